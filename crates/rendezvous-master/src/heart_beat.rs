//! Liveness tracking for clients that serve heart beats.
//!
//! The master connects to the client's heart-beat endpoint and keeps reading
//! `HeartBeat` frames. A missed or failed read counts one trial and the
//! connection is re-established after one interval; a good beat resets the
//! count. At the trial limit, or if the very first connect fails, the client
//! and all of its nodes are removed.

use rendezvous_channel::{MessageChannel, TcpClientChannel};
use rendezvous_core::{Endpoint, Message, Status};

use crate::master::Master;
use crate::notifier::NotifierConfig;

pub(crate) async fn watch(
    master: Master,
    client_id: u32,
    endpoint: Endpoint,
    config: NotifierConfig,
) {
    let mut channel = match connect(&endpoint, &config).await {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!(client = client_id, endpoint = %endpoint, error = %e, "heart beat connect failed");
            drop_client(&master, client_id).await;
            return;
        }
    };

    let read_timeout = config.heart_beat_interval * 2;
    let mut trials = 0u32;

    loop {
        if !master.has_client(client_id).await {
            tracing::debug!(client = client_id, "client gone, heart beat watch ended");
            return;
        }

        let result = match channel.as_mut() {
            Some(rx) => match tokio::time::timeout(read_timeout, rx.recv()).await {
                Ok(r) => r,
                Err(_) => Err(Status::aborted("Heart beat timed out.")),
            },
            None => match connect(&endpoint, &config).await {
                Ok(c) => {
                    channel = Some(c);
                    continue;
                }
                Err(e) => Err(e),
            },
        };

        match result {
            Ok(Message::HeartBeat { .. }) => trials = 0,
            Ok(other) => {
                tracing::debug!(client = client_id, kind = other.kind(), "ignored frame on heart beat channel");
            }
            Err(e) => {
                trials += 1;
                tracing::debug!(client = client_id, trials, error = %e, "heart beat missed");
                if trials >= config.heart_beat_trials {
                    tracing::warn!(client = client_id, trials, "heart beat lost, removing client");
                    drop_client(&master, client_id).await;
                    return;
                }
                channel = None;
                tokio::time::sleep(config.heart_beat_interval).await;
            }
        }
    }
}

async fn connect(endpoint: &Endpoint, config: &NotifierConfig) -> Result<MessageChannel, Status> {
    let channel = TcpClientChannel::connect(endpoint).await?;
    Ok(MessageChannel::new(channel.into(), config.max_message_bytes))
}

async fn drop_client(master: &Master, client_id: u32) {
    if let Err(e) = master.unregister_client(client_id).await {
        tracing::debug!(client = client_id, error = %e, "client already removed");
    }
}
