//! Client-side heart-beat signaller.
//!
//! Serves a TCP endpoint the master connects to and writes a `HeartBeat`
//! frame to every connected reader once per interval.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use rendezvous_core::wire::{self, DEFAULT_MAX_MESSAGE_BYTES};
use rendezvous_core::{Endpoint, Message, Status};

use crate::tcp_server::TcpServerChannel;

pub struct HeartBeatSignaller {
    endpoint: Endpoint,
    client_id: Arc<AtomicU32>,
    task: JoinHandle<()>,
}

impl HeartBeatSignaller {
    pub async fn start(endpoint: &Endpoint, interval: Duration) -> Result<Self, Status> {
        let server = TcpServerChannel::listen(endpoint).await?;
        let bound = server.endpoint().clone();
        let client_id = Arc::new(AtomicU32::new(u32::MAX));
        let task = tokio::spawn(signal_loop(server, Arc::clone(&client_id), interval));
        Ok(Self {
            endpoint: bound,
            client_id,
            task,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Stamp subsequent beats with the id the master assigned.
    pub fn set_client_id(&self, id: u32) {
        self.client_id.store(id, Ordering::Relaxed);
    }
}

impl Drop for HeartBeatSignaller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn signal_loop(mut server: TcpServerChannel, client_id: Arc<AtomicU32>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let beat = Message::HeartBeat {
            client_id: client_id.load(Ordering::Relaxed),
        };
        let frame = match wire::encode(&beat, DEFAULT_MAX_MESSAGE_BYTES) {
            Ok(f) => f,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode heart beat");
                return;
            }
        };
        if let Err(e) = server.write(&frame).await {
            tracing::trace!(error = %e, "heart beat not delivered");
        }
    }
}
