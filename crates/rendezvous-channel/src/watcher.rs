//! Node-side receiver of rendezvous pushes.
//!
//! The master opens a fresh connection per push and sends exactly one
//! message. The watcher accepts those connections, reads one message from
//! each, and queues it for [`RendezvousWatcher::recv`].

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use rendezvous_core::{Endpoint, Message, Status};

use crate::message_channel::MessageChannel;
use crate::net_util::{recover_from_accept_error, tcp_listener};
use crate::tcp_client::TcpClientChannel;

pub struct RendezvousWatcher {
    endpoint: Endpoint,
    rx: mpsc::UnboundedReceiver<Message>,
    accept_task: JoinHandle<()>,
}

impl RendezvousWatcher {
    pub async fn listen(endpoint: &Endpoint, max_message_bytes: usize) -> Result<Self, Status> {
        let listener = TcpListener::from_std(tcp_listener(endpoint.to_socket_addr()?)?)?;
        let bound: Endpoint = listener.local_addr()?.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let accept_task = tokio::spawn(watch_loop(listener, tx, max_message_bytes));
        tracing::debug!(endpoint = %bound, "rendezvous watcher listening");
        Ok(Self {
            endpoint: bound,
            rx,
            accept_task,
        })
    }

    /// Where the master should push to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Next pushed message. `None` once the listener has stopped.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

impl Drop for RendezvousWatcher {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn watch_loop(
    listener: TcpListener,
    tx: mpsc::UnboundedSender<Message>,
    max_message_bytes: usize,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(r) => r,
            Err(e) => {
                if recover_from_accept_error(&e, "watcher").await {
                    continue;
                }
                return;
            }
        };
        let push_tx = tx.clone();
        tokio::spawn(async move {
            let channel = match TcpClientChannel::from_stream(stream) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(peer = %peer, error = %e, "watcher stream setup failed");
                    return;
                }
            };
            let mut channel = MessageChannel::new(channel.into(), max_message_bytes);
            match channel.recv().await {
                Ok(message) => {
                    tracing::debug!(peer = %peer, kind = message.kind(), "received push");
                    let _ = push_tx.send(message);
                }
                Err(e) => tracing::warn!(peer = %peer, error = %e, "failed to read push"),
            }
        });
        if tx.is_closed() {
            return;
        }
    }
}
