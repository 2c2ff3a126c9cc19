//! Server role of a TCP channel.
//!
//! One listening socket feeds a background accept loop; every accepted
//! connection is handed to the channel over an mpsc queue and kept in an
//! owned list. Writes fan out to every accepted socket. Reads use only the
//! first one.

use futures::future::join_all;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use rendezvous_core::{Endpoint, Status};

use crate::net_util::{read_status, recover_from_accept_error, tcp_listener};

/// Outcome of a fan-out write.
#[derive(Debug)]
pub struct FanOut {
    /// Peers that received the whole buffer.
    pub delivered: usize,
    /// First failure, if any write failed or no peer was connected.
    pub error: Option<Status>,
}

pub struct TcpServerChannel {
    endpoint: Endpoint,
    accepted: Vec<TcpStream>,
    incoming: mpsc::UnboundedReceiver<TcpStream>,
    accept_task: JoinHandle<()>,
}

impl TcpServerChannel {
    /// Bind and start accepting. Port 0 binds an ephemeral port; the bound
    /// endpoint is available from [`TcpServerChannel::endpoint`].
    pub async fn listen(endpoint: &Endpoint) -> Result<Self, Status> {
        let addr = endpoint.to_socket_addr()?;
        let listener = TcpListener::from_std(tcp_listener(addr)?)?;
        let bound: Endpoint = listener.local_addr()?.into();

        let (tx, incoming) = mpsc::unbounded_channel();
        let accept_task = tokio::spawn(accept_loop(listener, tx));

        tracing::debug!(endpoint = %bound, "tcp server channel listening");
        Ok(Self {
            endpoint: bound,
            accepted: Vec::new(),
            incoming,
            accept_task,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Connections accepted so far.
    pub fn accepted_count(&mut self) -> usize {
        self.drain_incoming();
        self.accepted.len()
    }

    /// Wait for the next accepted connection and return its peer.
    pub async fn accept(&mut self) -> Result<Endpoint, Status> {
        let stream = self
            .incoming
            .recv()
            .await
            .ok_or_else(|| Status::network("Accept loop stopped."))?;
        let peer = stream.peer_addr()?.into();
        self.accepted.push(stream);
        Ok(peer)
    }

    /// Write `buf` to every accepted socket. Succeeds only if every per-socket
    /// write succeeded; otherwise returns the first failure. Sockets whose
    /// write failed are dropped.
    pub async fn write(&mut self, buf: &[u8]) -> Result<(), Status> {
        match self.fan_out(buf).await.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Like [`TcpServerChannel::write`], but also reports how many peers
    /// received `buf` when some of the writes failed.
    pub async fn fan_out(&mut self, buf: &[u8]) -> FanOut {
        self.drain_incoming();
        if self.accepted.is_empty() {
            return FanOut {
                delivered: 0,
                error: Some(Status::network("Socket is not connected.")),
            };
        }

        let results = join_all(self.accepted.iter_mut().map(|s| s.write_all(buf))).await;
        let failed: Vec<bool> = results.iter().map(Result::is_err).collect();
        let delivered = failed.iter().filter(|f| !**f).count();
        let first_error = results.into_iter().find_map(Result::err);

        if let Some(e) = &first_error {
            let mut i = 0;
            self.accepted.retain(|_| {
                let keep = !failed[i];
                i += 1;
                keep
            });
            tracing::debug!(
                error = %e,
                remaining = self.accepted.len(),
                "dropped closed sockets after fan-out write"
            );
        }
        FanOut {
            delivered,
            error: first_error.map(Status::from),
        }
    }

    /// Fill `buf` from the first accepted socket, waiting for a connection
    /// if none has arrived yet. A socket that fails a read is dropped, so the
    /// next accepted peer takes over.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        self.drain_incoming();
        if self.accepted.is_empty() {
            self.accept().await?;
        }
        match self.accepted[0].read_exact(buf).await {
            Ok(n) => Ok(n),
            Err(e) => {
                let closed = self.accepted.remove(0);
                tracing::debug!(
                    peer = ?closed.peer_addr().ok(),
                    error = %e,
                    remaining = self.accepted.len(),
                    "dropped read socket"
                );
                Err(read_status(e))
            }
        }
    }

    fn drain_incoming(&mut self) {
        while let Ok(stream) = self.incoming.try_recv() {
            self.accepted.push(stream);
        }
    }
}

impl Drop for TcpServerChannel {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(listener: TcpListener, tx: mpsc::UnboundedSender<TcpStream>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::warn!(peer = %peer, error = %e, "set_nodelay failed");
                }
                tracing::debug!(peer = %peer, "accepted connection");
                if tx.send(stream).is_err() {
                    return;
                }
            }
            Err(e) => {
                if !recover_from_accept_error(&e, "tcp server").await {
                    return;
                }
            }
        }
    }
}
