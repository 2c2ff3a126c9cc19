use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use rendezvous_core::{Endpoint, Status};

use crate::net_util::read_status;

/// Client role of a TCP channel: one connected stream.
pub struct TcpClientChannel {
    stream: TcpStream,
    peer: Endpoint,
}

impl TcpClientChannel {
    pub async fn connect(endpoint: &Endpoint) -> Result<Self, Status> {
        let addr = endpoint.to_socket_addr()?;
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        tracing::debug!(peer = %endpoint, "tcp channel connected");
        Ok(Self {
            stream,
            peer: endpoint.clone(),
        })
    }

    /// Wrap a stream accepted elsewhere.
    pub fn from_stream(stream: TcpStream) -> Result<Self, Status> {
        let peer = stream.peer_addr()?.into();
        stream.set_nodelay(true)?;
        Ok(Self { stream, peer })
    }

    pub fn peer(&self) -> &Endpoint {
        &self.peer
    }

    pub fn local_endpoint(&self) -> Result<Endpoint, Status> {
        Ok(self.stream.local_addr()?.into())
    }

    pub async fn write(&mut self, buf: &[u8]) -> Result<(), Status> {
        self.stream.write_all(buf).await?;
        Ok(())
    }

    /// Fill `buf` completely.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        self.stream.read_exact(buf).await.map_err(read_status)
    }
}
