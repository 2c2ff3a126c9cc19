use rendezvous_core::config::ChannelConfig;
use rendezvous_core::{Endpoint, Status, TransportKind};

use crate::tcp_client::TcpClientChannel;
use crate::tcp_server::TcpServerChannel;
use crate::udp_client::UdpClientChannel;
use crate::udp_server::UdpServerChannel;

/// A transport endpoint in one of its four roles.
///
/// Operations take `&mut self`, so a channel never has two reads or two
/// writes in flight.
pub enum Channel {
    TcpClient(TcpClientChannel),
    TcpServer(TcpServerChannel),
    UdpClient(UdpClientChannel),
    UdpServer(UdpServerChannel),
}

impl Channel {
    /// Open the client role for `kind` towards `endpoint`.
    pub async fn connect(kind: TransportKind, endpoint: &Endpoint) -> Result<Self, Status> {
        match kind {
            TransportKind::Tcp => Ok(Channel::TcpClient(TcpClientChannel::connect(endpoint).await?)),
            TransportKind::Udp => Ok(Channel::UdpClient(UdpClientChannel::connect(endpoint)?)),
        }
    }

    /// Open the server role: TCP listens, UDP binds and negotiates a group.
    pub async fn serve(
        kind: TransportKind,
        endpoint: &Endpoint,
        config: &ChannelConfig,
    ) -> Result<Self, Status> {
        match kind {
            TransportKind::Tcp => Ok(Channel::TcpServer(TcpServerChannel::listen(endpoint).await?)),
            TransportKind::Udp => Ok(Channel::UdpServer(UdpServerChannel::bind(endpoint, config)?)),
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Channel::TcpClient(_) | Channel::TcpServer(_) => TransportKind::Tcp,
            Channel::UdpClient(_) | Channel::UdpServer(_) => TransportKind::Udp,
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Channel::TcpServer(_) | Channel::UdpServer(_))
    }

    /// Server roles: the endpoint peers connect to. Client roles: the peer.
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Channel::TcpClient(c) => c.peer(),
            Channel::TcpServer(c) => c.endpoint(),
            Channel::UdpClient(c) => c.endpoint(),
            Channel::UdpServer(c) => c.endpoint(),
        }
    }

    pub fn as_tcp_server(&mut self) -> Option<&mut TcpServerChannel> {
        match self {
            Channel::TcpServer(c) => Some(c),
            _ => None,
        }
    }

    pub async fn write(&mut self, buf: &[u8]) -> Result<(), Status> {
        match self {
            Channel::TcpClient(c) => c.write(buf).await,
            Channel::TcpServer(c) => c.write(buf).await,
            Channel::UdpClient(c) => c.write(buf).await,
            Channel::UdpServer(c) => c.write(buf).await,
        }
    }

    /// TCP roles fill `buf` exactly. UDP roles receive one datagram and
    /// return its length.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        match self {
            Channel::TcpClient(c) => c.read(buf).await,
            Channel::TcpServer(c) => c.read(buf).await,
            Channel::UdpClient(c) => c.read(buf).await,
            Channel::UdpServer(c) => c.read(buf).await,
        }
    }
}

impl From<TcpClientChannel> for Channel {
    fn from(c: TcpClientChannel) -> Self {
        Channel::TcpClient(c)
    }
}

impl From<TcpServerChannel> for Channel {
    fn from(c: TcpServerChannel) -> Self {
        Channel::TcpServer(c)
    }
}

impl From<UdpClientChannel> for Channel {
    fn from(c: UdpClientChannel) -> Self {
        Channel::UdpClient(c)
    }
}

impl From<UdpServerChannel> for Channel {
    fn from(c: UdpServerChannel) -> Self {
        Channel::UdpServer(c)
    }
}
