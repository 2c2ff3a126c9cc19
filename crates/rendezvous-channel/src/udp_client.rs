use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use rendezvous_core::{Endpoint, Status};

use crate::net_util::udp_socket;

/// Client role of a UDP channel.
///
/// Binds the endpoint's port on the wildcard address with address sharing,
/// so several subscribers on one host can receive the same group, and joins
/// the group when the endpoint is multicast.
pub struct UdpClientChannel {
    socket: UdpSocket,
    peer: SocketAddr,
    endpoint: Endpoint,
    last_sender: Option<Endpoint>,
}

impl UdpClientChannel {
    pub fn connect(endpoint: &Endpoint) -> Result<Self, Status> {
        let peer = endpoint.to_socket_addr()?;
        let wildcard = match peer.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let socket = udp_socket(SocketAddr::new(wildcard, peer.port()), true)?;

        if let IpAddr::V4(group) = peer.ip() {
            if group.is_multicast() {
                socket.set_multicast_loop_v4(true)?;
                socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
                tracing::debug!(group = %group, port = peer.port(), "joined multicast group");
            }
        }

        Ok(Self {
            socket: UdpSocket::from_std(socket.into())?,
            peer,
            endpoint: endpoint.clone(),
            last_sender: None,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn last_sender(&self) -> Option<&Endpoint> {
        self.last_sender.as_ref()
    }

    pub async fn write(&mut self, buf: &[u8]) -> Result<(), Status> {
        let sent = self.socket.send_to(buf, self.peer).await?;
        if sent != buf.len() {
            return Err(Status::network(format!(
                "Partial datagram write: {sent} of {} bytes.",
                buf.len()
            )));
        }
        Ok(())
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        let (n, from) = self.socket.recv_from(buf).await?;
        self.last_sender = Some(from.into());
        Ok(n)
    }
}
