//! Server role of a UDP channel.
//!
//! `bind` reserves a `239.x.x.x` group by joining and immediately leaving
//! random candidates until one is accepted, then pairs it with a separately
//! picked port. Writes go to that group endpoint.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use rand::Rng;
use tokio::net::UdpSocket;

use rendezvous_core::config::ChannelConfig;
use rendezvous_core::{Endpoint, Status, TransportKind};

use crate::net_util::{pick_random_port, udp_socket};

pub struct UdpServerChannel {
    socket: UdpSocket,
    multicast: SocketAddr,
    endpoint: Endpoint,
    last_sender: Option<Endpoint>,
}

impl UdpServerChannel {
    pub fn bind(endpoint: &Endpoint, config: &ChannelConfig) -> Result<Self, Status> {
        let ip = match endpoint.ip_addr()? {
            IpAddr::V4(ip) => ip,
            IpAddr::V6(_) => {
                return Err(Status::invalid_argument(
                    "Multicast negotiation requires an IPv4 bind address.",
                ))
            }
        };
        let port = if endpoint.has_port() {
            endpoint.port
        } else {
            pick_random_port(TransportKind::Udp, config.port_trials)?
        };

        let socket = udp_socket(SocketAddr::new(IpAddr::V4(ip), port), false)?;
        let group = negotiate_multicast(&socket, config.multicast_trials)?;
        let group_port = pick_random_port(TransportKind::Udp, config.port_trials)?;
        socket.set_multicast_loop_v4(true)?;

        let multicast = SocketAddr::new(IpAddr::V4(group), group_port);
        tracing::debug!(bind = %ip, port, multicast = %multicast, "udp server channel bound");

        Ok(Self {
            socket: UdpSocket::from_std(socket.into())?,
            multicast,
            endpoint: multicast.into(),
            last_sender: None,
        })
    }

    /// Multicast endpoint that clients join and writes are sent to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Sender of the most recent datagram read.
    pub fn last_sender(&self) -> Option<&Endpoint> {
        self.last_sender.as_ref()
    }

    pub async fn write(&mut self, buf: &[u8]) -> Result<(), Status> {
        let sent = self.socket.send_to(buf, self.multicast).await?;
        if sent != buf.len() {
            return Err(Status::network(format!(
                "Partial datagram write: {sent} of {} bytes.",
                buf.len()
            )));
        }
        Ok(())
    }

    /// Receive one datagram from any sender.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        let (n, from) = self.socket.recv_from(buf).await?;
        self.last_sender = Some(from.into());
        Ok(n)
    }
}

/// Find a `239/8` group this host can join. Membership is dropped again
/// right away; the address is only reserved.
fn negotiate_multicast(socket: &socket2::Socket, trials: u32) -> Result<Ipv4Addr, Status> {
    let mut rng = rand::thread_rng();
    for _ in 0..trials {
        let group = Ipv4Addr::new(239, rng.gen(), rng.gen(), rng.gen());
        if socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .is_ok()
        {
            if let Err(e) = socket.leave_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED) {
                tracing::debug!(group = %group, error = %e, "leave after probe failed");
            }
            return Ok(group);
        }
    }
    Err(Status::internal(format!(
        "Failed to find a multicast address after {trials} trials."
    )))
}
