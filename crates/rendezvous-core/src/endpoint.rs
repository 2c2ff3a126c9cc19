use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::error::Status;

/// Transport used by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Tcp,
    Udp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Tcp => f.write_str("tcp"),
            TransportKind::Udp => f.write_str("udp"),
        }
    }
}

/// An IP address literal plus a port. Port 0 means "assign dynamically".
///
/// The address is kept as the caller wrote it so a malformed literal can
/// travel through the registry and be rejected where it is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub ip: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    pub fn ip_addr(&self) -> Result<IpAddr, Status> {
        self.ip
            .parse::<IpAddr>()
            .map_err(|_| Status::invalid_argument(format!("Invalid ip address: '{}'", self.ip)))
    }

    pub fn to_socket_addr(&self) -> Result<SocketAddr, Status> {
        Ok(SocketAddr::new(self.ip_addr()?, self.port))
    }

    pub fn has_port(&self) -> bool {
        self.port != 0
    }

    pub fn is_multicast(&self) -> bool {
        self.ip_addr().map(|ip| ip.is_multicast()).unwrap_or(false)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self {
            ip: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip_addr() {
            Ok(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
            _ => write!(f, "{}:{}", self.ip, self.port),
        }
    }
}
