//! Socket construction shared by the channel roles.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use rendezvous_core::generator::{IdStrategy, RandomPort};
use rendezvous_core::{Status, TransportKind};

/// Listen backlog for TCP server channels.
pub const LISTEN_BACKLOG: i32 = 5;

pub const DEFAULT_PORT_TRIALS: u32 = 100;

/// Find a free port for `kind` by binding throwaway sockets to random
/// candidates in `[1024, 65535]`.
pub fn pick_random_port(kind: TransportKind, trials: u32) -> Result<u16, Status> {
    for _ in 0..trials {
        let candidate = RandomPort.generate();
        match probe_port(kind, candidate) {
            Ok(granted) if granted == candidate => return Ok(granted),
            Ok(granted) => {
                tracing::trace!(candidate, granted, "port probe returned a different port");
            }
            Err(e) => {
                tracing::trace!(candidate, error = %e, "port probe rejected");
            }
        }
    }
    Err(Status::internal(format!(
        "Failed to pick a random {kind} port after {trials} trials."
    )))
}

fn probe_port(kind: TransportKind, port: u16) -> io::Result<u16> {
    let socket = match kind {
        TransportKind::Tcp => Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?,
        TransportKind::Udp => Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?,
    };
    socket.set_reuse_address(true)?;
    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket.bind(&addr.into())?;
    local_port(&socket)
}

fn local_port(socket: &Socket) -> io::Result<u16> {
    socket
        .local_addr()?
        .as_socket()
        .map(|addr| addr.port())
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "local address is not inet"))
}

/// Non-blocking listening socket with server defaults applied.
pub(crate) fn tcp_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    if addr.is_ipv6() {
        socket.set_only_v6(true)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket.into())
}

/// Non-blocking UDP socket. `share` additionally allows several processes
/// to bind the same multicast port.
pub(crate) fn udp_socket(addr: SocketAddr, share: bool) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    if share {
        socket.set_reuse_port(true)?;
    }
    #[cfg(not(unix))]
    let _ = share;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    Ok(socket)
}

/// Maps a read-side error, reporting a clean EOF as a closed connection.
pub(crate) fn read_status(e: io::Error) -> Status {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Status::network("Connection closed.")
    } else {
        Status::from(e)
    }
}

/// Pause before accepting again after the process ran out of descriptors
/// or buffers.
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// How an accept loop should react to a failed `accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AcceptFailure {
    /// Only the incoming connection is affected; accept again right away.
    Connection,
    /// Descriptor or memory exhaustion; accept again after [`ACCEPT_BACKOFF`].
    Exhausted,
    /// The listening socket itself is unusable; stop.
    Listener,
}

pub(crate) fn classify_accept_error(e: &io::Error) -> AcceptFailure {
    if let Some(failure) = e.raw_os_error().and_then(classify_os_error) {
        return failure;
    }
    match e.kind() {
        io::ErrorKind::InvalidInput => AcceptFailure::Listener,
        io::ErrorKind::OutOfMemory => AcceptFailure::Exhausted,
        _ => AcceptFailure::Connection,
    }
}

#[cfg(unix)]
fn classify_os_error(code: i32) -> Option<AcceptFailure> {
    match code {
        libc::EBADF | libc::EINVAL | libc::ENOTSOCK | libc::EOPNOTSUPP => {
            Some(AcceptFailure::Listener)
        }
        libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM => Some(AcceptFailure::Exhausted),
        _ => None,
    }
}

#[cfg(not(unix))]
fn classify_os_error(_code: i32) -> Option<AcceptFailure> {
    None
}

/// Log an accept failure and wait if needed. Returns false when the accept
/// loop has to stop.
pub(crate) async fn recover_from_accept_error(e: &io::Error, role: &'static str) -> bool {
    match classify_accept_error(e) {
        AcceptFailure::Connection => {
            tracing::warn!(role, error = %e, "accept failed, dropping connection");
            true
        }
        AcceptFailure::Exhausted => {
            tracing::warn!(role, error = %e, backoff_ms = ACCEPT_BACKOFF.as_millis() as u64, "accept out of resources, backing off");
            tokio::time::sleep(ACCEPT_BACKOFF).await;
            true
        }
        AcceptFailure::Listener => {
            tracing::error!(role, error = %e, "listening socket failed, accept loop stopped");
            false
        }
    }
}
