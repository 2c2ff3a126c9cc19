use std::net::IpAddr;

use crate::*;

use rendezvous_channel::{TcpClientChannel, TcpServerChannel, UdpServerChannel};
use rendezvous_core::config::ChannelConfig;
use rendezvous_core::Code;

/// Listening on the wildcard with port 0 yields an unprivileged port, and
/// one client connecting adds exactly one accepted socket.
#[tokio::test]
async fn test_tcp_listen_accepts_one_client() {
    let mut server = TcpServerChannel::listen(&Endpoint::new("0.0.0.0", 0))
        .await
        .unwrap();
    let port = server.endpoint().port;
    assert!(port >= 1024);

    let _client = TcpClientChannel::connect(&loopback(port)).await.unwrap();

    let deadline = tokio::time::Instant::now() + PUSH_TIMEOUT;
    while server.accepted_count() == 0 {
        assert!(tokio::time::Instant::now() < deadline, "accept loop never ran");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.accepted_count(), 1);
}

/// UDP bind negotiates a 239/8 group with a real port, and writing to it
/// works.
#[tokio::test]
async fn test_udp_bind_negotiates_multicast() {
    let mut server = UdpServerChannel::bind(&Endpoint::new("0.0.0.0", 0), &ChannelConfig::default())
        .unwrap();
    let addr = server.endpoint().to_socket_addr().unwrap();
    match addr.ip() {
        IpAddr::V4(ip) => assert_eq!(ip.octets()[0], 239),
        IpAddr::V6(ip) => panic!("expected IPv4 multicast, got {ip}"),
    }
    assert_ne!(addr.port(), 0);

    server.write(b"hello").await.unwrap();
}

#[tokio::test]
async fn test_connect_to_closed_port_is_network_error() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let err = TcpClientChannel::connect(&loopback(port)).await.err().unwrap();
    assert_eq!(err.code(), Code::NetworkError);
    assert!(!err.message().is_empty());
}
