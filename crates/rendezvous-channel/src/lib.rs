//! rendezvous-channel: TCP and UDP transport roles, framed message
//! channels, and the node-side helpers built on them.

pub mod channel;
pub mod heart_beat;
pub mod message_channel;
pub mod net_util;
pub mod pubsub;
pub mod tcp_client;
pub mod tcp_server;
pub mod udp_client;
pub mod udp_server;
pub mod watcher;

pub use channel::Channel;
pub use heart_beat::HeartBeatSignaller;
pub use message_channel::MessageChannel;
pub use net_util::pick_random_port;
pub use pubsub::{Publisher, Subscriber};
pub use tcp_client::TcpClientChannel;
pub use tcp_server::{FanOut, TcpServerChannel};
pub use udp_client::UdpClientChannel;
pub use udp_server::UdpServerChannel;
pub use watcher::RendezvousWatcher;
