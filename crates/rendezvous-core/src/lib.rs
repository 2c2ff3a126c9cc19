//! rendezvous-core: shared types, wire envelope, and the small containers
//! every other rendezvous crate builds on.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod fast_pool;
pub mod generator;
pub mod types;
pub mod wire;

pub use endpoint::{Endpoint, TransportKind};
pub use error::{Code, Status};
pub use fast_pool::FastPool;
pub use generator::{Generator, IdStrategy, RandomName, RandomPort, RandomU32};
pub use types::{
    ClientFilter, ClientInfo, NodeFilter, NodeInfo, ServiceFilter, ServiceSource, TopicFilter,
    TopicSource,
};
pub use wire::Message;
