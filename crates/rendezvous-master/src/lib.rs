//! rendezvous-master: the registry, its operations, and the task queue that
//! pushes rendezvous information to nodes.

pub mod client;
pub mod errors;
mod heart_beat;
pub mod master;
pub mod notifier;
pub mod registry;
pub mod server_node;
pub mod task;

pub use master::{Master, SharedRegistry};
pub use notifier::{Notifier, NotifierConfig};
pub use registry::{Registry, RegistrySnapshot};
pub use task::{MasterTask, Push};
