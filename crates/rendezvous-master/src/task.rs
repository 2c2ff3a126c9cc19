use rendezvous_core::{Endpoint, Message};

/// Work the master schedules after a registry mutation has been committed.
///
/// Push targets are resolved when the task runs, not when it is queued, so a
/// node that unsubscribed in between is not pushed to.
#[derive(Debug, Clone, PartialEq)]
pub enum MasterTask {
    /// Push the current publisher of `topic` to every subscriber.
    NotifySubscribers { topic: String },
    /// Push the current publisher of `topic`, if any, to `node`.
    NotifySubscriber { node: String, topic: String },
    /// Push `message` to every watcher node.
    NotifyWatchers { message: Message },
    NotifyServiceClients { service: String },
    NotifyServiceClient { node: String, service: String },
    /// Start reading heart beats from a client.
    WatchHeartBeat { client_id: u32, endpoint: Endpoint },
}

/// One resolved delivery: `message` to `node` at `endpoint`.
#[derive(Debug, Clone, PartialEq)]
pub struct Push {
    pub node: String,
    pub endpoint: Endpoint,
    pub message: Message,
}
