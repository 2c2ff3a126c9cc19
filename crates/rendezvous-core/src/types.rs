//! Records exchanged between nodes, the master, and the API.

use serde::{Deserialize, Serialize};

use crate::endpoint::{Endpoint, TransportKind};

/// A registered process.
///
/// `name` is left empty by callers that want the master to generate one.
/// `endpoint` is where the node accepts rendezvous pushes; port 0 means the
/// node has no inbound channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub name: String,
    pub endpoint: Endpoint,
    #[serde(default)]
    pub is_watcher: bool,
    /// Owning client, if the node was registered on behalf of one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u32>,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
            is_watcher: false,
            client_id: None,
        }
    }

    pub fn watcher(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            is_watcher: true,
            ..Self::new(name, endpoint)
        }
    }

    pub fn with_client(mut self, client_id: u32) -> Self {
        self.client_id = Some(client_id);
        self
    }
}

/// An external process that owns zero or more nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Assigned by the master; ignored on registration.
    #[serde(default)]
    pub id: u32,
    /// Where the client serves `HeartBeat` messages. `None` disables liveness tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_beat_endpoint: Option<Endpoint>,
}

impl ClientInfo {
    pub fn new(heart_beat_endpoint: Option<Endpoint>) -> Self {
        Self {
            id: 0,
            heart_beat_endpoint,
        }
    }
}

/// Where a topic is published. Pushed to subscribers on rendezvous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSource {
    pub topic: String,
    pub kind: TransportKind,
    pub endpoint: Endpoint,
}

impl TopicSource {
    pub fn new(topic: impl Into<String>, kind: TransportKind, endpoint: Endpoint) -> Self {
        Self {
            topic: topic.into(),
            kind,
            endpoint,
        }
    }
}

/// Where a service is served. Pushed to service clients on rendezvous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSource {
    pub service: String,
    pub kind: TransportKind,
    pub endpoint: Endpoint,
}

impl ServiceSource {
    pub fn new(service: impl Into<String>, kind: TransportKind, endpoint: Endpoint) -> Self {
        Self {
            service: service.into(),
            kind,
            endpoint,
        }
    }
}

// ── Filters ───────────────────────────────────────────────────────────────────

/// Node selector for `GetNodes`. Exactly one selector applies per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeFilter {
    All,
    PublishingTopic(String),
    SubscribingTopic(String),
    ServingService(String),
    RequestingService(String),
    Name(String),
    Watcher,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicFilter {
    All,
    Topic(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceFilter {
    All,
    Service(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientFilter {
    All,
    Id(u32),
}
