//! In-memory registry of clients, nodes, topics, and services.
//!
//! Every mutating operation either fails without touching state or commits
//! and returns the follow-up [`MasterTask`]s to schedule. The registry does
//! no I/O; callers serialize access to it.

use std::collections::BTreeMap;

use serde::Serialize;

use rendezvous_core::generator::{Generator, RandomName, RandomU32};
use rendezvous_core::{
    ClientFilter, ClientInfo, Message, NodeFilter, NodeInfo, ServiceFilter, ServiceSource, Status,
    TopicFilter, TopicSource,
};

use crate::client::Client;
use crate::errors;
use crate::server_node::ServerNode;
use crate::task::{MasterTask, Push};

pub type Followups = Vec<MasterTask>;

/// Counts reported by the periodic snapshot log and the status route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub clients: usize,
    pub nodes: usize,
    pub watchers: usize,
    pub topics: usize,
    pub subscriptions: usize,
    pub services: usize,
}

pub struct Registry {
    nodes: BTreeMap<String, ServerNode>,
    clients: BTreeMap<u32, Client>,
    /// topic → publishing node
    publishers: BTreeMap<String, String>,
    /// service → serving node
    servers: BTreeMap<String, String>,
    names: Generator<RandomName>,
    ids: Generator<RandomU32>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            clients: BTreeMap::new(),
            publishers: BTreeMap::new(),
            servers: BTreeMap::new(),
            names: Generator::new(RandomName),
            ids: Generator::new(RandomU32),
        }
    }

    // ── Clients ───────────────────────────────────────────────────────────────

    pub fn register_client(
        &mut self,
        mut info: ClientInfo,
    ) -> Result<(ClientInfo, Followups), Status> {
        if let Some(endpoint) = &info.heart_beat_endpoint {
            endpoint.to_socket_addr()?;
        }
        info.id = self
            .ids
            .generate()
            .ok_or_else(|| Status::internal("Failed to generate a client id."))?;

        let mut followups = Vec::new();
        if let Some(endpoint) = &info.heart_beat_endpoint {
            followups.push(MasterTask::WatchHeartBeat {
                client_id: info.id,
                endpoint: endpoint.clone(),
            });
        }
        self.clients.insert(info.id, Client::new(info.clone()));
        Ok((info, followups))
    }

    /// Remove a client along with every node it owns.
    pub fn remove_client(&mut self, id: u32) -> Result<Followups, Status> {
        let client = self
            .clients
            .remove(&id)
            .ok_or_else(errors::client_not_registered)?;
        self.ids.release(&id);

        let mut followups = Vec::new();
        for name in client.nodes() {
            followups.extend(self.remove_node(name));
        }
        Ok(followups)
    }

    pub fn has_client(&self, id: u32) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn list_clients(&self, filter: &ClientFilter) -> Vec<ClientInfo> {
        match filter {
            ClientFilter::All => self.clients.values().map(|c| c.info().clone()).collect(),
            ClientFilter::Id(id) => self
                .clients
                .get(id)
                .map(|c| c.info().clone())
                .into_iter()
                .collect(),
        }
    }

    // ── Nodes ─────────────────────────────────────────────────────────────────

    /// Insert a node, generating a name if none was given.
    pub fn register_node(&mut self, mut info: NodeInfo) -> Result<NodeInfo, Status> {
        if let Some(client_id) = info.client_id {
            if !self.clients.contains_key(&client_id) {
                return Err(errors::client_not_registered());
            }
        }

        if info.name.is_empty() {
            info.name = self
                .names
                .generate()
                .ok_or_else(|| Status::internal("Failed to generate a node name."))?;
        } else if !self.names.add(info.name.clone()) {
            return Err(errors::node_already_registered(&info.name));
        }

        if let Some(client) = info.client_id.and_then(|id| self.clients.get_mut(&id)) {
            client.add_node(&info.name);
        }
        self.nodes
            .insert(info.name.clone(), ServerNode::new(info.clone()));
        Ok(info)
    }

    pub fn unregister_node(&mut self, info: &NodeInfo) -> Result<Followups, Status> {
        if !self.nodes.contains_key(&info.name) {
            return Err(errors::node_not_registered(&info.name));
        }
        Ok(self.remove_node(&info.name))
    }

    fn remove_node(&mut self, name: &str) -> Followups {
        let Some(node) = self.nodes.remove(name) else {
            return Vec::new();
        };
        self.names.release(&node.info().name);
        if let Some(client) = node.info().client_id.and_then(|id| self.clients.get_mut(&id)) {
            client.remove_node(name);
        }

        let mut followups = Vec::new();
        for source in node.published() {
            self.publishers.remove(&source.topic);
            followups.push(MasterTask::NotifyWatchers {
                message: Message::TopicClosed {
                    topic: source.topic.clone(),
                },
            });
        }
        for source in node.served() {
            self.servers.remove(&source.service);
        }
        followups
    }

    pub fn node(&self, name: &str) -> Option<&ServerNode> {
        self.nodes.get(name)
    }

    fn node_mut(&mut self, name: &str) -> Result<&mut ServerNode, Status> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| errors::node_not_registered(name))
    }

    pub fn get_nodes(&self, filter: &NodeFilter) -> Vec<NodeInfo> {
        match filter {
            NodeFilter::All => self.infos(|_| true),
            NodeFilter::PublishingTopic(topic) => self.owner_info(self.publishers.get(topic)),
            NodeFilter::SubscribingTopic(topic) => self.infos(|n| n.is_subscribing(topic)),
            NodeFilter::ServingService(service) => self.owner_info(self.servers.get(service)),
            NodeFilter::RequestingService(service) => self.infos(|n| n.is_requesting(service)),
            NodeFilter::Name(name) => self.owner_info(Some(name)),
            NodeFilter::Watcher => self.infos(|n| n.info().is_watcher),
        }
    }

    fn infos(&self, pred: impl Fn(&ServerNode) -> bool) -> Vec<NodeInfo> {
        self.nodes
            .values()
            .filter(|n| pred(n))
            .map(|n| n.info().clone())
            .collect()
    }

    fn owner_info(&self, name: Option<&String>) -> Vec<NodeInfo> {
        name.and_then(|name| self.nodes.get(name))
            .map(|n| n.info().clone())
            .into_iter()
            .collect()
    }

    // ── Topics ────────────────────────────────────────────────────────────────

    pub fn publish_topic(
        &mut self,
        info: &NodeInfo,
        source: TopicSource,
    ) -> Result<Followups, Status> {
        if source.topic.is_empty() {
            return Err(errors::empty_name("Topic"));
        }
        source.endpoint.to_socket_addr()?;
        self.node_mut(&info.name)?;
        if self.publishers.contains_key(&source.topic) {
            return Err(errors::topic_already_published(&source.topic));
        }

        let node = self.node_mut(&info.name)?;
        node.publish(source.clone());
        self.publishers
            .insert(source.topic.clone(), info.name.clone());

        Ok(vec![
            MasterTask::NotifySubscribers {
                topic: source.topic.clone(),
            },
            MasterTask::NotifyWatchers {
                message: Message::TopicSource(source),
            },
        ])
    }

    pub fn unpublish_topic(&mut self, info: &NodeInfo, topic: &str) -> Result<Followups, Status> {
        let node = self.node_mut(&info.name)?;
        if node.unpublish(topic).is_none() {
            return Err(errors::topic_not_published(&info.name, topic));
        }
        self.publishers.remove(topic);
        Ok(vec![MasterTask::NotifyWatchers {
            message: Message::TopicClosed {
                topic: topic.to_string(),
            },
        }])
    }

    pub fn subscribe_topic(&mut self, info: &NodeInfo, topic: &str) -> Result<Followups, Status> {
        if topic.is_empty() {
            return Err(errors::empty_name("Topic"));
        }
        let node = self.node_mut(&info.name)?;
        if !node.subscribe(topic) {
            return Err(errors::topic_already_subscribed(&info.name, topic));
        }
        Ok(vec![MasterTask::NotifySubscriber {
            node: info.name.clone(),
            topic: topic.to_string(),
        }])
    }

    pub fn unsubscribe_topic(&mut self, info: &NodeInfo, topic: &str) -> Result<Followups, Status> {
        let node = self.node_mut(&info.name)?;
        if !node.unsubscribe(topic) {
            return Err(errors::topic_not_subscribed(&info.name, topic));
        }
        Ok(Vec::new())
    }

    pub fn list_topics(&self, filter: &TopicFilter) -> Vec<TopicSource> {
        match filter {
            TopicFilter::All => self
                .publishers
                .keys()
                .filter_map(|topic| self.publisher_source(topic))
                .collect(),
            TopicFilter::Topic(topic) => self.publisher_source(topic).into_iter().collect(),
        }
    }

    // ── Services ──────────────────────────────────────────────────────────────

    pub fn register_service_server(
        &mut self,
        info: &NodeInfo,
        source: ServiceSource,
    ) -> Result<Followups, Status> {
        if source.service.is_empty() {
            return Err(errors::empty_name("Service"));
        }
        source.endpoint.to_socket_addr()?;
        self.node_mut(&info.name)?;
        if self.servers.contains_key(&source.service) {
            return Err(errors::service_already_served(&source.service));
        }

        let node = self.node_mut(&info.name)?;
        node.serve(source.clone());
        self.servers
            .insert(source.service.clone(), info.name.clone());
        Ok(vec![MasterTask::NotifyServiceClients {
            service: source.service,
        }])
    }

    pub fn unregister_service_server(
        &mut self,
        info: &NodeInfo,
        service: &str,
    ) -> Result<Followups, Status> {
        let node = self.node_mut(&info.name)?;
        if node.unserve(service).is_none() {
            return Err(errors::service_not_served(&info.name, service));
        }
        self.servers.remove(service);
        Ok(Vec::new())
    }

    pub fn register_service_client(
        &mut self,
        info: &NodeInfo,
        service: &str,
    ) -> Result<Followups, Status> {
        if service.is_empty() {
            return Err(errors::empty_name("Service"));
        }
        let node = self.node_mut(&info.name)?;
        if !node.request(service) {
            return Err(errors::service_already_requested(&info.name, service));
        }
        Ok(vec![MasterTask::NotifyServiceClient {
            node: info.name.clone(),
            service: service.to_string(),
        }])
    }

    pub fn unregister_service_client(
        &mut self,
        info: &NodeInfo,
        service: &str,
    ) -> Result<Followups, Status> {
        let node = self.node_mut(&info.name)?;
        if !node.unrequest(service) {
            return Err(errors::service_not_requested(&info.name, service));
        }
        Ok(Vec::new())
    }

    pub fn list_services(&self, filter: &ServiceFilter) -> Vec<ServiceSource> {
        match filter {
            ServiceFilter::All => self
                .servers
                .keys()
                .filter_map(|service| self.server_source(service))
                .collect(),
            ServiceFilter::Service(service) => self.server_source(service).into_iter().collect(),
        }
    }

    // ── Notification targets ──────────────────────────────────────────────────

    /// Turn a notification task into concrete deliveries against the current
    /// state. Nodes without an inbound endpoint are skipped.
    pub fn resolve(&self, task: &MasterTask) -> Vec<Push> {
        let pushes: Vec<Push> = match task {
            MasterTask::NotifySubscribers { topic } => {
                let Some(source) = self.publisher_source(topic) else {
                    return Vec::new();
                };
                self.nodes
                    .values()
                    .filter(|n| n.is_subscribing(topic))
                    .map(|n| push_to(n, Message::TopicSource(source.clone())))
                    .collect()
            }
            MasterTask::NotifySubscriber { node, topic } => {
                match (self.nodes.get(node), self.publisher_source(topic)) {
                    (Some(n), Some(source)) if n.is_subscribing(topic) => {
                        vec![push_to(n, Message::TopicSource(source))]
                    }
                    _ => Vec::new(),
                }
            }
            MasterTask::NotifyWatchers { message } => self
                .nodes
                .values()
                .filter(|n| n.info().is_watcher)
                .map(|n| push_to(n, message.clone()))
                .collect(),
            MasterTask::NotifyServiceClients { service } => {
                let Some(source) = self.server_source(service) else {
                    return Vec::new();
                };
                self.nodes
                    .values()
                    .filter(|n| n.is_requesting(service))
                    .map(|n| push_to(n, Message::ServiceSource(source.clone())))
                    .collect()
            }
            MasterTask::NotifyServiceClient { node, service } => {
                match (self.nodes.get(node), self.server_source(service)) {
                    (Some(n), Some(source)) if n.is_requesting(service) => {
                        vec![push_to(n, Message::ServiceSource(source))]
                    }
                    _ => Vec::new(),
                }
            }
            MasterTask::WatchHeartBeat { .. } => Vec::new(),
        };

        pushes
            .into_iter()
            .filter(|p| {
                if p.endpoint.has_port() {
                    true
                } else {
                    tracing::debug!(node = %p.node, "node has no inbound endpoint, push skipped");
                    false
                }
            })
            .collect()
    }

    fn publisher_source(&self, topic: &str) -> Option<TopicSource> {
        let name = self.publishers.get(topic)?;
        self.nodes.get(name)?.topic_source(topic).cloned()
    }

    fn server_source(&self, service: &str) -> Option<ServiceSource> {
        let name = self.servers.get(service)?;
        self.nodes.get(name)?.service_source(service).cloned()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            clients: self.clients.len(),
            nodes: self.nodes.len(),
            watchers: self.nodes.values().filter(|n| n.info().is_watcher).count(),
            topics: self.publishers.len(),
            subscriptions: self.nodes.values().map(|n| n.subscribed().count()).sum(),
            services: self.servers.len(),
        }
    }
}

fn push_to(node: &ServerNode, message: Message) -> Push {
    Push {
        node: node.name().to_string(),
        endpoint: node.info().endpoint.clone(),
        message,
    }
}
