//! Registry-side record of a live node and the topics and services it owns.

use std::collections::{BTreeMap, BTreeSet};

use rendezvous_core::{NodeInfo, ServiceSource, TopicSource};

#[derive(Debug, Clone)]
pub struct ServerNode {
    info: NodeInfo,
    publishing: BTreeMap<String, TopicSource>,
    subscribing: BTreeSet<String>,
    serving: BTreeMap<String, ServiceSource>,
    requesting: BTreeSet<String>,
}

impl ServerNode {
    pub fn new(info: NodeInfo) -> Self {
        Self {
            info,
            publishing: BTreeMap::new(),
            subscribing: BTreeSet::new(),
            serving: BTreeMap::new(),
            requesting: BTreeSet::new(),
        }
    }

    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    // ── Topics ────────────────────────────────────────────────────────────────

    pub fn is_publishing(&self, topic: &str) -> bool {
        self.publishing.contains_key(topic)
    }

    pub fn is_subscribing(&self, topic: &str) -> bool {
        self.subscribing.contains(topic)
    }

    pub fn topic_source(&self, topic: &str) -> Option<&TopicSource> {
        self.publishing.get(topic)
    }

    pub fn published(&self) -> impl Iterator<Item = &TopicSource> {
        self.publishing.values()
    }

    pub fn subscribed(&self) -> impl Iterator<Item = &str> {
        self.subscribing.iter().map(String::as_str)
    }

    /// Returns false if the node already publishes `source.topic`.
    pub fn publish(&mut self, source: TopicSource) -> bool {
        if self.publishing.contains_key(&source.topic) {
            return false;
        }
        self.publishing.insert(source.topic.clone(), source);
        true
    }

    pub fn unpublish(&mut self, topic: &str) -> Option<TopicSource> {
        self.publishing.remove(topic)
    }

    pub fn subscribe(&mut self, topic: &str) -> bool {
        self.subscribing.insert(topic.to_string())
    }

    pub fn unsubscribe(&mut self, topic: &str) -> bool {
        self.subscribing.remove(topic)
    }

    // ── Services ──────────────────────────────────────────────────────────────

    pub fn is_serving(&self, service: &str) -> bool {
        self.serving.contains_key(service)
    }

    pub fn is_requesting(&self, service: &str) -> bool {
        self.requesting.contains(service)
    }

    pub fn service_source(&self, service: &str) -> Option<&ServiceSource> {
        self.serving.get(service)
    }

    pub fn served(&self) -> impl Iterator<Item = &ServiceSource> {
        self.serving.values()
    }

    pub fn serve(&mut self, source: ServiceSource) -> bool {
        if self.serving.contains_key(&source.service) {
            return false;
        }
        self.serving.insert(source.service.clone(), source);
        true
    }

    pub fn unserve(&mut self, service: &str) -> Option<ServiceSource> {
        self.serving.remove(service)
    }

    pub fn request(&mut self, service: &str) -> bool {
        self.requesting.insert(service.to_string())
    }

    pub fn unrequest(&mut self, service: &str) -> bool {
        self.requesting.remove(service)
    }
}
