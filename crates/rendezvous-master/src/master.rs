//! The master: registry operations plus the queue of follow-up work.
//!
//! Each operation locks the registry, applies the mutation, releases the
//! lock, and only then queues its follow-up tasks. The reply never waits on
//! a push.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use rendezvous_core::{
    ClientFilter, ClientInfo, NodeFilter, NodeInfo, ServiceFilter, ServiceSource, Status,
    TopicFilter, TopicSource,
};

use crate::registry::{Followups, Registry, RegistrySnapshot};
use crate::task::{MasterTask, Push};

pub type SharedRegistry = Arc<Mutex<Registry>>;

#[derive(Clone)]
pub struct Master {
    registry: SharedRegistry,
    tasks: mpsc::UnboundedSender<MasterTask>,
}

impl Master {
    /// Returns the master and the receiving end of its task queue, which is
    /// handed to a [`crate::Notifier`].
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MasterTask>) {
        let (tasks, rx) = mpsc::unbounded_channel();
        let master = Self {
            registry: Arc::new(Mutex::new(Registry::new())),
            tasks,
        };
        (master, rx)
    }

    fn schedule(&self, followups: Followups) {
        for task in followups {
            if self.tasks.send(task).is_err() {
                tracing::warn!("task queue closed, follow-up dropped");
                return;
            }
        }
    }

    // ── Clients ───────────────────────────────────────────────────────────────

    pub async fn register_client(&self, info: ClientInfo) -> Result<ClientInfo, Status> {
        let (info, followups) = self.registry.lock().await.register_client(info)?;
        tracing::info!(
            client = info.id,
            heart_beat = info.heart_beat_endpoint.is_some(),
            "client registered"
        );
        self.schedule(followups);
        Ok(info)
    }

    pub async fn unregister_client(&self, id: u32) -> Result<(), Status> {
        let followups = self.registry.lock().await.remove_client(id)?;
        tracing::info!(client = id, "client removed");
        self.schedule(followups);
        Ok(())
    }

    pub async fn list_clients(&self, filter: &ClientFilter) -> Vec<ClientInfo> {
        self.registry.lock().await.list_clients(filter)
    }

    pub async fn has_client(&self, id: u32) -> bool {
        self.registry.lock().await.has_client(id)
    }

    // ── Nodes ─────────────────────────────────────────────────────────────────

    pub async fn register_node(&self, info: NodeInfo) -> Result<NodeInfo, Status> {
        let info = self.registry.lock().await.register_node(info)?;
        tracing::info!(node = %info.name, endpoint = %info.endpoint, watcher = info.is_watcher, "node registered");
        Ok(info)
    }

    pub async fn unregister_node(&self, info: &NodeInfo) -> Result<(), Status> {
        let followups = self.registry.lock().await.unregister_node(info)?;
        tracing::info!(node = %info.name, "node unregistered");
        self.schedule(followups);
        Ok(())
    }

    pub async fn get_nodes(&self, filter: &NodeFilter) -> Vec<NodeInfo> {
        self.registry.lock().await.get_nodes(filter)
    }

    // ── Topics ────────────────────────────────────────────────────────────────

    pub async fn publish_topic(&self, info: &NodeInfo, source: TopicSource) -> Result<(), Status> {
        let topic = source.topic.clone();
        let followups = self.registry.lock().await.publish_topic(info, source)?;
        tracing::info!(node = %info.name, topic = %topic, "topic published");
        self.schedule(followups);
        Ok(())
    }

    pub async fn unpublish_topic(&self, info: &NodeInfo, topic: &str) -> Result<(), Status> {
        let followups = self.registry.lock().await.unpublish_topic(info, topic)?;
        tracing::info!(node = %info.name, topic = %topic, "topic unpublished");
        self.schedule(followups);
        Ok(())
    }

    pub async fn subscribe_topic(&self, info: &NodeInfo, topic: &str) -> Result<(), Status> {
        let followups = self.registry.lock().await.subscribe_topic(info, topic)?;
        tracing::info!(node = %info.name, topic = %topic, "topic subscribed");
        self.schedule(followups);
        Ok(())
    }

    pub async fn unsubscribe_topic(&self, info: &NodeInfo, topic: &str) -> Result<(), Status> {
        let followups = self.registry.lock().await.unsubscribe_topic(info, topic)?;
        tracing::info!(node = %info.name, topic = %topic, "topic unsubscribed");
        self.schedule(followups);
        Ok(())
    }

    pub async fn list_topics(&self, filter: &TopicFilter) -> Vec<TopicSource> {
        self.registry.lock().await.list_topics(filter)
    }

    // ── Services ──────────────────────────────────────────────────────────────

    pub async fn register_service_server(
        &self,
        info: &NodeInfo,
        source: ServiceSource,
    ) -> Result<(), Status> {
        let service = source.service.clone();
        let followups = self
            .registry
            .lock()
            .await
            .register_service_server(info, source)?;
        tracing::info!(node = %info.name, service = %service, "service server registered");
        self.schedule(followups);
        Ok(())
    }

    pub async fn unregister_service_server(
        &self,
        info: &NodeInfo,
        service: &str,
    ) -> Result<(), Status> {
        let followups = self
            .registry
            .lock()
            .await
            .unregister_service_server(info, service)?;
        tracing::info!(node = %info.name, service = %service, "service server unregistered");
        self.schedule(followups);
        Ok(())
    }

    pub async fn register_service_client(&self, info: &NodeInfo, service: &str) -> Result<(), Status> {
        let followups = self
            .registry
            .lock()
            .await
            .register_service_client(info, service)?;
        tracing::info!(node = %info.name, service = %service, "service client registered");
        self.schedule(followups);
        Ok(())
    }

    pub async fn unregister_service_client(
        &self,
        info: &NodeInfo,
        service: &str,
    ) -> Result<(), Status> {
        let followups = self
            .registry
            .lock()
            .await
            .unregister_service_client(info, service)?;
        tracing::info!(node = %info.name, service = %service, "service client unregistered");
        self.schedule(followups);
        Ok(())
    }

    pub async fn list_services(&self, filter: &ServiceFilter) -> Vec<ServiceSource> {
        self.registry.lock().await.list_services(filter)
    }

    // ── Maintenance ───────────────────────────────────────────────────────────

    /// Registry garbage collection. Not implemented.
    pub async fn gc(&self) -> Result<(), Status> {
        Err(Status::unimplemented("Gc is not implemented."))
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.registry.lock().await.snapshot()
    }

    pub(crate) async fn resolve(&self, task: &MasterTask) -> Vec<Push> {
        self.registry.lock().await.resolve(task)
    }
}
