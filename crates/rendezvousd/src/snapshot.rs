//! Periodic one-line summary of the registry.

use std::time::Duration;

use tokio::sync::broadcast;

use rendezvous_master::{Master, RegistrySnapshot};

pub async fn snapshot_loop(master: Master, period: Duration, mut shutdown: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(period);
    let mut last = RegistrySnapshot::default();

    loop {
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = interval.tick() => {
                let snapshot = master.snapshot().await;
                if snapshot == last {
                    continue;
                }
                tracing::info!(
                    clients = snapshot.clients,
                    nodes = snapshot.nodes,
                    watchers = snapshot.watchers,
                    topics = snapshot.topics,
                    subscriptions = snapshot.subscriptions,
                    services = snapshot.services,
                    "registry"
                );
                last = snapshot;
            }
        }
    }
}
