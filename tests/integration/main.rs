//! Rendezvous integration test harness.
//!
//! Every test runs a master, its notifier, and one or more nodes inside the
//! test process, talking over loopback sockets only.

use std::time::Duration;

use tokio::sync::broadcast;

use rendezvous_channel::RendezvousWatcher;
use rendezvous_core::wire::DEFAULT_MAX_MESSAGE_BYTES;
use rendezvous_core::{Endpoint, Message};
use rendezvous_master::{Master, Notifier, NotifierConfig};

mod heart_beat;
mod pubsub;
mod rendezvous;
mod transport;

// ── Harness ───────────────────────────────────────────────────────────────────

/// How long a test waits for a push before failing.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// A master with a running notifier. Dropping it stops the notifier.
pub struct TestMaster {
    pub master: Master,
    shutdown: broadcast::Sender<()>,
}

impl TestMaster {
    pub fn start() -> Self {
        Self::with_config(NotifierConfig::default())
    }

    pub fn with_config(config: NotifierConfig) -> Self {
        let (master, tasks) = Master::new();
        let (shutdown, _) = broadcast::channel(1);
        tokio::spawn(Notifier::new(master.clone(), tasks, config, shutdown.subscribe()).run());
        Self { master, shutdown }
    }
}

impl Drop for TestMaster {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

pub fn loopback(port: u16) -> Endpoint {
    Endpoint::new("127.0.0.1", port)
}

/// A node-side inbox for rendezvous pushes on an ephemeral loopback port.
pub async fn inbox() -> RendezvousWatcher {
    RendezvousWatcher::listen(&loopback(0), DEFAULT_MAX_MESSAGE_BYTES)
        .await
        .expect("inbox listen")
}

pub async fn next_push(inbox: &mut RendezvousWatcher) -> Message {
    tokio::time::timeout(PUSH_TIMEOUT, inbox.recv())
        .await
        .expect("no push within timeout")
        .expect("inbox closed")
}

/// Assert nothing arrives for a short while.
pub async fn assert_no_push(inbox: &mut RendezvousWatcher) {
    let got = tokio::time::timeout(Duration::from_millis(300), inbox.recv()).await;
    assert!(got.is_err(), "unexpected push: {:?}", got);
}
