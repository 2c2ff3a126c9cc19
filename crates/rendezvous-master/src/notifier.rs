//! Executes queued master tasks.
//!
//! Targets are resolved against the registry when a task is dequeued, then
//! each delivery runs as its own task: connect to the node's inbound
//! endpoint, send one message, close. Failures are logged and dropped.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;

use rendezvous_channel::{MessageChannel, TcpClientChannel};
use rendezvous_core::config::RendezvousConfig;
use rendezvous_core::Status;

use crate::heart_beat;
use crate::master::Master;
use crate::task::{MasterTask, Push};

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub heart_beat_interval: Duration,
    pub heart_beat_trials: u32,
    pub max_message_bytes: usize,
}

impl From<&RendezvousConfig> for NotifierConfig {
    fn from(config: &RendezvousConfig) -> Self {
        Self {
            heart_beat_interval: Duration::from_secs(config.master.heart_beat_secs),
            heart_beat_trials: config.master.heart_beat_trials,
            max_message_bytes: config.channel.max_message_bytes,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self::from(&RendezvousConfig::default())
    }
}

pub struct Notifier {
    master: Master,
    tasks: mpsc::UnboundedReceiver<MasterTask>,
    config: NotifierConfig,
    running: JoinSet<()>,
    shutdown: broadcast::Receiver<()>,
}

impl Notifier {
    pub fn new(
        master: Master,
        tasks: mpsc::UnboundedReceiver<MasterTask>,
        config: NotifierConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            master,
            tasks,
            config,
            running: JoinSet::new(),
            shutdown,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!(in_flight = self.running.len(), "notifier shutting down");
                    self.running.abort_all();
                    return;
                }

                task = self.tasks.recv() => match task {
                    Some(task) => self.dispatch(task).await,
                    None => {
                        tracing::info!("task queue closed, notifier stopping");
                        return;
                    }
                },

                Some(joined) = self.running.join_next(), if !self.running.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "notifier task panicked");
                        }
                    }
                }
            }
        }
    }

    async fn dispatch(&mut self, task: MasterTask) {
        if let MasterTask::WatchHeartBeat {
            client_id,
            endpoint,
        } = task
        {
            tracing::debug!(client = client_id, endpoint = %endpoint, "watching heart beat");
            self.running.spawn(heart_beat::watch(
                self.master.clone(),
                client_id,
                endpoint,
                self.config.clone(),
            ));
            return;
        }

        let pushes = self.master.resolve(&task).await;
        if pushes.is_empty() {
            tracing::trace!(task = ?task, "nothing to notify");
        }
        for push in pushes {
            self.running
                .spawn(deliver(push, self.config.max_message_bytes));
        }
    }
}

async fn deliver(push: Push, max_message_bytes: usize) {
    let result: Result<(), Status> = async {
        let channel = TcpClientChannel::connect(&push.endpoint).await?;
        let mut channel = MessageChannel::new(channel.into(), max_message_bytes);
        channel.send(&push.message).await
    }
    .await;

    match result {
        Ok(()) => tracing::debug!(
            node = %push.node,
            endpoint = %push.endpoint,
            kind = push.message.kind(),
            "pushed"
        ),
        Err(e) => tracing::warn!(
            node = %push.node,
            endpoint = %push.endpoint,
            kind = push.message.kind(),
            error = %e,
            "push failed"
        ),
    }
}
