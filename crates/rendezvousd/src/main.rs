//! rendezvousd: the rendezvous master daemon.

use std::time::Duration;

use anyhow::{Context, Result};

use rendezvous_api::ApiState;
use rendezvous_core::config::RendezvousConfig;
use rendezvous_master::{Master, Notifier, NotifierConfig};

mod snapshot;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    match RendezvousConfig::write_default_if_missing() {
        Ok(path) => tracing::debug!(path = %path.display(), "config file"),
        Err(e) => tracing::warn!(error = %e, "failed to write default config"),
    }
    let config = RendezvousConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        RendezvousConfig::default()
    });
    tracing::info!(
        bind_ip = %config.master.bind_ip,
        api_port = config.master.api_port,
        heart_beat_secs = config.master.heart_beat_secs,
        "rendezvousd starting"
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let (master, tasks) = Master::new();

    let notifier_task = tokio::spawn(
        Notifier::new(
            master.clone(),
            tasks,
            NotifierConfig::from(&config),
            shutdown_tx.subscribe(),
        )
        .run(),
    );

    let api_task = {
        let state = ApiState {
            master: master.clone(),
            shutdown_tx: shutdown_tx.clone(),
        };
        let bind_ip = config.master.bind_ip.clone();
        let port = config.master.api_port;
        tokio::spawn(async move {
            rendezvous_api::serve(state, &bind_ip, port)
                .await
                .with_context(|| format!("API server on {bind_ip}:{port}"))
        })
    };

    let snapshot_task = {
        let master = master.clone();
        let shutdown = shutdown_tx.subscribe();
        let period = config.master.snapshot_secs;
        tokio::spawn(async move {
            if period == 0 {
                return std::future::pending::<()>().await;
            }
            snapshot::snapshot_loop(master, Duration::from_secs(period), shutdown).await
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        biased;
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = notifier_task      => tracing::error!("notifier exited: {:?}", r),
        r = api_task           => match r {
            Ok(Err(e)) => return Err(e),
            r => tracing::error!("API server exited: {:?}", r),
        },
        r = snapshot_task      => tracing::error!("snapshot logger exited: {:?}", r),
    }

    Ok(())
}
