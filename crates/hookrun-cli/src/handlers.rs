//! Command handlers.

use crate::app::Components;
use crate::config::{AppConfig, BrokerKind};
use anyhow::{Context, bail};
use hookrun_api::AppState;
use hookrun_db::Database;
use hookrun_scheduler::{Coordinator, TriggerService};
use hookrun_worker::ExecutionWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Run the HTTP API, optionally with an in-process worker.
pub async fn serve(config: &AppConfig, with_worker: bool) -> anyhow::Result<()> {
    let components = Components::build(config).await?;
    let shutdown = shutdown_signal();

    let coordinator = Arc::new(Coordinator::new(
        components.triggers.clone(),
        components.executions.clone(),
        components.broker.clone(),
    ));
    let triggers = Arc::new(TriggerService::new(
        components.triggers.clone(),
        components.executions.clone(),
        components.secrets.clone(),
        &config.api.public_base_url,
    ));

    if config.api.api_key.is_none() {
        warn!("No api.api_key configured, trigger administration is disabled");
    }

    match coordinator
        .redispatch_queued(config.api.redispatch_batch, Duration::ZERO)
        .await
    {
        Ok(count) => info!(count, "Startup redispatch sweep finished"),
        Err(e) => warn!(error = %e, "Startup redispatch sweep failed"),
    }

    let reconciliation = (config.api.redispatch_interval_secs > 0).then(|| {
        tokio::spawn(coordinator.clone().run_reconciliation(
            Duration::from_secs(config.api.redispatch_interval_secs),
            config.api.redispatch_batch,
            shutdown.clone(),
        ))
    });

    let worker = with_worker.then(|| {
        let worker = Arc::new(ExecutionWorker::from_config(
            &config.worker,
            components.executions.clone(),
            components.secrets.clone(),
        ));
        tokio::spawn(worker.run(components.broker.clone(), shutdown.clone()))
    });

    let state = Arc::new(
        AppState::new(triggers, coordinator, config.api.api_key.clone())
            .with_broker_health(components.broker_health.clone()),
    );
    let listener = TcpListener::bind(&config.api.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.api.bind))?;

    hookrun_api::serve(listener, state, shutdown.clone()).await?;

    if let Some(handle) = worker {
        info!("Waiting for the in-flight execution to finish");
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Worker stopped with an error"),
            Err(e) => error!(error = %e, "Worker task panicked"),
        }
    }
    if let Some(handle) = reconciliation {
        let _ = handle.await;
    }

    components.close().await;
    info!("Server stopped");
    Ok(())
}

/// Consume dispatch messages until interrupted.
pub async fn worker(config: &AppConfig) -> anyhow::Result<()> {
    if config.broker.kind == BrokerKind::Memory {
        warn!("The memory broker only delivers messages published by this process; use `serve --with-worker` instead");
    }

    let components = Components::build(config).await?;
    let shutdown = shutdown_signal();

    let worker = Arc::new(ExecutionWorker::from_config(
        &config.worker,
        components.executions.clone(),
        components.secrets.clone(),
    ));
    let result = worker.run(components.broker.clone(), shutdown).await;

    components.close().await;
    result.context("worker failed")
}

/// Apply database migrations.
pub async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let Some(url) = &config.database.url else {
        bail!("database.url is required to run migrations");
    };

    let database = Database::connect(url, 1)
        .await
        .context("failed to connect to PostgreSQL")?;
    database.migrate().await?;
    Ok(())
}

/// A receiver that flips to `true` on Ctrl-C or SIGTERM.
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }

        info!("Shutdown signal received");
        let _ = tx.send(true);
    });

    rx
}
