//! `bridgescout serve` — HTTP API plus the worker pool in one process.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tracing::info;

use bridgescout_server::{build_router, AppState, InboundLimiter};

use crate::wiring::build_runtime;

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address; overrides BIND_ADDR.
    #[arg(long)]
    bind: Option<String>,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let runtime = build_runtime().await?;
    let bind_addr = args.bind.unwrap_or_else(|| runtime.config.bind_addr.clone());

    let worker = runtime.worker();
    let handle = worker.handle();
    let worker_task = tokio::spawn(async move { worker.run().await });

    let state = AppState {
        service: Arc::clone(&runtime.service),
        store: Arc::clone(&runtime.store),
        queue: Arc::clone(&runtime.queue),
        progress: runtime.progress.clone(),
        limiter: Arc::new(InboundLimiter::default()),
    };
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind {bind_addr}"))?;
    info!(%bind_addr, "serving API");

    let shutdown_handle = handle.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received, draining");
            shutdown_handle.shutdown();
        })
        .await
        .context("server error")?;

    // The worker drains in-flight jobs before the process exits.
    worker_task.await??;
    Ok(())
}

/// Wait for ctrl-c or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            signal.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
