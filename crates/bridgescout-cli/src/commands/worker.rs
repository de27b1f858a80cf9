//! `bridgescout worker` — worker pool with a minimal health endpoint.

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use clap::Args;
use std::sync::Arc;
use tracing::info;

use bridgescout::queue::JobQueue;

use crate::wiring::build_runtime;

#[derive(Args)]
pub struct WorkerArgs {
    /// Health endpoint bind address; overrides BIND_ADDR.
    #[arg(long)]
    bind: Option<String>,
}

pub async fn run(args: WorkerArgs) -> Result<()> {
    let runtime = build_runtime().await?;
    let bind_addr = args.bind.unwrap_or_else(|| runtime.config.bind_addr.clone());

    let worker = runtime.worker();
    let handle = worker.handle();
    let worker_task = tokio::spawn(async move { worker.run().await });

    let queue = Arc::clone(&runtime.queue);
    let health_handle = handle.clone();
    let router = Router::new().route(
        "/health",
        get(move || {
            let queue = Arc::clone(&queue);
            let handle = health_handle.clone();
            async move {
                let depth = queue.depth().await.unwrap_or(0);
                Json(serde_json::json!({
                    "status": if handle.is_shutdown() { "draining" } else { "ok" },
                    "queueDepth": depth,
                }))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind {bind_addr}"))?;
    info!(%bind_addr, "worker health endpoint up");

    let shutdown_handle = handle.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            super::serve::shutdown_signal().await;
            info!("shutdown signal received, draining");
            shutdown_handle.shutdown();
        })
        .await
        .context("health server error")?;

    worker_task.await??;
    Ok(())
}
