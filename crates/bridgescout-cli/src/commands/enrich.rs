//! `bridgescout enrich` — enqueue a run, optionally waiting for it.

use anyhow::{bail, Result};
use clap::Args;
use std::time::Duration;

use bridgescout::api::EnrichOptions;
use bridgescout::model::RoleType;

use crate::wiring::build_runtime;

#[derive(Args)]
pub struct EnrichArgs {
    /// Tenant id.
    #[arg(long)]
    tenant: String,

    /// Candidate id.
    #[arg(long)]
    candidate: String,

    /// Role type (engineer, data_scientist, researcher, founder, designer,
    /// general).
    #[arg(long)]
    role: Option<String>,

    /// Run an inline worker and wait for the session to finish.
    #[arg(long)]
    wait: bool,
}

pub async fn run(args: EnrichArgs) -> Result<()> {
    let runtime = build_runtime().await?;

    let role_type = match args.role.as_deref() {
        None => None,
        Some(raw) => Some(
            serde_json::from_value::<RoleType>(serde_json::Value::String(raw.to_string()))
                .map_err(|_| anyhow::anyhow!("unknown role type: {raw}"))?,
        ),
    };

    let receipt = runtime
        .service
        .enrich(
            &args.tenant,
            &args.candidate,
            EnrichOptions {
                role_type,
                budget: None,
                priority: None,
            },
        )
        .await?;
    println!("session: {}", receipt.session_id);

    if !args.wait {
        return Ok(());
    }

    // Inline worker: drain until our session reaches a terminal state.
    let worker = runtime.worker();
    let handle = worker.handle();
    let worker_task = tokio::spawn(async move { worker.run().await });

    let session = loop {
        tokio::time::sleep(Duration::from_millis(250)).await;
        match runtime.service.get_session(&receipt.session_id).await? {
            Some(session) if session.is_terminal() => break session,
            Some(_) | None => continue,
        }
    };
    handle.shutdown();
    worker_task.await??;

    println!("{}", serde_json::to_string_pretty(&session)?);
    if session.status == bridgescout::model::SessionStatus::Failed {
        bail!(
            "enrichment failed: {}",
            session.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
