//! `bridgescout session` — fetch session records.

use anyhow::{bail, Result};
use clap::Args;

use crate::wiring::build_runtime;

#[derive(Args)]
pub struct SessionArgs {
    /// Session id to fetch.
    id: String,
}

pub async fn run(args: SessionArgs) -> Result<()> {
    let runtime = build_runtime().await?;
    match runtime.service.get_session(&args.id).await? {
        Some(session) => {
            println!("{}", serde_json::to_string_pretty(&session)?);
            Ok(())
        }
        None => bail!("session {} not found", args.id),
    }
}
