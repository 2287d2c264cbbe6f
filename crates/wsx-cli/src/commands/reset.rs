//! `wsx reset` — recreate a workspace's container from its config.

use anyhow::{Context, Result};
use dialoguer::Confirm;

use wsx_client::WorkspaceApi;

use super::list::status_label;

pub async fn run(api: &WorkspaceApi, id: &str, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Reset workspace '{id}'? Unsaved container state is lost."
            ))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let resp = api.reset(id).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    println!(
        "{} — status: {}",
        resp.message,
        status_label(resp.workspace.status)
    );

    Ok(())
}
