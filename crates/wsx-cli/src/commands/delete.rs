//! `wsx delete` — delete a workspace.

use anyhow::{Context, Result};
use dialoguer::Confirm;

use wsx_client::WorkspaceApi;

pub async fn run(api: &WorkspaceApi, id: &str, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete workspace '{id}'? The container and its data are removed."
            ))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let resp = api.delete(id).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{} ({})", resp.message, resp.id);

    Ok(())
}
