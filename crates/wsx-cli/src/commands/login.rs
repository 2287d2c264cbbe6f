//! `wsx login` / `wsx logout` — API token management.

use anyhow::{Context, Result};
use dialoguer::Password;
use tracing::info;

use wsx_client::WorkspaceApi;

use crate::config::Config;

/// Prompt for a token, verify it against the server, and persist it.
pub async fn run(api: &WorkspaceApi, config_path: &str) -> Result<()> {
    let token = Password::new()
        .with_prompt("API token")
        .interact()
        .context("failed to read token")?;

    api.login(&token)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("login failed")?;

    let mut cfg = Config::load(config_path)?;
    cfg.server.token = token;
    cfg.save(config_path)?;

    info!("token stored");
    println!("Logged in.");
    Ok(())
}

/// End the server session and forget the stored token.
pub async fn run_logout(api: &WorkspaceApi, config_path: &str) -> Result<()> {
    // Best effort: the local token is cleared even if the server call fails.
    if let Err(e) = api.logout().await {
        tracing::warn!("logout request failed: {e}");
    }

    let mut cfg = Config::load(config_path)?;
    cfg.server.token = String::new();
    cfg.save(config_path)?;

    println!("Logged out.");
    Ok(())
}
