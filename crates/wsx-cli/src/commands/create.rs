//! `wsx create` — create a workspace.

use anyhow::Result;
use tracing::info;

use wsx_client::WorkspaceApi;
use wsx_core::workspace::CreateWorkspaceRequest;

use super::list::status_label;

pub async fn run(api: &WorkspaceApi, name: &str, image: Option<&str>) -> Result<()> {
    let req = CreateWorkspaceRequest {
        name: name.to_string(),
        image: image.map(String::from),
        scripts: None,
        ports: None,
    };

    let ws = api.create(&req).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    info!(workspace_id = %ws.id, "workspace created");
    println!(
        "Created workspace {} ({}) — status: {}",
        ws.id,
        ws.name,
        status_label(ws.status)
    );
    println!("Run `wsx terminal {}` once it is running.", ws.id);

    Ok(())
}
