//! `wsx list` — list workspaces.

use anyhow::Result;

use wsx_client::WorkspaceApi;
use wsx_core::WorkspaceStatus;

pub async fn run(api: &WorkspaceApi) -> Result<()> {
    let workspaces = api.list().await.map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("{:<14} {:<20} {:<10} {}", "ID", "NAME", "STATUS", "IMAGE");
    println!("{:<14} {:<20} {:<10} {}", "──", "────", "──────", "─────");
    for ws in &workspaces {
        println!(
            "{:<14} {:<20} {:<10} {}",
            ws.id,
            ws.name,
            status_label(ws.status),
            ws.config.image
        );
        if let Some(err) = &ws.error {
            println!("{:<14} {}", "", err);
        }
    }
    if workspaces.is_empty() {
        println!("(no workspaces)");
    }

    Ok(())
}

pub fn status_label(status: WorkspaceStatus) -> &'static str {
    match status {
        WorkspaceStatus::Creating => "creating",
        WorkspaceStatus::Running => "running",
        WorkspaceStatus::Error => "error",
        WorkspaceStatus::Failed => "failed",
    }
}
