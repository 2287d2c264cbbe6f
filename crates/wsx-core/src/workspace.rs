//! Workspace records exchanged with the management API.
//!
//! These are plain request/response shapes; the terminal core consumes only
//! `id` and `status` to decide whether a connection is permitted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of a workspace container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceStatus {
    Creating,
    Running,
    Error,
    Failed,
}

/// A provisioning script run inside the container, in `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub content: String,
    pub order: u32,
}

/// Image and provisioning configuration for a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub image: String,
    #[serde(default)]
    pub scripts: Vec<Script>,
}

/// One containerized development workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub status: WorkspaceStatus,
    pub created_at: String,
    pub config: WorkspaceConfig,
    /// Exposed port → human label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Workspace {
    /// Whether a terminal connection to this workspace is permitted.
    pub fn terminal_ready(&self) -> bool {
        self.status == WorkspaceStatus::Running
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Vec<Script>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePortsRequest {
    pub ports: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteWorkspaceResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetWorkspaceResponse {
    pub message: String,
    pub workspace: Workspace,
}
