//! Workspace management REST client.
//!
//! Thin request/response wrappers over the management API: no retry,
//! ordering, or lifetime concerns beyond what the HTTP client provides. The
//! terminal core consumes only `id` and `status` from these records.
//!
//! The API token travels as the `X-Api-Token` header on REST calls and as
//! the `token` query parameter on the socket upgrade URL (the handshake
//! cannot carry custom headers from a browser context).

use reqwest::StatusCode;
use serde::Deserialize;

use wsx_core::workspace::{
    CreateWorkspaceRequest, DeleteWorkspaceResponse, LoginRequest, MessageResponse,
    ResetWorkspaceResponse, UpdatePortsRequest, Workspace,
};
use wsx_core::{WsxError, WsxResult};

use crate::token::TokenStore;

const TOKEN_HEADER: &str = "X-Api-Token";

/// Error body returned by the management API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Client for the workspace management API.
#[derive(Debug, Clone)]
pub struct WorkspaceApi {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl WorkspaceApi {
    /// `base_url` is the server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Socket endpoint for a workspace terminal. The transport appends the
    /// token query parameter at connect time.
    pub fn terminal_url(&self, workspace_id: &str) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}/ws/terminal/{workspace_id}")
    }

    pub async fn list(&self) -> WsxResult<Vec<Workspace>> {
        self.expect_json(self.http.get(self.url("/api/workspaces")))
            .await
    }

    pub async fn get(&self, id: &str) -> WsxResult<Workspace> {
        self.expect_json(self.http.get(self.url(&format!("/api/workspaces/{id}"))))
            .await
    }

    pub async fn create(&self, req: &CreateWorkspaceRequest) -> WsxResult<Workspace> {
        self.expect_json(self.http.post(self.url("/api/workspaces")).json(req))
            .await
    }

    pub async fn delete(&self, id: &str) -> WsxResult<DeleteWorkspaceResponse> {
        self.expect_json(self.http.delete(self.url(&format!("/api/workspaces/{id}"))))
            .await
    }

    pub async fn update_ports(&self, id: &str, req: &UpdatePortsRequest) -> WsxResult<Workspace> {
        self.expect_json(
            self.http
                .put(self.url(&format!("/api/workspaces/{id}/ports")))
                .json(req),
        )
        .await
    }

    pub async fn reset(&self, id: &str) -> WsxResult<ResetWorkspaceResponse> {
        self.expect_json(self.http.post(self.url(&format!("/api/workspaces/{id}/reset"))))
            .await
    }

    /// Verify a token against the server and store it on success.
    pub async fn login(&self, token: &str) -> WsxResult<()> {
        let req = LoginRequest {
            token: token.to_string(),
        };
        let resp = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&req)
            .send()
            .await
            .map_err(|e| WsxError::Api(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        self.tokens.set(Some(token.to_string()));
        Ok(())
    }

    /// Invalidate the server-side session and forget the stored token.
    pub async fn logout(&self) -> WsxResult<MessageResponse> {
        let result: WsxResult<MessageResponse> = self
            .expect_json(self.http.post(self.url("/api/auth/logout")))
            .await;
        self.tokens.set(None);
        result
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn expect_json<T: serde::de::DeserializeOwned>(
        &self,
        rb: reqwest::RequestBuilder,
    ) -> WsxResult<T> {
        let rb = match self.tokens.get() {
            Some(token) => rb.header(TOKEN_HEADER, token),
            None => rb,
        };
        let resp = rb.send().await.map_err(|e| WsxError::Api(e.to_string()))?;

        if resp.status().is_success() {
            resp.json::<T>()
                .await
                .map_err(|e| WsxError::Api(format!("invalid response body: {e}")))
        } else {
            Err(error_from_response(resp).await)
        }
    }
}

async fn error_from_response(resp: reqwest::Response) -> WsxError {
    let status = resp.status();
    let detail = resp
        .json::<ApiErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("server returned {status}"));

    match status {
        StatusCode::UNAUTHORIZED => WsxError::Auth(detail),
        StatusCode::NOT_FOUND => WsxError::WorkspaceNotFound(detail),
        _ => WsxError::Api(detail),
    }
}
