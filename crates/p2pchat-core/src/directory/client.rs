//! HTTP client for the directory, used by nodes

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use super::{LookupResponse, RegisterRequest};
use crate::error::{ChatError, ChatResult, ErrorBody};

/// Client for a directory at `base_url`.
///
/// Every request is bounded by the client timeout; nothing is retried.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl DirectoryClient {
    /// Create a client with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ChatResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Directory(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register (or re-register) `username` with its peer id and addresses.
    pub async fn register(&self, username: &str, peer_id: &str, addrs: &[String]) -> ChatResult<()> {
        let body = RegisterRequest {
            username: username.to_string(),
            peer_id: peer_id.to_string(),
            addrs: addrs.to_vec(),
        };

        let resp = self
            .client
            .post(format!("{}/register", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        match resp.status() {
            StatusCode::OK => {
                debug!(username, peer_id, addrs = addrs.len(), "Registered with directory");
                Ok(())
            }
            StatusCode::BAD_REQUEST => Err(ChatError::Validation(error_text(resp).await)),
            status => Err(ChatError::Directory(format!(
                "register returned {}: {}",
                status,
                error_text(resp).await
            ))),
        }
    }

    /// Look up the peer id and addresses registered for `username`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotFound` if the directory has no record.
    pub async fn lookup(&self, username: &str) -> ChatResult<(String, Vec<String>)> {
        let resp = self
            .client
            .get(format!("{}/lookup", self.base_url))
            .query(&[("username", username)])
            .send()
            .await
            .map_err(request_error)?;

        match resp.status() {
            StatusCode::OK => {
                let body: LookupResponse = resp
                    .json()
                    .await
                    .map_err(|e| ChatError::Directory(format!("Bad lookup response: {}", e)))?;
                debug!(username, peer_id = %body.peer_id, "Directory lookup hit");
                Ok((body.peer_id, body.addrs))
            }
            StatusCode::NOT_FOUND => Err(ChatError::NotFound(username.to_string())),
            StatusCode::BAD_REQUEST => Err(ChatError::Validation(error_text(resp).await)),
            status => Err(ChatError::Directory(format!(
                "lookup returned {}: {}",
                status,
                error_text(resp).await
            ))),
        }
    }
}

fn request_error(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout(format!("directory request: {}", e))
    } else {
        ChatError::Directory(format!("directory unreachable: {}", e))
    }
}

async fn error_text(resp: reqwest::Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text)
}
