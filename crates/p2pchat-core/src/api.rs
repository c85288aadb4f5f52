//! Local control plane of a node
//!
//! | Route | Success |
//! |-------|---------|
//! | `POST /send` `{to_username, content}` | `200 {"status":"sent","id"}` |
//! | `GET /inbox?after=<id>` | `200 [ChatMessage, ...]` |
//! | `GET /me` | `200 {username, peer_id, addrs}` |
//!
//! Errors are reported as `{"error": "..."}` with the status of the
//! underlying [`ChatError`].

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chat::ChatMessage;
use crate::engine::ChatNode;
use crate::error::ChatError;
use crate::types::NodeInfo;

/// Body of `POST /send`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub to_username: String,
    #[serde(default)]
    pub content: String,
}

/// Body of a successful `POST /send`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub status: String,
    pub id: String,
}

/// Query of `GET /inbox`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub after: String,
}

/// Build the control-plane router for `node`.
pub fn router(node: Arc<ChatNode>) -> Router {
    Router::new()
        .route("/send", post(send))
        .route("/inbox", get(inbox))
        .route("/me", get(me))
        .with_state(node)
}

async fn send(
    State(node): State<Arc<ChatNode>>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, ChatError> {
    let Json(body) = body.map_err(|e| ChatError::Validation(e.body_text()))?;

    let id = node
        .send_message(&body.to_username, &body.content)
        .await
        .inspect_err(|e| warn!(to = %body.to_username, error = %e, "Send failed"))?;

    Ok(Json(SendResponse {
        status: "sent".to_string(),
        id,
    }))
}

async fn inbox(
    State(node): State<Arc<ChatNode>>,
    query: Result<Query<InboxQuery>, QueryRejection>,
) -> Result<Json<Vec<ChatMessage>>, ChatError> {
    let Query(query) = query.map_err(|e| ChatError::Validation(e.body_text()))?;
    Ok(Json(node.inbox().drain(&query.after)))
}

async fn me(State(node): State<Arc<ChatNode>>) -> Json<NodeInfo> {
    Json(node.info().clone())
}
