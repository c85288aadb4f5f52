//! HTTP surface of the directory
//!
//! | Route | Success | Failure |
//! |-------|---------|---------|
//! | `POST /register` | `200 {"ok":true}` | `400` malformed body or empty field |
//! | `GET /lookup?username=` | `200 {"peer_id","addrs"}` | `400` no username, `404` unknown |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{debug, info};

use super::registry::Registry;
use super::{LookupQuery, LookupResponse, RegisterRequest, RegisterResponse};
use crate::error::{ChatError, ChatResult};

/// Build the directory router over a shared registry.
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/lookup", get(lookup))
        .with_state(registry)
}

/// Serve the directory on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, registry: Arc<Registry>) -> ChatResult<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Directory listening");
    axum::serve(listener, router(registry)).await?;
    Ok(())
}

async fn register(
    State(registry): State<Arc<Registry>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ChatError> {
    let Json(body) = body.map_err(|e| ChatError::Validation(e.body_text()))?;

    let record = registry.register(&body.username, &body.peer_id, body.addrs)?;
    info!(
        username = %record.username,
        peer_id = %record.peer_id,
        addrs = record.addrs.len(),
        total = registry.len(),
        "Peer registered"
    );

    Ok(Json(RegisterResponse { ok: true }))
}

async fn lookup(
    State(registry): State<Arc<Registry>>,
    query: Result<Query<LookupQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<LookupResponse>, ChatError> {
    let Query(query) = query.map_err(|e| ChatError::Validation(e.body_text()))?;
    let username = query
        .username
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ChatError::Validation("username required".to_string()))?;

    let (peer_id, addrs) = registry.lookup(&username)?;
    debug!(%username, %peer_id, "Lookup hit");

    Ok(Json(LookupResponse { peer_id, addrs }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorBody;

    async fn spawn_directory() -> (String, Arc<Registry>) {
        let registry = Arc::new(Registry::new());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(serve(listener, registry.clone()));
        (url, registry)
    }

    #[tokio::test]
    async fn test_register_and_lookup_over_http() {
        let (url, registry) = spawn_directory().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{url}/register"))
            .json(&serde_json::json!({
                "username": "alice",
                "peer_id": "peer-a",
                "addrs": ["addr1"],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"ok": true}));
        assert_eq!(registry.len(), 1);

        let resp = client
            .get(format!("{url}/lookup"))
            .query(&[("username", "alice")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: LookupResponse = resp.json().await.unwrap();
        assert_eq!(body.peer_id, "peer-a");
        assert_eq!(body.addrs, vec!["addr1".to_string()]);
    }

    #[tokio::test]
    async fn test_register_missing_fields_is_400() {
        let (url, registry) = spawn_directory().await;
        let client = reqwest::Client::new();

        for body in [
            serde_json::json!({"peer_id": "peer-a"}),
            serde_json::json!({"username": "alice"}),
            serde_json::json!({"username": "", "peer_id": "peer-a"}),
        ] {
            let resp = client
                .post(format!("{url}/register"))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 400, "body: {body}");
            let err: ErrorBody = resp.json().await.unwrap();
            assert!(!err.error.is_empty());
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_register_malformed_json_is_400() {
        let (url, _registry) = spawn_directory().await;
        let resp = reqwest::Client::new()
            .post(format!("{url}/register"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_register_without_addrs_defaults_empty() {
        let (url, registry) = spawn_directory().await;
        let resp = reqwest::Client::new()
            .post(format!("{url}/register"))
            .json(&serde_json::json!({"username": "alice", "peer_id": "peer-a"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(registry.lookup("alice").unwrap().1.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_status_codes() {
        let (url, _registry) = spawn_directory().await;
        let client = reqwest::Client::new();

        let missing = client.get(format!("{url}/lookup")).send().await.unwrap();
        assert_eq!(missing.status(), 400);

        let empty = client
            .get(format!("{url}/lookup?username="))
            .send()
            .await
            .unwrap();
        assert_eq!(empty.status(), 400);

        let unknown = client
            .get(format!("{url}/lookup?username=carol"))
            .send()
            .await
            .unwrap();
        assert_eq!(unknown.status(), 404);
    }
}
