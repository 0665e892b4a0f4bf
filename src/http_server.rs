use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::IngestError;
use crate::event::WebhookEvent;
use crate::store::ObjectStore;
use crate::verification;

/// Per-process state injected into the handler. Holds the write-only store
/// handle and the slice of configuration the ingestion path needs. Nothing
/// here is mutated across requests.
pub struct AppState {
    store: Arc<dyn ObjectStore>,
    namespace: String,
    max_body_bytes: usize,
    store_timeout: Duration,
    webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            namespace: config.namespace.clone(),
            max_body_bytes: config.max_body_bytes,
            store_timeout: config.store_timeout,
            webhook_secret: config.webhook_secret.clone(),
        }
    }
}

/// The full HTTP surface: one route. Everything else falls through to the
/// router's default 404/405.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route("/webhook", post(handle_webhook))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Bind the listener and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(%local, "webhook receiver listening");
    axum::serve(listener, router(state)).await
}

#[derive(Serialize)]
struct StoredResponse {
    message: &'static str,
    key: String,
}

/// One delivery in, at most one durable write out.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StoredResponse>, IngestError> {
    if let Some(secret) = &state.webhook_secret {
        let signature = header_str(&headers, "x-webhook-signature");
        if !verification::verify_signature(secret, &body, signature) {
            tracing::warn!("rejected delivery with missing or invalid signature");
            return Err(IngestError::InvalidSignature);
        }
    }

    let source = source_identifier(&headers);
    let event = WebhookEvent::ingest(&state.namespace, source, &body, state.max_body_bytes)?;

    let put = state.store.put(event.key.as_str(), event.body.clone());
    match tokio::time::timeout(state.store_timeout, put).await {
        Ok(Ok(())) => {
            tracing::info!(
                key = %event.key,
                bytes = event.body.len(),
                source = event.source.as_deref().unwrap_or("-"),
                "stored webhook delivery"
            );
            Ok(Json(StoredResponse {
                message: "stored",
                key: event.key.to_string(),
            }))
        }
        Ok(Err(err)) => {
            tracing::error!(key = %event.key, error = %err, "store write failed");
            Err(err.into())
        }
        Err(_) => {
            tracing::error!(key = %event.key, "store write exceeded its time budget");
            Err(IngestError::StoreTimeout)
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Sender identity for the log line. Backlog puts the originating space in
/// `x-backlog-host`; fall back to the user agent.
fn source_identifier(headers: &HeaderMap) -> Option<String> {
    for name in ["x-backlog-host", "user-agent"] {
        let value = header_str(headers, name);
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}
