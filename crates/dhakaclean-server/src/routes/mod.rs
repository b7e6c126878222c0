pub mod chat;
pub mod dashboard;
pub mod scanner;
pub mod view;

use std::future::Future;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/view", view::router())
        .nest("/dashboard", dashboard::router())
        .nest("/scanner", scanner::router())
        .nest("/chat", chat::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Run a state-changing action to completion even if the client goes away.
pub(crate) async fn detached<T, F>(action: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    tokio::spawn(action)
        .await
        .map_err(|e| ApiError::Internal(format!("action task failed: {e}")))?
}
