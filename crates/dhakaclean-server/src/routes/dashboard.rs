use axum::{routing::get, Json, Router};
use dhakaclean_core::dashboard::sample_snapshot;
use dhakaclean_schema::DashboardSnapshot;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(snapshot))
}

pub async fn snapshot() -> Json<DashboardSnapshot> {
    Json(sample_snapshot())
}
