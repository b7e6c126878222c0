use axum::{extract::State, routing::get, Json, Router};
use dhakaclean_schema::AppView;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewBody {
    pub view: AppView,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(current_view).put(select_view))
}

pub async fn current_view(State(state): State<AppState>) -> Json<ViewBody> {
    let view = state.views.lock().await.current();
    Json(ViewBody { view })
}

pub async fn select_view(
    State(state): State<AppState>,
    Json(body): Json<ViewBody>,
) -> Json<ViewBody> {
    let view = state.views.lock().await.select(body.view);
    Json(ViewBody { view })
}
