use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use dhakaclean_core::ClientLocation;
use dhakaclean_schema::{ChatMessage, GeolocationSample};
use serde::Deserialize;

use super::detached;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendBody {
    pub text: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl SendBody {
    fn position(&self) -> Option<GeolocationSample> {
        Some(GeolocationSample {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(history).post(send))
}

pub async fn history(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.chat.history())
}

/// Browser coordinates win; without them the session's own locator is used.
/// The exchange finishes even if the client disconnects mid-reply.
pub async fn send(
    State(state): State<AppState>,
    Json(body): Json<SendBody>,
) -> Result<Json<ChatMessage>, ApiError> {
    let chat = Arc::clone(&state.chat);
    let position = body.position();
    let reply = detached(async move {
        let reply = match position {
            Some(position) => {
                chat.send_with_location(&body.text, &ClientLocation(Some(position)))
                    .await
            }
            None => chat.send(&body.text).await,
        };
        reply.map_err(ApiError::from)
    })
    .await?;
    Ok(Json(reply))
}
