use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dhakaclean_core::{CaptureError, ChatError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage => ApiError::BadRequest(err.to_string()),
            ChatError::Busy => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<CaptureError> for ApiError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::InvalidAction { .. } => ApiError::Conflict(err.to_string()),
            CaptureError::UnsupportedMedia(_) | CaptureError::EmptyUpload => {
                ApiError::BadRequest(err.to_string())
            }
            CaptureError::Frame(_) => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use dhakaclean_core::CaptureStage;

    #[tokio::test]
    async fn busy_chat_is_409_with_message() {
        let response = ApiError::from(ChatError::Busy).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "a reply is still pending");
    }

    #[test]
    fn capture_errors_map_to_statuses() {
        let invalid = CaptureError::InvalidAction {
            action: "capture",
            stage: CaptureStage::Idle,
        };
        assert_eq!(
            ApiError::from(invalid).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CaptureError::EmptyUpload).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CaptureError::Frame("dark".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
