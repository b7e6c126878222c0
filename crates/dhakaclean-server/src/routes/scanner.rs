use std::sync::Arc;

use axum::{extract::State, routing::get, routing::post, Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dhakaclean_core::{CapturePipeline, CaptureStage};
use dhakaclean_schema::WasteAnalysisResult;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;

use super::detached;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScannerStatus {
    pub stage: CaptureStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WasteAnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_error: Option<String>,
}

impl ScannerStatus {
    fn of(pipeline: &CapturePipeline) -> Self {
        Self {
            stage: pipeline.stage(),
            result: pipeline.result().cloned(),
            image_data_url: pipeline.image().map(|image| image.data_url()),
            camera_error: pipeline.camera_error().map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadBody {
    pub file_name: String,
    pub data_base64: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(status))
        .route("/upload", post(upload))
        .route("/camera", post(start_camera))
        .route("/capture", post(capture))
        .route("/another", post(scan_another))
        .route("/reset", post(reset))
}

/// The guard is owned so the action can outlive the request future.
fn claim(state: &AppState) -> Result<OwnedMutexGuard<CapturePipeline>, ApiError> {
    Arc::clone(&state.scanner)
        .try_lock_owned()
        .map_err(|_| ApiError::Conflict("scanner busy".into()))
}

/// Waits for any in-flight capture action before reporting.
pub async fn status(State(state): State<AppState>) -> Json<ScannerStatus> {
    let pipeline = state.scanner.lock().await;
    Json(ScannerStatus::of(&pipeline))
}

pub async fn upload(
    State(state): State<AppState>,
    Json(body): Json<UploadBody>,
) -> Result<Json<WasteAnalysisResult>, ApiError> {
    let bytes = BASE64
        .decode(body.data_base64.trim())
        .map_err(|e| ApiError::BadRequest(format!("invalid base64: {e}")))?;
    let mut pipeline = claim(&state)?;
    let result = detached(async move {
        pipeline
            .upload(&bytes, &body.file_name)
            .await
            .map_err(ApiError::from)
    })
    .await?;
    Ok(Json(result))
}

pub async fn start_camera(State(state): State<AppState>) -> Result<Json<ScannerStatus>, ApiError> {
    let mut pipeline = claim(&state)?;
    let status = detached(async move {
        let started = pipeline.start_camera().await;
        started
            .map(|_| ScannerStatus::of(&pipeline))
            .map_err(ApiError::from)
    })
    .await?;
    Ok(Json(status))
}

pub async fn capture(
    State(state): State<AppState>,
) -> Result<Json<WasteAnalysisResult>, ApiError> {
    let mut pipeline = claim(&state)?;
    let result = detached(async move { pipeline.capture().await.map_err(ApiError::from) }).await?;
    Ok(Json(result))
}

pub async fn scan_another(State(state): State<AppState>) -> Result<Json<ScannerStatus>, ApiError> {
    let mut pipeline = claim(&state)?;
    let status = detached(async move {
        let restarted = pipeline.scan_another().await;
        restarted
            .map(|_| ScannerStatus::of(&pipeline))
            .map_err(ApiError::from)
    })
    .await?;
    Ok(Json(status))
}

pub async fn reset(State(state): State<AppState>) -> Result<Json<ScannerStatus>, ApiError> {
    let mut pipeline = claim(&state)?;
    pipeline.reset();
    Ok(Json(ScannerStatus::of(&pipeline)))
}
