//! Capture pipeline: camera or upload -> still image -> classification.

use std::fmt;
use std::mem;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dhakaclean_gateway::AiGateway;
use dhakaclean_schema::{CapturedImage, WasteAnalysisResult};
use serde::Serialize;
use thiserror::Error;

use crate::camera::{encode_jpeg, ActiveStream, CameraDevice, FacingMode, JPEG_QUALITY};

pub const CAMERA_ERROR_MESSAGE: &str =
    "Could not access camera. Please allow permissions or use file upload.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    Idle,
    DeviceRequested,
    Streaming,
    DeviceError,
    Captured,
    Analyzing,
    Resulted,
}

impl CaptureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DeviceRequested => "device_requested",
            Self::Streaming => "streaming",
            Self::DeviceError => "device_error",
            Self::Captured => "captured",
            Self::Analyzing => "analyzing",
            Self::Resulted => "resulted",
        }
    }
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum CaptureState {
    Idle,
    DeviceRequested,
    Streaming(ActiveStream),
    DeviceError { message: String },
    Captured(CapturedImage),
    Analyzing(CapturedImage),
    Resulted {
        image: CapturedImage,
        result: WasteAnalysisResult,
    },
}

impl CaptureState {
    pub fn stage(&self) -> CaptureStage {
        match self {
            Self::Idle => CaptureStage::Idle,
            Self::DeviceRequested => CaptureStage::DeviceRequested,
            Self::Streaming(_) => CaptureStage::Streaming,
            Self::DeviceError { .. } => CaptureStage::DeviceError,
            Self::Captured(_) => CaptureStage::Captured,
            Self::Analyzing(_) => CaptureStage::Analyzing,
            Self::Resulted { .. } => CaptureStage::Resulted,
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot {action} while {stage}")]
    InvalidAction {
        action: &'static str,
        stage: CaptureStage,
    },
    #[error("unsupported file type: {0}")]
    UnsupportedMedia(String),
    #[error("uploaded file is empty")]
    EmptyUpload,
    #[error("could not capture frame: {0}")]
    Frame(String),
}

pub struct CapturePipeline {
    camera: Arc<dyn CameraDevice>,
    gateway: Arc<AiGateway>,
    state: CaptureState,
}

impl CapturePipeline {
    pub fn new(camera: Arc<dyn CameraDevice>, gateway: Arc<AiGateway>) -> Self {
        Self {
            camera,
            gateway,
            state: CaptureState::Idle,
        }
    }

    pub fn stage(&self) -> CaptureStage {
        self.state.stage()
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        match &self.state {
            CaptureState::Captured(image)
            | CaptureState::Analyzing(image)
            | CaptureState::Resulted { image, .. } => Some(image),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&WasteAnalysisResult> {
        match &self.state {
            CaptureState::Resulted { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn camera_error(&self) -> Option<&str> {
        match &self.state {
            CaptureState::DeviceError { message } => Some(message),
            _ => None,
        }
    }

    /// Open the rear camera. A refused device is a state, not an error.
    pub async fn start_camera(&mut self) -> Result<CaptureStage, CaptureError> {
        match self.stage() {
            CaptureStage::Idle | CaptureStage::DeviceError => {}
            stage => return Err(invalid("start camera", stage)),
        }
        let camera = Arc::clone(&self.camera);
        let request = InFlight::enter(&mut self.state, CaptureState::DeviceRequested);

        let next = match camera.open(FacingMode::Environment).await {
            Ok(stream) => {
                tracing::info!("camera stream started");
                CaptureState::Streaming(ActiveStream::new(stream))
            }
            Err(e) => {
                tracing::error!("Error accessing camera: {e}");
                CaptureState::DeviceError {
                    message: CAMERA_ERROR_MESSAGE.to_string(),
                }
            }
        };
        request.settle(next);
        Ok(self.stage())
    }

    /// Grab the current frame, release the camera, then classify.
    pub async fn capture(&mut self) -> Result<WasteAnalysisResult, CaptureError> {
        let stage = self.stage();
        let mut stream = match mem::replace(&mut self.state, CaptureState::Idle) {
            CaptureState::Streaming(stream) => stream,
            other => {
                self.state = other;
                return Err(invalid("capture", stage));
            }
        };

        let frame = stream.grab_frame();
        stream.release();

        let jpeg = frame
            .and_then(|frame| encode_jpeg(&frame, JPEG_QUALITY))
            .map_err(|e| {
                tracing::warn!("frame capture failed: {e}");
                CaptureError::Frame(e.to_string())
            })?;

        let image = CapturedImage::new("image/jpeg", BASE64.encode(jpeg));
        Ok(self.analyze(image).await)
    }

    /// Accept an image file instead of a camera frame.
    pub async fn upload(
        &mut self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<WasteAnalysisResult, CaptureError> {
        match self.stage() {
            CaptureStage::Idle | CaptureStage::DeviceError => {}
            stage => return Err(invalid("upload", stage)),
        }
        if bytes.is_empty() {
            return Err(CaptureError::EmptyUpload);
        }
        let mime_type = image_mime_type(bytes, file_name)?;
        tracing::info!(file_name, %mime_type, size = bytes.len(), "image uploaded");

        let image = CapturedImage::new(mime_type, BASE64.encode(bytes));
        Ok(self.analyze(image).await)
    }

    /// Drop the current result and go straight back to the camera.
    pub async fn scan_another(&mut self) -> Result<CaptureStage, CaptureError> {
        match self.stage() {
            CaptureStage::Resulted => {}
            stage => return Err(invalid("scan another", stage)),
        }
        self.state = CaptureState::Idle;
        self.start_camera().await
    }

    /// Back to Idle from anywhere. Releases the camera if streaming.
    pub fn reset(&mut self) {
        if let CaptureState::Streaming(stream) = mem::replace(&mut self.state, CaptureState::Idle)
        {
            stream.release();
        }
    }

    async fn analyze(&mut self, image: CapturedImage) -> WasteAnalysisResult {
        let gateway = Arc::clone(&self.gateway);
        self.state = CaptureState::Captured(image.clone());
        let analysis = InFlight::enter(&mut self.state, CaptureState::Analyzing(image.clone()));

        let result = gateway.classify_waste(&image).await;
        tracing::info!(
            category = %result.category,
            confidence = result.rounded_confidence(),
            "scan analyzed"
        );

        analysis.settle(CaptureState::Resulted {
            image,
            result: result.clone(),
        });
        result
    }
}

/// A waiting stage tied to the future that entered it. Dropped before
/// `settle`, the pipeline falls back to Idle.
struct InFlight<'a> {
    state: &'a mut CaptureState,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn enter(state: &'a mut CaptureState, waiting: CaptureState) -> Self {
        *state = waiting;
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, next: CaptureState) {
        *self.state = next;
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(stage = %self.state.stage(), "capture action cancelled, back to idle");
            *self.state = CaptureState::Idle;
        }
    }
}

fn invalid(action: &'static str, stage: CaptureStage) -> CaptureError {
    CaptureError::InvalidAction { action, stage }
}

/// Mime type from the file name, falling back to the content for bare names.
fn image_mime_type(bytes: &[u8], file_name: &str) -> Result<String, CaptureError> {
    let mime = match mime_guess::from_path(file_name).first() {
        Some(mime) => mime.essence_str().to_string(),
        None => image::guess_format(bytes)
            .map(|format| format.to_mime_type().to_string())
            .map_err(|_| CaptureError::UnsupportedMedia(file_name.to_string()))?,
    };
    if mime.starts_with("image/") {
        Ok(mime)
    } else {
        Err(CaptureError::UnsupportedMedia(mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{MediaStream, UnavailableCamera};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use dhakaclean_gateway::GatewayConfig;
    use dhakaclean_provider::{GenerateRequest, GenerateResponse, GenerativeModel};
    use dhakaclean_schema::{Frame, WasteCategory};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    const PAPER_JSON: &str = r#"{"category":"Recyclable (Paper)","confidence":88,"description":"Newspaper","disposalAdvice":"Keep dry and sell to a feriwala.","recyclingPotential":"High","estimatedDecompositionTime":"6 weeks"}"#;

    struct FixedModel(Option<&'static str>);

    #[async_trait]
    impl GenerativeModel for FixedModel {
        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
            match self.0 {
                Some(text) => Ok(GenerateResponse {
                    text: text.to_string(),
                    ..Default::default()
                }),
                None => Err(anyhow!("gemini api error (500): boom")),
            }
        }
    }

    /// Never answers; stands in for a request the caller gives up on.
    struct StalledModel;

    #[async_trait]
    impl GenerativeModel for StalledModel {
        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
            std::future::pending().await
        }
    }

    struct StalledCamera;

    #[async_trait]
    impl CameraDevice for StalledCamera {
        async fn open(&self, _facing: FacingMode) -> Result<Box<dyn MediaStream>> {
            std::future::pending().await
        }
    }

    /// Camera whose streams count live tracks in a shared counter.
    struct FakeCamera {
        live: Arc<AtomicUsize>,
        frame: Option<Frame>,
    }

    impl FakeCamera {
        fn new(frame: Option<Frame>) -> (Arc<Self>, Arc<AtomicUsize>) {
            let live = Arc::new(AtomicUsize::new(0));
            (
                Arc::new(Self {
                    live: live.clone(),
                    frame,
                }),
                live,
            )
        }
    }

    struct FakeStream {
        live: Arc<AtomicUsize>,
        frame: Option<Frame>,
        on: bool,
    }

    impl MediaStream for FakeStream {
        fn grab_frame(&mut self) -> Result<Frame> {
            self.frame.clone().ok_or_else(|| anyhow!("no frame yet"))
        }

        fn stop(&mut self) {
            if self.on {
                self.on = false;
                self.live.fetch_sub(1, Ordering::SeqCst);
            }
        }

        fn is_live(&self) -> bool {
            self.on
        }
    }

    #[async_trait]
    impl CameraDevice for FakeCamera {
        async fn open(&self, facing: FacingMode) -> Result<Box<dyn MediaStream>> {
            assert_eq!(facing, FacingMode::Environment);
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeStream {
                live: self.live.clone(),
                frame: self.frame.clone(),
                on: true,
            }))
        }
    }

    fn frame() -> Frame {
        Frame {
            width: 4,
            height: 4,
            pixels: vec![200; 4 * 4 * 3],
        }
    }

    fn gateway(reply: Option<&'static str>) -> Arc<AiGateway> {
        Arc::new(AiGateway::new(
            Arc::new(FixedModel(reply)),
            GatewayConfig::default(),
        ))
    }

    fn png_bytes() -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]))
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn camera_capture_releases_device_and_reaches_result() {
        let (camera, live) = FakeCamera::new(Some(frame()));
        let mut pipeline = CapturePipeline::new(camera, gateway(Some(PAPER_JSON)));

        assert_eq!(pipeline.start_camera().await.unwrap(), CaptureStage::Streaming);
        assert_eq!(live.load(Ordering::SeqCst), 1);

        let result = pipeline.capture().await.unwrap();
        assert_eq!(result.category, WasteCategory::RecyclablePaper);
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.stage(), CaptureStage::Resulted);

        let image = pipeline.image().unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        let decoded = BASE64.decode(&image.data).unwrap();
        assert_eq!(&decoded[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn failed_frame_grab_still_releases_device() {
        let (camera, live) = FakeCamera::new(None);
        let mut pipeline = CapturePipeline::new(camera, gateway(Some(PAPER_JSON)));
        pipeline.start_camera().await.unwrap();

        let err = pipeline.capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::Frame(_)));
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.stage(), CaptureStage::Idle);
    }

    #[tokio::test]
    async fn refused_camera_enters_device_error_and_upload_still_works() {
        let mut pipeline = CapturePipeline::new(Arc::new(UnavailableCamera), gateway(Some(PAPER_JSON)));

        assert_eq!(pipeline.start_camera().await.unwrap(), CaptureStage::DeviceError);
        assert_eq!(pipeline.camera_error(), Some(CAMERA_ERROR_MESSAGE));

        // retry is allowed
        assert_eq!(pipeline.start_camera().await.unwrap(), CaptureStage::DeviceError);

        let result = pipeline.upload(&png_bytes(), "paper.png").await.unwrap();
        assert_eq!(result.rounded_confidence(), 88);
        assert_eq!(pipeline.image().unwrap().mime_type, "image/png");
    }

    #[tokio::test]
    async fn upload_rejects_non_images() {
        let mut pipeline = CapturePipeline::new(Arc::new(UnavailableCamera), gateway(Some(PAPER_JSON)));

        let err = pipeline.upload(b"hello", "notes.txt").await.unwrap_err();
        assert!(matches!(err, CaptureError::UnsupportedMedia(m) if m == "text/plain"));
        assert!(matches!(
            pipeline.upload(b"", "a.png").await.unwrap_err(),
            CaptureError::EmptyUpload
        ));
        assert!(matches!(
            pipeline.upload(b"plain words", "noext").await.unwrap_err(),
            CaptureError::UnsupportedMedia(_)
        ));
        assert_eq!(pipeline.stage(), CaptureStage::Idle);
    }

    #[tokio::test]
    async fn upload_without_extension_sniffs_content() {
        let mut pipeline = CapturePipeline::new(Arc::new(UnavailableCamera), gateway(Some(PAPER_JSON)));
        pipeline.upload(&png_bytes(), "IMG_0001").await.unwrap();
        assert_eq!(pipeline.image().unwrap().mime_type, "image/png");
    }

    #[tokio::test]
    async fn analysis_failure_yields_sentinel_result() {
        let mut pipeline = CapturePipeline::new(Arc::new(UnavailableCamera), gateway(None));
        let result = pipeline.upload(&png_bytes(), "x.png").await.unwrap();
        assert_eq!(result, WasteAnalysisResult::fallback());
        assert_eq!(pipeline.stage(), CaptureStage::Resulted);
    }

    #[tokio::test]
    async fn cancelled_upload_returns_to_idle() {
        let gateway = Arc::new(AiGateway::new(Arc::new(StalledModel), GatewayConfig::default()));
        let mut pipeline = CapturePipeline::new(Arc::new(UnavailableCamera), gateway);

        let first = timeout(Duration::from_millis(50), pipeline.upload(&png_bytes(), "a.png")).await;
        assert!(first.is_err());
        assert_eq!(pipeline.stage(), CaptureStage::Idle);
        assert!(pipeline.image().is_none());

        // accepted again: it stalls on the model instead of failing on state
        let second = timeout(Duration::from_millis(50), pipeline.upload(&png_bytes(), "b.png")).await;
        assert!(second.is_err());
        assert_eq!(pipeline.stage(), CaptureStage::Idle);
    }

    #[tokio::test]
    async fn cancelled_camera_request_returns_to_idle() {
        let mut pipeline = CapturePipeline::new(Arc::new(StalledCamera), gateway(Some(PAPER_JSON)));

        assert!(timeout(Duration::from_millis(50), pipeline.start_camera()).await.is_err());
        assert_eq!(pipeline.stage(), CaptureStage::Idle);
        pipeline.upload(&png_bytes(), "paper.png").await.unwrap();
        assert_eq!(pipeline.stage(), CaptureStage::Resulted);
    }

    #[tokio::test]
    async fn invalid_actions_do_not_change_state() {
        let (camera, live) = FakeCamera::new(Some(frame()));
        let mut pipeline = CapturePipeline::new(camera, gateway(Some(PAPER_JSON)));

        let err = pipeline.capture().await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::InvalidAction { action: "capture", stage: CaptureStage::Idle }
        ));
        assert!(pipeline.scan_another().await.is_err());

        pipeline.start_camera().await.unwrap();
        assert!(pipeline.start_camera().await.is_err());
        assert!(pipeline.upload(&png_bytes(), "a.png").await.is_err());
        assert_eq!(pipeline.stage(), CaptureStage::Streaming);
        assert_eq!(live.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scan_another_reopens_camera() {
        let (camera, live) = FakeCamera::new(Some(frame()));
        let mut pipeline = CapturePipeline::new(camera, gateway(Some(PAPER_JSON)));
        pipeline.start_camera().await.unwrap();
        pipeline.capture().await.unwrap();

        assert_eq!(pipeline.scan_another().await.unwrap(), CaptureStage::Streaming);
        assert!(pipeline.result().is_none());
        assert!(pipeline.image().is_none());
        assert_eq!(live.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reset_and_drop_release_the_camera() {
        let (camera, live) = FakeCamera::new(Some(frame()));
        let mut pipeline = CapturePipeline::new(camera.clone(), gateway(Some(PAPER_JSON)));
        pipeline.start_camera().await.unwrap();
        pipeline.reset();
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.stage(), CaptureStage::Idle);

        pipeline.start_camera().await.unwrap();
        assert_eq!(live.load(Ordering::SeqCst), 1);
        drop(pipeline);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stage_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CaptureStage::DeviceRequested).unwrap(),
            "\"device_requested\""
        );
        assert_eq!(CaptureStage::DeviceError.to_string(), "device_error");
    }
}
