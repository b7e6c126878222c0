//! Capture device seam.
//!
//! A camera hands out a [`MediaStream`] that stays live until stopped. The
//! scanner only ever holds it through [`ActiveStream`], which stops the stream
//! when dropped so the device cannot leak on any exit path.

use std::io::Cursor;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use dhakaclean_schema::Frame;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use serde::{Deserialize, Serialize};

/// Still images are always JPEG at this quality.
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera
    Environment,
    User,
}

pub trait MediaStream: Send {
    fn grab_frame(&mut self) -> Result<Frame>;
    fn stop(&mut self);
    fn is_live(&self) -> bool;
}

#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn MediaStream>>;
}

/// Exclusive handle on an open stream.
pub struct ActiveStream {
    inner: Box<dyn MediaStream>,
}

impl ActiveStream {
    pub fn new(inner: Box<dyn MediaStream>) -> Self {
        Self { inner }
    }

    pub fn grab_frame(&mut self) -> Result<Frame> {
        self.inner.grab_frame()
    }

    pub fn is_live(&self) -> bool {
        self.inner.is_live()
    }

    /// Stop the stream now instead of at drop.
    pub fn release(self) {
        drop(self);
    }
}

impl std::fmt::Debug for ActiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveStream")
            .field("live", &self.is_live())
            .finish()
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        if self.inner.is_live() {
            self.inner.stop();
            tracing::debug!("camera stream released");
        }
    }
}

/// Camera for hosts without a capture device. Scanning falls back to upload.
pub struct UnavailableCamera;

#[async_trait]
impl CameraDevice for UnavailableCamera {
    async fn open(&self, _facing: FacingMode) -> Result<Box<dyn MediaStream>> {
        bail!("no camera device available")
    }
}

/// Serves a still image file as a single-frame stream.
pub struct ImageFileCamera {
    path: PathBuf,
}

impl ImageFileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CameraDevice for ImageFileCamera {
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn MediaStream>> {
        let path = self.path.clone();
        let decoded = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|e| anyhow!("camera worker failed: {e}"))?
            .map_err(|e| anyhow!("cannot open {}: {e}", self.path.display()))?;
        let rgb = decoded.to_rgb8();
        tracing::debug!(
            ?facing,
            width = rgb.width(),
            height = rgb.height(),
            "file camera opened"
        );
        Ok(Box::new(StillStream {
            frame: Frame {
                width: rgb.width(),
                height: rgb.height(),
                pixels: rgb.into_raw(),
            },
            live: true,
        }))
    }
}

struct StillStream {
    frame: Frame,
    live: bool,
}

impl MediaStream for StillStream {
    fn grab_frame(&mut self) -> Result<Frame> {
        if !self.live {
            bail!("stream stopped");
        }
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Rasterize an RGB8 frame into a JPEG still.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>> {
    if frame.width == 0 || frame.height == 0 {
        bail!("frame has no pixels ({}x{})", frame.width, frame.height);
    }
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.pixels.len() != expected {
        bail!(
            "frame size mismatch: {} bytes for {}x{} RGB",
            frame.pixels.len(),
            frame.width,
            frame.height
        );
    }
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality).encode(
        &frame.pixels,
        frame.width,
        frame.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32) -> Frame {
        Frame {
            width,
            height,
            pixels: vec![120; (width * height * 3) as usize],
        }
    }

    #[test]
    fn encode_jpeg_produces_jpeg_magic() {
        let bytes = encode_jpeg(&solid_frame(8, 8), JPEG_QUALITY).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn encode_jpeg_rejects_bad_frames() {
        assert!(encode_jpeg(&solid_frame(0, 4), JPEG_QUALITY).is_err());
        let mut short = solid_frame(4, 4);
        short.pixels.pop();
        let err = encode_jpeg(&short, JPEG_QUALITY).unwrap_err();
        assert!(err.to_string().contains("size mismatch"));
    }

    #[tokio::test]
    async fn unavailable_camera_fails_to_open() {
        assert!(UnavailableCamera.open(FacingMode::Environment).await.is_err());
    }

    #[tokio::test]
    async fn file_camera_streams_decoded_image() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bottle.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let camera = ImageFileCamera::new(&path);
        let mut stream = ActiveStream::new(camera.open(FacingMode::Environment).await.unwrap());
        let frame = stream.grab_frame().unwrap();
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(&frame.pixels[..3], &[10, 20, 30]);
        assert!(stream.is_live());
        stream.release();
    }

    #[tokio::test]
    async fn file_camera_missing_file_fails() {
        let camera = ImageFileCamera::new("/definitely/not/here.png");
        assert!(camera.open(FacingMode::Environment).await.is_err());
    }

    #[test]
    fn stopped_still_stream_yields_no_frames() {
        let mut stream = StillStream {
            frame: solid_frame(1, 1),
            live: true,
        };
        stream.stop();
        assert!(!stream.is_live());
        assert!(stream.grab_frame().is_err());
    }
}
