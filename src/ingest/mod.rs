//! Frame ingestion sources.
//!
//! This module provides the sources a sentinel session can capture from:
//! - Camera devices (V4L2, feature: ingest-v4l2)
//! - Still image files (one-shot inspection)
//! - Stub sources (testing, `stub://` device paths)
//!
//! All sources produce [`Frame`] instances that flow into the compliance
//! evaluator. A source that stops producing frames ends the session; the
//! session does not retry capture automatically.

pub mod camera;
pub mod still;

use image::RgbImage;
use thiserror::Error;

pub use camera::{CameraConfig, CameraSource, CameraStats};
pub use still::load_still;

/// One captured frame.
///
/// Owned by the caller for the duration of one cycle; annotation mutates the
/// image in place, so callers needing the pristine pixels clone first.
pub struct Frame {
    pub image: RgbImage,
    /// Monotonic capture index within the session, starting at 1.
    pub index: u64,
}

/// Frame capture errors. Capture loss ends a live session cleanly.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture source not connected")]
    NotConnected,
    #[error("capture source '{0}' unavailable: {1}")]
    Unavailable(String, String),
    #[error("failed to decode frame: {0}")]
    Decode(String),
    #[error("unsupported source '{0}': {1}")]
    Unsupported(String, String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
