use anyhow::Result;

use crate::detect::result::Detection;

/// Detection capabilities supported by backends.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionCapability {
    /// Labeled bounding boxes with per-instance confidences.
    ObjectDetection,
    /// Whole-frame class scores, no localization.
    Classification,
}

/// Detector backend trait.
///
/// Backends are opaque oracles: RGB pixels flow in, labeled detections flow
/// out. The sentinel core never looks inside a backend; it only consumes the
/// `(label, confidence, bbox)` schema.
///
/// Implementations must treat the pixel slice as read-only and ephemeral and
/// must not retain it beyond the `detect` call.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: DetectionCapability) -> bool;

    /// Run detection on one RGB frame.
    ///
    /// Returns every raw detection for the frame; per-label acceptance
    /// thresholds are applied downstream by the compliance evaluator, not
    /// here.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
