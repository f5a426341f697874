use anyhow::Result;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::{BoundingBox, Detection};

/// Stub backend for tests and the demo bin.
///
/// Replays a scripted sequence of per-frame detection sets, cycling when the
/// script runs out. An empty script detects nothing, ever.
pub struct StubBackend {
    script: Vec<Vec<Detection>>,
    cursor: usize,
}

impl StubBackend {
    /// A stub that never detects anything.
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            cursor: 0,
        }
    }

    /// Replay `script` one entry per frame, wrapping around at the end.
    pub fn with_script(script: Vec<Vec<Detection>>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Scene used by the demo bin: a worker with full kit, then the same
    /// worker with the vest below threshold, alternating every five frames.
    pub fn demo_scene() -> Self {
        let full_kit = vec![
            Detection::new("helmet", 0.91, BoundingBox::new(210.0, 40.0, 330.0, 140.0)),
            Detection::new("vest", 0.84, BoundingBox::new(190.0, 150.0, 350.0, 330.0)),
            Detection::new("gloves", 0.72, BoundingBox::new(150.0, 260.0, 200.0, 320.0)),
            Detection::new("boots", 0.68, BoundingBox::new(220.0, 380.0, 320.0, 460.0)),
        ];
        let vest_low = vec![
            Detection::new("helmet", 0.89, BoundingBox::new(210.0, 40.0, 330.0, 140.0)),
            Detection::new("vest", 0.41, BoundingBox::new(190.0, 150.0, 350.0, 330.0)),
            Detection::new("gloves", 0.70, BoundingBox::new(150.0, 260.0, 200.0, 320.0)),
            Detection::new("boots", 0.66, BoundingBox::new(220.0, 380.0, 320.0, 460.0)),
        ];

        let mut script = Vec::with_capacity(10);
        for _ in 0..5 {
            script.push(full_kit.clone());
        }
        for _ in 0..5 {
            script.push(vest_low.clone());
        }
        Self::with_script(script)
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(capability, DetectionCapability::ObjectDetection)
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        let detections = self.script[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.script.len();
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stub_detects_nothing() {
        let mut backend = StubBackend::new();
        let detections = backend.detect(&[], 640, 480).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn scripted_stub_cycles() {
        let frame_a = vec![Detection::new(
            "helmet",
            0.9,
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        )];
        let frame_b = Vec::new();
        let mut backend = StubBackend::with_script(vec![frame_a, frame_b]);

        assert_eq!(backend.detect(&[], 1, 1).unwrap().len(), 1);
        assert_eq!(backend.detect(&[], 1, 1).unwrap().len(), 0);
        // Wraps back to the first entry.
        assert_eq!(backend.detect(&[], 1, 1).unwrap().len(), 1);
    }
}
