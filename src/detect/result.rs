use thiserror::Error;

/// Axis-aligned bounding box in pixel coordinates, `(x1, y1)` top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Corners are finite and not inverted.
    pub fn is_well_formed(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x2 >= self.x1
            && self.y2 >= self.y1
    }
}

/// One labeled, confidence-scored object instance observed in a single frame.
///
/// Detections are ephemeral: a backend produces them fresh for every frame and
/// the evaluator owns them only for the duration of that frame's processing.
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// A detection that fails basic shape checks.
///
/// Malformed detections are skipped with a warning; they never abort
/// evaluation of the rest of the frame.
#[derive(Debug, Error)]
pub enum MalformedDetection {
    #[error("detection has an empty label")]
    EmptyLabel,
    #[error("confidence {0} is not a finite value in [0, 1]")]
    ConfidenceOutOfRange(f32),
    #[error("bounding box is inverted or non-finite")]
    DegenerateBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// Check the fields a well-formed detection must carry.
    pub fn validate(&self) -> Result<(), MalformedDetection> {
        if self.label.trim().is_empty() {
            return Err(MalformedDetection::EmptyLabel);
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(MalformedDetection::ConfidenceOutOfRange(self.confidence));
        }
        if !self.bbox.is_well_formed() {
            return Err(MalformedDetection::DegenerateBox);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, BoundingBox::new(10.0, 10.0, 50.0, 90.0))
    }

    #[test]
    fn well_formed_detection_validates() {
        assert!(boxed("helmet", 0.9).validate().is_ok());
    }

    #[test]
    fn empty_label_is_malformed() {
        assert!(matches!(
            boxed("  ", 0.9).validate(),
            Err(MalformedDetection::EmptyLabel)
        ));
    }

    #[test]
    fn out_of_range_confidence_is_malformed() {
        assert!(boxed("helmet", 1.5).validate().is_err());
        assert!(boxed("helmet", -0.1).validate().is_err());
        assert!(boxed("helmet", f32::NAN).validate().is_err());
    }

    #[test]
    fn inverted_box_is_malformed() {
        let det = Detection::new("vest", 0.8, BoundingBox::new(50.0, 10.0, 10.0, 90.0));
        assert!(matches!(
            det.validate(),
            Err(MalformedDetection::DegenerateBox)
        ));
    }
}
