use image::RgbImage;

use crate::annotate::Annotator;
use crate::compliance::requirements::{normalize_label, RequirementTable};
use crate::detect::Detection;

/// Per-frame presence snapshot, one flag per required label in table order.
///
/// A fresh map is built for every evaluation; presence never leaks from one
/// frame into the next and nothing is shared across invocations.
#[derive(Clone, Debug)]
pub struct PresenceMap {
    labels: Vec<String>,
    present: Vec<bool>,
}

impl PresenceMap {
    fn for_table(table: &RequirementTable) -> Self {
        Self {
            labels: table.labels().map(str::to_string).collect(),
            present: vec![false; table.len()],
        }
    }

    fn mark(&mut self, index: usize) {
        self.present[index] = true;
    }

    pub fn is_present(&self, label: &str) -> bool {
        let label = normalize_label(label);
        self.labels
            .iter()
            .position(|l| *l == label)
            .map(|idx| self.present[idx])
            .unwrap_or(false)
    }

    /// Labels whose flag is still false, in table order.
    pub fn missing(&self) -> Vec<String> {
        self.labels
            .iter()
            .zip(&self.present)
            .filter(|(_, present)| !**present)
            .map(|(label, _)| label.clone())
            .collect()
    }
}

/// Result of evaluating one frame against the requirement table.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub presence: PresenceMap,
    /// Required labels not observed above threshold, in table order.
    pub missing: Vec<String>,
    /// Number of detections drawn onto the frame.
    pub annotated: usize,
}

impl Evaluation {
    pub fn compliant(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Evaluate one frame's detections against the requirement table.
///
/// A detection marks its label present (and is drawn) only when the label is
/// required and the confidence strictly exceeds that label's threshold.
/// Detections for non-required labels, or below threshold, are ignored.
/// Malformed detections are skipped with a warning and never abort the rest
/// of the frame.
///
/// Annotations are drawn into `frame` in place; callers that still need the
/// pristine frame clone it first.
pub fn evaluate(
    frame: &mut RgbImage,
    detections: &[Detection],
    table: &RequirementTable,
    annotator: &Annotator,
) -> Evaluation {
    let mut presence = PresenceMap::for_table(table);
    let mut annotated = 0;

    for detection in detections {
        if let Err(err) = detection.validate() {
            log::warn!("skipping malformed detection: {}", err);
            continue;
        }

        let Some((index, requirement)) = table.get_indexed(&detection.label) else {
            continue;
        };
        if detection.confidence <= requirement.min_confidence {
            continue;
        }

        presence.mark(index);
        annotator.draw_detection(frame, detection, requirement.color);
        annotated += 1;
    }

    let missing = presence.missing();
    Evaluation {
        presence,
        missing,
        annotated,
    }
}
