use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Default site kit: label, acceptance threshold, annotation color.
const SITE_DEFAULT: [(&str, f32); 4] = [
    ("helmet", 0.70),
    ("vest", 0.65),
    ("gloves", 0.60),
    ("boots", 0.60),
];

const DEFAULT_COLOR: [u8; 3] = [0, 255, 0];

/// One required PPE item.
#[derive(Clone, Debug, PartialEq)]
pub struct Requirement {
    /// Normalized label (lowercase, trimmed). Matching detections mark the
    /// item present.
    pub label: String,
    /// A detection counts only when its confidence is strictly greater than
    /// this threshold.
    pub min_confidence: f32,
    /// RGB color used for this item's annotations.
    pub color: [u8; 3],
}

/// Serde shape for a requirement entry in the config file.
#[derive(Debug, Deserialize)]
pub struct RequirementFile {
    pub label: String,
    pub min_confidence: f32,
    pub color: Option<[u8; 3]>,
}

/// Ordered table of required PPE items.
///
/// Loaded once at startup and immutable afterwards; per-frame presence state
/// lives in [`PresenceMap`](crate::compliance::PresenceMap), never here.
/// Missing-item lists preserve this table's declaration order.
#[derive(Clone, Debug)]
pub struct RequirementTable {
    items: Vec<Requirement>,
}

impl RequirementTable {
    /// Build a table, normalizing labels and validating thresholds.
    pub fn new(items: Vec<Requirement>) -> Result<Self> {
        if items.is_empty() {
            return Err(anyhow!("requirement table must not be empty"));
        }

        let mut normalized = Vec::with_capacity(items.len());
        for mut item in items {
            item.label = normalize_label(&item.label);
            if item.label.is_empty() {
                return Err(anyhow!("requirement labels must not be empty"));
            }
            if !item.min_confidence.is_finite() || !(0.0..=1.0).contains(&item.min_confidence) {
                return Err(anyhow!(
                    "requirement '{}' has min_confidence {} outside [0, 1]",
                    item.label,
                    item.min_confidence
                ));
            }
            if normalized
                .iter()
                .any(|existing: &Requirement| existing.label == item.label)
            {
                return Err(anyhow!("duplicate requirement label '{}'", item.label));
            }
            normalized.push(item);
        }

        Ok(Self { items: normalized })
    }

    /// The four-item construction-site default.
    pub fn site_default() -> Self {
        let items = SITE_DEFAULT
            .iter()
            .map(|(label, min_confidence)| Requirement {
                label: (*label).to_string(),
                min_confidence: *min_confidence,
                color: DEFAULT_COLOR,
            })
            .collect();
        Self::new(items).expect("default table is valid")
    }

    pub fn from_file_entries(entries: Vec<RequirementFile>) -> Result<Self> {
        let items = entries
            .into_iter()
            .map(|entry| Requirement {
                label: entry.label,
                min_confidence: entry.min_confidence,
                color: entry.color.unwrap_or(DEFAULT_COLOR),
            })
            .collect();
        Self::new(items)
    }

    /// Look up a requirement and its table position by (normalized) label.
    pub fn get_indexed(&self, label: &str) -> Option<(usize, &Requirement)> {
        let label = normalize_label(label);
        self.items
            .iter()
            .enumerate()
            .find(|(_, item)| item.label == label)
    }

    pub fn get(&self, label: &str) -> Option<&Requirement> {
        self.get_indexed(label).map(|(_, item)| item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.items.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Labels compare case-insensitively with surrounding whitespace ignored.
pub(crate) fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
