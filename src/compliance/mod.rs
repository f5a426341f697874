//! PPE compliance evaluation.
//!
//! The evaluator consumes one frame's raw detections, applies the per-label
//! acceptance thresholds from the [`RequirementTable`], draws accepted
//! detections onto the frame, and reports which required items are missing.
//!
//! Presence state is frame-scoped by construction: every call to
//! [`evaluate`] builds its own [`PresenceMap`], so results from one frame can
//! never leak into the next and concurrent evaluations do not share state.

mod evaluator;
mod requirements;

pub use evaluator::{evaluate, Evaluation, PresenceMap};
pub use requirements::{Requirement, RequirementFile, RequirementTable};
