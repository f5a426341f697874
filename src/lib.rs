//! PPE Sentinel
//!
//! This crate implements a site-safety inspector: it runs an object-detection
//! backend over camera frames or still images, checks the detections against
//! a table of required personal protective equipment, draws the accepted
//! detections onto the frame, and issues spoken warnings when required items
//! are missing.
//!
//! # Architecture
//!
//! Control flow per frame:
//!
//! 1. A frame source ([`ingest`]) captures one frame.
//! 2. A detector backend ([`detect`]) turns pixels into labeled,
//!    confidence-scored bounding boxes. Backends are opaque; the core only
//!    consumes their output schema.
//! 3. The compliance evaluator ([`compliance`]) applies per-label acceptance
//!    thresholds, builds a frame-scoped presence map, annotates the frame
//!    ([`annotate`]) and reports missing items in table order.
//! 4. The alert dispatcher ([`alert`]) decides, under a cooldown, whether to
//!    emit a message; a decoupled worker speaks it ([`speech`]) so audio
//!    playback never stalls capture.
//!
//! Two invariants hold by construction: presence state is rebuilt fresh for
//! every evaluation (no leakage between frames), and the requirement table is
//! immutable after startup (no shared scratch state).
//!
//! # Module Structure
//!
//! - `detect`: detector backend trait, registry, stub + ONNX backends
//! - `compliance`: requirement table, presence map, evaluator
//! - `annotate`: box/caption drawing
//! - `alert`: dispatcher (cooldown policy) + speech worker
//! - `speech`: speech backend trait, espeak-ng + null backends
//! - `ingest`: camera and still-image frame sources
//! - `session`: the live capture/evaluate/dispatch loop
//! - `config`: file + env configuration

pub mod alert;
pub mod annotate;
pub mod compliance;
pub mod config;
pub mod detect;
pub mod ingest;
pub mod session;
pub mod speech;

pub use alert::{AlertDispatcher, AlertMessage, AlertSeverity, AlertWorker, DEFAULT_COOLDOWN};
pub use annotate::Annotator;
pub use compliance::{evaluate, Evaluation, PresenceMap, Requirement, RequirementTable};
pub use config::SentinelConfig;
pub use detect::{
    BackendRegistry, BoundingBox, Detection, DetectionCapability, DetectorBackend,
    MalformedDetection, StubBackend,
};
#[cfg(feature = "backend-tract")]
pub use detect::{TractBackend, TractConfig};
pub use ingest::{load_still, CameraConfig, CameraSource, CaptureError, Frame};
pub use session::{LiveSession, SessionOptions, SessionPhase, SessionReport, StopReason};
pub use speech::{EspeakBackend, EspeakConfig, NullSpeech, SpeechBackend, SpeechError};
