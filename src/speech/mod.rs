//! Voice alert backends.
//!
//! The sentinel core needs exactly one operation from audio: render a text
//! message to speech and play it to completion. Backends are opaque behind
//! [`SpeechBackend`]; a playback failure is reported, never retried here.

mod espeak;
mod null;

use thiserror::Error;

pub use espeak::{EspeakBackend, EspeakConfig};
pub use null::NullSpeech;

/// Speech synthesis / playback errors.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech engine unavailable: {0}")]
    Unavailable(String),
    #[error("synthesis rejected: {0}")]
    Rejected(String),
    #[error("playback failed: {0}")]
    Playback(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Speech backend trait.
///
/// `speak` blocks until playback completes; callers that must not stall run
/// it on a dedicated worker (see [`crate::alert::AlertWorker`]).
pub trait SpeechBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Render `text` to speech and play it. Blocks until playback completes.
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;
}

const MAX_TEXT_BYTES: usize = 1_000;

/// Strip control characters and cap length before handing text to an engine.
pub(crate) fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .take(MAX_TEXT_BYTES)
        .collect()
}
