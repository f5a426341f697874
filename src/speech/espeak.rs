use std::io;
use std::process::{Command, Stdio};

use super::{sanitize_text, SpeechBackend, SpeechError};

const DEFAULT_PROGRAM: &str = "espeak-ng";
/// Words per minute. Deliberately slow for clear site announcements.
const DEFAULT_RATE_WPM: u32 = 130;
const DEFAULT_AMPLITUDE: u32 = 150;

/// Configuration for the espeak-ng backend.
#[derive(Clone, Debug)]
pub struct EspeakConfig {
    /// Synthesizer executable (e.g. "espeak-ng" or "espeak").
    pub program: String,
    /// Speaking rate in words per minute.
    pub rate_wpm: u32,
    /// Output amplitude, 0..=200.
    pub amplitude: u32,
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            rate_wpm: DEFAULT_RATE_WPM,
            amplitude: DEFAULT_AMPLITUDE,
        }
    }
}

/// Speech backend shelling out to espeak-ng.
///
/// The child process synthesizes and plays the message; `speak` returns when
/// the process exits, i.e. when playback is done. No temp files are written,
/// so there is nothing to clean up on any exit path.
pub struct EspeakBackend {
    config: EspeakConfig,
}

impl EspeakBackend {
    pub fn new(config: EspeakConfig) -> Self {
        Self { config }
    }

    /// Probe whether the configured synthesizer can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl SpeechBackend for EspeakBackend {
    fn name(&self) -> &'static str {
        "espeak"
    }

    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let sanitized = sanitize_text(text);
        if sanitized.trim().is_empty() {
            return Err(SpeechError::Rejected("text is empty".to_string()));
        }

        let status = Command::new(&self.config.program)
            .arg("-s")
            .arg(self.config.rate_wpm.to_string())
            .arg("-a")
            .arg(self.config.amplitude.to_string())
            .arg("--")
            .arg(&sanitized)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => {
                    SpeechError::Unavailable(format!("{} not found", self.config.program))
                }
                _ => SpeechError::Io(err),
            })?;

        if !status.success() {
            return Err(SpeechError::Playback(format!(
                "{} exited with {}",
                self.config.program, status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_rejected_before_spawning() {
        let mut backend = EspeakBackend::new(EspeakConfig::default());
        assert!(matches!(
            backend.speak("  \u{7} "),
            Err(SpeechError::Rejected(_))
        ));
    }

    #[test]
    fn missing_program_reports_unavailable() {
        let mut backend = EspeakBackend::new(EspeakConfig {
            program: "definitely-not-a-synthesizer".to_string(),
            ..EspeakConfig::default()
        });
        assert!(matches!(
            backend.speak("warning"),
            Err(SpeechError::Unavailable(_))
        ));
    }
}
