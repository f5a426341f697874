use super::{SpeechBackend, SpeechError};

/// Speech backend that logs instead of speaking.
///
/// Used when voice alerts are disabled and as the fallback when no real
/// synthesizer is available.
#[derive(Default)]
pub struct NullSpeech {
    spoken: u64,
}

impl NullSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> u64 {
        self.spoken
    }
}

impl SpeechBackend for NullSpeech {
    fn name(&self) -> &'static str {
        "null"
    }

    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.spoken += 1;
        log::info!("voice alert (muted): {}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_speech_counts_messages() {
        let mut backend = NullSpeech::new();
        backend.speak("all clear").unwrap();
        backend.speak("missing vest").unwrap();
        assert_eq!(backend.spoken(), 2);
    }
}
