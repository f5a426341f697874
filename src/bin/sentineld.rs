//! sentineld - PPE Sentinel live-inspection daemon
//!
//! This daemon:
//! 1. Captures frames from the configured source (camera or stub)
//! 2. Runs the configured detector backend on each frame
//! 3. Evaluates PPE compliance and annotates accepted detections
//! 4. Publishes cooldown-gated voice alerts to a decoupled speech worker
//! 5. Writes the latest annotated frame for external display

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use ppe_sentinel::{
    AlertDispatcher, AlertWorker, Annotator, CameraSource, EspeakBackend, LiveSession,
    NullSpeech, SentinelConfig, SessionOptions, SpeechBackend,
};

fn main() -> Result<()> {
    // Initialize logging (simple stderr)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = SentinelConfig::load()?;

    log::info!(
        "sentineld {} starting, source={}",
        env!("CARGO_PKG_VERSION"),
        cfg.source.device
    );
    log::info!(
        "required equipment: {}",
        cfg.requirements
            .labels()
            .collect::<Vec<_>>()
            .join(", ")
    );
    log::info!(
        "alert cooldown: {:?}, audio {}",
        cfg.alerts.cooldown,
        if cfg.alerts.audio_enabled { "on" } else { "off" }
    );

    let registry = cfg.build_registry(cfg.source.width, cfg.source.height)?;
    let backend = registry
        .default_backend()
        .ok_or_else(|| anyhow!("no detector backend registered"))?;
    {
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("detector backend lock poisoned"))?;
        log::info!("detector backend: {}", guard.name());
        guard.warm_up()?;
    }

    let mut source = CameraSource::new(cfg.source.camera_config())?;
    source.connect()?;

    let speech = select_speech(&cfg);
    let worker = AlertWorker::spawn(speech)?;

    let annotator = Annotator::from_font_config(cfg.annotate.font_path.as_deref());
    let dispatcher = AlertDispatcher::new(cfg.requirements.clone(), cfg.alerts.cooldown);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        log::info!("stop requested");
        stop_handler.store(true, Ordering::Relaxed);
    })?;

    let session = LiveSession::new(
        source,
        backend,
        cfg.requirements.clone(),
        annotator,
        dispatcher,
        worker,
        SessionOptions {
            target_fps: cfg.source.target_fps,
            annotated_path: cfg.annotate.annotated_path.clone(),
            max_frames: None,
        },
    );

    let report = session.run(stop)?;
    log::info!(
        "sentineld exiting: {} frames, {} alerts queued, {} spoken",
        report.frames,
        report.alerts_published,
        report.alerts_spoken
    );
    Ok(())
}

/// Pick the speech backend: espeak when audio is enabled and the synthesizer
/// can be launched, the logging null backend otherwise.
fn select_speech(cfg: &SentinelConfig) -> Box<dyn SpeechBackend> {
    if !cfg.alerts.audio_enabled {
        return Box::new(NullSpeech::new());
    }
    let espeak = EspeakBackend::new(cfg.alerts.speech.clone());
    if espeak.is_available() {
        Box::new(espeak)
    } else {
        log::warn!(
            "{} is not available; voice alerts will be logged only",
            cfg.alerts.speech.program
        );
        Box::new(NullSpeech::new())
    }
}
