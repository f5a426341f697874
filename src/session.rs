//! Live inspection session.
//!
//! One session drives the cycle `Capturing -> Evaluating -> Dispatching`
//! until stopped. Each cycle is synchronous: capture one frame, evaluate it,
//! hand any alert to the decoupled worker, sink the annotated frame, repeat.
//! The only blocking call taken off this path is speech playback (see
//! [`crate::alert::AlertWorker`]); detection and annotation run inline.
//!
//! The stop flag is observed once per iteration (cooperative cancellation);
//! capture failure ends the session cleanly rather than being retried.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::alert::{AlertDispatcher, AlertWorker};
use crate::annotate::Annotator;
use crate::compliance::{evaluate, RequirementTable};
use crate::detect::DetectorBackend;
use crate::ingest::CameraSource;

const HEALTH_LOG_EVERY: Duration = Duration::from_secs(5);

/// Session state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Capturing,
    Evaluating,
    Dispatching,
    Stopped,
}

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Explicit stop signal.
    Signal,
    /// The capture source failed; not retried.
    SourceFailure,
    /// A configured frame budget was reached (demo runs).
    FrameBudget,
}

/// Summary of a finished session.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub frames: u64,
    pub alerts_published: u64,
    pub alerts_spoken: u64,
    pub stop_reason: StopReason,
}

/// Session tunables not derived from other components.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub target_fps: u32,
    /// Latest annotated frame is written here each cycle; None disables.
    pub annotated_path: Option<PathBuf>,
    /// Stop after this many frames; None runs until signalled.
    pub max_frames: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            target_fps: 10,
            annotated_path: None,
            max_frames: None,
        }
    }
}

/// A live inspection session wiring source, detector, evaluator and alerts.
pub struct LiveSession {
    source: CameraSource,
    backend: Arc<Mutex<dyn DetectorBackend>>,
    table: RequirementTable,
    annotator: Annotator,
    dispatcher: AlertDispatcher,
    worker: AlertWorker,
    options: SessionOptions,
    phase: SessionPhase,
}

impl LiveSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: CameraSource,
        backend: Arc<Mutex<dyn DetectorBackend>>,
        table: RequirementTable,
        annotator: Annotator,
        dispatcher: AlertDispatcher,
        worker: AlertWorker,
        options: SessionOptions,
    ) -> Self {
        Self {
            source,
            backend,
            table,
            annotator,
            dispatcher,
            worker,
            options,
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Run the capture loop until the stop flag is raised, the source fails,
    /// or the frame budget is exhausted. Consumes the session; the alert
    /// worker is always shut down and joined on the way out.
    pub fn run(mut self, stop: Arc<AtomicBool>) -> Result<SessionReport> {
        let frame_interval = Duration::from_millis(1_000 / self.options.target_fps.max(1) as u64);
        let mut frames = 0u64;
        let mut alerts_published = 0u64;
        let mut last_health_log = Instant::now();
        let mut last_missing: Option<Vec<String>> = None;

        let stop_reason = loop {
            if stop.load(Ordering::Relaxed) {
                break StopReason::Signal;
            }
            if let Some(budget) = self.options.max_frames {
                if frames >= budget {
                    break StopReason::FrameBudget;
                }
            }

            self.phase = SessionPhase::Capturing;
            let mut frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    log::error!("capture failed, ending session: {}", err);
                    break StopReason::SourceFailure;
                }
            };
            frames += 1;

            self.phase = SessionPhase::Evaluating;
            let detections = {
                let mut backend = match self.backend.lock() {
                    Ok(guard) => guard,
                    Err(_) => {
                        log::error!("detector backend lock poisoned, ending session");
                        break StopReason::SourceFailure;
                    }
                };
                match backend.detect(
                    frame.image.as_raw(),
                    frame.image.width(),
                    frame.image.height(),
                ) {
                    Ok(detections) => detections,
                    Err(err) => {
                        log::warn!("detection failed on frame {}: {}", frame.index, err);
                        continue;
                    }
                }
            };
            let evaluation = evaluate(&mut frame.image, &detections, &self.table, &self.annotator);

            if last_missing.as_deref() != Some(evaluation.missing.as_slice()) {
                if evaluation.compliant() {
                    log::info!("frame {}: all required equipment detected", frame.index);
                } else {
                    log::warn!(
                        "frame {}: missing {}",
                        frame.index,
                        evaluation.missing.join(", ")
                    );
                }
                last_missing = Some(evaluation.missing.clone());
            }

            self.phase = SessionPhase::Dispatching;
            if let Some(message) = self.dispatcher.maybe_alert(&evaluation.missing, Instant::now())
            {
                log::debug!("alert queued: {}", message.text);
                self.worker.publish(message);
                alerts_published += 1;
            }

            if let Some(path) = &self.options.annotated_path {
                if let Err(err) = frame.image.save(path) {
                    log::warn!("failed to write annotated frame to {}: {}", path.display(), err);
                }
            }

            if last_health_log.elapsed() >= HEALTH_LOG_EVERY {
                let stats = self.source.stats();
                log::info!(
                    "source health={} frames={} device={}",
                    self.source.is_healthy(),
                    stats.frames_captured,
                    stats.device
                );
                last_health_log = Instant::now();
            }

            std::thread::sleep(frame_interval);
        };

        self.phase = SessionPhase::Stopped;
        let alerts_spoken = self.worker.shutdown();
        log::info!(
            "live inspection stopped ({:?}): {} frames, {} alerts queued, {} spoken",
            stop_reason,
            frames,
            alerts_published,
            alerts_spoken
        );

        Ok(SessionReport {
            frames,
            alerts_published,
            alerts_spoken,
            stop_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertDispatcher;
    use crate::detect::StubBackend;
    use crate::ingest::CameraConfig;
    use crate::speech::NullSpeech;

    fn session(max_frames: u64, script: StubBackend) -> LiveSession {
        let mut source = CameraSource::new(CameraConfig {
            device: "stub://test".to_string(),
            target_fps: 1_000,
            width: 64,
            height: 48,
        })
        .unwrap();
        source.connect().unwrap();

        let table = RequirementTable::site_default();
        LiveSession::new(
            source,
            Arc::new(Mutex::new(script)),
            table.clone(),
            Annotator::new(),
            AlertDispatcher::new(table, Duration::ZERO),
            AlertWorker::spawn(Box::new(NullSpeech::new())).unwrap(),
            SessionOptions {
                target_fps: 1_000,
                annotated_path: None,
                max_frames: Some(max_frames),
            },
        )
    }

    #[test]
    fn session_honours_frame_budget() {
        let stop = Arc::new(AtomicBool::new(false));
        let report = session(3, StubBackend::new()).run(stop).unwrap();

        assert_eq!(report.frames, 3);
        assert_eq!(report.stop_reason, StopReason::FrameBudget);
    }

    #[test]
    fn session_stops_on_signal_before_capturing() {
        let stop = Arc::new(AtomicBool::new(true));
        let report = session(10, StubBackend::new()).run(stop).unwrap();

        assert_eq!(report.frames, 0);
        assert_eq!(report.stop_reason, StopReason::Signal);
    }

    #[test]
    fn empty_detections_publish_alerts_with_zero_cooldown() {
        let stop = Arc::new(AtomicBool::new(false));
        let report = session(2, StubBackend::new()).run(stop).unwrap();

        // Every frame misses all items and the cooldown is zero, so each
        // cycle queues an alert (the single slot may coalesce them).
        assert!(report.alerts_published >= 1);
    }
}
