use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::compliance::{RequirementFile, RequirementTable};
use crate::ingest::CameraConfig;
use crate::speech::EspeakConfig;

const DEFAULT_DEVICE: &str = "stub://site_camera";
const DEFAULT_FPS: u32 = 10;
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_COOLDOWN_SECS: u64 = 5;
const DEFAULT_DETECTOR: &str = "stub";
const DEFAULT_BASE_CONFIDENCE: f32 = 0.9;
const DEFAULT_ANNOTATED_PATH: &str = "annotated.jpg";

#[derive(Debug, Deserialize, Default)]
struct SentinelConfigFile {
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    alerts: Option<AlertConfigFile>,
    annotate: Option<AnnotateConfigFile>,
    requirements: Option<Vec<RequirementFile>>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    device: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    labels: Option<Vec<String>>,
    base_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    cooldown_secs: Option<u64>,
    audio_enabled: Option<bool>,
    speech_program: Option<String>,
    speech_rate_wpm: Option<u32>,
    speech_amplitude: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AnnotateConfigFile {
    font_path: Option<PathBuf>,
    annotated_path: Option<PathBuf>,
}

/// Resolved sentinel configuration.
///
/// Loaded once at startup; immutable afterwards. Per-frame state (presence,
/// cooldown timestamps) never lives here.
#[derive(Clone, Debug)]
pub struct SentinelConfig {
    pub source: SourceSettings,
    pub detector: DetectorSettings,
    pub alerts: AlertSettings,
    pub annotate: AnnotateSettings,
    pub requirements: RequirementTable,
}

#[derive(Clone, Debug)]
pub struct SourceSettings {
    pub device: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug)]
pub struct DetectorSettings {
    /// Backend name to select from the registry ("stub", "tract", ...).
    pub backend: String,
    pub model_path: Option<PathBuf>,
    /// Class labels, indexed by model class id.
    pub labels: Vec<String>,
    /// Model-level confidence floor applied before per-label thresholds.
    pub base_confidence: f32,
}

#[derive(Clone, Debug)]
pub struct AlertSettings {
    pub cooldown: Duration,
    pub audio_enabled: bool,
    pub speech: EspeakConfig,
}

#[derive(Clone, Debug)]
pub struct AnnotateSettings {
    pub font_path: Option<PathBuf>,
    /// Where the daemon writes the latest annotated frame; None disables.
    pub annotated_path: Option<PathBuf>,
}

impl SourceSettings {
    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            device: self.device.clone(),
            target_fps: self.target_fps,
            width: self.width,
            height: self.height,
        }
    }
}

impl SentinelConfig {
    /// Load configuration: file named by `PPE_CONFIG` (JSON), then env-var
    /// overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PPE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentinelConfigFile) -> Result<Self> {
        let source = SourceSettings {
            device: file
                .source
                .as_ref()
                .and_then(|source| source.device.clone())
                .unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
            target_fps: file
                .source
                .as_ref()
                .and_then(|source| source.target_fps)
                .unwrap_or(DEFAULT_FPS),
            width: file
                .source
                .as_ref()
                .and_then(|source| source.width)
                .unwrap_or(DEFAULT_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|source| source.height)
                .unwrap_or(DEFAULT_HEIGHT),
        };

        let detector = DetectorSettings {
            backend: file
                .detector
                .as_ref()
                .and_then(|detector| detector.backend.clone())
                .unwrap_or_else(|| DEFAULT_DETECTOR.to_string()),
            model_path: file
                .detector
                .as_ref()
                .and_then(|detector| detector.model_path.clone()),
            labels: file
                .detector
                .as_ref()
                .and_then(|detector| detector.labels.clone())
                .unwrap_or_default(),
            base_confidence: file
                .detector
                .as_ref()
                .and_then(|detector| detector.base_confidence)
                .unwrap_or(DEFAULT_BASE_CONFIDENCE),
        };

        let alerts = AlertSettings {
            cooldown: Duration::from_secs(
                file.alerts
                    .as_ref()
                    .and_then(|alerts| alerts.cooldown_secs)
                    .unwrap_or(DEFAULT_COOLDOWN_SECS),
            ),
            audio_enabled: file
                .alerts
                .as_ref()
                .and_then(|alerts| alerts.audio_enabled)
                .unwrap_or(true),
            speech: EspeakConfig {
                program: file
                    .alerts
                    .as_ref()
                    .and_then(|alerts| alerts.speech_program.clone())
                    .unwrap_or_else(|| EspeakConfig::default().program),
                rate_wpm: file
                    .alerts
                    .as_ref()
                    .and_then(|alerts| alerts.speech_rate_wpm)
                    .unwrap_or_else(|| EspeakConfig::default().rate_wpm),
                amplitude: file
                    .alerts
                    .as_ref()
                    .and_then(|alerts| alerts.speech_amplitude)
                    .unwrap_or_else(|| EspeakConfig::default().amplitude),
            },
        };

        let annotate = AnnotateSettings {
            font_path: file
                .annotate
                .as_ref()
                .and_then(|annotate| annotate.font_path.clone()),
            annotated_path: match file.annotate.and_then(|annotate| annotate.annotated_path) {
                Some(path) => Some(path),
                None => Some(PathBuf::from(DEFAULT_ANNOTATED_PATH)),
            },
        };

        let requirements = match file.requirements {
            Some(entries) => RequirementTable::from_file_entries(entries)?,
            None => RequirementTable::site_default(),
        };

        Ok(Self {
            source,
            detector,
            alerts,
            annotate,
            requirements,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("PPE_SOURCE") {
            if !device.trim().is_empty() {
                self.source.device = device;
            }
        }
        if let Ok(fps) = std::env::var("PPE_FPS") {
            let fps: u32 = fps
                .parse()
                .map_err(|_| anyhow!("PPE_FPS must be an integer frame rate"))?;
            self.source.target_fps = fps;
        }
        if let Ok(backend) = std::env::var("PPE_DETECTOR") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend;
            }
        }
        if let Ok(path) = std::env::var("PPE_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(cooldown) = std::env::var("PPE_COOLDOWN_SECS") {
            let seconds: u64 = cooldown
                .parse()
                .map_err(|_| anyhow!("PPE_COOLDOWN_SECS must be an integer number of seconds"))?;
            self.alerts.cooldown = Duration::from_secs(seconds);
        }
        if let Ok(audio) = std::env::var("PPE_AUDIO") {
            self.alerts.audio_enabled = match audio.trim() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" => false,
                other => return Err(anyhow!("PPE_AUDIO must be on/off, got '{}'", other)),
            };
        }
        if let Ok(path) = std::env::var("PPE_FONT_PATH") {
            if !path.trim().is_empty() {
                self.annotate.font_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("PPE_ANNOTATED_PATH") {
            self.annotate.annotated_path = if path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.detector.base_confidence) {
            return Err(anyhow!(
                "detector base_confidence {} outside [0, 1]",
                self.detector.base_confidence
            ));
        }
        if self.detector.backend == "tract" {
            if self.detector.model_path.is_none() {
                return Err(anyhow!("tract backend requires detector.model_path"));
            }
            if self.detector.labels.is_empty() {
                return Err(anyhow!("tract backend requires detector.labels"));
            }
        }
        if self.alerts.speech.amplitude > 200 {
            return Err(anyhow!("speech_amplitude must be 0..=200"));
        }
        Ok(())
    }
}

impl SentinelConfig {
    /// Build the detector registry for this configuration and make the
    /// configured backend the default.
    ///
    /// `input_width`/`input_height` are the frame dimensions the session will
    /// feed the backend; model-bound backends are built to match them.
    #[allow(unused_variables)]
    pub fn build_registry(
        &self,
        input_width: u32,
        input_height: u32,
    ) -> Result<crate::detect::BackendRegistry> {
        let mut registry = crate::detect::BackendRegistry::new();
        registry.register(crate::detect::StubBackend::new());

        #[cfg(feature = "backend-tract")]
        if self.detector.backend == "tract" {
            let model_path = self
                .detector
                .model_path
                .clone()
                .ok_or_else(|| anyhow!("tract backend requires detector.model_path"))?;
            registry.register(crate::detect::TractBackend::new(crate::detect::TractConfig {
                model_path,
                input_width,
                input_height,
                labels: self.detector.labels.clone(),
                base_confidence: self.detector.base_confidence,
            })?);
        }

        registry.set_default(&self.detector.backend).map_err(|_| {
            anyhow!(
                "detector backend '{}' is not available (is the matching feature enabled?)",
                self.detector.backend
            )
        })?;
        Ok(registry)
    }
}

fn read_config_file(path: &Path) -> Result<SentinelConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
