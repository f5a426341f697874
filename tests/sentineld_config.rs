use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use ppe_sentinel::config::SentinelConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PPE_CONFIG",
        "PPE_SOURCE",
        "PPE_FPS",
        "PPE_DETECTOR",
        "PPE_MODEL_PATH",
        "PPE_COOLDOWN_SECS",
        "PPE_AUDIO",
        "PPE_FONT_PATH",
        "PPE_ANNOTATED_PATH",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": {
            "device": "stub://yard_camera",
            "target_fps": 12,
            "width": 800,
            "height": 600
        },
        "alerts": {
            "cooldown_secs": 7,
            "audio_enabled": true,
            "speech_rate_wpm": 120
        },
        "annotate": {
            "annotated_path": "yard.jpg"
        },
        "requirements": [
            { "label": "Helmet", "min_confidence": 0.8 },
            { "label": "vest", "min_confidence": 0.5, "color": [255, 128, 0] }
        ]
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PPE_CONFIG", file.path());
    std::env::set_var("PPE_SOURCE", "stub://gate_camera");
    std::env::set_var("PPE_COOLDOWN_SECS", "11");
    std::env::set_var("PPE_AUDIO", "off");

    let cfg = SentinelConfig::load().expect("load config");

    // Env wins over file for the source device and alert knobs.
    assert_eq!(cfg.source.device, "stub://gate_camera");
    assert_eq!(cfg.alerts.cooldown, Duration::from_secs(11));
    assert!(!cfg.alerts.audio_enabled);

    // File values survive where no env override exists.
    assert_eq!(cfg.source.target_fps, 12);
    assert_eq!(cfg.source.width, 800);
    assert_eq!(cfg.alerts.speech.rate_wpm, 120);
    assert_eq!(
        cfg.annotate.annotated_path.as_deref(),
        Some(std::path::Path::new("yard.jpg"))
    );

    // Requirement labels are normalized and keep file order and colors.
    let labels: Vec<&str> = cfg.requirements.labels().collect();
    assert_eq!(labels, vec!["helmet", "vest"]);
    assert_eq!(cfg.requirements.get("vest").unwrap().color, [255, 128, 0]);

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SentinelConfig::load().expect("load defaults");

    assert_eq!(cfg.source.device, "stub://site_camera");
    assert_eq!(cfg.source.target_fps, 10);
    assert_eq!(cfg.alerts.cooldown, Duration::from_secs(5));
    assert!(cfg.alerts.audio_enabled);
    assert_eq!(cfg.detector.backend, "stub");

    let labels: Vec<&str> = cfg.requirements.labels().collect();
    assert_eq!(labels, vec!["helmet", "vest", "gloves", "boots"]);

    clear_env();
}

#[test]
fn invalid_cooldown_env_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PPE_COOLDOWN_SECS", "soon");
    let result = SentinelConfig::load();
    assert!(result.is_err());

    clear_env();
}

#[test]
fn tract_backend_requires_model_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PPE_DETECTOR", "tract");
    let result = SentinelConfig::load();
    assert!(result.is_err(), "tract without model_path must not validate");

    clear_env();
}
