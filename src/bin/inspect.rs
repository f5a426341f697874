//! inspect - one-shot PPE inspection of a still image
//!
//! Loads a photo, runs the configured detector, writes an annotated copy and
//! prints the compliance result. With `--speak` the alert message is also
//! read out (blocking; acceptable for a one-shot tool).

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::Parser;

use ppe_sentinel::{
    AlertDispatcher, Annotator, EspeakBackend, SentinelConfig, SpeechBackend,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image file to inspect.
    image: PathBuf,
    /// Where to write the annotated copy (default: <image>.annotated.jpg).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Speak the result through the configured synthesizer.
    #[arg(long)]
    speak: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let cfg = SentinelConfig::load()?;

    let mut frame = ppe_sentinel::load_still(&args.image)?;
    let (width, height) = (frame.image.width(), frame.image.height());

    let registry = cfg.build_registry(width, height)?;
    let backend = registry
        .default_backend()
        .ok_or_else(|| anyhow!("no detector backend registered"))?;
    let detections = {
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("detector backend lock poisoned"))?;
        guard.detect(frame.image.as_raw(), width, height)?
    };

    let annotator = Annotator::from_font_config(cfg.annotate.font_path.as_deref());
    let evaluation =
        ppe_sentinel::evaluate(&mut frame.image, &detections, &cfg.requirements, &annotator);

    let out_path = args.out.unwrap_or_else(|| annotated_path(&args.image));
    frame.image.save(&out_path)?;

    println!("inspected: {}", args.image.display());
    println!("  detections considered: {}", detections.len());
    println!("  annotated boxes: {}", evaluation.annotated);
    if evaluation.compliant() {
        println!("  result: all required equipment detected");
    } else {
        println!("  result: missing {}", evaluation.missing.join(", "));
    }
    println!("  annotated copy: {}", out_path.display());

    // A fresh dispatcher with no cooldown history always emits, which gives
    // the same wording the daemon would use.
    let mut dispatcher = AlertDispatcher::new(cfg.requirements.clone(), std::time::Duration::ZERO);
    if let Some(message) = dispatcher.maybe_alert(&evaluation.missing, Instant::now()) {
        println!("  alert: {}", message.text);
        if args.speak {
            let mut speech = EspeakBackend::new(cfg.alerts.speech.clone());
            if let Err(err) = speech.speak(&message.text) {
                log::warn!("could not speak result: {}", err);
            }
        }
    }

    Ok(())
}

/// `photo.jpg` -> `photo.annotated.jpg`.
fn annotated_path(image: &PathBuf) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let ext = image
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jpg".to_string());
    image.with_file_name(format!("{}.annotated.{}", stem, ext))
}
