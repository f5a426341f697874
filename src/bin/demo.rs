//! demo - end-to-end synthetic run for PPE Sentinel
//!
//! Runs the full pipeline with a synthetic camera, a scripted detector and
//! muted speech: no hardware, no model file, no audio device required.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use clap::Parser;

use ppe_sentinel::{
    AlertDispatcher, AlertWorker, Annotator, CameraConfig, CameraSource, LiveSession, NullSpeech,
    RequirementTable, SessionOptions, StubBackend, DEFAULT_COOLDOWN,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds for the synthetic session.
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 10)]
    fps: u32,
    /// Output directory for the annotated frame.
    #[arg(long, default_value = "demo_out")]
    out: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }

    let out_dir = PathBuf::from(&args.out);
    fs::create_dir_all(&out_dir)?;
    let annotated_path = out_dir.join("annotated.jpg");
    let total_frames = args.seconds.saturating_mul(args.fps as u64);

    stage("configure synthetic source + scripted detector");
    let mut source = CameraSource::new(CameraConfig {
        device: "stub://demo".to_string(),
        target_fps: args.fps,
        width: 640,
        height: 480,
    })?;
    source.connect()?;

    let table = RequirementTable::site_default();
    let backend = Arc::new(Mutex::new(StubBackend::demo_scene()));
    let dispatcher = AlertDispatcher::new(table.clone(), DEFAULT_COOLDOWN);
    let worker = AlertWorker::spawn(Box::new(NullSpeech::new()))?;

    stage("run live session");
    let session = LiveSession::new(
        source,
        backend,
        table,
        Annotator::new(),
        dispatcher,
        worker,
        SessionOptions {
            target_fps: args.fps,
            annotated_path: Some(annotated_path.clone()),
            max_frames: Some(total_frames),
        },
    );
    let report = session.run(Arc::new(AtomicBool::new(false)))?;

    stage("summary");
    println!("demo summary:");
    println!("  frames processed: {}", report.frames);
    println!("  alerts queued: {}", report.alerts_published);
    println!("  alerts spoken (muted): {}", report.alerts_spoken);
    println!("  alert cooldown: {:?}", DEFAULT_COOLDOWN);
    println!("  annotated frame: {}", annotated_path.display());
    println!("next steps:");
    println!("  cargo run --bin sentineld");
    println!("  cargo run --bin inspect -- site_photo.jpg");

    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
