//! gesture-lock — authenticate with a timed sequence of hand gestures.
//!
//! The core lives in `matcher` (debounced combination matching), `vocab`
//! (token vocabulary and validation), `session` (attempt loop with cooldown)
//! and `pipeline` (capture/classification hand-off).  This binary wires a
//! line-driven stand-in classifier: real video capture and classification
//! are external collaborators behind the `GestureClassifier` trait.

mod matcher;
mod pipeline;
mod session;
mod vocab;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pipeline::{CancelToken, Frame, GestureCandidate, GestureClassifier, Recognizer};
use session::{SessionConfig, SessionController, SessionOutcome, TracingObserver};
use vocab::{CombinationSpec, ConfigError, GestureLabel};

/// Pace of synthetic frame submission (roughly 30 fps).
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Parser, Debug)]
#[command(
    name = "gesture-lock",
    about = "Unlock with a timed sequence of hand gestures",
    version
)]
struct Cli {
    /// Target combination: comma-separated gesture tokens
    #[arg(long)]
    combination: String,

    /// Camera device index (/dev/video<N>)
    #[arg(long, default_value_t = 0)]
    camera: u32,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Seconds to wait after a mismatch before a new attempt;
    /// 0 fails the session on the first mismatch
    #[arg(long, default_value_t = 3)]
    cooldown_secs: u64,

    /// Combinations must be strictly longer than this many gestures
    #[arg(long, default_value_t = vocab::DEFAULT_MIN_LENGTH)]
    min_length: usize,
}

/// Stand-in classifier: each line of input is one frame's top-ranked
/// classification.  A blank or unrecognized line is a classification gap;
/// "q" quits the session.
struct LineClassifier {
    input: Box<dyn BufRead + Send>,
    cancel: CancelToken,
}

impl LineClassifier {
    fn new(input: Box<dyn BufRead + Send>, cancel: CancelToken) -> Self {
        Self { input, cancel }
    }
}

impl GestureClassifier for LineClassifier {
    fn classify(&mut self, _frame: &Frame) -> Vec<GestureCandidate> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            // EOF or read failure ends the session like a quit.
            Ok(0) | Err(_) => {
                self.cancel.cancel();
                Vec::new()
            }
            Ok(_) => {
                let token = line.trim();
                if token.eq_ignore_ascii_case("q") {
                    self.cancel.cancel();
                    return Vec::new();
                }
                match GestureLabel::from_token(token) {
                    Some(label) => vec![GestureCandidate { label, score: 1.0 }],
                    None => Vec::new(),
                }
            }
        }
    }
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gesture_lock=info".into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

/// Eager capture-device check, before any pipeline resource is spawned.
fn check_camera(index: u32) -> Result<(), ConfigError> {
    let path = format!("/dev/video{index}");
    if Path::new(&path).exists() {
        Ok(())
    } else {
        Err(ConfigError::CameraUnavailable { index, path })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_file.as_deref()) {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    // Fail fast on configuration before touching capture resources.
    let target = match CombinationSpec::parse(&cli.combination, cli.min_length) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };
    if let Err(e) = check_camera(cli.camera) {
        eprintln!("{e}");
        return ExitCode::from(1);
    }

    info!(
        "gesture-lock v{}: {} gestures to hit, cooldown {}s",
        env!("CARGO_PKG_VERSION"),
        target.len(),
        cli.cooldown_secs,
    );

    let cancel = CancelToken::new();
    let classifier = LineClassifier::new(Box::new(BufReader::new(io::stdin())), cancel.clone());
    let mut recognizer = match Recognizer::spawn(classifier) {
        Ok(recognizer) => recognizer,
        Err(e) => {
            eprintln!("spawning classifier worker: {e}");
            return ExitCode::from(1);
        }
    };
    let results = recognizer.results().clone();

    // Capture loop: submits frames fire-and-forget at the frame rate.
    // Owns the recognizer; dropping it on exit disconnects the worker.
    let capture_cancel = cancel.clone();
    let capture = thread::spawn(move || {
        while !capture_cancel.is_cancelled() {
            recognizer.submit(Vec::new());
            thread::sleep(FRAME_INTERVAL);
        }
    });

    let config = SessionConfig {
        cooldown: Duration::from_secs(cli.cooldown_secs),
        ..SessionConfig::default()
    };
    let mut controller = SessionController::new(&target, config);
    let outcome = controller.run(&results, &cancel, &mut TracingObserver);

    cancel.cancel();
    let _ = capture.join();

    match outcome {
        SessionOutcome::Succeeded => {
            info!("session succeeded");
            ExitCode::SUCCESS
        }
        SessionOutcome::Failed => {
            info!("session failed");
            ExitCode::from(1)
        }
        SessionOutcome::Cancelled => {
            info!("session cancelled");
            ExitCode::from(2)
        }
    }
}
