//! Classifier hand-off pipeline.
//!
//! Decouples "a frame was captured" from "a classification result became
//! available": the capture side submits frames fire-and-forget, a worker
//! thread runs the classifier, and results come back over a bounded channel
//! in strict submission order (single worker, FIFO queues, monotonically
//! increasing timestamps).

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::vocab::GestureLabel;

/// Depth of both the submission and result queues.  Keeps memory flat when
/// the classifier falls behind the capture rate.
const QUEUE_DEPTH: usize = 8;

// ── Frames and results ─────────────────────────────────────

/// One captured frame.  The payload is opaque to the pipeline; only the
/// classifier interprets it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw image payload.
    pub data: Vec<u8>,
    /// Logical submission timestamp, incremented once per submitted frame.
    pub timestamp_ms: u64,
}

/// One ranked classification candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureCandidate {
    pub label: GestureLabel,
    /// Classifier confidence (0.0–1.0).
    pub score: f32,
}

/// Classification output for one submitted frame.
#[derive(Debug, Clone)]
pub struct RecognizerResult {
    /// Submission timestamp of the frame this result belongs to.
    pub timestamp_ms: u64,
    /// Candidates ordered best-first.  Empty means no gesture recognized —
    /// a classification gap, never an error.
    pub candidates: Vec<GestureCandidate>,
}

impl RecognizerResult {
    /// The top-ranked label, or None on a classification gap.
    pub fn top_label(&self) -> Option<GestureLabel> {
        self.candidates.first().map(|c| c.label)
    }
}

// ── Classifier trait ───────────────────────────────────────

/// Pluggable gesture classifier.  Runs on the recognizer worker thread.
pub trait GestureClassifier: Send {
    /// Classify one frame, candidates ordered best-first.
    fn classify(&mut self, frame: &Frame) -> Vec<GestureCandidate>;
}

// ── Cancellation ───────────────────────────────────────────

/// Cloneable stop signal, checked once per loop iteration by both the
/// capture side and the session consumer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Recognizer ─────────────────────────────────────────────

/// Owns the hand-off queues around a classifier worker thread.
///
/// Results arrive in submission order: there is exactly one worker and both
/// channels are FIFO.  Dropping the recognizer disconnects the submission
/// channel; the worker exits once its queues drain.
pub struct Recognizer {
    frames_tx: Sender<Frame>,
    results_rx: Receiver<RecognizerResult>,
    next_timestamp_ms: u64,
}

impl Recognizer {
    /// Spawn the worker thread around a classifier.
    pub fn spawn<C: GestureClassifier + 'static>(mut classifier: C) -> io::Result<Self> {
        let (frames_tx, frames_rx) = bounded::<Frame>(QUEUE_DEPTH);
        let (results_tx, results_rx) = bounded::<RecognizerResult>(QUEUE_DEPTH);

        thread::Builder::new()
            .name("gesture-classifier".into())
            .spawn(move || {
                for frame in frames_rx.iter() {
                    let result = RecognizerResult {
                        timestamp_ms: frame.timestamp_ms,
                        candidates: classifier.classify(&frame),
                    };
                    if results_tx.send(result).is_err() {
                        // Consumer gone.
                        break;
                    }
                }
                debug!("classifier worker exiting");
            })?;

        Ok(Self {
            frames_tx,
            results_rx,
            next_timestamp_ms: 0,
        })
    }

    /// Fire-and-forget frame submission.  Assigns the monotonic timestamp.
    /// Drops the frame when the queue is full rather than blocking capture.
    pub fn submit(&mut self, data: Vec<u8>) {
        let timestamp_ms = self.next_timestamp_ms;
        self.next_timestamp_ms += 1;

        match self.frames_tx.try_send(Frame { data, timestamp_ms }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!("classifier backlog full, dropping frame {timestamp_ms}");
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("classifier worker gone, dropping frame {timestamp_ms}");
            }
        }
    }

    /// FIFO result stream, one result per classified frame.
    pub fn results(&self) -> &Receiver<RecognizerResult> {
        &self.results_rx
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Classifier that replays a fixed script of per-frame labels.
    struct ScriptedClassifier {
        script: Vec<Option<GestureLabel>>,
        cursor: usize,
    }

    impl ScriptedClassifier {
        fn new(script: Vec<Option<GestureLabel>>) -> Self {
            Self { script, cursor: 0 }
        }
    }

    impl GestureClassifier for ScriptedClassifier {
        fn classify(&mut self, _frame: &Frame) -> Vec<GestureCandidate> {
            let label = self.script.get(self.cursor).copied().flatten();
            self.cursor += 1;
            match label {
                Some(label) => vec![GestureCandidate { label, score: 0.9 }],
                None => Vec::new(),
            }
        }
    }

    #[test]
    fn test_results_preserve_submission_order() {
        let script = vec![
            Some(GestureLabel::ClosedFist),
            None,
            Some(GestureLabel::OpenPalm),
            Some(GestureLabel::Victory),
        ];
        let mut recognizer =
            Recognizer::spawn(ScriptedClassifier::new(script.clone())).expect("spawn worker");

        for _ in 0..script.len() {
            recognizer.submit(Vec::new());
        }

        let mut seen = Vec::new();
        for i in 0..script.len() {
            let result = recognizer
                .results()
                .recv_timeout(Duration::from_secs(5))
                .expect("result within timeout");
            assert_eq!(result.timestamp_ms, i as u64);
            seen.push(result.top_label());
        }
        assert_eq!(seen, script);
    }

    #[test]
    fn test_timestamps_monotonic_across_submissions() {
        let mut recognizer =
            Recognizer::spawn(ScriptedClassifier::new(vec![None; 3])).expect("spawn worker");
        for _ in 0..3 {
            recognizer.submit(Vec::new());
        }
        let mut last = None;
        for _ in 0..3 {
            let result = recognizer
                .results()
                .recv_timeout(Duration::from_secs(5))
                .expect("result within timeout");
            if let Some(prev) = last {
                assert!(result.timestamp_ms > prev);
            }
            last = Some(result.timestamp_ms);
        }
    }

    #[test]
    fn test_top_label_empty_candidates() {
        let result = RecognizerResult {
            timestamp_ms: 0,
            candidates: Vec::new(),
        };
        assert_eq!(result.top_label(), None);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
