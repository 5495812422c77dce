//! Session orchestration: drives the attempt loop against the live result
//! stream until the combination is hit, the user quits, or (in the
//! zero-cooldown degenerate mode) the first mismatch.
//!
//! After a mismatch the loop keeps draining classification results for the
//! cooldown window without feeding the matcher, so the gesture that caused
//! the mismatch cannot immediately start a new attempt and the result queue
//! never backs up.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::matcher::{self, AttemptState, MatchOutcome};
use crate::pipeline::{CancelToken, RecognizerResult};
use crate::vocab::{CombinationSpec, GestureLabel};

// ── Observer ───────────────────────────────────────────────

/// Best-effort side-effect notifications for accepted labels and attempt
/// outcomes.  Implementations must not block and cannot touch matcher state.
pub trait SessionObserver {
    /// A new label was accepted into the attempt.
    fn on_transition(&mut self, _label: GestureLabel) {}
    /// A full-length attempt did not match; the attempt was reset.
    fn on_mismatch(&mut self) {}
    /// The combination was entered.
    fn on_success(&mut self) {}
}

/// Observer that reports through tracing.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_transition(&mut self, label: GestureLabel) {
        info!("gesture: {label}");
    }

    fn on_mismatch(&mut self) {
        info!("combination missed...");
    }

    fn on_success(&mut self) {
        info!("combination hit!");
    }
}

// ── Config and states ──────────────────────────────────────

/// Session policy knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay after a mismatch before a new attempt may accept input.
    /// Zero degenerates to failing the session on the first mismatch.
    pub cooldown: Duration,
    /// How long to wait for a result before rechecking the stop flag.
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(3),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No attempt in progress; waiting for the first accepted gesture.
    Idle,
    /// An attempt is accumulating accepted gestures.
    Attempting,
    /// Post-mismatch delay; results are drained but not fed to the matcher.
    Cooldown,
    /// Terminal: the combination was entered.
    Succeeded,
    /// Terminal: stopped by the external quit signal (or the result stream
    /// ended underneath us).
    Cancelled,
}

/// Terminal result reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The combination was entered.
    Succeeded,
    /// Stopped by the external quit signal.
    Cancelled,
    /// First mismatch with zero cooldown configured.
    Failed,
}

// ── Controller ─────────────────────────────────────────────

/// Drives one authentication session to a terminal outcome.
pub struct SessionController<'a> {
    target: &'a CombinationSpec,
    config: SessionConfig,
    state: SessionState,
    attempt: AttemptState,
    cooldown_until: Option<Instant>,
}

impl<'a> SessionController<'a> {
    pub fn new(target: &'a CombinationSpec, config: SessionConfig) -> Self {
        Self {
            target,
            config,
            state: SessionState::Idle,
            attempt: AttemptState::new(),
            cooldown_until: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Pull results until a terminal outcome.  Checks the stop flag every
    /// iteration so an external quit takes effect within one poll interval.
    pub fn run(
        &mut self,
        results: &Receiver<RecognizerResult>,
        cancel: &CancelToken,
        observer: &mut dyn SessionObserver,
    ) -> SessionOutcome {
        loop {
            if cancel.is_cancelled() {
                self.state = SessionState::Cancelled;
                return SessionOutcome::Cancelled;
            }

            if self.state == SessionState::Cooldown {
                let elapsed = self
                    .cooldown_until
                    .map_or(true, |until| Instant::now() >= until);
                if elapsed {
                    self.cooldown_until = None;
                    self.state = SessionState::Idle;
                    debug!("cooldown over, ready for a new attempt");
                }
            }

            let result = match results.recv_timeout(self.config.poll_interval) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("classification stream ended");
                    self.state = SessionState::Cancelled;
                    return SessionOutcome::Cancelled;
                }
            };

            // Cooldown drains results without feeding the matcher.
            if self.state == SessionState::Cooldown {
                continue;
            }

            let label = result.top_label();
            match matcher::feed(label, &mut self.attempt, self.target) {
                MatchOutcome::NoOp => {}
                MatchOutcome::Progressed(len) => {
                    self.state = SessionState::Attempting;
                    debug!("attempt at {len}/{}", self.target.len());
                    if let Some(label) = label {
                        observer.on_transition(label);
                    }
                }
                MatchOutcome::Matched => {
                    if let Some(label) = label {
                        observer.on_transition(label);
                    }
                    observer.on_success();
                    // The matcher leaves a successful attempt intact.
                    self.attempt.reset();
                    self.state = SessionState::Succeeded;
                    return SessionOutcome::Succeeded;
                }
                MatchOutcome::Mismatched => {
                    if let Some(label) = label {
                        observer.on_transition(label);
                    }
                    observer.on_mismatch();
                    if self.config.cooldown.is_zero() {
                        // Degenerate exit-on-mismatch policy.
                        self.state = SessionState::Idle;
                        return SessionOutcome::Failed;
                    }
                    self.cooldown_until = Some(Instant::now() + self.config.cooldown);
                    self.state = SessionState::Cooldown;
                    debug!("cooldown for {:?}", self.config.cooldown);
                }
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
