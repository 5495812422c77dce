//! Combination matching over a debounced gesture stream.
//!
//! Consumes one classified label per processed frame and tracks the current
//! attempt.  Like a physical combination lock, every distinct gesture is
//! recorded; correctness is judged only once the attempt reaches the target
//! length.  Pure state transitions, no I/O, no locking.

use tracing::debug;

use crate::vocab::{CombinationSpec, GestureLabel};

// ── Outcomes ───────────────────────────────────────────────

/// Result of feeding one frame's label into an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Nothing accepted: no gesture, or the same gesture still held.
    NoOp,
    /// A new label was accepted; the attempt is this many gestures long.
    Progressed(usize),
    /// The accepted history equals the target.  The caller resets the state.
    Matched,
    /// A full-length attempt did not equal the target.  The state has
    /// already been cleared, ready for a fresh attempt.
    Mismatched,
}

// ── Attempt state ──────────────────────────────────────────

/// Mutable state for one attempt.  Owned exclusively by the session loop;
/// never shared across threads.
#[derive(Debug, Default)]
pub struct AttemptState {
    /// Labels accepted so far, oldest first.  Never longer than the target.
    history: Vec<GestureLabel>,
    /// Most recently accepted label, for debounce.  None at attempt start.
    last_accepted: Option<GestureLabel>,
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear back to the attempt-start state.
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_accepted = None;
    }

    /// Number of gestures accepted in the current attempt.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The label a held gesture is debounced against.
    pub fn last_accepted(&self) -> Option<GestureLabel> {
        self.last_accepted
    }

    /// Accepted labels, oldest first.
    pub fn history(&self) -> &[GestureLabel] {
        &self.history
    }
}

// ── Matching ───────────────────────────────────────────────

/// Feed one frame's classification into the attempt.
///
/// Total over all inputs; never fails.  A held gesture (the same label
/// across consecutive frames) counts once: only a change to a new,
/// recognized label is accepted.  Acceptance is unconditional — whether the
/// label matches the expected position is judged only when the attempt
/// reaches the target length.  On `Mismatched` the state is cleared here;
/// on `Matched` resetting is left to the caller.
pub fn feed(
    label: Option<GestureLabel>,
    state: &mut AttemptState,
    target: &CombinationSpec,
) -> MatchOutcome {
    let label = match label {
        Some(l) if state.last_accepted != Some(l) => l,
        _ => return MatchOutcome::NoOp,
    };

    state.history.push(label);
    state.last_accepted = Some(label);
    debug!("accepted {} ({}/{})", label, state.history.len(), target.len());

    if state.history.len() < target.len() {
        return MatchOutcome::Progressed(state.history.len());
    }
    if state.history == target.labels() {
        MatchOutcome::Matched
    } else {
        state.reset();
        MatchOutcome::Mismatched
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::GestureLabel::{ClosedFist, OpenPalm, ThumbUp, Victory};

    fn target(labels: &str) -> CombinationSpec {
        CombinationSpec::parse(labels, 3).expect("valid test target")
    }

    /// Feed a sequence of labels, returning the outcome of the last one.
    fn feed_all(
        labels: &[Option<GestureLabel>],
        state: &mut AttemptState,
        target: &CombinationSpec,
    ) -> MatchOutcome {
        let mut last = MatchOutcome::NoOp;
        for label in labels {
            last = feed(*label, state, target);
        }
        last
    }

    #[test]
    fn test_none_is_noop() {
        let t = target("closed,open,closed,open");
        let mut state = AttemptState::new();
        assert_eq!(feed(None, &mut state, &t), MatchOutcome::NoOp);
        assert!(state.is_empty());
        assert_eq!(state.last_accepted(), None);
    }

    #[test]
    fn test_held_gesture_counts_once() {
        let t = target("closed,open,closed,open");
        let mut state = AttemptState::new();

        assert_eq!(
            feed(Some(ClosedFist), &mut state, &t),
            MatchOutcome::Progressed(1)
        );
        // Same label again: debounced, length unchanged.
        assert_eq!(feed(Some(ClosedFist), &mut state, &t), MatchOutcome::NoOp);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_none_does_not_clear_debounce() {
        let t = target("closed,open,closed,open");
        let mut state = AttemptState::new();

        feed(Some(ClosedFist), &mut state, &t);
        feed(None, &mut state, &t);
        // Still the same held gesture after a classification gap.
        assert_eq!(feed(Some(ClosedFist), &mut state, &t), MatchOutcome::NoOp);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_wrong_label_still_accepted() {
        // Acceptance and correctness are decoupled: everything typed is
        // recorded, judgment waits for the full length.
        let t = target("closed,open,closed,open");
        let mut state = AttemptState::new();

        assert_eq!(
            feed(Some(Victory), &mut state, &t),
            MatchOutcome::Progressed(1)
        );
        assert_eq!(state.history(), &[Victory]);
    }

    #[test]
    fn test_scenario_a_match_with_held_frames() {
        let t = target("closed,open,closed,open");
        let mut state = AttemptState::new();

        let outcome = feed_all(
            &[
                Some(ClosedFist),
                Some(ClosedFist), // held, debounced
                Some(OpenPalm),
                Some(ClosedFist),
                Some(OpenPalm),
            ],
            &mut state,
            &t,
        );
        assert_eq!(outcome, MatchOutcome::Matched);
        // Matcher does not auto-reset on success; that is the caller's call.
        assert_eq!(state.len(), 4);
    }

    #[test]
    fn test_scenario_b_mismatch_resets() {
        let t = target("closed,open,closed,open");
        let mut state = AttemptState::new();

        let outcome = feed_all(
            &[Some(OpenPalm), Some(ClosedFist), Some(OpenPalm)],
            &mut state,
            &t,
        );
        assert_eq!(outcome, MatchOutcome::Progressed(3));

        // Held repeat of the last gesture stays at 3.
        assert_eq!(feed(Some(OpenPalm), &mut state, &t), MatchOutcome::NoOp);
        assert_eq!(state.len(), 3);

        // A 4th distinct label completes a wrong attempt.
        assert_eq!(
            feed(Some(ClosedFist), &mut state, &t),
            MatchOutcome::Mismatched
        );
        assert!(state.is_empty());
        assert_eq!(state.last_accepted(), None);
    }

    #[test]
    fn test_match_iff_accepted_equals_target() {
        let t = target("thumbs-up,victory,thumbs-up,victory");
        let mut state = AttemptState::new();

        // Wrong attempt first.
        let outcome = feed_all(
            &[Some(Victory), Some(ThumbUp), Some(Victory), Some(ThumbUp)],
            &mut state,
            &t,
        );
        assert_eq!(outcome, MatchOutcome::Mismatched);

        // Fresh attempt with the right labels matches.
        let outcome = feed_all(
            &[Some(ThumbUp), Some(Victory), Some(ThumbUp), Some(Victory)],
            &mut state,
            &t,
        );
        assert_eq!(outcome, MatchOutcome::Matched);
    }

    #[test]
    fn test_first_label_after_reset_starts_fresh_attempt() {
        let t = target("closed,open,closed,open");
        let mut state = AttemptState::new();

        // Mismatch, then the target's first gesture starts over normally.
        feed_all(
            &[Some(OpenPalm), Some(ClosedFist), Some(OpenPalm), Some(ClosedFist)],
            &mut state,
            &t,
        );
        assert!(state.is_empty());

        assert_eq!(
            feed(Some(ClosedFist), &mut state, &t),
            MatchOutcome::Progressed(1)
        );
    }

    #[test]
    fn test_manual_reset_after_match() {
        let t = target("closed,open,closed,open");
        let mut state = AttemptState::new();

        feed_all(
            &[Some(ClosedFist), Some(OpenPalm), Some(ClosedFist), Some(OpenPalm)],
            &mut state,
            &t,
        );
        state.reset();
        assert!(state.is_empty());
        assert_eq!(state.last_accepted(), None);
    }
}
