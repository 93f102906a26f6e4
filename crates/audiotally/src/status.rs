//! Derived UI status and its timed transitions.
//!
//! The machine itself is pure: it never sleeps and owns no timers. Timed
//! transitions are armed by handing the caller a [`TimerToken`]; when the
//! caller's timer fires it presents the token back, and a token that has
//! been superseded by a newer event is ignored. That makes "a new
//! calculation cancels the pending phase change" a property of the machine
//! rather than of timer bookkeeping.

use serde::Serialize;

/// UI-facing status derived from watcher and aggregation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusState {
    /// Idle; no clip list currently of interest.
    Ready,

    /// A new clip list was detected; calculation is pending.
    Detecting {
        /// Number of clips found in the new content.
        clip_count: usize,
    },

    /// Aggregation just completed (transient "just calculated" highlight).
    CalculatedPhase1 {
        /// Number of clips in the result.
        clip_count: usize,
    },

    /// Settled result display; remains until the next clipboard change.
    CalculatedPhase2 {
        /// Number of clips in the result.
        clip_count: usize,
    },
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::Detecting { clip_count } => {
                write!(f, "Detected {clip_count} events - calculating")
            }
            Self::CalculatedPhase1 { clip_count } => {
                write!(f, "Calculated! ({clip_count} events)")
            }
            Self::CalculatedPhase2 { clip_count } => {
                write!(f, "Calculated ({clip_count} events)")
            }
        }
    }
}

/// Token identifying a scheduled transition.
///
/// Tokens from superseded transitions no longer match the machine's current
/// generation and are ignored when presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// Status state machine.
///
/// Holds the current state, the sticky "has calculated at least once"
/// session flag and the generation counter that invalidates stale timers.
#[derive(Debug)]
pub struct StatusMachine {
    state: StatusState,
    has_calculated: bool,
    generation: u64,
}

impl StatusMachine {
    /// Create a machine in the `Ready` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: StatusState::Ready,
            has_calculated: false,
            generation: 0,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> StatusState {
        self.state
    }

    /// Whether a calculation has completed at least once this session.
    ///
    /// Sticky: once set it stays set, and `Ready` re-renders with a muted
    /// "last calculated" indicator afterwards.
    #[must_use]
    pub fn has_calculated(&self) -> bool {
        self.has_calculated
    }

    /// A new clip list was detected.
    ///
    /// Enters `Detecting` and supersedes any pending timed transition. The
    /// returned token arms the delayed calculation.
    pub fn clips_detected(&mut self, clip_count: usize) -> (StatusState, TimerToken) {
        self.generation += 1;
        self.state = StatusState::Detecting { clip_count };
        (self.state, TimerToken(self.generation))
    }

    /// The detect-delay timer fired.
    ///
    /// Returns `true` when the token is still current and the machine is
    /// still detecting, i.e. the caller should aggregate now.
    #[must_use]
    pub fn detect_elapsed(&self, token: TimerToken) -> bool {
        token.0 == self.generation && matches!(self.state, StatusState::Detecting { .. })
    }

    /// Aggregation finished.
    ///
    /// Enters `CalculatedPhase1`, sets the sticky flag and returns the token
    /// arming the phase-2 auto-transition.
    pub fn calculated(&mut self, clip_count: usize) -> (StatusState, TimerToken) {
        self.generation += 1;
        self.has_calculated = true;
        self.state = StatusState::CalculatedPhase1 { clip_count };
        (self.state, TimerToken(self.generation))
    }

    /// The phase-delay timer fired.
    ///
    /// Moves `CalculatedPhase1` to `CalculatedPhase2` with the same clip
    /// count. Stale tokens return `None` and change nothing.
    pub fn phase_elapsed(&mut self, token: TimerToken) -> Option<StatusState> {
        if token.0 != self.generation {
            return None;
        }
        match self.state {
            StatusState::CalculatedPhase1 { clip_count } => {
                self.state = StatusState::CalculatedPhase2 { clip_count };
                Some(self.state)
            }
            _ => None,
        }
    }

    /// Changed content failed parsing or contained no valid clips.
    ///
    /// Drops back to `Ready` unconditionally, cancelling any in-flight
    /// detecting/calculated display.
    pub fn invalid_content(&mut self) -> StatusState {
        self.generation += 1;
        self.state = StatusState::Ready;
        self.state
    }

    /// Steady-state tick: content identical to the last check.
    ///
    /// In a calculated phase nothing changes (no flicker). If the session
    /// has calculated before and the state drifted back to `Ready` while
    /// valid cached clips exist, re-enter `CalculatedPhase2` without
    /// recomputation.
    pub fn unchanged_tick(&mut self, cached_clips: usize) -> Option<StatusState> {
        match self.state {
            StatusState::CalculatedPhase1 { .. } | StatusState::CalculatedPhase2 { .. } => None,
            StatusState::Ready if self.has_calculated && cached_clips > 0 => {
                self.generation += 1;
                self.state = StatusState::CalculatedPhase2 {
                    clip_count: cached_clips,
                };
                Some(self.state)
            }
            _ => None,
        }
    }
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let machine = StatusMachine::new();
        assert_eq!(machine.state(), StatusState::Ready);
        assert!(!machine.has_calculated());
    }

    #[test]
    fn test_full_cycle() {
        let mut machine = StatusMachine::new();

        let (state, detect_token) = machine.clips_detected(3);
        assert_eq!(state, StatusState::Detecting { clip_count: 3 });
        assert!(machine.detect_elapsed(detect_token));

        let (state, phase_token) = machine.calculated(3);
        assert_eq!(state, StatusState::CalculatedPhase1 { clip_count: 3 });
        assert!(machine.has_calculated());

        let state = machine.phase_elapsed(phase_token);
        assert_eq!(state, Some(StatusState::CalculatedPhase2 { clip_count: 3 }));
    }

    #[test]
    fn test_phase_transition_keeps_clip_count() {
        let mut machine = StatusMachine::new();
        let (_, token) = machine.calculated(7);
        assert_eq!(
            machine.phase_elapsed(token),
            Some(StatusState::CalculatedPhase2 { clip_count: 7 })
        );
    }

    #[test]
    fn test_newer_detection_cancels_pending_phase() {
        let mut machine = StatusMachine::new();
        let (_, stale_token) = machine.calculated(2);

        // A new copy arrives before the phase timer fires.
        let (_, _detect_token) = machine.clips_detected(5);

        assert_eq!(machine.phase_elapsed(stale_token), None);
        assert_eq!(machine.state(), StatusState::Detecting { clip_count: 5 });
    }

    #[test]
    fn test_newer_calculation_supersedes_stale_phase_timer() {
        let mut machine = StatusMachine::new();
        let (_, first_token) = machine.calculated(2);
        let (_, second_token) = machine.calculated(4);

        // The first timer fires late; nothing must change.
        assert_eq!(machine.phase_elapsed(first_token), None);
        assert_eq!(
            machine.state(),
            StatusState::CalculatedPhase1 { clip_count: 4 }
        );

        assert_eq!(
            machine.phase_elapsed(second_token),
            Some(StatusState::CalculatedPhase2 { clip_count: 4 })
        );
    }

    #[test]
    fn test_stale_detect_token_ignored() {
        let mut machine = StatusMachine::new();
        let (_, first) = machine.clips_detected(1);
        let (_, second) = machine.clips_detected(2);

        assert!(!machine.detect_elapsed(first));
        assert!(machine.detect_elapsed(second));
    }

    #[test]
    fn test_invalid_content_resets_to_ready() {
        let mut machine = StatusMachine::new();
        let (_, token) = machine.calculated(3);
        machine.invalid_content();

        assert_eq!(machine.state(), StatusState::Ready);
        assert_eq!(machine.phase_elapsed(token), None);
        // The sticky flag survives the reset.
        assert!(machine.has_calculated());
    }

    #[test]
    fn test_unchanged_tick_no_flicker_in_calculated_phases() {
        let mut machine = StatusMachine::new();
        let (_, token) = machine.calculated(3);
        assert_eq!(machine.unchanged_tick(3), None);

        machine.phase_elapsed(token);
        assert_eq!(machine.unchanged_tick(3), None);
        assert_eq!(
            machine.state(),
            StatusState::CalculatedPhase2 { clip_count: 3 }
        );
    }

    #[test]
    fn test_unchanged_tick_reconciles_ready_with_cache() {
        let mut machine = StatusMachine::new();
        let (_, _) = machine.calculated(3);
        machine.invalid_content();
        assert_eq!(machine.state(), StatusState::Ready);

        let state = machine.unchanged_tick(3);
        assert_eq!(state, Some(StatusState::CalculatedPhase2 { clip_count: 3 }));
    }

    #[test]
    fn test_unchanged_tick_stays_ready_without_prior_calculation() {
        let mut machine = StatusMachine::new();
        assert_eq!(machine.unchanged_tick(3), None);
        assert_eq!(machine.state(), StatusState::Ready);
    }

    #[test]
    fn test_unchanged_tick_stays_ready_with_empty_cache() {
        let mut machine = StatusMachine::new();
        let (_, _) = machine.calculated(3);
        machine.invalid_content();

        assert_eq!(machine.unchanged_tick(0), None);
        assert_eq!(machine.state(), StatusState::Ready);
    }

    #[test]
    fn test_unchanged_tick_does_not_disturb_detecting() {
        let mut machine = StatusMachine::new();
        let (_, _) = machine.calculated(1);
        let (_, token) = machine.clips_detected(2);

        assert_eq!(machine.unchanged_tick(2), None);
        assert_eq!(machine.state(), StatusState::Detecting { clip_count: 2 });
        assert!(machine.detect_elapsed(token));
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusState::Ready.to_string(), "Ready");
        assert_eq!(
            StatusState::Detecting { clip_count: 4 }.to_string(),
            "Detected 4 events - calculating"
        );
        assert_eq!(
            StatusState::CalculatedPhase1 { clip_count: 4 }.to_string(),
            "Calculated! (4 events)"
        );
        assert_eq!(
            StatusState::CalculatedPhase2 { clip_count: 4 }.to_string(),
            "Calculated (4 events)"
        );
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&StatusState::Detecting { clip_count: 2 }).unwrap();
        assert!(json.contains("detecting"));
        assert!(json.contains("clip_count"));
    }
}
