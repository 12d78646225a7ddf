// ============================================================================
// COMBO.RS - Combo State Machine
// ============================================================================
//
// Rapid tab switching becomes a melody. Every trigger is classified
// against a sliding time window (default 2000 ms since the previous
// trigger):
//
// - Inside the window: the trigger CONTINUES a combo. What plays depends
//   on the mode:
//     * Continuous mode substitutes the next note of the active pattern
//       for the raw per-site pitch.
//     * Completion mode plays the raw pitch immediately and saves the
//       payoff for the end: when the combo times out with at least two
//       accumulated notes, the whole pattern plays as a fast run.
// - Outside the window: the trigger STARTS a new combo. The raw pitch
//   plays as a normal, non-combo tone, and the note still seeds the
//   combo list so a follow-up trigger lands on pattern step 1.
//
// TIMING MODEL:
// The tracker owns no timers and never reads a clock. Callers pass
// timestamps in, and the pending reset "timer" is just a deadline the
// host polls. Overwriting the deadline on each trigger is the atomic
// cancel-and-reschedule: there is never a moment with two pending resets.
//
// When the deadline expires the note list is cleared and the
// last-trigger timestamp is erased entirely (None, reported as 0). That
// erasure is intentional: the next trigger is always treated as a combo
// start, even if it arrives quickly after the reset fired, so a combo
// can never "resume" across a full cooldown.
// ============================================================================

/// Default combo window: triggers closer together than this continue a combo
pub const DEFAULT_COMBO_WINDOW_MS: u64 = 2000;

// ============================================================================
// COMBO MODE
// ============================================================================

/// The two combo behaviors. They are deliberately asymmetric and must
/// not be merged: continuous rewrites every combo note, completion
/// rewards the whole burst at the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComboMode {
    /// Substitute pattern notes per trigger
    Continuous,

    /// Raw notes per trigger, full pattern run on timeout
    Completion,
}

impl ComboMode {
    /// Parses a settings string; unknown values fall back to continuous
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "completion" => ComboMode::Completion,
            _ => ComboMode::Continuous,
        }
    }
}

// ============================================================================
// STATE
// ============================================================================

/// One recorded trigger inside the current combo
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComboNote {
    /// The raw frequency selected for the trigger
    pub frequency_hz: f32,

    /// When the trigger happened (caller-supplied milliseconds)
    pub timestamp_ms: u64,
}

/// What a trigger should cause the renderer to play
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerOutcome {
    /// Combo start (or standalone tone): play the raw frequency
    Normal { frequency_hz: f32 },

    /// Continuous-mode combo: play the pattern note at this index
    /// (wrapped modulo the pattern length by the caller)
    ComboNote { pattern_index: usize },

    /// Completion-mode combo: play the raw frequency now; the pattern
    /// run is owed later if the combo ends with enough notes
    ComboRaw { frequency_hz: f32 },
}

/// Fired when the reset deadline passes without a new trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComboExpiry {
    /// How many notes the combo had accumulated when it ended
    pub note_count: usize,
}

/// The combo state machine. Owns only plain data; completely
/// deterministic given the timestamps it is fed.
#[derive(Clone, Debug)]
pub struct ComboTracker {
    /// Notes accumulated in the current combo (oldest first)
    notes: Vec<ComboNote>,

    /// Timestamp of the last counted trigger. None means "no history":
    /// either nothing played yet or the reset erased it.
    last_trigger_ms: Option<u64>,

    /// When the pending reset fires, if one is scheduled
    reset_deadline_ms: Option<u64>,

    /// The sliding window length
    window_ms: u64,
}

impl ComboTracker {
    /// Creates a tracker with the given combo window
    pub fn new(window_ms: u64) -> Self {
        Self {
            notes: Vec::new(),
            last_trigger_ms: None,
            reset_deadline_ms: None,
            window_ms,
        }
    }

    /// Updates the window length. Takes effect from the next trigger;
    /// an already-scheduled reset deadline is left alone.
    pub fn set_window_ms(&mut self, window_ms: u64) {
        self.window_ms = window_ms.max(1);
    }

    /// Classifies a trigger and records it.
    ///
    /// The window comparison uses the previous trigger's timestamp;
    /// the timestamp is then updated to `now_ms` regardless of branch,
    /// and the reset deadline is rescheduled (cancelling any pending one).
    pub fn on_trigger(&mut self, frequency_hz: f32, now_ms: u64, mode: ComboMode) -> TriggerOutcome {
        let continues_combo = match self.last_trigger_ms {
            Some(last) => now_ms.saturating_sub(last) < self.window_ms,
            None => false,
        };

        let outcome = if continues_combo {
            self.notes.push(ComboNote { frequency_hz, timestamp_ms: now_ms });
            match mode {
                ComboMode::Continuous => TriggerOutcome::ComboNote {
                    pattern_index: self.notes.len() - 1,
                },
                ComboMode::Completion => TriggerOutcome::ComboRaw { frequency_hz },
            }
        } else {
            // New combo window: forget the old list, seed it with this note
            self.notes.clear();
            self.notes.push(ComboNote { frequency_hz, timestamp_ms: now_ms });
            TriggerOutcome::Normal { frequency_hz }
        };

        self.last_trigger_ms = Some(now_ms);
        self.reset_deadline_ms = Some(now_ms + self.window_ms);

        outcome
    }

    /// Checks the reset deadline. If it has passed, clears the combo and
    /// reports how many notes it held; the caller decides whether that
    /// earns a completion run. Returns None while the deadline is still
    /// in the future or nothing is pending.
    pub fn poll(&mut self, now_ms: u64) -> Option<ComboExpiry> {
        let deadline = self.reset_deadline_ms?;
        if now_ms < deadline {
            return None;
        }

        let note_count = self.notes.len();
        self.notes.clear();
        self.last_trigger_ms = None;
        self.reset_deadline_ms = None;

        Some(ComboExpiry { note_count })
    }

    /// Number of notes in the current combo
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// The recorded notes of the current combo, oldest first
    pub fn notes(&self) -> &[ComboNote] {
        &self.notes
    }

    /// Last counted trigger timestamp, 0 when there is none
    pub fn last_trigger_ms(&self) -> u64 {
        self.last_trigger_ms.unwrap_or(0)
    }

    /// The pending reset deadline, if any
    pub fn reset_deadline_ms(&self) -> Option<u64> {
        self.reset_deadline_ms
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ComboTracker {
        ComboTracker::new(DEFAULT_COMBO_WINDOW_MS)
    }

    #[test]
    fn test_mode_parsing_defaults_to_continuous() {
        assert_eq!(ComboMode::from_name("completion"), ComboMode::Completion);
        assert_eq!(ComboMode::from_name("Continuous"), ComboMode::Continuous);
        assert_eq!(ComboMode::from_name("whatever"), ComboMode::Continuous);
    }

    #[test]
    fn test_first_trigger_is_a_combo_start() {
        let mut combo = tracker();
        let outcome = combo.on_trigger(440.0, 0, ComboMode::Continuous);
        assert_eq!(outcome, TriggerOutcome::Normal { frequency_hz: 440.0 });
        assert_eq!(combo.note_count(), 1);
    }

    #[test]
    fn test_window_boundary_is_strict() {
        // 1999 ms after the previous trigger continues the combo
        let mut combo = tracker();
        combo.on_trigger(440.0, 0, ComboMode::Continuous);
        let outcome = combo.on_trigger(523.25, 1999, ComboMode::Continuous);
        assert_eq!(outcome, TriggerOutcome::ComboNote { pattern_index: 1 });
        assert_eq!(combo.note_count(), 2);

        // Exactly 2000 ms starts a new combo instead
        let mut combo = tracker();
        combo.on_trigger(440.0, 0, ComboMode::Continuous);
        let outcome = combo.on_trigger(523.25, 2000, ComboMode::Continuous);
        assert_eq!(outcome, TriggerOutcome::Normal { frequency_hz: 523.25 });
        assert_eq!(combo.note_count(), 1);
    }

    #[test]
    fn test_window_compares_against_latest_trigger() {
        // Three triggers each 1500 ms apart all chain, even though the
        // third is 3000 ms after the first
        let mut combo = tracker();
        combo.on_trigger(440.0, 0, ComboMode::Continuous);
        combo.on_trigger(440.0, 1500, ComboMode::Continuous);
        let outcome = combo.on_trigger(440.0, 3000, ComboMode::Continuous);
        assert_eq!(outcome, TriggerOutcome::ComboNote { pattern_index: 2 });
        assert_eq!(combo.note_count(), 3);
    }

    #[test]
    fn test_pattern_index_counts_all_combo_notes() {
        // Twelve chained triggers: the twelfth reports index 11, which a
        // five-step pattern wraps to step 1
        let mut combo = tracker();
        let mut last_outcome = combo.on_trigger(440.0, 0, ComboMode::Continuous);
        for i in 1..12 {
            last_outcome = combo.on_trigger(440.0, i as u64 * 100, ComboMode::Continuous);
        }
        assert_eq!(last_outcome, TriggerOutcome::ComboNote { pattern_index: 11 });
        assert_eq!(11 % 5, 1);
    }

    #[test]
    fn test_completion_mode_plays_raw_notes() {
        let mut combo = tracker();
        combo.on_trigger(440.0, 0, ComboMode::Completion);
        let outcome = combo.on_trigger(329.63, 500, ComboMode::Completion);
        assert_eq!(outcome, TriggerOutcome::ComboRaw { frequency_hz: 329.63 });
    }

    #[test]
    fn test_expiry_clears_state_and_reports_count() {
        let mut combo = tracker();
        combo.on_trigger(440.0, 0, ComboMode::Completion);
        combo.on_trigger(440.0, 500, ComboMode::Completion);
        combo.on_trigger(440.0, 1000, ComboMode::Completion);

        // Not yet: deadline is 1000 + 2000
        assert_eq!(combo.poll(2999), None);

        let expiry = combo.poll(3001).expect("deadline has passed");
        assert_eq!(expiry.note_count, 3);
        assert_eq!(combo.note_count(), 0);
        assert_eq!(combo.last_trigger_ms(), 0);
        assert_eq!(combo.poll(4000), None); // Nothing left pending
    }

    #[test]
    fn test_no_combo_resume_after_reset() {
        // A trigger soon after the reset FIRED (but long after the last
        // trigger) must start fresh: the erased timestamp guarantees it
        let mut combo = tracker();
        combo.on_trigger(440.0, 0, ComboMode::Continuous);
        combo.on_trigger(440.0, 1000, ComboMode::Continuous);
        combo.poll(3001).expect("combo expired");

        let outcome = combo.on_trigger(440.0, 3100, ComboMode::Continuous);
        assert_eq!(outcome, TriggerOutcome::Normal { frequency_hz: 440.0 });
        assert_eq!(combo.note_count(), 1);
    }

    #[test]
    fn test_deadline_is_rescheduled_per_trigger() {
        let mut combo = tracker();
        combo.on_trigger(440.0, 0, ComboMode::Continuous);
        assert_eq!(combo.reset_deadline_ms(), Some(2000));

        combo.on_trigger(440.0, 1500, ComboMode::Continuous);
        // The earlier deadline is gone, only the rescheduled one remains
        assert_eq!(combo.reset_deadline_ms(), Some(3500));
        assert_eq!(combo.poll(2500), None);
    }

    #[test]
    fn test_recorded_notes_keep_frequency_and_time() {
        let mut combo = tracker();
        combo.on_trigger(440.0, 100, ComboMode::Completion);
        combo.on_trigger(523.25, 600, ComboMode::Completion);

        let notes = combo.notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].frequency_hz, 440.0);
        assert_eq!(notes[0].timestamp_ms, 100);
        assert_eq!(notes[1].frequency_hz, 523.25);
        assert_eq!(notes[1].timestamp_ms, 600);
    }

    #[test]
    fn test_custom_window_length() {
        let mut combo = ComboTracker::new(500);
        combo.on_trigger(440.0, 0, ComboMode::Continuous);
        let outcome = combo.on_trigger(440.0, 499, ComboMode::Continuous);
        assert!(matches!(outcome, TriggerOutcome::ComboNote { .. }));

        let mut combo = ComboTracker::new(500);
        combo.on_trigger(440.0, 0, ComboMode::Continuous);
        let outcome = combo.on_trigger(440.0, 500, ComboMode::Continuous);
        assert!(matches!(outcome, TriggerOutcome::Normal { .. }));
    }
}
