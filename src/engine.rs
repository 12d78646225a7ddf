// ============================================================================
// ENGINE.RS - The Chime Engine
// ============================================================================
//
// ChimeEngine ties everything together: settings, the combo state
// machine, the mixer and the audio device, all owned by one struct that
// the host drives through a small request contract:
//
//   PlayTone      - play one note               -> success flag
//   PlayCombo     - play a melody               -> success flag
//   TabActivated  - a tab switch happened       -> fire and forget
//   UpdateSettings- apply a config change       -> atomic
//   GetStatus     - snapshot of engine state
//
// DECIDE, THEN COMMIT:
// Trigger handling is split in two. decide_trigger() classifies the
// trigger, updates combo state and produces a note plan - pure data,
// no audio, fully testable with synthetic timestamps. Committing the
// plan to the mixer is a separate thin step. The split also gives the
// failure isolation the host needs: combo state is updated BEFORE the
// commit, so a dead audio device never desynchronizes combo timing.
//
// TIMERS:
// The engine owns no threads. The host supplies timestamps to
// on_tab_activated() and pumps poll() so the combo reset (and the
// completion-mode pattern run) can fire. Single-threaded and
// event-driven, exactly like the environment it was built for.
// ============================================================================

use std::sync::{Arc, Mutex};

use rand::Rng;

use crate::combo::{ComboMode, ComboTracker, TriggerOutcome};
use crate::helper::{SAMPLE_RATE, cents_to_multiplier};
use crate::output::AudioOutput;
use crate::patterns::{pattern_or_default, resolve_pattern};
use crate::renderer::{
    Mixer, PlaybackHandle, ScheduledNote, plan_duration_s, plan_note, plan_sequence,
};
use crate::scales::scale_or_default;
use crate::selector::{PositionContext, select_frequency};
use crate::settings::{ChimeSettings, DebugLevel, SettingsUpdate};
use crate::timbres::{TimbreDefinition, timbre_or_default};

// ============================================================================
// REQUEST CONTRACT
// ============================================================================

/// Requests the host can send to the engine
#[derive(Clone, Debug)]
pub enum EngineRequest {
    /// Play one tone at an explicit frequency
    PlayTone {
        frequency_hz: f32,
        duration_s: f32,
        timbre_name: Option<String>,
    },

    /// Play an ordered list of frequencies as a melody
    PlayCombo {
        frequencies: Vec<f32>,
        timbre_name: Option<String>,
    },

    /// A tab switch (or equivalent) happened
    TabActivated {
        identifier: String,
        position: Option<PositionContext>,
        now_ms: u64,
    },

    /// Apply a settings change
    UpdateSettings { update: SettingsUpdate },

    /// Ask for a state snapshot
    GetStatus,
}

/// Responses matching the requests
#[derive(Clone, Debug)]
pub enum EngineResponse {
    /// Result of a play request
    Played { success: bool },

    /// Fire-and-forget requests acknowledge with this
    Done,

    /// Snapshot for GetStatus
    Status(EngineStatus),
}

/// A snapshot of the engine's externally visible state
#[derive(Clone, Debug)]
pub struct EngineStatus {
    /// Whether the audio device is up
    pub audio_ready: bool,

    /// The active scale name
    pub current_scale: String,

    /// The active timbre name
    pub current_timbre: String,

    /// Notes accumulated in the current combo
    pub combo_note_count: usize,

    /// Timestamp of the last counted trigger (0 = none)
    pub last_play_timestamp_ms: u64,

    /// Triggers that produced a tone since the engine started
    pub total_plays: u64,
}

// ============================================================================
// THE ENGINE
// ============================================================================

/// The chime engine. One per process; owns all mutable core state.
pub struct ChimeEngine {
    settings: ChimeSettings,
    combo: ComboTracker,
    mixer: Arc<Mutex<Mixer>>,
    output: AudioOutput,
    total_plays: u64,
    last_play_ms: u64,
}

impl ChimeEngine {
    /// Creates an engine and tries to start the audio device.
    /// A missing device is not an error - the engine runs silent and
    /// every play request reports failure.
    pub fn new(settings: ChimeSettings) -> Self {
        let mixer = Arc::new(Mutex::new(Mixer::new(SAMPLE_RATE)));
        let output = AudioOutput::start(Arc::clone(&mixer));
        Self::assemble(settings, mixer, output)
    }

    /// Creates an engine without any audio device. Play requests report
    /// failure; everything else (combo state, planning) works normally.
    pub fn without_device(settings: ChimeSettings) -> Self {
        let mixer = Arc::new(Mutex::new(Mixer::new(SAMPLE_RATE)));
        let output = AudioOutput::disabled();
        Self::assemble(settings, mixer, output)
    }

    fn assemble(
        settings: ChimeSettings,
        mixer: Arc<Mutex<Mixer>>,
        output: AudioOutput,
    ) -> Self {
        mixer.lock().unwrap().configure_master(settings.master_params());
        let combo = ComboTracker::new(settings.combo_window_ms);

        if settings.debug_level >= DebugLevel::Basic {
            println!(
                "[ENGINE] initialized: scale={} timbre={} audio={}",
                settings.scale_name,
                settings.timbre_name,
                if output.available() { "ready" } else { "unavailable" }
            );
        }

        Self {
            settings,
            combo,
            mixer,
            output,
            total_plays: 0,
            last_play_ms: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Request dispatch
    // ------------------------------------------------------------------------

    /// Dispatches one request. Thin wrapper over the typed methods for
    /// hosts that prefer a single entry point.
    pub fn handle(&mut self, request: EngineRequest) -> EngineResponse {
        match request {
            EngineRequest::PlayTone { frequency_hz, duration_s, timbre_name } => {
                EngineResponse::Played {
                    success: self.play_tone(frequency_hz, duration_s, timbre_name.as_deref()),
                }
            }
            EngineRequest::PlayCombo { frequencies, timbre_name } => {
                EngineResponse::Played {
                    success: self.play_combo(&frequencies, timbre_name.as_deref()),
                }
            }
            EngineRequest::TabActivated { identifier, position, now_ms } => {
                self.on_tab_activated(&identifier, position, now_ms);
                EngineResponse::Done
            }
            EngineRequest::UpdateSettings { update } => {
                self.update_settings(update);
                EngineResponse::Done
            }
            EngineRequest::GetStatus => EngineResponse::Status(self.get_status()),
        }
    }

    // ------------------------------------------------------------------------
    // Direct playback
    // ------------------------------------------------------------------------

    /// Plays a single tone. Returns false (without touching any state)
    /// for non-finite or non-positive inputs, and false when the audio
    /// device is unavailable.
    pub fn play_tone(
        &mut self,
        frequency_hz: f32,
        duration_s: f32,
        timbre_name: Option<&str>,
    ) -> bool {
        if !valid_note(frequency_hz, duration_s) {
            return false;
        }
        let timbre = self.resolve_timbre(timbre_name);
        let plan = [plan_note(frequency_hz, duration_s, timbre)];
        self.commit_plan(&plan).is_some()
    }

    /// Plays an ordered list of frequencies as a sequenced melody with
    /// the configured note length and inter-note gap.
    pub fn play_combo(&mut self, frequencies: &[f32], timbre_name: Option<&str>) -> bool {
        if frequencies.is_empty() {
            return false;
        }
        for &frequency_hz in frequencies {
            if !valid_note(frequency_hz, self.settings.combo_note_duration_s) {
                return false;
            }
        }
        let timbre = self.resolve_timbre(timbre_name);
        let plan = plan_sequence(
            frequencies,
            self.settings.combo_note_duration_s,
            self.settings.note_gap_s,
            timbre,
        );
        self.commit_plan(&plan).is_some()
    }

    // ------------------------------------------------------------------------
    // Trigger handling
    // ------------------------------------------------------------------------

    /// A tab switch happened. Fire and forget: audio failure is
    /// swallowed here (combo state has already been updated by then).
    pub fn on_tab_activated(
        &mut self,
        identifier: &str,
        position: Option<PositionContext>,
        now_ms: u64,
    ) {
        if let Some(plan) = self.decide_trigger(identifier, position, now_ms) {
            let _ = self.commit_plan(&plan);
        }
    }

    /// Classifies a trigger and produces the notes it should play.
    /// This updates combo state and play statistics but produces no
    /// audio - the caller commits the returned plan. Returns None when
    /// the trigger is suppressed (disabled, blacklisted, debounced).
    pub fn decide_trigger(
        &mut self,
        identifier: &str,
        position: Option<PositionContext>,
        now_ms: u64,
    ) -> Option<Vec<ScheduledNote>> {
        if !self.settings.enabled {
            return None;
        }
        if self.settings.is_blacklisted(identifier) {
            if self.settings.debug_level >= DebugLevel::Verbose {
                println!("[ENGINE] {identifier} is blacklisted, skipping");
            }
            return None;
        }

        // Debounce: triggers inside the minimum interval are dropped
        // before they can touch combo timing
        let interval_ms = (self.settings.min_trigger_interval_s * 1000.0) as u64;
        if self.last_play_ms != 0 && now_ms.saturating_sub(self.last_play_ms) < interval_ms {
            return None;
        }

        let scale = scale_or_default(&self.settings.scale_name);
        let timbre = timbre_or_default(&self.settings.timbre_name);
        let frequency_hz =
            select_frequency(identifier, scale, self.settings.selection_mode, position);

        let plan = if self.settings.combo_enabled {
            let outcome = self
                .combo
                .on_trigger(frequency_hz, now_ms, self.settings.combo_mode);

            if self.settings.debug_level >= DebugLevel::Verbose {
                println!(
                    "[ENGINE] trigger {identifier} -> {frequency_hz:.2} Hz, combo depth {}",
                    self.combo.note_count()
                );
            }

            match outcome {
                TriggerOutcome::Normal { frequency_hz } => {
                    vec![plan_note(frequency_hz, self.settings.tone_duration_s(), timbre)]
                }
                TriggerOutcome::ComboNote { pattern_index } => {
                    // Continuous mode: the pattern replaces the raw pitch
                    let pattern = pattern_or_default(&self.settings.combo_pattern_name);
                    let melody = resolve_pattern(pattern, scale);
                    let substituted = melody[pattern_index % melody.len()];
                    vec![plan_note(
                        substituted,
                        self.settings.combo_note_duration_s,
                        timbre,
                    )]
                }
                TriggerOutcome::ComboRaw { frequency_hz } => {
                    // Completion mode: raw note now, pattern run later
                    vec![plan_note(
                        frequency_hz,
                        self.settings.combo_note_duration_s,
                        timbre,
                    )]
                }
            }
        } else {
            vec![plan_note(frequency_hz, self.settings.tone_duration_s(), timbre)]
        };

        self.last_play_ms = now_ms;
        self.total_plays += 1;

        Some(plan)
    }

    /// Checks the combo reset deadline. In completion mode an expired
    /// combo of at least two notes earns the full pattern as a fast run;
    /// the planned run (if any) is returned after being committed.
    pub fn poll(&mut self, now_ms: u64) -> Option<Vec<ScheduledNote>> {
        let expiry = self.combo.poll(now_ms)?;

        if self.settings.debug_level >= DebugLevel::Verbose {
            println!(
                "[ENGINE] combo window expired with {} notes",
                expiry.note_count
            );
        }

        if self.settings.combo_mode == ComboMode::Completion && expiry.note_count >= 2 {
            let scale = scale_or_default(&self.settings.scale_name);
            let pattern = pattern_or_default(&self.settings.combo_pattern_name);
            let timbre = timbre_or_default(&self.settings.timbre_name);
            let melody = resolve_pattern(pattern, scale);

            let plan = plan_sequence(
                &melody,
                self.settings.combo_note_duration_s,
                self.settings.note_gap_s,
                timbre,
            );

            if self.settings.debug_level >= DebugLevel::Basic {
                println!(
                    "[ENGINE] completion run: {} notes of {}",
                    plan.len(),
                    pattern.name
                );
            }

            let _ = self.commit_plan(&plan);
            return Some(plan);
        }

        None
    }

    // ------------------------------------------------------------------------
    // Settings and status
    // ------------------------------------------------------------------------

    /// Applies a settings change atomically. Later triggers see the new
    /// values; notes already committed to the mixer play out unchanged.
    pub fn update_settings(&mut self, update: SettingsUpdate) {
        update.apply(&mut self.settings);
        self.combo.set_window_ms(self.settings.combo_window_ms);
        self.mixer
            .lock()
            .unwrap()
            .configure_master(self.settings.master_params());

        if self.settings.debug_level >= DebugLevel::Basic {
            println!(
                "[ENGINE] settings updated: scale={} timbre={} mode={:?}",
                self.settings.scale_name, self.settings.timbre_name, self.settings.combo_mode
            );
        }
    }

    /// Snapshot of the engine's externally visible state
    pub fn get_status(&self) -> EngineStatus {
        EngineStatus {
            audio_ready: self.output.available(),
            current_scale: self.settings.scale_name.clone(),
            current_timbre: self.settings.timbre_name.clone(),
            combo_note_count: self.combo.note_count(),
            last_play_timestamp_ms: self.last_play_ms,
            total_plays: self.total_plays,
        }
    }

    /// Read access to the current settings
    pub fn settings(&self) -> &ChimeSettings {
        &self.settings
    }

    // ------------------------------------------------------------------------
    // Committing plans
    // ------------------------------------------------------------------------

    /// Commits a plan to the mixer. Returns None when the audio device
    /// is unavailable; the caller decides whether that matters.
    pub fn commit_plan(&mut self, plan: &[ScheduledNote]) -> Option<PlaybackHandle> {
        if !self.output.available() {
            return None;
        }

        // Optional humanization: nudge each note a few cents
        let detuned: Vec<ScheduledNote> = if self.settings.humanize_cents > 0.0 {
            let spread = self.settings.humanize_cents;
            let mut rng = rand::rng();
            plan.iter()
                .map(|note| {
                    let cents = rng.random_range(-spread..=spread);
                    ScheduledNote {
                        frequency_hz: note.frequency_hz * cents_to_multiplier(cents),
                        ..*note
                    }
                })
                .collect()
        } else {
            plan.to_vec()
        };

        let end_sample = self.mixer.lock().unwrap().commit(&detuned);
        Some(PlaybackHandle::new(
            Arc::clone(&self.mixer),
            end_sample,
            plan_duration_s(&detuned),
        ))
    }

    fn resolve_timbre(&self, requested: Option<&str>) -> &'static TimbreDefinition {
        match requested {
            Some(name) => timbre_or_default(name),
            None => timbre_or_default(&self.settings.timbre_name),
        }
    }
}

/// A playable note has a finite positive frequency and duration
fn valid_note(frequency_hz: f32, duration_s: f32) -> bool {
    frequency_hz.is_finite() && frequency_hz > 0.0 && duration_s.is_finite() && duration_s > 0.0
}

// ============================================================================
// UNIT TESTS
// ============================================================================
