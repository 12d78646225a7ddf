// ============================================================================
// SETTINGS.RS - Engine Configuration
// ============================================================================
//
// All tunable behavior lives in one closed, explicitly typed struct.
// The host (which owns persistence) hands values in; nothing here reads
// storage. Every recognized field is enumerated below with its default -
// there is no bag of untyped options, so an unrecognized key simply
// cannot reach the engine.
//
// Updates arrive as a SettingsUpdate: the same fields, each optional.
// apply() merges them in one shot with numeric clamping, so a settings
// change is atomic - triggers processed afterwards see the new values,
// and in-flight notes are unaffected.
// ============================================================================

use crate::combo::{ComboMode, DEFAULT_COMBO_WINDOW_MS};
use crate::effects::MasterParams;
use crate::helper::db_to_linear;
use crate::selector::SelectionMode;

// ============================================================================
// DEBUG LEVEL
// ============================================================================

/// How much diagnostic output the engine prints
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    /// Silent (production)
    Off,

    /// One line per played tone / combo event
    Basic,

    /// Everything, including trigger classification
    Verbose,
}

// ============================================================================
// SETTINGS
// ============================================================================

/// The complete engine configuration
#[derive(Clone, Debug)]
pub struct ChimeSettings {
    /// Master switch - disabled engines ignore triggers entirely
    pub enabled: bool,

    /// Active scale name (unknown names fall back to pentatonic)
    pub scale_name: String,

    /// Active timbre name (unknown names fall back to sine)
    pub timbre_name: String,

    /// Hash mode or piano-position mode
    pub selection_mode: SelectionMode,

    /// Whether rapid switching forms combos at all
    pub combo_enabled: bool,

    /// Continuous (pattern per trigger) or completion (run on timeout)
    pub combo_mode: ComboMode,

    /// Active combo pattern name (unknown names fall back to scale-up)
    pub combo_pattern_name: String,

    /// The combo window in milliseconds
    pub combo_window_ms: u64,

    /// Loudness/length feel from 0.0 to 1.0; scales the tone duration
    pub intensity: f32,

    /// Length of each note in a combo melody, seconds
    pub combo_note_duration_s: f32,

    /// Silence between combo melody notes, seconds
    pub note_gap_s: f32,

    /// Master output volume in dB (0 = full scale)
    pub master_volume_db: f32,

    /// Reverb send level (0.0 = off)
    pub reverb_wet: f32,

    /// Reverb tail length in seconds, mapped onto the room size
    pub reverb_decay_s: f32,

    /// Delay send level (0.0 = off)
    pub delay_wet: f32,

    /// Delay time in seconds
    pub delay_time_s: f32,

    /// Delay regeneration (0.0 to 0.9)
    pub delay_feedback: f32,

    /// Triggers closer together than this are ignored outright, seconds
    pub min_trigger_interval_s: f32,

    /// Random detune applied per note, in cents (0 = exact pitch)
    pub humanize_cents: f32,

    /// Identifiers that never chime
    pub blacklist: Vec<String>,

    /// Diagnostic output level
    pub debug_level: DebugLevel,
}

impl Default for ChimeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            scale_name: "pentatonic".to_string(),
            timbre_name: "sine".to_string(),
            selection_mode: SelectionMode::Hash,
            combo_enabled: true,
            combo_mode: ComboMode::Continuous,
            combo_pattern_name: "scale-up".to_string(),
            combo_window_ms: DEFAULT_COMBO_WINDOW_MS,
            intensity: 0.8,
            combo_note_duration_s: 0.15,
            note_gap_s: 0.05,
            master_volume_db: -12.0,
            reverb_wet: 0.25,
            reverb_decay_s: 2.2,
            delay_wet: 0.18,
            delay_time_s: 0.3,
            delay_feedback: 0.3,
            min_trigger_interval_s: 0.2,
            humanize_cents: 0.0,
            blacklist: Vec::new(),
            debug_level: DebugLevel::Off,
        }
    }
}

impl ChimeSettings {
    /// Length of a normal (non-combo) tone: intensity stretches it from
    /// 0.2s up to a hard cap of 0.8s
    pub fn tone_duration_s(&self) -> f32 {
        (0.2 + self.intensity * 0.4).min(0.8)
    }

    /// Converts the user-facing audio settings into master bus parameters
    pub fn master_params(&self) -> MasterParams {
        MasterParams {
            master_gain: db_to_linear(self.master_volume_db),
            delay_time_s: self.delay_time_s,
            delay_feedback: self.delay_feedback,
            delay_wet: self.delay_wet,
            // Decay seconds map onto the 0..1 room size (4s = max room)
            reverb_room: (self.reverb_decay_s / 4.0).clamp(0.0, 1.0),
            reverb_wet: self.reverb_wet,
        }
    }

    /// Whether an identifier is blacklisted from chiming
    pub fn is_blacklisted(&self, identifier: &str) -> bool {
        self.blacklist.iter().any(|entry| entry == identifier)
    }
}

// ============================================================================
// SETTINGS UPDATE
// ============================================================================

/// A partial settings change. Fields left as None keep their value.
#[derive(Clone, Debug, Default)]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    pub scale_name: Option<String>,
    pub timbre_name: Option<String>,
    pub selection_mode: Option<SelectionMode>,
    pub combo_enabled: Option<bool>,
    pub combo_mode: Option<ComboMode>,
    pub combo_pattern_name: Option<String>,
    pub combo_window_ms: Option<u64>,
    pub intensity: Option<f32>,
    pub combo_note_duration_s: Option<f32>,
    pub note_gap_s: Option<f32>,
    pub master_volume_db: Option<f32>,
    pub reverb_wet: Option<f32>,
    pub reverb_decay_s: Option<f32>,
    pub delay_wet: Option<f32>,
    pub delay_time_s: Option<f32>,
    pub delay_feedback: Option<f32>,
    pub min_trigger_interval_s: Option<f32>,
    pub humanize_cents: Option<f32>,
    pub blacklist: Option<Vec<String>>,
    pub debug_level: Option<DebugLevel>,
}

impl SettingsUpdate {
    /// Merges this update into the settings, clamping numeric values to
    /// their valid ranges. The merge is all-or-nothing: call it once and
    /// every change lands together.
    pub fn apply(self, settings: &mut ChimeSettings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(scale_name) = self.scale_name {
            settings.scale_name = scale_name;
        }
        if let Some(timbre_name) = self.timbre_name {
            settings.timbre_name = timbre_name;
        }
        if let Some(selection_mode) = self.selection_mode {
            settings.selection_mode = selection_mode;
        }
        if let Some(combo_enabled) = self.combo_enabled {
            settings.combo_enabled = combo_enabled;
        }
        if let Some(combo_mode) = self.combo_mode {
            settings.combo_mode = combo_mode;
        }
        if let Some(combo_pattern_name) = self.combo_pattern_name {
            settings.combo_pattern_name = combo_pattern_name;
        }
        if let Some(combo_window_ms) = self.combo_window_ms {
            settings.combo_window_ms = combo_window_ms.max(1);
        }
        if let Some(intensity) = self.intensity {
            settings.intensity = intensity.clamp(0.0, 1.0);
        }
        if let Some(duration) = self.combo_note_duration_s {
            settings.combo_note_duration_s = duration.clamp(0.02, 1.0);
        }
        if let Some(gap) = self.note_gap_s {
            settings.note_gap_s = gap.clamp(0.0, 1.0);
        }
        if let Some(volume) = self.master_volume_db {
            settings.master_volume_db = volume.clamp(-60.0, 0.0);
        }
        if let Some(wet) = self.reverb_wet {
            settings.reverb_wet = wet.clamp(0.0, 1.0);
        }
        if let Some(decay) = self.reverb_decay_s {
            settings.reverb_decay_s = decay.clamp(0.0, 4.0);
        }
        if let Some(wet) = self.delay_wet {
            settings.delay_wet = wet.clamp(0.0, 1.0);
        }
        if let Some(time) = self.delay_time_s {
            settings.delay_time_s = time.clamp(0.0, 2.0);
        }
        if let Some(feedback) = self.delay_feedback {
            settings.delay_feedback = feedback.clamp(0.0, 0.9);
        }
        if let Some(interval) = self.min_trigger_interval_s {
            settings.min_trigger_interval_s = interval.clamp(0.0, 5.0);
        }
        if let Some(cents) = self.humanize_cents {
            settings.humanize_cents = cents.clamp(0.0, 100.0);
        }
        if let Some(blacklist) = self.blacklist {
            settings.blacklist = blacklist;
        }
        if let Some(debug_level) = self.debug_level {
            settings.debug_level = debug_level;
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_duration_scales_with_intensity_and_caps() {
        let mut settings = ChimeSettings::default();

        settings.intensity = 0.0;
        assert!((settings.tone_duration_s() - 0.2).abs() < 1e-6);

        settings.intensity = 0.5;
        assert!((settings.tone_duration_s() - 0.4).abs() < 1e-6);

        settings.intensity = 1.0;
        assert!((settings.tone_duration_s() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let mut settings = ChimeSettings::default();
        let update = SettingsUpdate {
            scale_name: Some("minor".to_string()),
            intensity: Some(0.5),
            ..SettingsUpdate::default()
        };
        update.apply(&mut settings);

        assert_eq!(settings.scale_name, "minor");
        assert_eq!(settings.intensity, 0.5);
        // Untouched fields keep their defaults
        assert_eq!(settings.timbre_name, "sine");
        assert_eq!(settings.combo_window_ms, DEFAULT_COMBO_WINDOW_MS);
    }

    #[test]
    fn test_update_clamps_out_of_range_values() {
        let mut settings = ChimeSettings::default();
        let update = SettingsUpdate {
            intensity: Some(7.0),
            delay_feedback: Some(3.0),
            master_volume_db: Some(20.0),
            combo_window_ms: Some(0),
            ..SettingsUpdate::default()
        };
        update.apply(&mut settings);

        assert_eq!(settings.intensity, 1.0);
        assert_eq!(settings.delay_feedback, 0.9);
        assert_eq!(settings.master_volume_db, 0.0);
        assert_eq!(settings.combo_window_ms, 1);
    }

    #[test]
    fn test_blacklist_lookup() {
        let mut settings = ChimeSettings::default();
        settings.blacklist = vec!["ads.example.com".to_string()];

        assert!(settings.is_blacklisted("ads.example.com"));
        assert!(!settings.is_blacklisted("example.com"));
    }

    #[test]
    fn test_master_params_conversion() {
        let settings = ChimeSettings::default();
        let params = settings.master_params();

        // -12 dB is about 0.25 linear
        assert!((params.master_gain - 0.251).abs() < 0.01);
        assert_eq!(params.delay_wet, settings.delay_wet);
        assert!((params.reverb_room - 2.2 / 4.0).abs() < 1e-6);
    }
}
