// ============================================================================
// TIMBRES.RS - Timbre Registry (Synthesis Recipes)
// ============================================================================
//
// A timbre is a complete recipe for a sound's tone color:
// - The carrier waveform
// - The amplitudes of harmonic partials stacked above the fundamental
// - An ADSR envelope (attack/decay/sustain/release)
// - Optional extras: low-pass filter, waveshaper distortion, vibrato,
//   and a noise mix for breathy/airy sounds
//
// The registry is loosely organized like a General MIDI bank: pianos,
// guitars, strings, winds, synths, percussion, plus the four bare
// waveforms. Index 0 ("sine") is the default timbre: one oscillator, no
// harmonics, no extras - unknown timbre names fall back to it.
//
// HOW TO ADD A NEW TIMBRE:
// 1. Copy an existing entry in TIMBRE_REGISTRY
// 2. Give it a unique name and adjust waveform/harmonics/envelope to taste
// 3. The timbre is now selectable by name from the settings
// ============================================================================

// ============================================================================
// WAVEFORM
// ============================================================================

/// The carrier waveform shapes the synthesizer can produce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    /// Pure tone, no harmonics of its own - like a tuning fork
    Sine,

    /// Odd harmonics falling off quickly - soft and flute-like
    Triangle,

    /// Odd harmonics only - hollow, clarinet-like
    Square,

    /// All harmonics - bright and buzzy, the classic synth wave
    Sawtooth,
}

// ============================================================================
// OPTIONAL STAGES
// ============================================================================

/// Low-pass filter settings for a timbre
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterSpec {
    /// Cutoff frequency in Hz - everything above gets attenuated
    pub cutoff_hz: f32,

    /// Resonance (Q) - higher values emphasize the cutoff region
    pub q: f32,
}

/// Vibrato settings for a timbre
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VibratoSpec {
    /// Vibrato speed in Hz (typical instrumental vibrato is 5-7 Hz)
    pub rate_hz: f32,

    /// Pitch wobble depth as a fraction of the base frequency
    /// 0.1 means the pitch swings +-10%
    pub depth: f32,
}

// ============================================================================
// TIMBRE DEFINITION
// ============================================================================

/// A complete synthesis recipe
#[derive(Clone, Debug)]
pub struct TimbreDefinition {
    /// Unique name for this timbre (used in settings)
    pub name: &'static str,

    /// Instrument family, for display grouping only
    pub category: &'static str,

    /// The carrier waveform
    pub waveform: Waveform,

    /// Amplitudes of the harmonic series, starting at the fundamental.
    /// Entry k is the amplitude of the partial at frequency * (k + 1).
    /// Length 1 means a single plain oscillator.
    pub harmonics: &'static [f32],

    /// Attack time in seconds (silence to peak)
    pub attack: f32,

    /// Decay time in seconds (peak down to sustain level)
    pub decay: f32,

    /// Sustain level from 0.0 to 1.0 (a LEVEL, not a time)
    pub sustain: f32,

    /// Release time in seconds (sustain down to silence)
    pub release: f32,

    /// Optional low-pass filter stage
    pub filter: Option<FilterSpec>,

    /// Optional waveshaper distortion amount (0.0 to 1.0)
    pub distortion: Option<f32>,

    /// Optional vibrato on the carrier frequency
    pub vibrato: Option<VibratoSpec>,

    /// How much white noise to blend in (0.0 = none, 1.0 = only noise)
    pub noise_mix: f32,
}

// ============================================================================
// TIMBRE REGISTRY
// ============================================================================

/// The registry of all available timbres
/// Index 0 ("sine") is the default used for unknown names
pub static TIMBRE_REGISTRY: &[TimbreDefinition] = &[
    // -------------------------------------------------------------------------
    // Basic waveforms
    // One oscillator, short envelope, no extras. "sine" doubles as the
    // fallback timbre, so it must stay the plainest recipe in the table.
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "sine",
        category: "basic",
        waveform: Waveform::Sine,
        harmonics: &[1.0],
        attack: 0.01,
        decay: 0.1,
        sustain: 0.3,
        release: 0.1,
        filter: None,
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "triangle",
        category: "basic",
        waveform: Waveform::Triangle,
        harmonics: &[1.0],
        attack: 0.01,
        decay: 0.1,
        sustain: 0.3,
        release: 0.1,
        filter: None,
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "square",
        category: "basic",
        waveform: Waveform::Square,
        harmonics: &[1.0],
        attack: 0.01,
        decay: 0.1,
        sustain: 0.3,
        release: 0.1,
        filter: None,
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "sawtooth",
        category: "basic",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0],
        attack: 0.01,
        decay: 0.1,
        sustain: 0.3,
        release: 0.1,
        filter: None,
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },

    // -------------------------------------------------------------------------
    // Pianos
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "acoustic-grand",
        category: "piano",
        waveform: Waveform::Sine,
        harmonics: &[1.0, 0.3, 0.1, 0.05, 0.02],
        attack: 0.001,
        decay: 0.1,
        sustain: 0.3,
        release: 0.3,
        filter: Some(FilterSpec { cutoff_hz: 2000.0, q: 1.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "electric-piano",
        category: "piano",
        waveform: Waveform::Triangle,
        harmonics: &[1.0, 0.5, 0.2, 0.1],
        attack: 0.01,
        decay: 0.05,
        sustain: 0.4,
        release: 0.2,
        filter: Some(FilterSpec { cutoff_hz: 1500.0, q: 2.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },

    // -------------------------------------------------------------------------
    // Guitars and bass
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "acoustic-guitar",
        category: "guitar",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.4, 0.3, 0.2, 0.1, 0.05],
        attack: 0.005,
        decay: 0.15,
        sustain: 0.2,
        release: 0.2,
        filter: Some(FilterSpec { cutoff_hz: 800.0, q: 0.5 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "electric-guitar",
        category: "guitar",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.8, 0.6, 0.4, 0.3],
        attack: 0.01,
        decay: 0.1,
        sustain: 0.5,
        release: 0.1,
        filter: Some(FilterSpec { cutoff_hz: 1200.0, q: 3.0 }),
        distortion: Some(0.3),
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "bass-guitar",
        category: "bass",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.6, 0.3, 0.1],
        attack: 0.01,
        decay: 0.05,
        sustain: 0.6,
        release: 0.1,
        filter: Some(FilterSpec { cutoff_hz: 300.0, q: 1.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },

    // -------------------------------------------------------------------------
    // Strings - slow attacks and real vibrato
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "violin",
        category: "strings",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.4, 0.3, 0.2, 0.15, 0.1, 0.05],
        attack: 0.05,
        decay: 0.2,
        sustain: 0.7,
        release: 0.3,
        filter: Some(FilterSpec { cutoff_hz: 2500.0, q: 1.0 }),
        distortion: None,
        vibrato: Some(VibratoSpec { rate_hz: 6.0, depth: 0.1 }),
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "cello",
        category: "strings",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.5, 0.3, 0.2, 0.1],
        attack: 0.08,
        decay: 0.3,
        sustain: 0.6,
        release: 0.4,
        filter: Some(FilterSpec { cutoff_hz: 1500.0, q: 1.0 }),
        distortion: None,
        vibrato: Some(VibratoSpec { rate_hz: 5.0, depth: 0.08 }),
        noise_mix: 0.0,
    },

    // -------------------------------------------------------------------------
    // Winds and brass
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "flute",
        category: "wind",
        waveform: Waveform::Sine,
        harmonics: &[1.0, 0.2, 0.1, 0.05],
        attack: 0.02,
        decay: 0.1,
        sustain: 0.5,
        release: 0.2,
        filter: Some(FilterSpec { cutoff_hz: 3000.0, q: 0.8 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "saxophone",
        category: "wind",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.6, 0.4, 0.3, 0.2, 0.1],
        attack: 0.03,
        decay: 0.15,
        sustain: 0.6,
        release: 0.2,
        filter: Some(FilterSpec { cutoff_hz: 1800.0, q: 1.5 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "trumpet",
        category: "brass",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.8, 0.6, 0.4, 0.3, 0.2],
        attack: 0.01,
        decay: 0.05,
        sustain: 0.7,
        release: 0.1,
        filter: Some(FilterSpec { cutoff_hz: 2000.0, q: 2.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },

    // -------------------------------------------------------------------------
    // Synthesizers
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "synth-lead",
        category: "synth",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.7, 0.5, 0.3],
        attack: 0.01,
        decay: 0.1,
        sustain: 0.8,
        release: 0.1,
        filter: Some(FilterSpec { cutoff_hz: 1000.0, q: 3.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "synth-pad",
        category: "synth",
        waveform: Waveform::Sine,
        harmonics: &[1.0, 0.3, 0.2, 0.1],
        attack: 0.2,
        decay: 0.3,
        sustain: 0.6,
        release: 0.5,
        filter: Some(FilterSpec { cutoff_hz: 800.0, q: 1.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "synth-bass",
        category: "synth",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.5, 0.3],
        attack: 0.01,
        decay: 0.05,
        sustain: 0.7,
        release: 0.1,
        filter: Some(FilterSpec { cutoff_hz: 200.0, q: 2.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },

    // -------------------------------------------------------------------------
    // Percussion - zero sustain, the decay and release carry the sound
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "bell",
        category: "percussion",
        waveform: Waveform::Sine,
        harmonics: &[1.0, 0.8, 0.6, 0.4, 0.3, 0.2, 0.1],
        attack: 0.001,
        decay: 0.5,
        sustain: 0.0,
        release: 0.5,
        filter: Some(FilterSpec { cutoff_hz: 4000.0, q: 5.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "glockenspiel",
        category: "percussion",
        waveform: Waveform::Sine,
        harmonics: &[1.0, 0.9, 0.7, 0.5, 0.3],
        attack: 0.001,
        decay: 0.8,
        sustain: 0.0,
        release: 0.3,
        filter: Some(FilterSpec { cutoff_hz: 6000.0, q: 8.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },

    // -------------------------------------------------------------------------
    // Organs
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "organ",
        category: "organ",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.6, 0.4, 0.3, 0.2, 0.1],
        attack: 0.01,
        decay: 0.1,
        sustain: 0.8,
        release: 0.1,
        filter: Some(FilterSpec { cutoff_hz: 1500.0, q: 1.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "harpsichord",
        category: "organ",
        waveform: Waveform::Square,
        harmonics: &[1.0, 0.5, 0.3, 0.2, 0.1],
        attack: 0.001,
        decay: 0.05,
        sustain: 0.2,
        release: 0.1,
        filter: Some(FilterSpec { cutoff_hz: 3000.0, q: 2.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },

    // -------------------------------------------------------------------------
    // Ambient textures
    // -------------------------------------------------------------------------
    TimbreDefinition {
        name: "water",
        category: "ambient",
        waveform: Waveform::Sine,
        harmonics: &[1.0, 0.2, 0.1],
        attack: 0.001,
        decay: 0.3,
        sustain: 0.0,
        release: 0.5,
        filter: Some(FilterSpec { cutoff_hz: 1000.0, q: 1.0 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.0,
    },
    TimbreDefinition {
        name: "wind",
        category: "ambient",
        waveform: Waveform::Sawtooth,
        harmonics: &[1.0, 0.1, 0.05],
        attack: 0.5,
        decay: 0.5,
        sustain: 0.3,
        release: 1.0,
        filter: Some(FilterSpec { cutoff_hz: 500.0, q: 0.5 }),
        distortion: None,
        vibrato: None,
        noise_mix: 0.3,
    },
];

// ============================================================================
// LOOKUP FUNCTIONS
// ============================================================================

/// Finds a timbre by name (case-insensitive)
pub fn find_timbre_by_name(name: &str) -> Option<&'static TimbreDefinition> {
    TIMBRE_REGISTRY
        .iter()
        .find(|timbre| timbre.name.eq_ignore_ascii_case(name))
}

/// Looks up a timbre by name, falling back to the default timbre
/// ("sine", a plain single oscillator) for unknown names. Never fails.
pub fn timbre_or_default(name: &str) -> &'static TimbreDefinition {
    find_timbre_by_name(name).unwrap_or(&TIMBRE_REGISTRY[0])
}

/// Returns a list of all available timbre names
pub fn all_timbre_names() -> Vec<&'static str> {
    TIMBRE_REGISTRY.iter().map(|timbre| timbre.name).collect()
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_timbre_by_name() {
        assert!(find_timbre_by_name("sine").is_some());
        assert!(find_timbre_by_name("Acoustic-Grand").is_some()); // Case insensitive
        assert!(find_timbre_by_name("kazoo").is_none());
    }

    #[test]
    fn test_unknown_timbre_falls_back_to_plain_sine() {
        let fallback = timbre_or_default("kazoo");
        assert_eq!(fallback.name, "sine");
        assert_eq!(fallback.harmonics.len(), 1);
        assert!(fallback.filter.is_none());
        assert!(fallback.distortion.is_none());
        assert!(fallback.vibrato.is_none());
    }

    #[test]
    fn test_recipes_are_sane() {
        for timbre in TIMBRE_REGISTRY {
            assert!(!timbre.harmonics.is_empty(), "{} has no partials", timbre.name);
            for &amp in timbre.harmonics {
                assert!((0.0..=1.0).contains(&amp), "{} partial out of range", timbre.name);
            }
            assert!(timbre.attack >= 0.0);
            assert!(timbre.decay >= 0.0);
            assert!(timbre.release >= 0.0);
            assert!((0.0..=1.0).contains(&timbre.sustain));
            assert!((0.0..=1.0).contains(&timbre.noise_mix));
        }
    }
}
