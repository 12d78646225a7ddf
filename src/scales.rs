// ============================================================================
// SCALES.RS - Musical Scale Registry
// ============================================================================
//
// This module defines the named musical scales the chime engine can pick
// notes from. A scale is an ordered list of fundamental frequencies in Hz,
// by convention ascending.
//
// WHY FREQUENCIES AND NOT NOTE NAMES?
// The engine never needs note spelling - the selector just indexes into
// the table and the synthesizer consumes raw Hz. Storing frequencies keeps
// lookup trivial and makes the domain-hash mapping bit-for-bit stable.
//
// HOW TO ADD A NEW SCALE:
// 1. Add a new entry to the SCALE_REGISTRY array below
// 2. Give it a unique name and an ascending list of frequencies
// 3. The scale is now selectable by name from the settings
//
// Unknown scale names silently fall back to the default scale (index 0,
// pentatonic). That is deliberate: a stale name in stored settings must
// never break tab switching.
// ============================================================================

// ============================================================================
// SCALE DEFINITION
// ============================================================================

/// Defines a named musical scale
#[derive(Clone, Debug)]
pub struct ScaleDefinition {
    /// Unique name for this scale (used in settings)
    pub name: &'static str,

    /// Short description of the scale's character
    pub description: &'static str,

    /// The scale degrees as fundamental frequencies in Hz, ascending
    pub frequencies: &'static [f32],
}

// ============================================================================
// SCALE REGISTRY
// ============================================================================
//
// The master list of all available scales.
// Index 0 is the default scale used when no specific scale is requested
// or when an unknown name is looked up.
// ============================================================================

/// The registry of all available scales
pub static SCALE_REGISTRY: &[ScaleDefinition] = &[
    // -------------------------------------------------------------------------
    // Pentatonic (default)
    // Five-note scale spread over two octaves. Any two notes sound
    // consonant together, which matters because rapid tab switching
    // overlaps release tails.
    // -------------------------------------------------------------------------
    ScaleDefinition {
        name: "pentatonic",
        description: "Major pentatonic, always-consonant default",
        frequencies: &[261.63, 293.66, 329.63, 392.0, 440.0, 523.25, 587.33, 659.25],
    },
    ScaleDefinition {
        name: "major",
        description: "C major, bright and plain",
        frequencies: &[261.63, 293.66, 329.63, 349.23, 392.0, 440.0, 493.88, 523.25],
    },
    ScaleDefinition {
        name: "minor",
        description: "A natural minor, darker mood",
        frequencies: &[220.0, 246.94, 261.63, 293.66, 329.63, 349.23, 392.0, 440.0],
    },
    ScaleDefinition {
        name: "ambient",
        description: "Low, open voicing for background listening",
        frequencies: &[174.61, 196.0, 220.0, 261.63, 293.66, 349.23, 392.0, 440.0],
    },
    ScaleDefinition {
        name: "blues",
        description: "Hexatonic blues with the flat fifth",
        frequencies: &[174.61, 207.65, 233.08, 261.63, 311.13, 349.23, 392.0, 466.16],
    },
    ScaleDefinition {
        name: "harmonic",
        description: "A harmonic minor",
        frequencies: &[220.0, 246.94, 261.63, 293.66, 329.63, 349.23, 392.0, 440.0],
    },
    ScaleDefinition {
        name: "dorian",
        description: "D dorian mode",
        frequencies: &[293.66, 329.63, 349.23, 392.0, 440.0, 493.88, 523.25, 587.33],
    },
    ScaleDefinition {
        name: "lydian",
        description: "G lydian mode, floating quality",
        frequencies: &[392.0, 440.0, 493.88, 554.37, 587.33, 659.25, 698.46, 783.99],
    },
    ScaleDefinition {
        name: "whole_tone",
        description: "Whole tone, dreamlike and rootless",
        frequencies: &[261.63, 293.66, 329.63, 369.99, 415.30, 466.16, 523.25, 587.33],
    },
    // Twelve degrees instead of eight - the selector takes indices modulo
    // the scale length, so nothing else needs to know.
    ScaleDefinition {
        name: "chromatic",
        description: "All twelve semitones from middle C",
        frequencies: &[
            261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.0, 415.30, 440.0,
            466.16, 493.88,
        ],
    },
];

// ============================================================================
// LOOKUP FUNCTIONS
// ============================================================================

/// Finds a scale by name (case-insensitive)
/// Returns None if no scale with that name exists
pub fn find_scale_by_name(name: &str) -> Option<&'static ScaleDefinition> {
    SCALE_REGISTRY
        .iter()
        .find(|scale| scale.name.eq_ignore_ascii_case(name))
}

/// Looks up a scale by name, falling back to the default scale
/// (pentatonic) for unknown names. Never fails.
pub fn scale_or_default(name: &str) -> &'static ScaleDefinition {
    find_scale_by_name(name).unwrap_or(&SCALE_REGISTRY[0])
}

/// Returns a list of all available scale names
pub fn all_scale_names() -> Vec<&'static str> {
    SCALE_REGISTRY.iter().map(|scale| scale.name).collect()
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_scale_by_name() {
        assert!(find_scale_by_name("pentatonic").is_some());
        assert!(find_scale_by_name("PENTATONIC").is_some()); // Case insensitive
        assert!(find_scale_by_name("nonexistent").is_none());
    }

    #[test]
    fn test_unknown_scale_falls_back_to_default() {
        let fallback = scale_or_default("definitely-not-a-scale");
        assert_eq!(fallback.name, SCALE_REGISTRY[0].name);
        assert_eq!(fallback.name, "pentatonic");
    }

    #[test]
    fn test_all_scales_nonempty_and_positive() {
        for scale in SCALE_REGISTRY {
            assert!(!scale.frequencies.is_empty(), "{} is empty", scale.name);
            for &freq in scale.frequencies {
                assert!(freq > 0.0, "{} has a non-positive frequency", scale.name);
            }
        }
    }

    #[test]
    fn test_scale_names_unique() {
        let names = all_scale_names();
        for (i, a) in names.iter().enumerate() {
            for b in names.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
