// ============================================================================
// PATTERNS.RS - Combo Melody Pattern Registry
// ============================================================================
//
// A pattern is a melodic shape: an ordered list of scale-degree indices,
// independent of absolute pitch. When rapid tab switching triggers a
// combo, the engine plays notes from the active pattern instead of the
// raw per-site pitches, so the clicking turns into a little tune.
//
// Indices are taken modulo the active scale's length at resolution time,
// so a pattern written against an 8-note scale still works on a 12-note
// one (and vice versa).
//
// Unknown pattern names fall back to "scale-up" (the ascending run).
// ============================================================================

use crate::scales::ScaleDefinition;

// ============================================================================
// PATTERN DEFINITION
// ============================================================================

/// Defines a named melodic pattern
#[derive(Clone, Debug)]
pub struct PatternDefinition {
    /// Unique name for this pattern (used in settings)
    pub name: &'static str,

    /// Short description of the melodic shape
    pub description: &'static str,

    /// Scale-degree indices in playback order
    /// Values may exceed the scale length; they wrap at resolution time
    pub steps: &'static [usize],
}

// ============================================================================
// PATTERN REGISTRY
// ============================================================================
//
// Index 0 is the default pattern (ascending scale run).
// ============================================================================

/// The registry of all available combo patterns
pub static PATTERN_REGISTRY: &[PatternDefinition] = &[
    PatternDefinition {
        name: "scale-up",
        description: "Ascending scale run (default)",
        steps: &[0, 1, 2, 3, 4, 5, 6, 7],
    },
    PatternDefinition {
        name: "scale-down",
        description: "Descending scale run",
        steps: &[7, 6, 5, 4, 3, 2, 1, 0],
    },
    PatternDefinition {
        name: "arpeggio",
        description: "Triad arpeggio up and back down",
        steps: &[0, 2, 4, 7, 4, 2, 0],
    },
    PatternDefinition {
        name: "melody",
        description: "Twinkle-twinkle nursery melody",
        steps: &[0, 0, 4, 4, 5, 5, 4, 3, 3, 2, 2, 1, 1, 0],
    },
    // The 9 here wraps to degree 1 on an 8-note scale, landing an octave
    // feel at the top of the fanfare.
    PatternDefinition {
        name: "fanfare",
        description: "Bugle-call style flourish",
        steps: &[0, 4, 7, 9, 7, 4, 0],
    },
    PatternDefinition {
        name: "wave",
        description: "Rising two-steps-forward one-back contour",
        steps: &[0, 2, 1, 3, 2, 4, 3, 5, 4],
    },
    PatternDefinition {
        name: "jump",
        description: "Alternating wide leaps",
        steps: &[0, 4, 1, 5, 2, 6, 3, 7],
    },
    PatternDefinition {
        name: "cascade",
        description: "Stair-stepping climb",
        steps: &[0, 1, 0, 2, 1, 3, 2, 4, 3, 5],
    },
];

// ============================================================================
// LOOKUP AND RESOLUTION
// ============================================================================

/// Finds a pattern by name (case-insensitive)
pub fn find_pattern_by_name(name: &str) -> Option<&'static PatternDefinition> {
    PATTERN_REGISTRY
        .iter()
        .find(|pattern| pattern.name.eq_ignore_ascii_case(name))
}

/// Looks up a pattern by name, falling back to the default pattern
/// ("scale-up") for unknown names. Never fails.
pub fn pattern_or_default(name: &str) -> &'static PatternDefinition {
    find_pattern_by_name(name).unwrap_or(&PATTERN_REGISTRY[0])
}

/// Returns a list of all available pattern names
pub fn all_pattern_names() -> Vec<&'static str> {
    PATTERN_REGISTRY.iter().map(|pattern| pattern.name).collect()
}

/// Resolves a pattern against a scale, producing concrete frequencies.
/// Each step index is wrapped modulo the scale length.
pub fn resolve_pattern(pattern: &PatternDefinition, scale: &ScaleDefinition) -> Vec<f32> {
    pattern
        .steps
        .iter()
        .map(|&step| scale.frequencies[step % scale.frequencies.len()])
        .collect()
}

// ============================================================================
// UNIT TESTS
// ============================================================================
