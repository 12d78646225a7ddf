// ============================================================================
// SELECTOR.RS - Identifier to Frequency Selection
// ============================================================================
//
// This module decides which note a tab switch produces. Two modes:
//
// HASH MODE ("random"):
// A deterministic 32-bit hash of the identifier (usually the domain name)
// picks a scale degree. The same site always gets the same note - that
// mapping IS the feature, so the hash must be reproducible forever:
// fixed-width signed 32-bit arithmetic with wraparound, computed over the
// identifier's UTF-16 code units. No randomness, no time, no locale.
//
// POSITION MODE ("piano"):
// The tab's left-to-right rank maps onto a keyboard spanning several
// octaves of the active scale: leftmost tab = lowest note, rightmost tab
// = highest. Falls back to hash mode when no usable position context is
// available (single tab, or rank outside the window).
// ============================================================================

use crate::scales::ScaleDefinition;

/// How many octaves the piano-mode keyboard spans
pub const PIANO_OCTAVE_SPAN: u32 = 3;

// ============================================================================
// SELECTION MODE
// ============================================================================

/// Which note-selection strategy is active
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    /// Deterministic hash of the identifier ("random" in the settings UI)
    Hash,

    /// Tab position mapped across a multi-octave keyboard ("piano")
    Position,
}

impl SelectionMode {
    /// Parses a settings string; unknown values fall back to hash mode
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "piano" | "position" => SelectionMode::Position,
            _ => SelectionMode::Hash,
        }
    }
}

/// Position of the triggering item among its siblings
/// (e.g. tab index within the window, left to right)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionContext {
    /// 0-based rank of the current item
    pub rank: usize,

    /// Total number of items
    pub total: usize,
}

// ============================================================================
// THE HASH
// ============================================================================

/// Computes the 32-bit rolling hash of an identifier.
///
/// Per code unit: hash = ((hash << 5) - hash) + unit, i.e. hash*31 + unit,
/// wrapped to signed 32 bits at every step. The input is iterated as
/// UTF-16 code units so identifiers with non-ASCII characters hash the
/// same way across implementations.
pub fn identifier_hash(identifier: &str) -> i32 {
    let mut hash: i32 = 0;
    for code_unit in identifier.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(code_unit as i32);
    }
    hash
}

// ============================================================================
// FREQUENCY SELECTION
// ============================================================================

/// Selects the frequency for an identifier.
///
/// - Empty identifier maps to the first scale degree.
/// - Hash mode indexes the scale with abs(hash) mod length.
/// - Position mode spreads ranks across PIANO_OCTAVE_SPAN octaves and
///   falls back to hash mode without usable context.
///
/// There are no error conditions; every input maps to some frequency.
pub fn select_frequency(
    identifier: &str,
    scale: &ScaleDefinition,
    mode: SelectionMode,
    position: Option<PositionContext>,
) -> f32 {
    if identifier.is_empty() {
        return scale.frequencies[0];
    }

    if mode == SelectionMode::Position {
        if let Some(frequency) = position_frequency(scale, position) {
            return frequency;
        }
        // No usable position context - fall through to the hash
    }

    hash_frequency(identifier, scale)
}

/// Hash-mode selection: abs(hash) mod scale length
fn hash_frequency(identifier: &str, scale: &ScaleDefinition) -> f32 {
    let hash = identifier_hash(identifier);
    // unsigned_abs avoids the i32::MIN overflow corner of abs()
    let index = hash.unsigned_abs() as usize % scale.frequencies.len();
    scale.frequencies[index]
}

/// Position-mode selection across a multi-octave keyboard.
/// Returns None when the context can't place the item (caller falls back).
fn position_frequency(scale: &ScaleDefinition, position: Option<PositionContext>) -> Option<f32> {
    let context = position?;
    if context.total < 2 || context.rank >= context.total {
        return None;
    }

    let scale_length = scale.frequencies.len();
    let total_keys = scale_length * PIANO_OCTAVE_SPAN as usize;

    // Map rank 0..total-1 onto key 0..total_keys-1, left = low, right = high
    let span = (context.total - 1).max(1) as f32;
    let key_position =
        ((context.rank as f32 / span) * (total_keys - 1) as f32).floor() as usize;

    let octave = (key_position / scale_length) as u32;
    let degree = key_position % scale_length;

    Some(scale.frequencies[degree] * 2.0_f32.powi(octave as i32))
}

// ============================================================================
// TAB GROUP ACCENTS
// ============================================================================
//
// Tab groups get their own accent pitch derived from the group color,
// nudged by the group id so two groups of the same color stay apart.
// ============================================================================

/// Maps a tab-group color name and id to an accent frequency.
/// Unknown colors land on A4 (440 Hz).
pub fn group_accent_frequency(color: &str, group_id: u64) -> f32 {
    let base = match color.to_ascii_lowercase().as_str() {
        "grey" | "gray" => 220.0, // A3
        "blue" => 261.63,         // C4
        "red" => 293.66,          // D4
        "yellow" => 329.63,       // E4
        "green" => 349.23,        // F4
        "pink" => 392.0,          // G4
        "purple" => 440.0,        // A4
        "cyan" => 493.88,         // B4
        "orange" => 523.25,       // C5
        _ => 440.0,
    };

    // Small per-group offset so identically colored groups differ
    base + (group_id % 7) as f32 * 10.0
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scales::scale_or_default;

    #[test]
    fn test_mode_parsing_defaults_to_hash() {
        assert_eq!(SelectionMode::from_name("piano"), SelectionMode::Position);
        assert_eq!(SelectionMode::from_name("random"), SelectionMode::Hash);
        assert_eq!(SelectionMode::from_name("anything-else"), SelectionMode::Hash);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let scale = scale_or_default("pentatonic");
        let first = select_frequency("github.com", scale, SelectionMode::Hash, None);
        for _ in 0..10 {
            let again = select_frequency("github.com", scale, SelectionMode::Hash, None);
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_hash_known_values() {
        // hash("a") = 'a' = 97; hash("ab") = 97*31 + 98 = 3105
        assert_eq!(identifier_hash("a"), 97);
        assert_eq!(identifier_hash("ab"), 3105);
        assert_eq!(identifier_hash(""), 0);
    }

    #[test]
    fn test_hash_wraps_at_32_bits() {
        // Long strings overflow i32 many times over; the result must stay
        // a stable wrapped value, not saturate or panic
        let long_name = "a-fairly-long-domain-name-with-many-characters.example.com";
        let hash = identifier_hash(long_name);
        assert_eq!(hash, identifier_hash(long_name));
        // And distinct inputs should not collapse
        assert_ne!(hash, identifier_hash("other.example.com"));
    }

    #[test]
    fn test_hash_uses_utf16_code_units() {
        // A non-BMP character is two UTF-16 code units; hashing bytes or
        // chars would give a different answer than hashing code units
        let units: Vec<u16> = "\u{1F600}".encode_utf16().collect();
        assert_eq!(units.len(), 2);
        let mut expected: i32 = 0;
        for unit in units {
            expected = expected
                .wrapping_shl(5)
                .wrapping_sub(expected)
                .wrapping_add(unit as i32);
        }
        assert_eq!(identifier_hash("\u{1F600}"), expected);
    }

    #[test]
    fn test_empty_identifier_maps_to_first_degree() {
        let scale = scale_or_default("major");
        let frequency = select_frequency("", scale, SelectionMode::Hash, None);
        assert_eq!(frequency, scale.frequencies[0]);
    }

    #[test]
    fn test_hash_distribution_covers_all_degrees() {
        // 1000 domain-like strings on an 8-note scale must hit every
        // index at least once - guards against a systematic exclusion bug
        let scale = scale_or_default("pentatonic");
        let mut hits = [0_u32; 8];
        for i in 0..1000 {
            let domain = format!("site-{i}.example.com");
            let frequency = select_frequency(&domain, scale, SelectionMode::Hash, None);
            let index = scale
                .frequencies
                .iter()
                .position(|&f| f == frequency)
                .expect("selected frequency must be in the scale");
            hits[index] += 1;
        }
        for (index, &count) in hits.iter().enumerate() {
            assert!(count > 0, "scale degree {index} was never selected");
        }
    }

    #[test]
    fn test_position_mode_endpoints() {
        let scale = scale_or_default("pentatonic");
        let length = scale.frequencies.len();

        // Leftmost tab: lowest key = first degree, base octave
        let low = select_frequency(
            "a.com",
            scale,
            SelectionMode::Position,
            Some(PositionContext { rank: 0, total: 10 }),
        );
        assert_eq!(low, scale.frequencies[0]);

        // Rightmost tab: highest key = last degree, top octave
        let high = select_frequency(
            "b.com",
            scale,
            SelectionMode::Position,
            Some(PositionContext { rank: 9, total: 10 }),
        );
        let expected = scale.frequencies[length - 1] * 2.0_f32.powi(PIANO_OCTAVE_SPAN as i32 - 1);
        assert!((high - expected).abs() < 0.001);
    }

    #[test]
    fn test_position_mode_falls_back_to_hash() {
        let scale = scale_or_default("pentatonic");
        let hashed = select_frequency("github.com", scale, SelectionMode::Hash, None);

        // No context at all
        let no_context = select_frequency("github.com", scale, SelectionMode::Position, None);
        assert_eq!(no_context, hashed);

        // Single tab
        let single = select_frequency(
            "github.com",
            scale,
            SelectionMode::Position,
            Some(PositionContext { rank: 0, total: 1 }),
        );
        assert_eq!(single, hashed);

        // Rank outside the window
        let out_of_range = select_frequency(
            "github.com",
            scale,
            SelectionMode::Position,
            Some(PositionContext { rank: 5, total: 3 }),
        );
        assert_eq!(out_of_range, hashed);
    }

    #[test]
    fn test_group_accent_frequency() {
        assert_eq!(group_accent_frequency("blue", 0), 261.63);
        // Offset is id mod 7 times 10 Hz
        assert_eq!(group_accent_frequency("blue", 3), 261.63 + 30.0);
        // Unknown color lands on A4
        assert_eq!(group_accent_frequency("chartreuse", 0), 440.0);
    }
}
