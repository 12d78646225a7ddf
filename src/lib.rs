// ============================================================================
// TABCHIME - Tab-Switch Chime Engine
// ============================================================================
//
// Short synthesized tones for tab switches, with a combo system that
// turns rapid switching into melodies. The host environment (the
// extension shell, or the demo binary in this repo) drives everything
// through engine::ChimeEngine:
//
//   trigger event -> selector (domain hash / tab position)
//                 -> combo state machine (normal vs combo, pattern pick)
//                 -> renderer (plan notes against the sample clock)
//                 -> output (miniaudio device) or offline buffer
//
// The leaf tables (scales, patterns, timbres) are static registries with
// silent fallbacks; all timing comes from caller-supplied timestamps, so
// the whole decision path is deterministic and unit-testable.
// ============================================================================

pub mod combo;
pub mod effects;
pub mod engine;
pub mod envelope;
pub mod helper;
pub mod output;
pub mod patterns;
pub mod renderer;
pub mod scales;
pub mod selector;
pub mod settings;
pub mod timbres;
pub mod voice;
pub mod wav;
