// ============================================================================
// ENVELOPE.RS - ADSR Envelope Planning and Evaluation
// ============================================================================
//
// An envelope shapes a note's loudness over time: ramp up (attack), dip
// to a holding level (decay), hold (sustain), fade out (release).
//
// Chime notes are different from held instrument notes in one important
// way: the total duration is always known up front. So instead of a
// phase-by-phase state machine driven by note-off events, the envelope
// here is a PLAN - stage lengths are computed once when the note is
// scheduled, and evaluation is a pure function of elapsed time. That
// keeps the timing math testable without rendering a single sample.
//
// TIME BUDGET CLAMPING:
// A timbre may ask for attack+decay+release longer than the note itself
// (a 1-second release on a 0.15-second combo note). The plan scales the
// three timed stages proportionally so they exactly fill the duration
// and the sustain hold collapses to zero. The envelope's total length
// always equals the note duration - never more, never negative.
//
// CURVES:
// Attack is linear. Decay and release use the exponential curve, which
// sounds natural for fades. The sustain target is clamped away from
// exact zero so zero-sustain timbres (bells) can't produce degenerate
// ramp targets.
// ============================================================================

use crate::helper::{exponential_interpolation, lerp};

/// Curve strength for the decay and release stages
const FADE_CURVE_STRENGTH: f32 = 2.0;

/// Sustain gain floor. Zero-sustain timbres hold here instead of at
/// exactly 0.0, mirroring how ramp targets must stay positive.
const MIN_SUSTAIN_GAIN: f32 = 0.0001;

// ============================================================================
// ENVELOPE PLAN
// ============================================================================

/// A fully resolved amplitude contour for one note.
/// All times are in seconds from the note's start.
#[derive(Clone, Copy, Debug)]
pub struct EnvelopePlan {
    /// Attack stage length (possibly clamped)
    pub attack_s: f32,

    /// Decay stage length (possibly clamped)
    pub decay_s: f32,

    /// Sustain hold length (zero when the timed stages fill the note)
    pub hold_s: f32,

    /// Release stage length (possibly clamped)
    pub release_s: f32,

    /// The gain reached at the top of the attack
    pub peak_gain: f32,

    /// The gain held during sustain (sustain level * peak, floored)
    pub sustain_gain: f32,
}

impl EnvelopePlan {
    /// Builds the plan for a note of the given duration.
    ///
    /// `sustain_level` is the timbre's 0..1 sustain; `peak_gain` is the
    /// overall loudness ceiling for the voice.
    pub fn new(
        attack: f32,
        decay: f32,
        sustain_level: f32,
        release: f32,
        duration_s: f32,
        peak_gain: f32,
    ) -> Self {
        let attack = attack.max(0.0);
        let decay = decay.max(0.0);
        let release = release.max(0.0);

        let timed_total = attack + decay + release;

        // Scale the timed stages down proportionally when they overrun
        // the note; otherwise whatever is left over becomes the hold
        let (attack_s, decay_s, release_s, hold_s) = if timed_total > duration_s {
            let factor = if timed_total > 0.0 { duration_s / timed_total } else { 0.0 };
            (attack * factor, decay * factor, release * factor, 0.0)
        } else {
            (attack, decay, release, duration_s - timed_total)
        };

        let sustain_gain = (sustain_level.clamp(0.0, 1.0) * peak_gain).max(MIN_SUSTAIN_GAIN);

        Self {
            attack_s,
            decay_s,
            hold_s,
            release_s,
            peak_gain,
            sustain_gain,
        }
    }

    /// Total envelope length - by construction exactly the note duration
    pub fn total_duration_s(&self) -> f32 {
        self.attack_s + self.decay_s + self.hold_s + self.release_s
    }

    /// Evaluates the amplitude at `t` seconds into the note.
    /// Returns 0.0 before the note starts and after it ends.
    pub fn amplitude_at(&self, t: f32) -> f32 {
        if t < 0.0 {
            return 0.0;
        }

        // ---- Attack: linear 0 -> peak ----
        if t < self.attack_s {
            return lerp(0.0, self.peak_gain, t / self.attack_s);
        }
        let after_attack = t - self.attack_s;

        // ---- Decay: exponential peak -> sustain ----
        if after_attack < self.decay_s {
            let progress = after_attack / self.decay_s;
            return exponential_interpolation(
                self.peak_gain,
                self.sustain_gain,
                progress,
                FADE_CURVE_STRENGTH,
            );
        }
        let after_decay = after_attack - self.decay_s;

        // ---- Sustain hold ----
        if after_decay < self.hold_s {
            return self.sustain_gain;
        }
        let into_release = after_decay - self.hold_s;

        // ---- Release: exponential sustain -> silence ----
        if into_release < self.release_s {
            let progress = into_release / self.release_s;
            return exponential_interpolation(
                self.sustain_gain,
                0.0,
                progress,
                FADE_CURVE_STRENGTH,
            );
        }

        0.0
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_fit_inside_duration() {
        // attack+decay+release = 0.6s against a 0.3s note: everything
        // scales by 0.5 and the hold disappears
        let plan = EnvelopePlan::new(0.2, 0.2, 0.5, 0.2, 0.3, 0.15);

        assert!((plan.attack_s - 0.1).abs() < 1e-6);
        assert!((plan.decay_s - 0.1).abs() < 1e-6);
        assert!((plan.release_s - 0.1).abs() < 1e-6);
        assert_eq!(plan.hold_s, 0.0);
        assert!((plan.total_duration_s() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_leftover_time_becomes_hold() {
        let plan = EnvelopePlan::new(0.01, 0.1, 0.8, 0.1, 1.0, 0.15);
        assert!((plan.hold_s - 0.79).abs() < 1e-6);
        assert!((plan.total_duration_s() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_amplitude_contour_shape() {
        let plan = EnvelopePlan::new(0.1, 0.1, 0.5, 0.1, 1.0, 0.2);

        assert_eq!(plan.amplitude_at(-0.5), 0.0);
        assert_eq!(plan.amplitude_at(0.0), 0.0);
        // Mid-attack is partway up
        let mid_attack = plan.amplitude_at(0.05);
        assert!(mid_attack > 0.0 && mid_attack < 0.2);
        // Top of attack is the peak
        assert!((plan.amplitude_at(0.1) - 0.2).abs() < 0.01);
        // During the hold we sit at sustain * peak
        assert!((plan.amplitude_at(0.5) - 0.1).abs() < 0.001);
        // Past the end: silence
        assert_eq!(plan.amplitude_at(1.01), 0.0);
    }

    #[test]
    fn test_zero_sustain_does_not_degenerate() {
        // Bell-style recipes have sustain 0; the contour must stay
        // finite and the hold must sit at the floor, not at -inf/NaN
        let plan = EnvelopePlan::new(0.001, 0.2, 0.0, 0.2, 1.0, 0.15);

        for step in 0..100 {
            let t = step as f32 * 0.01;
            let amplitude = plan.amplitude_at(t);
            assert!(amplitude.is_finite());
            assert!(amplitude >= 0.0);
        }
        assert!(plan.sustain_gain > 0.0);
    }

    #[test]
    fn test_all_zero_stage_times() {
        // An organ-like instant recipe on a short note: hold fills
        // everything, amplitude is just the sustain gain
        let plan = EnvelopePlan::new(0.0, 0.0, 1.0, 0.0, 0.5, 0.15);
        assert!((plan.hold_s - 0.5).abs() < 1e-6);
        assert!((plan.amplitude_at(0.25) - 0.15).abs() < 1e-6);
    }
}
