// ============================================================================
// VOICE.RS - Synthesis Voices and the Voice Pool
// ============================================================================
//
// A voice is one playing note: a carrier oscillator plus its harmonic
// partials, an envelope plan, and the timbre's optional filter,
// distortion, vibrato and noise stages. Voices are scheduled against the
// mixer's sample clock - each one knows its start and stop sample and is
// silent outside that range, so sequencing is sample-accurate no matter
// when the scheduling thread ran.
//
// SIGNAL PATH PER SAMPLE:
//   vibrato -> advance partial phases -> sum partials (+ noise)
//     -> low-pass filter -> distortion -> envelope gain
//
// VOICE POOL:
// A fixed pool of 8 reusable slots bounds the synthesis cost of frantic
// tab switching. Allocation prefers a free slot; when none is free the
// least-recently-used voice is cut off and reassigned. Voices also free
// themselves deterministically when the clock passes their stop sample.
// ============================================================================

use crate::effects::{BiquadCoefficients, BiquadState, DistortionShaper, VibratoLfo};
use crate::envelope::EnvelopePlan;
use crate::helper::{RandomNumberGenerator, TWO_PI, calculate_phase_increment, wrap_phase};
use crate::timbres::{TimbreDefinition, Waveform};

/// Number of reusable voice slots in the pool
pub const VOICE_POOL_SIZE: usize = 8;

/// Peak gain of a single voice. Kept low so several overlapping voices
/// and their send tails stay clear of clipping.
pub const VOICE_PEAK_GAIN: f32 = 0.15;

/// Gain staging for partials above the fundamental
const HARMONIC_LEVEL: f32 = 0.1;

// ============================================================================
// WAVEFORM EVALUATION
// ============================================================================

/// Evaluates one waveform shape at the given phase (0 to 2*PI)
#[inline]
fn waveform_sample(waveform: Waveform, phase: f32) -> f32 {
    let normalized = phase / TWO_PI;
    match waveform {
        Waveform::Sine => phase.sin(),
        Waveform::Triangle => {
            // Rises 0..0.5, falls 0.5..1.0
            if normalized < 0.5 {
                normalized * 4.0 - 1.0
            } else {
                3.0 - normalized * 4.0
            }
        }
        Waveform::Square => {
            if normalized < 0.5 { 1.0 } else { -1.0 }
        }
        Waveform::Sawtooth => normalized * 2.0 - 1.0,
    }
}

// ============================================================================
// VOICE
// ============================================================================

/// One instance of an oscillator+envelope(+effects) chain playing a note
#[derive(Clone, Debug)]
pub struct Voice {
    /// Whether this voice currently owns a scheduled note
    pub active: bool,

    /// Carrier frequency in Hz
    pub frequency_hz: f32,

    /// Carrier waveform for all partials
    waveform: Waveform,

    /// Partial amplitudes, index k plays at frequency * (k + 1)
    harmonics: &'static [f32],

    /// One phase accumulator per partial
    phases: Vec<f32>,

    /// Resolved amplitude contour for the note
    envelope: EnvelopePlan,

    /// Mixer clock sample at which the note begins
    pub start_sample: u64,

    /// Mixer clock sample at which the note ends
    pub stop_sample: u64,

    /// Mixer clock sample at which this slot was last allocated
    pub last_used_sample: u64,

    /// Optional per-voice low-pass filter
    filter: Option<(BiquadCoefficients, BiquadState)>,

    /// Optional distortion stage; the curve is kept across notes and
    /// only regenerated when the amount changes
    distortion: Option<DistortionShaper>,

    /// Whether the current note wants the distortion stage
    distortion_active: bool,

    /// Optional vibrato LFO
    vibrato: Option<VibratoLfo>,

    /// White-noise blend for breathy timbres
    noise_mix: f32,

    /// Noise source, seeded per slot so voices don't correlate
    rng: RandomNumberGenerator,

    sample_rate: u32,
}

impl Voice {
    /// Creates an idle voice for the given pool slot
    pub fn new(slot_index: usize, sample_rate: u32) -> Self {
        Self {
            active: false,
            frequency_hz: 440.0,
            waveform: Waveform::Sine,
            harmonics: &[1.0],
            phases: vec![0.0],
            envelope: EnvelopePlan::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            start_sample: 0,
            stop_sample: 0,
            last_used_sample: 0,
            filter: None,
            distortion: None,
            distortion_active: false,
            vibrato: None,
            noise_mix: 0.0,
            rng: RandomNumberGenerator::from_slot_index(slot_index),
            sample_rate,
        }
    }

    /// Arms this voice with a note. `start_sample` is an absolute mixer
    /// clock position; the voice stays silent until the clock reaches it.
    pub fn start(
        &mut self,
        frequency_hz: f32,
        duration_s: f32,
        timbre: &'static TimbreDefinition,
        start_sample: u64,
        allocated_at_sample: u64,
    ) {
        self.active = true;
        self.frequency_hz = frequency_hz;
        self.waveform = timbre.waveform;
        self.harmonics = timbre.harmonics;
        self.phases.clear();
        self.phases.resize(timbre.harmonics.len(), 0.0);
        self.envelope = EnvelopePlan::new(
            timbre.attack,
            timbre.decay,
            timbre.sustain,
            timbre.release,
            duration_s,
            VOICE_PEAK_GAIN,
        );
        self.start_sample = start_sample;
        self.stop_sample = start_sample + (duration_s * self.sample_rate as f32) as u64;
        self.last_used_sample = allocated_at_sample;

        self.filter = timbre
            .filter
            .map(|spec| {
                (
                    BiquadCoefficients::low_pass(spec.cutoff_hz, spec.q, self.sample_rate),
                    BiquadState::new(),
                )
            });

        // Reuse the distortion curve when the amount hasn't changed
        match timbre.distortion {
            Some(amount) => {
                let needs_new_curve = self
                    .distortion
                    .as_ref()
                    .map(|shaper| shaper.amount != amount)
                    .unwrap_or(true);
                if needs_new_curve {
                    self.distortion = Some(DistortionShaper::new(amount));
                }
                self.distortion_active = true;
            }
            None => self.distortion_active = false,
        }

        self.vibrato = timbre
            .vibrato
            .map(|spec| VibratoLfo::new(spec.rate_hz, spec.depth));

        self.noise_mix = timbre.noise_mix;
    }

    /// Cuts the voice off immediately (used by LRU reassignment)
    pub fn steal(&mut self) {
        self.active = false;
    }

    /// Renders one sample at the given mixer clock position
    pub fn render_sample(&mut self, clock_sample: u64) -> f32 {
        if !self.active || clock_sample < self.start_sample {
            return 0.0;
        }
        if clock_sample >= self.stop_sample {
            // Deterministic release of the slot once the scheduled stop
            // time has passed
            self.active = false;
            return 0.0;
        }

        // ---- Vibrato modulates the carrier for this sample ----
        let vibrato_multiplier = match self.vibrato.as_mut() {
            Some(lfo) => lfo.next_multiplier(self.sample_rate),
            None => 1.0,
        };
        let modulated_frequency = self.frequency_hz * vibrato_multiplier;

        // ---- Sum the partials ----
        let mut mixed = 0.0;
        for (k, &amplitude) in self.harmonics.iter().enumerate() {
            let partial_frequency = modulated_frequency * (k as f32 + 1.0);
            let increment = calculate_phase_increment(partial_frequency, self.sample_rate);
            self.phases[k] = wrap_phase(self.phases[k] + increment);

            let gain = if k == 0 { amplitude } else { amplitude * HARMONIC_LEVEL };
            mixed += waveform_sample(self.waveform, self.phases[k]) * gain;
        }

        // ---- Noise blend ----
        if self.noise_mix > 0.0 {
            mixed = mixed * (1.0 - self.noise_mix)
                + self.rng.next_float_bipolar() * self.noise_mix;
        }

        // ---- Filter ----
        if let Some((coefficients, state)) = self.filter.as_mut() {
            mixed = state.process(mixed, coefficients);
        }

        // ---- Distortion ----
        if self.distortion_active {
            if let Some(shaper) = self.distortion.as_ref() {
                mixed = shaper.shape(mixed);
            }
        }

        // ---- Envelope gain ----
        let elapsed_s =
            (clock_sample - self.start_sample) as f32 / self.sample_rate as f32;
        mixed * self.envelope.amplitude_at(elapsed_s)
    }
}

// ============================================================================
// VOICE POOL
// ============================================================================

/// Fixed pool of reusable voice slots with LRU reassignment
pub struct VoicePool {
    voices: Vec<Voice>,
}

impl VoicePool {
    /// Creates a pool of VOICE_POOL_SIZE idle voices
    pub fn new(sample_rate: u32) -> Self {
        let voices = (0..VOICE_POOL_SIZE)
            .map(|slot| Voice::new(slot, sample_rate))
            .collect();
        Self { voices }
    }

    /// Allocates a slot for a new note: a free voice when one exists,
    /// otherwise the least-recently-used voice is cut off and reused.
    pub fn allocate(&mut self, clock_sample: u64) -> &mut Voice {
        let index = match self.voices.iter().position(|voice| !voice.active) {
            Some(free_index) => free_index,
            None => {
                // All busy: reassign the slot that was allocated longest ago
                let (lru_index, _) = self
                    .voices
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, voice)| voice.last_used_sample)
                    .expect("pool is never empty");
                self.voices[lru_index].steal();
                lru_index
            }
        };

        let voice = &mut self.voices[index];
        voice.last_used_sample = clock_sample;
        voice
    }

    /// Renders and sums one sample from every active voice
    #[inline]
    pub fn render_sample(&mut self, clock_sample: u64) -> f32 {
        let mut sum = 0.0;
        for voice in &mut self.voices {
            if voice.active {
                sum += voice.render_sample(clock_sample);
            }
        }
        sum
    }

    /// Number of voices currently holding a note
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|voice| voice.active).count()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::SAMPLE_RATE;
    use crate::timbres::timbre_or_default;

    #[test]
    fn test_voice_is_silent_outside_its_window() {
        let mut voice = Voice::new(0, SAMPLE_RATE);
        voice.start(440.0, 0.1, timbre_or_default("sine"), 1000, 0);

        assert_eq!(voice.render_sample(0), 0.0);
        assert_eq!(voice.render_sample(999), 0.0);
        assert!(voice.active);

        // Past the stop sample the voice silences and frees itself
        let stop = voice.stop_sample;
        assert_eq!(voice.render_sample(stop), 0.0);
        assert!(!voice.active);
    }

    #[test]
    fn test_voice_produces_audio_mid_note() {
        let mut voice = Voice::new(0, SAMPLE_RATE);
        voice.start(440.0, 0.5, timbre_or_default("sine"), 0, 0);

        let mut peak = 0.0_f32;
        for clock in 0..(SAMPLE_RATE as u64 / 2) {
            peak = peak.max(voice.render_sample(clock).abs());
        }
        assert!(peak > 0.01, "expected audible output, got {peak}");
        assert!(peak <= VOICE_PEAK_GAIN + 0.01, "peak {peak} exceeds the gain ceiling");
    }

    #[test]
    fn test_harmonic_timbre_differs_from_plain_sine() {
        let mut plain = Voice::new(0, SAMPLE_RATE);
        let mut rich = Voice::new(1, SAMPLE_RATE);
        plain.start(440.0, 0.2, timbre_or_default("sine"), 0, 0);
        rich.start(440.0, 0.2, timbre_or_default("bell"), 0, 0);

        let mut difference = 0.0_f32;
        for clock in 0..4800 {
            difference += (plain.render_sample(clock) - rich.render_sample(clock)).abs();
        }
        assert!(difference > 0.1, "harmonic stack should change the waveform");
    }

    #[test]
    fn test_pool_prefers_free_slots() {
        let mut pool = VoicePool::new(SAMPLE_RATE);
        let timbre = timbre_or_default("sine");

        for i in 0..4 {
            let voice = pool.allocate(i);
            voice.start(440.0, 1.0, timbre, 0, i);
        }
        assert_eq!(pool.active_count(), 4);
    }

    #[test]
    fn test_pool_reassigns_least_recently_used() {
        let mut pool = VoicePool::new(SAMPLE_RATE);
        let timbre = timbre_or_default("sine");

        // Fill every slot, allocation times 0..7
        for i in 0..VOICE_POOL_SIZE as u64 {
            let voice = pool.allocate(i);
            voice.start(100.0 + i as f32, 10.0, timbre, 0, i);
        }
        assert_eq!(pool.active_count(), VOICE_POOL_SIZE);

        // The ninth note steals the oldest slot (allocated at time 0)
        let voice = pool.allocate(100);
        voice.start(999.0, 1.0, timbre, 100, 100);
        assert_eq!(pool.active_count(), VOICE_POOL_SIZE);

        let frequencies: Vec<f32> = pool
            .voices
            .iter()
            .map(|voice| voice.frequency_hz)
            .collect();
        assert!(frequencies.contains(&999.0));
        assert!(!frequencies.contains(&100.0), "LRU slot should have been stolen");
    }
}
