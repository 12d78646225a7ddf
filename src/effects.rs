// ============================================================================
// EFFECTS.RS - Voice and Master Bus Effects
// ============================================================================
//
// Signal-shaping building blocks for the chime renderer:
//
// PER-VOICE (applied inside Voice, in this fixed order):
// - Low-pass biquad filter (timbre.filter)
// - Waveshaper distortion (timbre.distortion)
// - Vibrato LFO on the carrier frequency (timbre.vibrato)
//
// MASTER BUS (applied after all voices are mixed):
// - Master gain
// - Feedback delay send (echo)
// - Simple delay-buffer reverb send
// - Soft clipping as the final safety stage
//
// All filters and buffers are plain per-sample state machines - no
// allocation happens in the audio callback once a buffer exists.
// ============================================================================

use crate::helper::{PI, TWO_PI, lerp, soft_clip};

// ============================================================================
// BIQUAD LOW-PASS FILTER
// ============================================================================
//
// Standard second-order IIR filter. Coefficients follow the Audio EQ
// Cookbook low-pass formulas; processing uses transposed direct form II.
// ============================================================================

/// Biquad filter coefficients
#[derive(Clone, Copy, Debug, Default)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Calculates low-pass coefficients for the given cutoff and Q
    pub fn low_pass(cutoff_hz: f32, q: f32, sample_rate: u32) -> Self {
        // Keep the cutoff inside the representable range
        let nyquist = sample_rate as f32 * 0.5;
        let cutoff = cutoff_hz.clamp(10.0, nyquist * 0.99);
        let q = q.max(0.05);

        let w0 = 2.0 * PI * cutoff / sample_rate as f32;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let b0 = (1.0 - cos_w0) / 2.0;
        let b1 = 1.0 - cos_w0;
        let b2 = (1.0 - cos_w0) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Biquad filter state (the two delay slots)
#[derive(Clone, Copy, Debug, Default)]
pub struct BiquadState {
    z1: f32,
    z2: f32,
}

impl BiquadState {
    pub fn new() -> Self {
        Self { z1: 0.0, z2: 0.0 }
    }

    /// Processes one sample through the filter (transposed direct form II)
    #[inline]
    pub fn process(&mut self, input: f32, coefficients: &BiquadCoefficients) -> f32 {
        let output = coefficients.b0 * input + self.z1;
        self.z1 = coefficients.b1 * input - coefficients.a1 * output + self.z2;
        self.z2 = coefficients.b2 * input - coefficients.a2 * output;
        output
    }
}

// ============================================================================
// WAVESHAPER DISTORTION
// ============================================================================
//
// Nonlinear distortion through a precomputed transfer curve. The curve
// is generated once per distortion amount and reused for every sample of
// every note that wants that amount - the per-sample work is just a
// table lookup with linear interpolation.
// ============================================================================

/// Number of entries in a distortion transfer curve
const DISTORTION_CURVE_SIZE: usize = 2048;

/// A reusable distortion transfer curve for one amount value
#[derive(Clone, Debug)]
pub struct DistortionShaper {
    /// The amount this curve was generated for
    pub amount: f32,

    /// Transfer curve sampled over input -1.0 ..= 1.0
    curve: Vec<f32>,
}

impl DistortionShaper {
    /// Generates the transfer curve for a distortion amount (0.0 to 1.0)
    pub fn new(amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let degree = PI / 180.0;

        let curve = (0..DISTORTION_CURVE_SIZE)
            .map(|i| {
                let x = (i as f32 * 2.0) / (DISTORTION_CURVE_SIZE - 1) as f32 - 1.0;
                ((3.0 + amount) * x * 20.0 * degree) / (PI + amount * x.abs())
            })
            .collect();

        Self { amount, curve }
    }

    /// Shapes one sample through the curve
    #[inline]
    pub fn shape(&self, sample: f32) -> f32 {
        let clamped = sample.clamp(-1.0, 1.0);
        let position = (clamped + 1.0) * 0.5 * (DISTORTION_CURVE_SIZE - 1) as f32;
        let index = position as usize;
        let fraction = position - index as f32;

        if index + 1 < DISTORTION_CURVE_SIZE {
            lerp(self.curve[index], self.curve[index + 1], fraction)
        } else {
            self.curve[DISTORTION_CURVE_SIZE - 1]
        }
    }
}

// ============================================================================
// VIBRATO LFO
// ============================================================================
//
// A low-frequency sine oscillator that wobbles the carrier frequency.
// The multiplier form (1 + depth * sin) means depth 0.1 swings the pitch
// about ten percent either way.
// ============================================================================

/// Vibrato oscillator state for one voice
#[derive(Clone, Copy, Debug)]
pub struct VibratoLfo {
    /// LFO rate in Hz
    pub rate_hz: f32,

    /// Depth as a fraction of the carrier frequency
    pub depth: f32,

    /// Normalized phase (0 to 1)
    phase: f32,
}

impl VibratoLfo {
    pub fn new(rate_hz: f32, depth: f32) -> Self {
        Self { rate_hz, depth, phase: 0.0 }
    }

    /// Returns the frequency multiplier for the current sample and
    /// advances the LFO by one sample
    #[inline]
    pub fn next_multiplier(&mut self, sample_rate: u32) -> f32 {
        let multiplier = 1.0 + (self.phase * TWO_PI).sin() * self.depth;
        self.phase += self.rate_hz / sample_rate as f32;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        multiplier
    }
}

// ============================================================================
// EFFECT BUFFER
// ============================================================================
//
// A circular delay buffer with interpolated reads, used by the master
// bus sends. Allocated once, reused forever.
// ============================================================================

/// Circular buffer for delay-based effects
#[derive(Clone, Debug)]
pub struct EffectBuffer {
    buffer: Vec<f32>,
    write_position: usize,
}

impl EffectBuffer {
    /// Creates a buffer holding `size` samples of history
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            write_position: 0,
        }
    }

    /// Number of samples of history this buffer can hold
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Writes one sample and advances the write head
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_position] = sample;
        self.write_position = (self.write_position + 1) % self.buffer.len();
    }

    /// Reads `delay_samples` behind the write head with linear
    /// interpolation between neighbors
    #[inline]
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let length = self.buffer.len() as f32;
        let delay = delay_samples.clamp(0.0, length - 1.0);

        let mut position = self.write_position as f32 - delay;
        if position < 0.0 {
            position += length;
        }

        let index = position as usize % self.buffer.len();
        let next_index = (index + 1) % self.buffer.len();
        let fraction = position - position.floor();

        lerp(self.buffer[index], self.buffer[next_index], fraction)
    }

    /// Clears all history to silence
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_position = 0;
    }
}

// ============================================================================
// MASTER BUS
// ============================================================================
//
// Everything the mixed voice signal passes through on its way out:
// gain, delay send, reverb send, soft clip. Parameters are plain fields
// updated between callbacks; buffers are sized once for the longest
// supported delay (2 seconds).
// ============================================================================

/// Parameters for the master bus, already converted to linear units
#[derive(Clone, Copy, Debug)]
pub struct MasterParams {
    /// Overall output gain (linear, not dB)
    pub master_gain: f32,

    /// Echo delay time in seconds
    pub delay_time_s: f32,

    /// Echo regeneration (0.0 to 0.9)
    pub delay_feedback: f32,

    /// Echo level mixed into the output (0.0 = off)
    pub delay_wet: f32,

    /// Reverb room size (0.0 to 1.0, scales the buffer length)
    pub reverb_room: f32,

    /// Reverb level mixed into the output (0.0 = off)
    pub reverb_wet: f32,
}

impl Default for MasterParams {
    fn default() -> Self {
        Self {
            master_gain: 0.25,
            delay_time_s: 0.3,
            delay_feedback: 0.3,
            delay_wet: 0.0,
            reverb_room: 0.5,
            reverb_wet: 0.0,
        }
    }
}

/// Longest supported delay/reverb tail in seconds
const MAX_SEND_SECONDS: f32 = 2.0;

/// Internal regeneration of the reverb buffer
const REVERB_FEEDBACK: f32 = 0.55;

/// The master output bus
pub struct MasterBus {
    /// Current parameters
    pub params: MasterParams,

    sample_rate: u32,
    delay_buffer: EffectBuffer,
    reverb_buffer: EffectBuffer,
}

impl MasterBus {
    /// Creates a master bus with buffers sized for the longest sends
    pub fn new(sample_rate: u32) -> Self {
        let send_size = (sample_rate as f32 * MAX_SEND_SECONDS) as usize;
        Self {
            params: MasterParams::default(),
            sample_rate,
            delay_buffer: EffectBuffer::new(send_size),
            reverb_buffer: EffectBuffer::new(send_size),
        }
    }

    /// Replaces the bus parameters. Buffers keep their history so a
    /// parameter change doesn't cut tails short.
    pub fn configure(&mut self, params: MasterParams) {
        self.params = params;
    }

    /// Processes one mixed mono sample into a stereo frame
    #[inline]
    pub fn process(&mut self, mono: f32) -> (f32, f32) {
        let mut output = mono;

        // ---- Delay send ----
        if self.params.delay_wet > 0.0 {
            let delay_samples =
                (self.params.delay_time_s * self.sample_rate as f32).max(1.0);
            let echo = self.delay_buffer.read_interpolated(delay_samples);
            output += echo * self.params.delay_wet;
            self.delay_buffer
                .write(mono + echo * self.params.delay_feedback.clamp(0.0, 0.9));
        } else {
            // Keep the buffer advancing so old echoes age out
            self.delay_buffer.write(mono);
        }

        // ---- Reverb send (single-buffer, room size scales the length) ----
        if self.params.reverb_wet > 0.0 {
            let room_samples = (self.params.reverb_room.clamp(0.01, 1.0)
                * self.sample_rate as f32
                * MAX_SEND_SECONDS
                * 0.5)
                .max(1.0);
            let tail = self.reverb_buffer.read_interpolated(room_samples);
            output += tail * self.params.reverb_wet;
            self.reverb_buffer.write(mono + tail * REVERB_FEEDBACK);
        } else {
            self.reverb_buffer.write(mono);
        }

        // ---- Gain and final safety stage ----
        let shaped = soft_clip(output * self.params.master_gain);
        (shaped, shaped)
    }

    /// Silences all send tails
    pub fn clear(&mut self) {
        self.delay_buffer.clear();
        self.reverb_buffer.clear();
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::{SAMPLE_RATE, calculate_phase_increment, wrap_phase};

    /// Renders a sine at the given frequency through a filter and
    /// returns the output peak
    fn filtered_peak(frequency_hz: f32, coefficients: &BiquadCoefficients) -> f32 {
        let mut state = BiquadState::new();
        let mut phase = 0.0_f32;
        let increment = calculate_phase_increment(frequency_hz, SAMPLE_RATE);
        let mut peak = 0.0_f32;
        for i in 0..SAMPLE_RATE / 4 {
            let filtered = state.process(phase.sin(), coefficients);
            phase = wrap_phase(phase + increment);
            // Skip the settle-in period before measuring
            if i > SAMPLE_RATE / 8 {
                peak = peak.max(filtered.abs());
            }
        }
        peak
    }

    #[test]
    fn test_low_pass_attenuates_high_frequencies() {
        let coefficients = BiquadCoefficients::low_pass(1000.0, 0.707, SAMPLE_RATE);
        let low = filtered_peak(200.0, &coefficients);
        let high = filtered_peak(8000.0, &coefficients);

        assert!(low > 0.9, "passband should be nearly unity, got {low}");
        assert!(high < 0.1, "stopband should be heavily attenuated, got {high}");
    }

    #[test]
    fn test_distortion_curve_is_bounded_and_odd() {
        let shaper = DistortionShaper::new(0.5);
        for step in 0..100 {
            let x = step as f32 * 0.02 - 1.0;
            let y = shaper.shape(x);
            assert!(y.is_finite());
            assert!(y.abs() <= 1.5);
        }
        // The transfer curve passes near zero at zero input
        assert!(shaper.shape(0.0).abs() < 0.01);
        // And is roughly odd-symmetric
        assert!((shaper.shape(0.5) + shaper.shape(-0.5)).abs() < 0.01);
    }

    #[test]
    fn test_vibrato_multiplier_range() {
        let mut lfo = VibratoLfo::new(6.0, 0.1);
        let mut low = f32::MAX;
        let mut high = f32::MIN;
        for _ in 0..SAMPLE_RATE {
            let multiplier = lfo.next_multiplier(SAMPLE_RATE);
            low = low.min(multiplier);
            high = high.max(multiplier);
        }
        // A full second covers several cycles; both extremes get hit
        assert!((low - 0.9).abs() < 0.01);
        assert!((high - 1.1).abs() < 0.01);
    }

    #[test]
    fn test_effect_buffer_echo_timing() {
        let mut buffer = EffectBuffer::new(100);
        buffer.write(1.0);
        for _ in 0..9 {
            buffer.write(0.0);
        }
        // The impulse is now 10 samples behind the write head
        assert!((buffer.read_interpolated(10.0) - 1.0).abs() < 0.001);
        assert!(buffer.read_interpolated(5.0).abs() < 0.001);
    }

    #[test]
    fn test_master_bus_dry_path() {
        let mut bus = MasterBus::new(SAMPLE_RATE);
        bus.configure(MasterParams {
            master_gain: 0.5,
            delay_wet: 0.0,
            reverb_wet: 0.0,
            ..MasterParams::default()
        });

        let (left, right) = bus.process(0.5);
        assert_eq!(left, right);
        assert!((left - soft_clip(0.25)).abs() < 1e-6);
    }

    #[test]
    fn test_master_bus_delay_produces_echo() {
        let mut bus = MasterBus::new(SAMPLE_RATE);
        bus.configure(MasterParams {
            master_gain: 1.0,
            delay_time_s: 0.01,
            delay_feedback: 0.0,
            delay_wet: 1.0,
            reverb_wet: 0.0,
            ..MasterParams::default()
        });

        // Impulse in, then silence; the echo arrives ~480 samples later
        let (first, _) = bus.process(1.0);
        let mut echo_peak = 0.0_f32;
        for _ in 0..(SAMPLE_RATE / 50) {
            let (left, _) = bus.process(0.0);
            echo_peak = echo_peak.max(left.abs());
        }
        assert!(first > 0.5);
        assert!(echo_peak > 0.3, "expected an audible echo, got {echo_peak}");
    }
}
