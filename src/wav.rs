// ============================================================================
// WAV.RS - WAV Export and Audio Analysis
// ============================================================================
//
// Offline-rendered chimes can be written to WAV files for previewing a
// timbre or sharing a combo melody. The format is minimal and
// self-contained:
// 1. RIFF header (12 bytes)
// 2. Format chunk (24 bytes)
// 3. Optional fact chunk (float format only)
// 4. Data chunk header (8 bytes) + audio data
//
// Two encodings are supported:
// - 32-bit IEEE float (format tag 3), written as-is
// - 16-bit PCM (format tag 1), clamped and scaled
//
// Input buffers are interleaved stereo (L R L R ...), the same layout
// the mixer renders.
// ============================================================================

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

/// WAV format tags
const WAV_FORMAT_PCM: u16 = 1;
const WAV_FORMAT_IEEE_FLOAT: u16 = 3;

/// Writes interleaved stereo samples to a WAV file.
///
/// Parameters:
/// - samples: Interleaved stereo samples in the -1.0 to 1.0 range
/// - use_float: true for 32-bit float output, false for 16-bit PCM
pub fn write_wav_file(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    use_float: bool,
) -> Result<()> {
    if samples.is_empty() {
        bail!("no samples to write");
    }
    if samples.len() % 2 != 0 {
        bail!("sample count must be even (stereo)");
    }

    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let num_channels: u16 = 2;
    let bits_per_sample: u16 = if use_float { 32 } else { 16 };
    let bytes_per_sample = bits_per_sample / 8;
    let block_align = num_channels * bytes_per_sample;
    let byte_rate = sample_rate * block_align as u32;
    let format_tag = if use_float { WAV_FORMAT_IEEE_FLOAT } else { WAV_FORMAT_PCM };

    // Float WAV needs the 'fact' chunk
    let has_fact_chunk = use_float;
    let audio_data_bytes = samples.len() as u32 * bytes_per_sample as u32;

    let riff_chunk_size = 4 + // "WAVE"
        8 + 16 + // fmt chunk header + data
        (if has_fact_chunk { 8 + 4 } else { 0 }) +
        8 + // data chunk header
        audio_data_bytes;

    // ---- RIFF header ----
    writer.write_all(b"RIFF")?;
    writer.write_all(&riff_chunk_size.to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    // ---- Format chunk ----
    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&format_tag.to_le_bytes())?;
    writer.write_all(&num_channels.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&bits_per_sample.to_le_bytes())?;

    // ---- Fact chunk (float only) ----
    if has_fact_chunk {
        let sample_count = samples.len() as u32 / num_channels as u32;
        writer.write_all(b"fact")?;
        writer.write_all(&4u32.to_le_bytes())?;
        writer.write_all(&sample_count.to_le_bytes())?;
    }

    // ---- Data chunk ----
    writer.write_all(b"data")?;
    writer.write_all(&audio_data_bytes.to_le_bytes())?;

    if use_float {
        for &sample in samples {
            writer.write_all(&sample.to_le_bytes())?;
        }
    } else {
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            let scaled = (clamped * 32767.0) as i16;
            writer.write_all(&scaled.to_le_bytes())?;
        }
    }

    writer.flush().context("flush failed")?;
    Ok(())
}

// ============================================================================
// AUDIO STATISTICS
// ============================================================================

/// Summary statistics of a rendered buffer
#[derive(Clone, Debug)]
pub struct AudioStatistics {
    /// Number of frames (per channel)
    pub frame_count: usize,

    /// Duration in seconds
    pub duration_seconds: f32,

    /// Peak amplitude (absolute value)
    pub peak_amplitude: f32,

    /// RMS (root mean square) amplitude
    pub rms_amplitude: f32,
}

/// Analyzes an interleaved stereo buffer
pub fn analyze_audio(samples: &[f32], sample_rate: u32) -> AudioStatistics {
    if samples.is_empty() {
        return AudioStatistics {
            frame_count: 0,
            duration_seconds: 0.0,
            peak_amplitude: 0.0,
            rms_amplitude: 0.0,
        };
    }

    let frame_count = samples.len() / 2;
    let duration_seconds = frame_count as f32 / sample_rate as f32;

    let mut peak_amplitude = 0.0_f32;
    let mut sum_squared = 0.0_f64;
    for &sample in samples {
        peak_amplitude = peak_amplitude.max(sample.abs());
        sum_squared += (sample as f64) * (sample as f64);
    }
    let rms_amplitude = (sum_squared / samples.len() as f64).sqrt() as f32;

    AudioStatistics {
        frame_count,
        duration_seconds,
        peak_amplitude,
        rms_amplitude,
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
