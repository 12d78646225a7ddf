// ============================================================================
// RENDERER.RS - Note Scheduling and the Mixer
// ============================================================================
//
// The renderer is split into a pure half and an impure half:
//
// PURE: planning. A ScheduledNote is a plain value - frequency, duration,
// start offset, timbre. plan_sequence() lays out a melody's offsets up
// front: each note starts at the previous note's start plus
// (duration + gap). Nothing here touches a clock or a device, so every
// timing decision is unit-testable.
//
// IMPURE: committing. The Mixer owns the voice pool, the master bus, a
// pending-note queue and the sample clock. Committing a plan reads the
// clock ONCE and converts every offset into an absolute start sample
// against that single reference - inter-note timing is sample-accurate
// regardless of callback jitter or how long scheduling itself took.
// Notes that start now claim a voice immediately; future notes wait in
// the queue and claim their voice the moment the clock reaches them, so
// a melody longer than the voice pool still plays in full.
//
// A commit returns a PlaybackHandle that can be dropped (fire and
// forget) or waited on (combo runs and the demo binary want to outlive
// their notes). Committed notes always play to their scheduled stop:
// resetting combo state or changing settings never cancels in-flight
// notes, which means a new melody can audibly overlap the tail of the
// previous one - that overlap is the intended behavior.
// ============================================================================

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::effects::{MasterBus, MasterParams};
use crate::timbres::TimbreDefinition;
use crate::voice::VoicePool;

// ============================================================================
// PLANNING (PURE)
// ============================================================================

/// A fully described note, not yet tied to any clock
#[derive(Clone, Copy, Debug)]
pub struct ScheduledNote {
    /// Pitch in Hz
    pub frequency_hz: f32,

    /// Length of the note in seconds
    pub duration_s: f32,

    /// Start time relative to the commit point, in seconds
    pub start_offset_s: f32,

    /// Synthesis recipe to play it with
    pub timbre: &'static TimbreDefinition,
}

/// Plans a single note starting immediately
pub fn plan_note(
    frequency_hz: f32,
    duration_s: f32,
    timbre: &'static TimbreDefinition,
) -> ScheduledNote {
    ScheduledNote {
        frequency_hz,
        duration_s,
        start_offset_s: 0.0,
        timbre,
    }
}

/// Plans an ordered melody with a fixed inter-note gap.
/// Note i starts at i * (note_duration + gap) seconds.
pub fn plan_sequence(
    frequencies: &[f32],
    note_duration_s: f32,
    gap_s: f32,
    timbre: &'static TimbreDefinition,
) -> Vec<ScheduledNote> {
    frequencies
        .iter()
        .enumerate()
        .map(|(i, &frequency_hz)| ScheduledNote {
            frequency_hz,
            duration_s: note_duration_s,
            start_offset_s: i as f32 * (note_duration_s + gap_s),
            timbre,
        })
        .collect()
}

/// Total length of a plan in seconds (end of the last note)
pub fn plan_duration_s(notes: &[ScheduledNote]) -> f32 {
    notes
        .iter()
        .map(|note| note.start_offset_s + note.duration_s)
        .fold(0.0, f32::max)
}

// ============================================================================
// THE MIXER (IMPURE)
// ============================================================================

/// A committed note waiting for the clock to reach its start sample
#[derive(Clone, Copy, Debug)]
struct PendingNote {
    start_sample: u64,
    frequency_hz: f32,
    duration_s: f32,
    timbre: &'static TimbreDefinition,
}

/// Voice pool + master bus + pending queue + the shared sample clock.
/// Lives behind Arc<Mutex<_>> shared with the audio callback.
pub struct Mixer {
    pool: VoicePool,
    master: MasterBus,
    pending: Vec<PendingNote>,
    clock_samples: u64,
    sample_rate: u32,
}

impl Mixer {
    /// Creates a silent mixer at clock zero
    pub fn new(sample_rate: u32) -> Self {
        Self {
            pool: VoicePool::new(sample_rate),
            master: MasterBus::new(sample_rate),
            pending: Vec::new(),
            clock_samples: 0,
            sample_rate,
        }
    }

    /// The current position of the sample clock
    pub fn clock_samples(&self) -> u64 {
        self.clock_samples
    }

    /// The sample rate the mixer runs at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Updates the master bus parameters (gain, sends)
    pub fn configure_master(&mut self, params: MasterParams) {
        self.master.configure(params);
    }

    /// Number of voices currently holding notes
    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    /// Number of committed notes still waiting to start
    pub fn pending_notes(&self) -> usize {
        self.pending.len()
    }

    /// Commits a plan against the clock as it is RIGHT NOW. Every note's
    /// absolute start sample derives from this one reading, so the notes
    /// keep their relative spacing exactly. Notes starting immediately
    /// claim a voice here; later notes wait in the pending queue.
    /// Returns the clock sample at which the last note ends.
    pub fn commit(&mut self, notes: &[ScheduledNote]) -> u64 {
        let base = self.clock_samples;
        let mut end_sample = base;

        for note in notes {
            let start_sample =
                base + (note.start_offset_s * self.sample_rate as f32) as u64;
            let stop_sample =
                start_sample + (note.duration_s * self.sample_rate as f32) as u64;
            end_sample = end_sample.max(stop_sample);

            if start_sample <= base {
                self.start_voice(note.frequency_hz, note.duration_s, note.timbre, start_sample);
            } else {
                self.pending.push(PendingNote {
                    start_sample,
                    frequency_hz: note.frequency_hz,
                    duration_s: note.duration_s,
                    timbre: note.timbre,
                });
            }
        }

        self.pending.sort_by_key(|pending| pending.start_sample);
        end_sample
    }

    /// Assigns a voice to a note that starts now
    fn start_voice(
        &mut self,
        frequency_hz: f32,
        duration_s: f32,
        timbre: &'static TimbreDefinition,
        start_sample: u64,
    ) {
        let clock = self.clock_samples;
        let voice = self.pool.allocate(clock);
        voice.start(frequency_hz, duration_s, timbre, start_sample, clock);
    }

    /// Fills an interleaved stereo buffer and advances the clock.
    /// This is what the audio callback calls.
    pub fn process_frame(&mut self, output: &mut [f32]) {
        for frame in output.chunks_mut(2) {
            // Promote pending notes whose start time has arrived
            while let Some(next) = self.pending.first() {
                if next.start_sample > self.clock_samples {
                    break;
                }
                let note = self.pending.remove(0);
                self.start_voice(
                    note.frequency_hz,
                    note.duration_s,
                    note.timbre,
                    note.start_sample,
                );
            }

            let mixed = self.pool.render_sample(self.clock_samples);
            let (left, right) = self.master.process(mixed);

            frame[0] = left.clamp(-1.0, 1.0);
            if frame.len() > 1 {
                frame[1] = right.clamp(-1.0, 1.0);
            }

            self.clock_samples += 1;
        }
    }
}

/// Renders a plan offline into an interleaved stereo buffer, with some
/// extra tail time for send effects to ring out. Used by WAV export and
/// by tests - no audio device involved.
pub fn render_offline(
    notes: &[ScheduledNote],
    master: MasterParams,
    sample_rate: u32,
    tail_s: f32,
) -> Vec<f32> {
    let mut mixer = Mixer::new(sample_rate);
    mixer.configure_master(master);
    mixer.commit(notes);

    let total_s = plan_duration_s(notes) + tail_s.max(0.0);
    let total_frames = (total_s * sample_rate as f32) as usize;
    let mut buffer = vec![0.0_f32; total_frames * 2];

    for chunk in buffer.chunks_mut(1024) {
        mixer.process_frame(chunk);
    }

    buffer
}

// ============================================================================
// PLAYBACK HANDLE
// ============================================================================

/// Tracks one committed plan. Drop it to fire and forget, or wait() for
/// the scheduled notes to finish playing.
pub struct PlaybackHandle {
    mixer: Arc<Mutex<Mixer>>,
    end_sample: u64,
    /// Wall-clock bail-out so wait() terminates even if the device
    /// stalls and the sample clock stops advancing
    wall_deadline: Instant,
}

impl PlaybackHandle {
    /// Creates a handle for a plan that ends at `end_sample`
    pub fn new(mixer: Arc<Mutex<Mixer>>, end_sample: u64, plan_duration_s: f32) -> Self {
        let margin = Duration::from_millis(500);
        Self {
            mixer,
            end_sample,
            wall_deadline: Instant::now()
                + Duration::from_secs_f32(plan_duration_s.max(0.0))
                + margin,
        }
    }

    /// True once the mixer clock has passed the last note's end
    pub fn is_finished(&self) -> bool {
        self.mixer.lock().unwrap().clock_samples() >= self.end_sample
    }

    /// Blocks until playback finishes (or the wall-clock deadline passes)
    pub fn wait(&self) {
        while !self.is_finished() && Instant::now() < self.wall_deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
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
    fn test_sequence_offsets_are_cumulative() {
        let timbre = timbre_or_default("sine");
        let plan = plan_sequence(&[440.0, 523.25, 659.25], 0.15, 0.05, timbre);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].start_offset_s, 0.0);
        assert!((plan[1].start_offset_s - 0.2).abs() < 1e-6);
        assert!((plan[2].start_offset_s - 0.4).abs() < 1e-6);
        assert!((plan_duration_s(&plan) - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_commit_translates_offsets_to_absolute_samples() {
        let timbre = timbre_or_default("sine");
        let mut mixer = Mixer::new(SAMPLE_RATE);

        // Advance the clock a bit first, as if audio had been running
        let mut scratch = vec![0.0_f32; 2000];
        mixer.process_frame(&mut scratch);
        let clock_before = mixer.clock_samples();

        let plan = plan_sequence(&[440.0, 523.25], 0.1, 0.1, timbre);
        let end_sample = mixer.commit(&plan);

        // Last note starts at 0.2s and lasts 0.1s past the commit clock
        let expected_end = clock_before + (0.3 * SAMPLE_RATE as f32) as u64;
        assert_eq!(end_sample, expected_end);

        // First note started immediately, second waits its turn
        assert_eq!(mixer.active_voices(), 1);
        assert_eq!(mixer.pending_notes(), 1);
    }

    #[test]
    fn test_offline_render_is_audible_and_bounded() {
        let timbre = timbre_or_default("acoustic-grand");
        let plan = plan_sequence(&[261.63, 329.63, 392.0], 0.15, 0.05, timbre);
        let buffer = render_offline(&plan, MasterParams::default(), SAMPLE_RATE, 0.2);

        let peak = buffer.iter().fold(0.0_f32, |acc, &s| acc.max(s.abs()));
        assert!(peak > 0.001, "render should be audible, got peak {peak}");
        assert!(peak <= 1.0, "render must not clip, got peak {peak}");
    }

    #[test]
    fn test_notes_play_in_sequence_not_at_once() {
        // With a gap between notes there must be a quiet stretch
        // between the first note's end and the second note's start
        let timbre = timbre_or_default("sine");
        let plan = plan_sequence(&[440.0, 440.0], 0.1, 0.1, timbre);
        let buffer = render_offline(&plan, MasterParams::default(), SAMPLE_RATE, 0.1);

        let frame_at = |seconds: f32| {
            let index = (seconds * SAMPLE_RATE as f32) as usize * 2;
            buffer[index].abs()
        };

        // Middle of the gap (0.1s .. 0.2s) is silent, mid-notes are not
        let mut gap_peak = 0.0_f32;
        for step in 0..100 {
            gap_peak = gap_peak.max(frame_at(0.12 + step as f32 * 0.0006));
        }
        let mut second_note_peak = 0.0_f32;
        for step in 0..100 {
            second_note_peak = second_note_peak.max(frame_at(0.22 + step as f32 * 0.0006));
        }

        assert!(gap_peak < 0.01, "gap should be quiet, got {gap_peak}");
        assert!(second_note_peak > 0.01, "second note should sound");
    }

    #[test]
    fn test_melody_longer_than_the_voice_pool() {
        // 14 notes against 8 voice slots: the pending queue hands out
        // voices over time, so the tail of the melody still plays
        let timbre = timbre_or_default("sine");
        let frequencies = [440.0_f32; 14];
        let plan = plan_sequence(&frequencies, 0.1, 0.1, timbre);
        let buffer = render_offline(&plan, MasterParams::default(), SAMPLE_RATE, 0.2);

        // The 14th note occupies 2.6s .. 2.7s
        let start = (2.62 * SAMPLE_RATE as f32) as usize * 2;
        let end = (2.68 * SAMPLE_RATE as f32) as usize * 2;
        let last_note_peak = buffer[start..end]
            .iter()
            .fold(0.0_f32, |acc, &s| acc.max(s.abs()));

        assert!(
            last_note_peak > 0.01,
            "the last note of a long melody must still sound, got {last_note_peak}"
        );
    }

    #[test]
    fn test_in_flight_notes_survive_later_commits() {
        // Committing a second plan must not cancel the first - the two
        // overlap, matching the documented no-cancellation choice
        let timbre = timbre_or_default("sine");
        let mut mixer = Mixer::new(SAMPLE_RATE);

        mixer.commit(&[plan_note(440.0, 1.0, timbre)]);
        let mut scratch = vec![0.0_f32; 1000];
        mixer.process_frame(&mut scratch);

        mixer.commit(&[plan_note(523.25, 1.0, timbre)]);
        assert_eq!(mixer.active_voices(), 2);
    }

    #[test]
    fn test_playback_handle_reports_completion() {
        let timbre = timbre_or_default("sine");
        let mixer = Arc::new(Mutex::new(Mixer::new(SAMPLE_RATE)));

        let plan = [plan_note(440.0, 0.01, timbre)];
        let end_sample = mixer.lock().unwrap().commit(&plan);
        let handle = PlaybackHandle::new(Arc::clone(&mixer), end_sample, 0.01);

        assert!(!handle.is_finished());

        // Advance the clock past the end by rendering offline
        let mut scratch = vec![0.0_f32; 2048];
        mixer.lock().unwrap().process_frame(&mut scratch);
        assert!(handle.is_finished());
    }
}
