// ============================================================================
// MAIN.RS - Demo and Diagnostic CLI
// ============================================================================
//
// A small driver for the chime engine. The real host feeds the engine
// tab-activation events; this binary fakes them from the command line so
// the whole pipeline can be heard (or rendered to a file) without a
// browser anywhere near it.
//
// COMMANDS:
//   chime play <identifier>...        simulate tab switches, one per arg
//   chime tone <hz> [secs] [timbre]   play a single tone
//   chime export <file> [pattern] [timbre]
//                                     render a pattern melody to WAV
//   chime list                        print the available registries
// ============================================================================

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Result, bail};

use tabchime::engine::ChimeEngine;
use tabchime::helper::SAMPLE_RATE;
use tabchime::patterns::{all_pattern_names, pattern_or_default, resolve_pattern};
use tabchime::renderer::{plan_sequence, render_offline};
use tabchime::scales::{SCALE_REGISTRY, all_scale_names, scale_or_default};
use tabchime::selector::PositionContext;
use tabchime::settings::{ChimeSettings, DebugLevel};
use tabchime::timbres::{TIMBRE_REGISTRY, timbre_or_default};
use tabchime::wav::{analyze_audio, write_wav_file};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("play") => run_play(&args[1..]),
        Some("tone") => run_tone(&args[1..]),
        Some("export") => run_export(&args[1..]),
        Some("list") => {
            run_list();
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("tabchime - tab-switch chime synthesizer");
    println!();
    println!("Usage:");
    println!("  chime play <identifier>...        simulate tab switches");
    println!("  chime tone <hz> [secs] [timbre]   play a single tone");
    println!("  chime export <file> [pattern] [timbre]");
    println!("                                    render a melody to WAV");
    println!("  chime list                        show scales/patterns/timbres");
}

/// Current wall-clock time in milliseconds, the same shape of timestamp
/// a real host would pass along with each trigger
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

// ============================================================================
// PLAY - simulated tab switching
// ============================================================================

fn run_play(identifiers: &[String]) -> Result<()> {
    if identifiers.is_empty() {
        bail!("play needs at least one identifier, e.g. `chime play github.com docs.rs`");
    }

    let mut settings = ChimeSettings::default();
    settings.debug_level = DebugLevel::Basic;
    settings.humanize_cents = 5.0;
    let mut engine = ChimeEngine::new(settings);

    if !engine.get_status().audio_ready {
        bail!("no audio device available; try `chime export` instead");
    }

    // Switch "tabs" quickly enough to chain a combo, with position
    // context as if the identifiers were tabs left to right
    let total = identifiers.len();
    for (rank, identifier) in identifiers.iter().enumerate() {
        println!("[CHIME] switching to {identifier}");
        engine.on_tab_activated(identifier, Some(PositionContext { rank, total }), now_ms());
        std::thread::sleep(Duration::from_millis(400));
        engine.poll(now_ms());
    }

    // Pump the combo timer until the window has expired, so a
    // completion-mode run still gets its chance to play
    let deadline = now_ms() + engine.settings().combo_window_ms + 200;
    while now_ms() < deadline {
        engine.poll(now_ms());
        std::thread::sleep(Duration::from_millis(50));
    }

    let status = engine.get_status();
    println!(
        "[CHIME] done: {} plays on scale {} with timbre {}",
        status.total_plays, status.current_scale, status.current_timbre
    );

    // Let release tails ring out before the device drops
    std::thread::sleep(Duration::from_millis(600));
    Ok(())
}

// ============================================================================
// TONE - one note
// ============================================================================

fn run_tone(args: &[String]) -> Result<()> {
    let frequency_hz: f32 = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("tone needs a frequency in Hz"))?
        .parse()?;
    let duration_s: f32 = match args.get(1) {
        Some(raw) => raw.parse()?,
        None => 0.5,
    };
    let timbre_name = args.get(2).map(String::as_str);

    let mut engine = ChimeEngine::new(ChimeSettings::default());
    if !engine.play_tone(frequency_hz, duration_s, timbre_name) {
        bail!("tone playback failed (device unavailable or invalid input)");
    }

    println!(
        "[CHIME] {frequency_hz} Hz for {duration_s}s on {}",
        timbre_or_default(timbre_name.unwrap_or("sine")).name
    );
    std::thread::sleep(Duration::from_secs_f32(duration_s + 0.5));
    Ok(())
}

// ============================================================================
// EXPORT - offline render to WAV
// ============================================================================

fn run_export(args: &[String]) -> Result<()> {
    let path = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("export needs an output path"))?;
    let pattern = pattern_or_default(args.get(1).map(String::as_str).unwrap_or("scale-up"));
    let timbre = timbre_or_default(args.get(2).map(String::as_str).unwrap_or("acoustic-grand"));

    let settings = ChimeSettings::default();
    let scale = scale_or_default(&settings.scale_name);
    let melody = resolve_pattern(pattern, scale);
    let plan = plan_sequence(
        &melody,
        settings.combo_note_duration_s,
        settings.note_gap_s,
        timbre,
    );

    println!(
        "[CHIME] rendering {} ({} notes) with {} ...",
        pattern.name,
        plan.len(),
        timbre.name
    );

    let buffer = render_offline(&plan, settings.master_params(), SAMPLE_RATE, 1.0);
    write_wav_file(Path::new(path), &buffer, SAMPLE_RATE, true)?;

    let stats = analyze_audio(&buffer, SAMPLE_RATE);
    println!(
        "[CHIME] wrote {path}: {:.2}s, peak {:.3}, rms {:.3}",
        stats.duration_seconds, stats.peak_amplitude, stats.rms_amplitude
    );
    Ok(())
}

// ============================================================================
// LIST - registry contents
// ============================================================================

fn run_list() {
    println!("Scales:");
    for scale in SCALE_REGISTRY {
        println!(
            "  {:<14} {} ({} degrees)",
            scale.name,
            scale.description,
            scale.frequencies.len()
        );
    }

    println!();
    println!("Patterns:");
    for name in all_pattern_names() {
        let pattern = pattern_or_default(name);
        println!(
            "  {:<14} {} ({} steps)",
            pattern.name,
            pattern.description,
            pattern.steps.len()
        );
    }

    println!();
    println!("Timbres:");
    for timbre in TIMBRE_REGISTRY {
        println!("  {:<16} [{}]", timbre.name, timbre.category);
    }

    println!();
    println!(
        "{} scales, {} patterns, {} timbres",
        all_scale_names().len(),
        all_pattern_names().len(),
        TIMBRE_REGISTRY.len()
    );
}
