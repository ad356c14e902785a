// Simulated device session with a printed summary

use upsampler_core::{Button, Duration, Instant, UpsamplerConfig};
use upsampler_tests::session::steady;
use upsampler_tests::{Session, SessionLog, Stimulus};

fn main() {
    println!("🧪 Pulse Upsampler Simulation");

    // Session 1: steady 50Hz signal at the power-on factor
    run_steady_session();

    // Session 2: factor changes while the signal runs
    run_button_session();

    // Session 3: noise and a stalled signal
    run_abnormal_session();

    println!("✅ All simulated sessions behaved as expected");
    println!();
    println!("📝 Run the full suite with: cargo test");
}

fn summarize(log: &SessionLog) {
    println!(
        "    bursts: {}, rejected: {}, pulses: {}, factor: {}",
        log.bursts.len(),
        log.rejected,
        log.pulse_count(),
        log.final_factor
    );
    for line in &log.diagnostics {
        print!("    serial> {}", line.replace('\r', ""));
    }
}

/// Steady signal, diagnostics on
fn run_steady_session() {
    println!("📡 Steady 20ms signal, factor 2, diagnostics on...");

    let config = UpsamplerConfig::default().with_diagnostics(true);
    let log = Session::new(config)
        .with_diagnostic_latency(Duration::from_micros(1_700))
        .run(&steady(20_000, 20_000, 5));
    summarize(&log);

    assert_eq!(log.bursts.len(), 5);
    assert_eq!(log.pulse_count(), 10);
    assert_eq!(log.diagnostics.len(), 5);
    println!("  ✅ Steady signal doubled");
}

/// Raise the factor to 4 mid-stream, then drop it to 0
fn run_button_session() {
    println!("🔘 Button presses between bursts...");

    let mut stimuli = steady(20_000, 20_000, 30);
    for (i, at_ms) in [250u32, 500, 5_000, 5_250, 5_500, 5_750].into_iter().enumerate() {
        let button = if i < 2 { Button::Up } else { Button::Down };
        stimuli.push(Stimulus::Press(button, Instant::from_micros(at_ms * 1_000)));
    }
    stimuli.sort_by_key(|s| s.at().as_micros());

    let log = Session::new(UpsamplerConfig::default()).run(&stimuli);
    summarize(&log);
    println!("    display: {:?}", log.shown);

    assert_eq!(log.shown, [3, 4, 3, 2, 1, 0]);
    assert_eq!(log.final_factor, 0);
    assert!(log.bursts.iter().any(|b| b.pulses == 4));
    println!("  ✅ Factor followed the buttons");
}

/// Glitches are dropped and a stall is clamped to the cap
fn run_abnormal_session() {
    println!("⚡ Glitches and a stalled signal...");

    let edges = [20_000u32, 20_400, 40_000, 40_900, 60_000, 400_000];
    let stimuli: Vec<_> = edges
        .iter()
        .map(|&us| Stimulus::Edge(Instant::from_micros(us)))
        .collect();

    let log = Session::new(UpsamplerConfig::wide_pulse()).run(&stimuli);
    summarize(&log);

    assert_eq!(log.rejected, 2);
    assert!(log.bursts.last().is_some_and(|b| b.clamped));
    println!("  ✅ Noise rejected, stall clamped");
}
