use criterion::{black_box, criterion_group, criterion_main, Criterion};
use upsampler_core::test_utils::output_capture::RecordingOutput;
use upsampler_core::test_utils::virtual_time::SimClock;
use upsampler_core::{
    diagnostic_line, BurstPlan, BurstScheduler, Duration, Instant, IntervalFilter, IntervalMeasurement,
    NoDiagnostics, PulseEvent, UpsamplerConfig, UpsamplingFactor,
};

fn measurement(us: u32) -> IntervalMeasurement {
    IntervalMeasurement {
        duration: Duration::from_micros(us),
        raw: Duration::from_micros(us),
    }
}

fn bench_planning(c: &mut Criterion) {
    let factor = UpsamplingFactor::new(7).unwrap_or(UpsamplingFactor::MAX);
    let width = Duration::from_micros(100);

    c.bench_function("burst_plan_new", |b| {
        b.iter(|| BurstPlan::new(black_box(measurement(48_271)), black_box(factor), width))
    });

    let plan = BurstPlan::new(measurement(48_271), factor, width);
    c.bench_function("diagnostic_line", |b| b.iter(|| diagnostic_line(black_box(&plan))));
}

fn bench_filter(c: &mut Criterion) {
    let config = UpsamplerConfig::default();

    c.bench_function("interval_filter_accept", |b| {
        let mut filter = IntervalFilter::from_config(&config);
        let mut t = 0u32;
        b.iter(|| {
            // Alternate real edges and glitches
            t = t.wrapping_add(if t % 2 == 0 { 20_001 } else { 301 });
            filter.accept(black_box(PulseEvent::at(Instant::from_micros(t))))
        })
    });
}

fn bench_emit(c: &mut Criterion) {
    let config = UpsamplerConfig::default();

    c.bench_function("emit_simulated_burst", |b| {
        b.iter(|| {
            let clock = SimClock::new();
            let mut output = RecordingOutput::new(&clock);
            let mut scheduler = BurstScheduler::new(config.pulse_width, false);
            let plan = scheduler.plan(measurement(2_000), UpsamplingFactor::MAX);
            scheduler.emit(&plan, &clock, &mut output, &mut NoDiagnostics)
        })
    });
}

criterion_group!(benches, bench_planning, bench_filter, bench_emit);
criterion_main!(benches);
