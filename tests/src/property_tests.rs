//! Property checks over the whole input range

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use upsampler_core::hal::mock::MockPin;
    use upsampler_core::test_utils::observers::RecordingDisplay;
    use upsampler_core::test_utils::output_capture::RecordingOutput;
    use upsampler_core::test_utils::virtual_time::SimClock;
    use upsampler_core::{
        Button, Duration, EdgeCapture, FactorControl, Instant, NoDiagnostics, SevenSegment, Upsampler,
        UpsamplerConfig, UpsamplingFactor,
    };

    const FLOOR: u32 = 1_000;
    const CAP: u32 = 100_000;
    const START: u32 = 500_000;

    /// Prime the filter with one edge, then emit the burst for `interval_us`
    fn second_burst(config: UpsamplerConfig, interval_us: u32) -> (Option<(u8, Duration)>, Vec<Duration>, Vec<Duration>, Instant) {
        let clock = SimClock::new();
        let capture = EdgeCapture::new();
        let control = FactorControl::from_config(&config);
        let mut upsampler = Upsampler::new(config);
        let mut output = RecordingOutput::new(&clock);

        clock.advance_to(Instant::from_micros(START));
        capture.record(Instant::from_micros(START));
        upsampler.poll(&capture, &control, &clock, &mut output, &mut NoDiagnostics).unwrap();
        output.clear();

        capture.record(Instant::from_micros(START + interval_us));
        let report = upsampler
            .poll(&capture, &control, &clock, &mut output, &mut NoDiagnostics)
            .unwrap()
            .map(|r| (r.pulses, r.per_pulse_delay));

        let widths = output.pulses().iter().map(|p| p.width).collect();
        (report, widths, output.gaps(), upsampler.last_pulse())
    }

    fn config(width_us: u32, factor: u8) -> UpsamplerConfig {
        UpsamplerConfig::new(width_us, 200, FLOOR, CAP, factor, false).unwrap()
    }

    proptest! {
        #[test]
        fn prop_in_range_burst_shape(interval in FLOOR..=CAP, n in 1u8..=9, width in prop::sample::select(vec![100u32, 1_000])) {
            let (report, widths, gaps, _) = second_burst(config(width, n), interval);

            let expected_gap = Duration::from_micros((interval / n as u32).saturating_sub(width));
            prop_assert_eq!(report, Some((n, expected_gap)));
            prop_assert_eq!(widths.len(), n as usize);
            prop_assert!(widths.iter().all(|&w| w == Duration::from_micros(width)));
            prop_assert_eq!(gaps.len(), n as usize - 1);
            prop_assert!(gaps.iter().all(|&g| g == expected_gap));
        }

        #[test]
        fn prop_noise_never_emits(interval in 0..FLOOR, n in 1u8..=9) {
            let (report, widths, _, last_pulse) = second_burst(config(100, n), interval);

            prop_assert_eq!(report, None);
            prop_assert!(widths.is_empty());
            prop_assert_eq!(last_pulse, Instant::from_micros(START));
        }

        #[test]
        fn prop_long_intervals_match_cap(interval in CAP..=CAP * 4, n in 1u8..=9) {
            let (clamped, _, clamped_gaps, _) = second_burst(config(100, n), interval);
            let (at_cap, _, cap_gaps, _) = second_burst(config(100, n), CAP);

            prop_assert_eq!(clamped, at_cap);
            prop_assert_eq!(clamped_gaps, cap_gaps);
        }

        #[test]
        fn prop_buttons_follow_debounced_model(
            presses in prop::collection::vec((any::<bool>(), 0u32..400), 1..40)
        ) {
            let window = Duration::from_millis(200);
            let control = FactorControl::new(UpsamplingFactor::new(2).unwrap(), window);
            let mut display = RecordingDisplay::new();

            let mut model_factor = 2u8;
            let mut model_last = [0u32; 2];
            let mut model_shown = Vec::new();
            let mut now_ms = 0u32;

            for (up, step_ms) in presses {
                now_ms += step_ms;
                let (button, slot) = if up { (Button::Up, 0) } else { (Button::Down, 1) };
                control.handle_press(button, Instant::from_micros(now_ms * 1_000), &mut display).unwrap();

                if (now_ms - model_last[slot]) * 1_000 > window.as_micros() {
                    model_last[slot] = now_ms;
                    let next = if up { (model_factor + 1).min(9) } else { model_factor.saturating_sub(1) };
                    if next != model_factor {
                        model_factor = next;
                        model_shown.push(next);
                    }
                }
            }

            prop_assert_eq!(control.factor().get(), model_factor);
            prop_assert_eq!(display.shown(), model_shown.as_slice());
        }

        #[test]
        fn prop_render_is_idempotent(value in any::<u8>()) {
            let mut display = SevenSegment::new(core::array::from_fn(|_| MockPin::new()));
            display.render(value).unwrap();
            let first: Vec<bool> = display.pins().iter().map(MockPin::is_high).collect();
            display.render(value).unwrap();
            let second: Vec<bool> = display.pins().iter().map(MockPin::is_high).collect();

            prop_assert_eq!(&first, &second);
            let writes: usize = display.pins().iter().map(MockPin::writes).sum();
            prop_assert_eq!(writes, if value <= 9 { 14 } else { 0 });
        }
    }
}
