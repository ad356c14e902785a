//! Button debounce and factor adjustment behaviour

#[cfg(test)]
mod tests {
    use crate::session::{Session, Stimulus};
    use rstest::{fixture, rstest};
    use upsampler_core::test_utils::observers::RecordingDisplay;
    use upsampler_core::{Button, Duration, FactorControl, Instant, PressOutcome, UpsamplerConfig, UpsamplingFactor};

    const WINDOW: Duration = Duration::from_millis(200);

    fn at_ms(ms: u32) -> Instant {
        Instant::from_micros(ms * 1_000)
    }

    fn factor(n: u8) -> UpsamplingFactor {
        UpsamplingFactor::new(n).unwrap()
    }

    #[fixture]
    fn display() -> RecordingDisplay {
        RecordingDisplay::new()
    }

    #[rstest]
    #[case(Button::Up, 2, 3)]
    #[case(Button::Down, 2, 1)]
    #[case(Button::Up, 9, 9)]
    #[case(Button::Down, 0, 0)]
    #[case(Button::Up, 0, 1)]
    #[case(Button::Down, 9, 8)]
    fn test_single_press(#[case] button: Button, #[case] start: u8, #[case] expected: u8) {
        let control = FactorControl::new(factor(start), WINDOW);
        control.press(button, at_ms(500));
        assert_eq!(control.factor().get(), expected);
    }

    #[rstest]
    fn test_bounce_train_counts_once(mut display: RecordingDisplay) {
        let control = FactorControl::new(factor(2), WINDOW);

        // Contact bounce: an edge every 10ms for 150ms after the first
        let outcomes: Vec<_> = (0..16)
            .map(|i| control.handle_press(Button::Up, at_ms(1_000 + i * 10), &mut display).unwrap())
            .collect();

        assert_eq!(outcomes[0], PressOutcome::Changed(factor(3)));
        assert!(outcomes[1..].iter().all(|o| *o == PressOutcome::Ignored));
        assert_eq!(display.shown(), [3]);
    }

    #[rstest]
    fn test_buttons_debounce_independently(mut display: RecordingDisplay) {
        let control = FactorControl::new(factor(5), WINDOW);

        control.handle_press(Button::Up, at_ms(1_000), &mut display).unwrap();
        control.handle_press(Button::Down, at_ms(1_010), &mut display).unwrap();

        assert_eq!(display.shown(), [6, 5]);
        assert_eq!(control.last_accepted(Button::Up), at_ms(1_000));
        assert_eq!(control.last_accepted(Button::Down), at_ms(1_010));
    }

    #[rstest]
    #[case(100_000, PressOutcome::Ignored)]
    #[case(200_000, PressOutcome::Ignored)]
    #[case(200_001, PressOutcome::Changed(UpsamplingFactor::new(3).unwrap()))]
    fn test_window_after_power_on(#[case] at_us: u32, #[case] expected: PressOutcome) {
        let control = FactorControl::from_config(&UpsamplerConfig::default());
        assert_eq!(control.press(Button::Up, Instant::from_micros(at_us)), expected);
    }

    #[rstest]
    fn test_saturated_press_still_restarts_window(mut display: RecordingDisplay) {
        let control = FactorControl::new(UpsamplingFactor::MAX, WINDOW);

        let first = control.handle_press(Button::Up, at_ms(1_000), &mut display).unwrap();
        let bounce = control.handle_press(Button::Up, at_ms(1_100), &mut display).unwrap();

        assert_eq!(first, PressOutcome::Saturated(UpsamplingFactor::MAX));
        assert_eq!(bounce, PressOutcome::Ignored);
        assert!(display.shown().is_empty());
    }

    #[test]
    fn test_walk_full_range() {
        let mut stimuli: Vec<_> = (1..=12).map(|i| Stimulus::Press(Button::Up, at_ms(i * 300))).collect();
        stimuli.extend((13..=26).map(|i| Stimulus::Press(Button::Down, at_ms(i * 300))));

        let log = Session::new(UpsamplerConfig::default()).run(&stimuli);

        assert_eq!(log.shown, [3, 4, 5, 6, 7, 8, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(log.final_factor, 0);
        let saturated = log
            .presses
            .iter()
            .filter(|o| matches!(o, PressOutcome::Saturated(_)))
            .count();
        assert_eq!(saturated, 10);
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let control = FactorControl::from_config(&UpsamplerConfig::default());
        control.press(Button::Up, at_ms(1_000));
        assert_eq!(control.factor().get(), 3);

        control.reset(factor(2));
        assert_eq!(control.factor().get(), 2);
        assert_eq!(control.last_accepted(Button::Up), Instant::from_micros(0));
    }
}
