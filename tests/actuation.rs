#![allow(missing_docs, reason = "integration tests")]
#![allow(clippy::unwrap_used, reason = "tests fail loudly")]
//! Host-level tests for unit conversions.

use knob_drive::Error;
use knob_drive::actuation::{AngleMapping, PulseBounds, PwmTiming};

fn motor_bounds() -> PulseBounds {
    PulseBounds::new(1_000, 2_000).unwrap()
}

fn servo_bounds() -> PulseBounds {
    PulseBounds::new(500, 2_500).unwrap()
}

#[test]
fn default_timing_is_50hz_13bit() {
    let timing = PwmTiming::DEFAULT;
    assert_eq!(timing.frequency_hz(), 50);
    assert_eq!(timing.duty_resolution_bits(), 13);
    assert_eq!(timing.duty_max(), 8_191);
    assert_eq!(timing.period_us(), 20_000);
}

#[test]
fn pulse_width_to_duty_truncates() {
    let timing = PwmTiming::DEFAULT;
    assert_eq!(timing.pulse_width_to_duty(0), 0);
    assert_eq!(timing.pulse_width_to_duty(1_000), 409);
    assert_eq!(timing.pulse_width_to_duty(1_500), 614);
    assert_eq!(timing.pulse_width_to_duty(2_000), 819);
    assert_eq!(timing.pulse_width_to_duty(20_000), 8_191);
}

#[test]
fn pulse_width_to_duty_saturates_past_the_period() {
    let timing = PwmTiming::DEFAULT;
    assert_eq!(timing.pulse_width_to_duty(u16::MAX), 8_191);
}

#[test]
fn duty_round_trip_stays_within_one_count() {
    let timing = PwmTiming::new(50, 16).unwrap();
    for pulse_us in [500_u16, 1_000, 1_234, 1_500, 2_000, 2_500] {
        let back = timing.duty_to_pulse_width(timing.pulse_width_to_duty(pulse_us));
        assert!(pulse_us.abs_diff(back) <= 1, "{pulse_us} came back as {back}");
    }
}

#[test]
fn slow_high_resolution_timing_converts_back() {
    let timing = PwmTiming::new(10, 16).unwrap();
    assert_eq!(timing.period_us(), 100_000);
    // One count is about 1.5 us here.
    for pulse_us in [500_u16, 1_500, 2_500, 20_000, u16::MAX] {
        let back = timing.duty_to_pulse_width(timing.pulse_width_to_duty(pulse_us));
        assert!(pulse_us.abs_diff(back) <= 2, "{pulse_us} came back as {back}");
    }
    // A full-period duty is longer than any u16 pulse width.
    assert_eq!(timing.duty_to_pulse_width(timing.duty_max()), u16::MAX);
}

#[test]
fn one_hertz_timing_saturates_instead_of_overflowing() {
    let timing = PwmTiming::new(1, 13).unwrap();
    assert_eq!(timing.duty_to_pulse_width(0), 0);
    assert_eq!(timing.duty_to_pulse_width(8_191), u16::MAX);

    let timing = PwmTiming::new(1, 16).unwrap();
    assert_eq!(timing.duty_to_pulse_width(65), 991);
    assert_eq!(timing.duty_to_pulse_width(u16::MAX), u16::MAX);
}

#[test]
fn timing_rejects_bad_parameters() {
    assert!(matches!(PwmTiming::new(0, 13), Err(Error::ZeroFrequency)));
    assert!(matches!(
        PwmTiming::new(50, 0),
        Err(Error::UnsupportedDutyResolution(0))
    ));
    assert!(matches!(
        PwmTiming::new(50, 17),
        Err(Error::UnsupportedDutyResolution(17))
    ));
    assert!(matches!(
        PwmTiming::new(2_000_000, 13),
        Err(Error::PwmFrequencyUnreachable(2_000_000))
    ));
    assert!(PwmTiming::new(330, 12).is_ok());
}

#[test]
fn bounds_require_min_below_max() {
    assert!(matches!(
        PulseBounds::new(1_500, 1_500),
        Err(Error::InvalidPulseBounds {
            min_us: 1_500,
            max_us: 1_500
        })
    ));
    assert!(PulseBounds::new(2_000, 1_000).is_err());
    assert_eq!(motor_bounds().span_us(), 1_000);
}

#[test]
fn bounds_must_fit_in_the_period() {
    let fast = PwmTiming::new(400, 13).unwrap();
    assert_eq!(fast.period_us(), 2_500);
    assert!(servo_bounds().check_fits(&fast).is_ok());

    let faster = PwmTiming::new(500, 13).unwrap();
    assert!(matches!(
        servo_bounds().check_fits(&faster),
        Err(Error::PulseExceedsPeriod {
            pulse_us: 2_500,
            period_us: 2_000
        })
    ));
}

#[test]
fn clamp_limits_to_bounds() {
    let bounds = motor_bounds();
    assert_eq!(bounds.clamp(0), 1_000);
    assert_eq!(bounds.clamp(1_234), 1_234);
    assert_eq!(bounds.clamp(3_000), 2_000);
}

#[test]
fn percent_maps_linearly() {
    let bounds = motor_bounds();
    assert_eq!(bounds.percent_to_pulse_width(0), 1_000);
    assert_eq!(bounds.percent_to_pulse_width(50), 1_500);
    assert_eq!(bounds.percent_to_pulse_width(100), 2_000);
    assert_eq!(bounds.percent_to_pulse_width(250), 2_000);

    assert_eq!(bounds.pulse_width_to_percent(1_000), 0);
    assert_eq!(bounds.pulse_width_to_percent(1_500), 50);
    assert_eq!(bounds.pulse_width_to_percent(1_509), 50);
    assert_eq!(bounds.pulse_width_to_percent(2_000), 100);
    assert_eq!(bounds.pulse_width_to_percent(900), 0);
    assert_eq!(bounds.pulse_width_to_percent(2_100), 100);
}

#[test]
fn angle_maps_linearly() {
    let bounds = servo_bounds();
    let mapping = AngleMapping::DEGREES_180;
    assert_eq!(mapping.angle_max(), 180);
    assert_eq!(mapping.angle_to_pulse_width(&bounds, 0), 500);
    assert_eq!(mapping.angle_to_pulse_width(&bounds, 90), 1_500);
    assert_eq!(mapping.angle_to_pulse_width(&bounds, 180), 2_500);
    assert_eq!(mapping.angle_to_pulse_width(&bounds, 270), 2_500);

    assert_eq!(mapping.pulse_width_to_angle(&bounds, 500), 0);
    assert_eq!(mapping.pulse_width_to_angle(&bounds, 1_500), 90);
    assert_eq!(mapping.pulse_width_to_angle(&bounds, 2_500), 180);
}

#[test]
fn angle_round_trip_stays_within_one_degree() {
    let bounds = PulseBounds::new(544, 2_400).unwrap();
    let mapping = AngleMapping::new(270).unwrap();
    for angle in (0..=270).step_by(7) {
        let back = mapping.pulse_width_to_angle(&bounds, mapping.angle_to_pulse_width(&bounds, angle));
        assert!(angle.abs_diff(back) <= 1, "{angle} came back as {back}");
    }
}

#[test]
fn angle_mapping_needs_a_range() {
    assert!(matches!(AngleMapping::new(0), Err(Error::ZeroAngleMax)));
}

#[test]
fn errors_display_their_values() {
    let err = PulseBounds::new(2_000, 1_000).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid pulse bounds: min 2000 us must be below max 1000 us"
    );
}
