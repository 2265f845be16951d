//! Hardware description for one knob-and-actuator board revision.
//!
//! One [`BoardConfig`] value replaces per-revision forks: it names the actuator kind, PWM
//! timing, pulse bounds, knob step sizes, and whether a display is fitted. Pin assignments
//! stay with the firmware entry point, since Embassy peripherals are typed.

use crate::actuation::{AngleMapping, PulseBounds, PwmTiming};
use crate::settings::{Mode, Settings, WRITE_DELAY_MS_DEFAULT};
use crate::{Error, Result};

/// Fastest control loop cadence; [`BoardConfig::loop_period_ms`] must stay non-zero.
pub const LOOP_HZ_MAX: u32 = 1_000;

/// What kind of actuator is attached.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum ActuatorKind {
    /// Continuous motor or ESC, commanded in percent.
    Motor,
    /// Positional servo, commanded in degrees.
    Servo(AngleMapping),
}

/// Knob step sizes per mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct Steps {
    /// Percent per step.
    pub percent: u8,
    /// Degrees per step.
    pub angle_deg: u16,
    /// Microseconds per step in raw pulse-width mode.
    pub pulse_width_us: u16,
    /// Microseconds per step when calibrating the minimum pulse width.
    pub min_pulse_width_us: u16,
}

impl Steps {
    /// Default knob feel.
    pub const DEFAULT: Self = Self {
        percent: 5,
        angle_deg: 5,
        pulse_width_us: 10,
        min_pulse_width_us: 50,
    };
}

/// Range over which the minimum pulse width may be calibrated.
///
/// The maximum pulse width is not calibrated separately. It mirrors the minimum around the
/// neutral point: `max = pulse_sum_us - min`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct Calibration {
    /// Lowest allowed minimum pulse width.
    pub min_us: u16,
    /// Highest allowed minimum pulse width.
    pub max_us: u16,
    /// `min + max` of the pulse bounds.
    pub pulse_sum_us: u16,
}

impl Calibration {
    /// 100..=1400 us around a 1500 us neutral point.
    pub const DEFAULT: Self = Self {
        min_us: 100,
        max_us: 1_400,
        pulse_sum_us: 3_000,
    };

    /// Pulse bounds for a calibrated minimum, which is clamped into range first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPulseBounds`] if the mirrored maximum does not exceed the minimum.
    pub const fn bounds_for(&self, min_pulse_width_us: u16) -> Result<PulseBounds> {
        let min_us = self.clamp(min_pulse_width_us);
        PulseBounds::new(min_us, self.pulse_sum_us.saturating_sub(min_us))
    }

    /// Clamps a minimum pulse width into the calibration range.
    #[must_use]
    pub const fn clamp(&self, min_pulse_width_us: u16) -> u16 {
        if min_pulse_width_us < self.min_us {
            self.min_us
        } else if min_pulse_width_us > self.max_us {
            self.max_us
        } else {
            min_pulse_width_us
        }
    }
}

/// Hardware description for one board revision.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct BoardConfig {
    /// Attached actuator.
    pub actuator: ActuatorKind,
    /// Channel timing.
    pub timing: PwmTiming,
    /// Pulse bounds before any calibration is loaded.
    pub bounds: PulseBounds,
    /// Minimum pulse width calibration range.
    pub calibration: Calibration,
    /// Knob step sizes.
    pub steps: Steps,
    /// Rotation ticks that must accumulate before one step is applied.
    pub rotation_threshold: u16,
    /// Control loop cadence.
    pub loop_hz: u32,
    /// Delay from the last change to the settings write.
    pub write_delay_ms: u64,
    /// Whether a dial display is fitted.
    pub has_display: bool,
}

impl BoardConfig {
    /// ESC or continuous motor on 1000..2000 us, percent control, no display.
    pub const MOTOR: Self = Self {
        actuator: ActuatorKind::Motor,
        timing: PwmTiming::DEFAULT,
        bounds: match PulseBounds::new(1_000, 2_000) {
            Ok(bounds) => bounds,
            Err(_) => panic!("motor bounds are valid"),
        },
        calibration: Calibration::DEFAULT,
        steps: Steps::DEFAULT,
        rotation_threshold: 3,
        loop_hz: 30,
        write_delay_ms: WRITE_DELAY_MS_DEFAULT,
        has_display: false,
    };

    /// Hobby servo on 500..2500 us over 180 degrees, with a dial display.
    pub const SERVO: Self = Self {
        actuator: ActuatorKind::Servo(AngleMapping::DEGREES_180),
        bounds: match PulseBounds::new(500, 2_500) {
            Ok(bounds) => bounds,
            Err(_) => panic!("servo bounds are valid"),
        },
        has_display: true,
        ..Self::MOTOR
    };

    /// Checks every boot-time precondition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PulseExceedsPeriod`] if the bounds or calibrated range do not fit the
    /// PWM period, [`Error::InvalidPulseBounds`] if the calibrated range cannot produce valid
    /// bounds, or [`Error::InvalidBoardConfig`] for an inverted calibration range, zero steps,
    /// or a cadence outside `1..=LOOP_HZ_MAX`.
    pub fn validate(&self) -> Result<()> {
        self.bounds.check_fits(&self.timing)?;

        let calibration = &self.calibration;
        if calibration.min_us > calibration.max_us {
            return Err(Error::InvalidBoardConfig("calibration range is inverted"));
        }
        // The widest calibrated range comes from the lowest minimum.
        calibration
            .bounds_for(calibration.min_us)?
            .check_fits(&self.timing)?;
        calibration.bounds_for(calibration.max_us)?;

        let steps = &self.steps;
        if steps.percent == 0
            || steps.angle_deg == 0
            || steps.pulse_width_us == 0
            || steps.min_pulse_width_us == 0
        {
            return Err(Error::InvalidBoardConfig("step sizes must be non-zero"));
        }
        // The loop period is whole milliseconds.
        if self.loop_hz == 0 || self.loop_hz > LOOP_HZ_MAX {
            return Err(Error::InvalidBoardConfig("loop rate must be 1..=1000 Hz"));
        }
        Ok(())
    }

    /// Angle mapping when the actuator is a servo.
    #[must_use]
    pub const fn angle_mapping(&self) -> Option<AngleMapping> {
        match self.actuator {
            ActuatorKind::Motor => None,
            ActuatorKind::Servo(mapping) => Some(mapping),
        }
    }

    /// The mode the knob adjusts by default: percent for motors, angle for servos.
    #[must_use]
    pub const fn primary_mode(&self) -> Mode {
        match self.actuator {
            ActuatorKind::Motor => Mode::Percent,
            ActuatorKind::Servo(_) => Mode::Angle,
        }
    }

    /// The mode selected by the next button press.
    ///
    /// Cycles primary → pulse width → min pulse width → primary.
    #[must_use]
    pub const fn next_mode(&self, mode: Mode) -> Mode {
        match mode {
            Mode::Percent | Mode::Angle => Mode::PulseWidth,
            Mode::PulseWidth => Mode::MinPulseWidth,
            Mode::MinPulseWidth => self.primary_mode(),
        }
    }

    /// Maps a stored mode onto one this board supports.
    #[must_use]
    pub const fn supported_mode(&self, mode: Mode) -> Mode {
        match mode {
            Mode::Percent | Mode::Angle => self.primary_mode(),
            Mode::PulseWidth | Mode::MinPulseWidth => mode,
        }
    }

    /// Settings used when nothing valid is stored.
    #[must_use]
    pub const fn default_settings(&self) -> Settings {
        Settings {
            mode: self.primary_mode(),
            min_pulse_width_us: self.bounds.min_us(),
            percent: 0,
            pulse_width_us: self.bounds.min_us(),
            angle_deg: 0,
        }
    }

    /// Loop period in milliseconds.
    #[must_use]
    pub const fn loop_period_ms(&self) -> u64 {
        1_000 / self.loop_hz as u64
    }
}
