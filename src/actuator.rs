//! A device abstraction for pulse-width driven actuators (ESCs, continuous motors, servos).
//!
//! [`Actuator`] drives any [`SetDutyCycle`] output. Angle control is an optional
//! [`AngleMapping`] composed in at construction, not a separate actuator type.
//!
//! See [`Actuator`] for usage.

use embedded_hal::pwm::SetDutyCycle;

use crate::actuation::{AngleMapping, Command, PulseBounds, PwmTiming};
use crate::{Error, Result};

/// A pulse-width actuator on one PWM channel.
///
/// Exactly one [`Command`] is authoritative at a time. Pulse width, percent, angle, and duty
/// are always derived from it and the current [`PulseBounds`], so changing the bounds
/// re-derives the output instead of leaving a stale duty behind.
///
/// # Example
///
/// ```
/// # use core::convert::Infallible;
/// # use embedded_hal::pwm::{ErrorType, SetDutyCycle};
/// use knob_drive::actuation::{AngleMapping, PulseBounds, PwmTiming};
/// use knob_drive::actuator::Actuator;
/// # struct Output(u16);
/// # impl ErrorType for Output { type Error = Infallible; }
/// # impl SetDutyCycle for Output {
/// #     fn max_duty_cycle(&self) -> u16 { 8191 }
/// #     fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> { self.0 = duty; Ok(()) }
/// # }
///
/// # fn main() -> knob_drive::Result<()> {
/// let mut servo = Actuator::new(
///     Output(0),
///     PwmTiming::DEFAULT,
///     PulseBounds::new(500, 2_500)?,
///     Some(AngleMapping::DEGREES_180),
/// )?;
///
/// servo.set_angle(90)?;
/// assert_eq!(servo.pulse_width_us(), 1_500);
/// assert_eq!(servo.duty(), 614);
/// # Ok(())
/// # }
/// ```
pub struct Actuator<O> {
    output: O,
    timing: PwmTiming,
    bounds: PulseBounds,
    angle: Option<AngleMapping>,
    command: Command,
    duty: u16,
}

impl<O: SetDutyCycle> Actuator<O> {
    /// Creates an actuator and drives it to the minimum pulse width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PulseExceedsPeriod`] if `bounds` do not fit in one PWM period, or
    /// [`Error::DutyWrite`] if the initial write fails.
    pub fn new(
        output: O,
        timing: PwmTiming,
        bounds: PulseBounds,
        angle: Option<AngleMapping>,
    ) -> Result<Self> {
        bounds.check_fits(&timing)?;
        let mut actuator = Self {
            output,
            timing,
            bounds,
            angle,
            command: Command::PulseWidth(bounds.min_us()),
            duty: 0,
        };
        actuator.apply()?;
        Ok(actuator)
    }

    /// Commands a raw pulse width, clamped into the current bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DutyWrite`] if the output rejects the duty value.
    pub fn set_pulse_width(&mut self, pulse_us: u16) -> Result<()> {
        self.command = Command::PulseWidth(self.bounds.clamp(pulse_us));
        self.apply()
    }

    /// Commands a percentage of the pulse range, clamped to 0..=100.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DutyWrite`] if the output rejects the duty value.
    pub fn set_percent(&mut self, percent: u8) -> Result<()> {
        self.command = Command::Percent(percent.min(100));
        self.apply()
    }

    /// Commands an angle, clamped to 0..=`angle_max`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAngleMapping`] if this actuator was built without an
    /// [`AngleMapping`], or [`Error::DutyWrite`] if the output rejects the duty value.
    pub fn set_angle(&mut self, degrees: u16) -> Result<()> {
        let mapping = self.angle.ok_or(Error::NoAngleMapping)?;
        self.command = Command::Angle(degrees.min(mapping.angle_max()));
        self.apply()
    }

    /// Applies any [`Command`].
    ///
    /// # Errors
    ///
    /// See [`set_pulse_width`](Self::set_pulse_width), [`set_percent`](Self::set_percent),
    /// and [`set_angle`](Self::set_angle).
    pub fn set_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::PulseWidth(pulse_us) => self.set_pulse_width(pulse_us),
            Command::Percent(percent) => self.set_percent(percent),
            Command::Angle(degrees) => self.set_angle(degrees),
        }
    }

    /// Replaces the pulse bounds and re-derives the output from the authoritative command.
    ///
    /// A raw pulse-width command is re-clamped into the new range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PulseExceedsPeriod`] if the new bounds do not fit in one period (the
    /// old bounds stay in effect), or [`Error::DutyWrite`] if the write fails.
    pub fn set_bounds(&mut self, bounds: PulseBounds) -> Result<()> {
        bounds.check_fits(&self.timing)?;
        self.bounds = bounds;
        if let Command::PulseWidth(pulse_us) = self.command {
            self.command = Command::PulseWidth(bounds.clamp(pulse_us));
        }
        self.apply()
    }

    /// Current authoritative command.
    #[must_use]
    pub const fn command(&self) -> Command {
        self.command
    }

    /// Current pulse bounds.
    #[must_use]
    pub const fn bounds(&self) -> PulseBounds {
        self.bounds
    }

    /// Channel timing.
    #[must_use]
    pub const fn timing(&self) -> PwmTiming {
        self.timing
    }

    /// Angle mapping, if this actuator has angle semantics.
    #[must_use]
    pub const fn angle_mapping(&self) -> Option<AngleMapping> {
        self.angle
    }

    /// Last duty value written to the output.
    #[must_use]
    pub const fn duty(&self) -> u16 {
        self.duty
    }

    /// Pulse width derived from the authoritative command.
    #[must_use]
    pub fn pulse_width_us(&self) -> u16 {
        match self.command {
            Command::PulseWidth(pulse_us) => self.bounds.clamp(pulse_us),
            Command::Percent(percent) => self.bounds.percent_to_pulse_width(percent),
            Command::Angle(degrees) => self.angle.map_or(self.bounds.min_us(), |mapping| {
                mapping.angle_to_pulse_width(&self.bounds, degrees)
            }),
        }
    }

    /// Percent of the pulse range, derived unless percent is authoritative.
    #[must_use]
    pub fn percent(&self) -> u8 {
        match self.command {
            Command::Percent(percent) => percent,
            _ => self.bounds.pulse_width_to_percent(self.pulse_width_us()),
        }
    }

    /// Angle in degrees, or `None` without an angle mapping.
    #[must_use]
    pub fn angle(&self) -> Option<u16> {
        let mapping = self.angle?;
        Some(match self.command {
            Command::Angle(degrees) => degrees,
            _ => mapping.pulse_width_to_angle(&self.bounds, self.pulse_width_us()),
        })
    }

    /// Consumes the actuator and returns the PWM output.
    pub fn free(self) -> O {
        self.output
    }

    // Takes effect at the next PWM period boundary.
    fn apply(&mut self) -> Result<()> {
        let duty = self.timing.pulse_width_to_duty(self.pulse_width_us());
        self.output
            .set_duty_cycle(duty)
            .map_err(|_| Error::DutyWrite)?;
        self.duty = duty;
        #[cfg(not(feature = "host"))]
        defmt::debug!(
            "Actuator {} -> {}us duty {}",
            self.command,
            self.pulse_width_us(),
            duty
        );
        Ok(())
    }
}
