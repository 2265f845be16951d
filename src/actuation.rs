//! Unit conversions between pulse width, percent, angle, and PWM duty.
//!
//! All arithmetic is truncating integer division on `u32` intermediates. Round trips such as
//! pulse width → percent → pulse width may drift by one unit per hop.
//!
//! See [`PwmTiming`], [`PulseBounds`], and [`AngleMapping`].

use crate::{Error, Result};

/// Default PWM frequency for hobby servos and ESCs.
pub const FREQUENCY_HZ_DEFAULT: u32 = 50;

/// Default duty resolution.
pub const DUTY_RESOLUTION_BITS_DEFAULT: u8 = 13;

/// Largest duty resolution the PWM counter can hold (16-bit `top`).
pub const DUTY_RESOLUTION_BITS_MAX: u8 = 16;

const MICROS_PER_SECOND: u32 = 1_000_000;

/// Fixed PWM channel timing: frequency and duty resolution.
///
/// Both are fixed for the lifetime of the channel; changing them means reconfiguring the
/// peripheral.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct PwmTiming {
    frequency_hz: u32,
    duty_resolution_bits: u8,
}

impl PwmTiming {
    /// 50 Hz with 13-bit duty.
    pub const DEFAULT: Self = Self {
        frequency_hz: FREQUENCY_HZ_DEFAULT,
        duty_resolution_bits: DUTY_RESOLUTION_BITS_DEFAULT,
    };

    /// Creates a timing description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroFrequency`] for 0 Hz, [`Error::PwmFrequencyUnreachable`] above
    /// 1 MHz, or [`Error::UnsupportedDutyResolution`] outside `1..=16` bits.
    pub const fn new(frequency_hz: u32, duty_resolution_bits: u8) -> Result<Self> {
        if frequency_hz == 0 {
            return Err(Error::ZeroFrequency);
        }
        if frequency_hz > MICROS_PER_SECOND {
            return Err(Error::PwmFrequencyUnreachable(frequency_hz));
        }
        if duty_resolution_bits == 0 || duty_resolution_bits > DUTY_RESOLUTION_BITS_MAX {
            return Err(Error::UnsupportedDutyResolution(duty_resolution_bits));
        }
        Ok(Self {
            frequency_hz,
            duty_resolution_bits,
        })
    }

    /// PWM frequency in hertz.
    #[must_use]
    pub const fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Duty resolution in bits.
    #[must_use]
    pub const fn duty_resolution_bits(&self) -> u8 {
        self.duty_resolution_bits
    }

    /// Largest duty value, `2^bits - 1`.
    #[must_use]
    pub const fn duty_max(&self) -> u16 {
        ((1_u32 << self.duty_resolution_bits) - 1) as u16
    }

    /// PWM period in microseconds (`1_000_000 / frequency`, truncated).
    #[must_use]
    pub const fn period_us(&self) -> u32 {
        MICROS_PER_SECOND / self.frequency_hz
    }

    /// Converts a pulse width to a duty value: `us * duty_max / period_us`.
    ///
    /// Pulse widths longer than the period saturate at [`duty_max`](Self::duty_max).
    #[must_use]
    pub const fn pulse_width_to_duty(&self, pulse_us: u16) -> u16 {
        let duty = pulse_us as u32 * self.duty_max() as u32 / self.period_us();
        if duty > self.duty_max() as u32 {
            self.duty_max()
        } else {
            duty as u16
        }
    }

    /// Converts a duty value back to a pulse width: `duty * period_us / duty_max`.
    ///
    /// Pulse widths beyond `u16::MAX` (possible below ~16 Hz) saturate.
    #[must_use]
    pub const fn duty_to_pulse_width(&self, duty: u16) -> u16 {
        // At 1 Hz / 16 bits the product needs 36 bits.
        let pulse_us = duty as u64 * self.period_us() as u64 / self.duty_max() as u64;
        if pulse_us > u16::MAX as u64 {
            u16::MAX
        } else {
            pulse_us as u16
        }
    }
}

impl Default for PwmTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Physical pulse-width range the actuator accepts, with `min_us < max_us`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct PulseBounds {
    min_us: u16,
    max_us: u16,
}

impl PulseBounds {
    /// Creates bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPulseBounds`] unless `min_us < max_us`.
    pub const fn new(min_us: u16, max_us: u16) -> Result<Self> {
        if min_us >= max_us {
            return Err(Error::InvalidPulseBounds { min_us, max_us });
        }
        Ok(Self { min_us, max_us })
    }

    /// Checks that the longest pulse fits in one period of `timing`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PulseExceedsPeriod`] when `max_us` is longer than the period.
    pub const fn check_fits(&self, timing: &PwmTiming) -> Result<()> {
        if self.max_us as u32 > timing.period_us() {
            return Err(Error::PulseExceedsPeriod {
                pulse_us: self.max_us,
                period_us: timing.period_us(),
            });
        }
        Ok(())
    }

    /// Shortest accepted pulse.
    #[must_use]
    pub const fn min_us(&self) -> u16 {
        self.min_us
    }

    /// Longest accepted pulse.
    #[must_use]
    pub const fn max_us(&self) -> u16 {
        self.max_us
    }

    /// Width of the range, `max_us - min_us`.
    #[must_use]
    pub const fn span_us(&self) -> u16 {
        self.max_us - self.min_us
    }

    /// Clamps a pulse width into the range.
    #[must_use]
    pub const fn clamp(&self, pulse_us: u16) -> u16 {
        if pulse_us < self.min_us {
            self.min_us
        } else if pulse_us > self.max_us {
            self.max_us
        } else {
            pulse_us
        }
    }

    /// `min + span * clamp(percent, 0, 100) / 100`.
    #[must_use]
    pub const fn percent_to_pulse_width(&self, percent: u8) -> u16 {
        let percent = if percent > 100 { 100 } else { percent };
        self.scale_into(percent as u32, 100)
    }

    /// Inverse of [`percent_to_pulse_width`](Self::percent_to_pulse_width), truncated.
    #[must_use]
    pub const fn pulse_width_to_percent(&self, pulse_us: u16) -> u8 {
        self.scale_out(pulse_us, 100) as u8
    }

    /// `min + span * numerator / denominator`, with `numerator <= denominator`.
    const fn scale_into(&self, numerator: u32, denominator: u32) -> u16 {
        let offset = self.span_us() as u32 * numerator / denominator;
        self.min_us + offset as u16
    }

    /// `(clamp(pulse) - min) * full_scale / span`.
    const fn scale_out(&self, pulse_us: u16, full_scale: u32) -> u32 {
        let offset = (self.clamp(pulse_us) - self.min_us) as u32;
        offset * full_scale / self.span_us() as u32
    }
}

/// Linear mapping of `0..=angle_max` degrees onto [`PulseBounds`].
///
/// Composed into an actuator to give it angle semantics; the pulse-width path stays the same.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct AngleMapping {
    angle_max: u16,
}

impl AngleMapping {
    /// The common 0..=180 degree hobby servo.
    pub const DEGREES_180: Self = Self { angle_max: 180 };

    /// Creates a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroAngleMax`] when `angle_max` is zero.
    pub const fn new(angle_max: u16) -> Result<Self> {
        if angle_max == 0 {
            return Err(Error::ZeroAngleMax);
        }
        Ok(Self { angle_max })
    }

    /// Largest commandable angle.
    #[must_use]
    pub const fn angle_max(&self) -> u16 {
        self.angle_max
    }

    /// `min + span * clamp(angle, 0, angle_max) / angle_max`.
    #[must_use]
    pub const fn angle_to_pulse_width(&self, bounds: &PulseBounds, angle: u16) -> u16 {
        let angle = if angle > self.angle_max {
            self.angle_max
        } else {
            angle
        };
        bounds.scale_into(angle as u32, self.angle_max as u32)
    }

    /// Inverse of [`angle_to_pulse_width`](Self::angle_to_pulse_width), truncated.
    #[must_use]
    pub const fn pulse_width_to_angle(&self, bounds: &PulseBounds, pulse_us: u16) -> u16 {
        bounds.scale_out(pulse_us, self.angle_max as u32) as u16
    }
}

/// The single authoritative commanded quantity. Everything else is derived from it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Command {
    /// Raw pulse width in microseconds (clamped into the bounds when applied).
    PulseWidth(u16),
    /// Percent of the pulse range, 0..=100.
    Percent(u8),
    /// Angle in degrees, 0..=`angle_max`.
    Angle(u16),
}
