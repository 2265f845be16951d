//! Crate-wide error type.
//!
//! Configuration errors are raised once at boot; the decode/convert core has no runtime
//! failure modes beyond the PWM write and persistence paths.

use derive_more::{Debug, Display, Error};

/// Result type used throughout this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors returned by this crate.
#[derive(Debug, Display, Error)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Spawning an Embassy task failed (the task pool is already in use).
    #[cfg(not(feature = "host"))]
    #[display("failed to spawn task: {_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    /// The internal flash driver reported an error.
    #[cfg(not(feature = "host"))]
    #[display("flash error: {_0:?}")]
    Flash(#[error(not(source))] embassy_rp::flash::Error),

    /// The PWM output rejected a duty-cycle write.
    #[display("PWM duty-cycle write failed")]
    DutyWrite,

    /// `min_us` must be strictly below `max_us`.
    #[display("invalid pulse bounds: min {min_us} us must be below max {max_us} us")]
    InvalidPulseBounds {
        /// Requested minimum pulse width.
        min_us: u16,
        /// Requested maximum pulse width.
        max_us: u16,
    },

    /// A pulse width does not fit in one PWM period.
    #[display("pulse width {pulse_us} us exceeds the {period_us} us PWM period")]
    PulseExceedsPeriod {
        /// Offending pulse width.
        pulse_us: u16,
        /// PWM period for the configured frequency.
        period_us: u32,
    },

    /// The PWM frequency must be non-zero.
    #[display("PWM frequency must be non-zero")]
    ZeroFrequency,

    /// Duty resolution outside the range the PWM hardware supports.
    #[display("unsupported duty resolution: {_0} bits")]
    UnsupportedDutyResolution(#[error(not(source))] u8),

    /// The clock divider cannot produce the requested PWM frequency.
    #[display("PWM frequency {_0} Hz is unreachable with the system clock")]
    PwmFrequencyUnreachable(#[error(not(source))] u32),

    /// An angle mapping needs a non-zero maximum angle.
    #[display("maximum angle must be non-zero")]
    ZeroAngleMax,

    /// An angle was commanded on an actuator without an angle mapping.
    #[display("actuator has no angle mapping")]
    NoAngleMapping,

    /// Step sizes, thresholds, and calibration range are inconsistent.
    #[display("invalid board configuration: {_0}")]
    InvalidBoardConfig(#[error(not(source))] &'static str),

    /// Settings could not be serialized into a storage record.
    #[display("settings could not be serialized")]
    FormatError,

    /// A stored settings record failed its length, CRC, or payload check.
    #[display("stored settings are corrupted")]
    StorageCorrupted,
}
