//! Persisted operating mode and calibration, with debounced writes.
//!
//! [`Settings`] is the persisted value. [`SettingsStore`] owns the current settings and a
//! [`SettingsStorage`] backend, and batches bursts of knob changes into a single write.
//!
//! On the Pico, [`FlashSettings`](flash::FlashSettings) stores the record in internal flash.

#[cfg(not(feature = "host"))]
pub mod flash;
pub mod record;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Minimum pulse width used when nothing has been stored yet.
pub const MIN_PULSE_WIDTH_US_DEFAULT: u16 = 1_000;

/// Default delay between the last change and the write that persists it.
pub const WRITE_DELAY_MS_DEFAULT: u64 = 1_500;

/// What the knob currently adjusts.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Mode {
    /// Percent of the pulse range (continuous motors).
    #[default]
    Percent,
    /// Angle in degrees (servos).
    Angle,
    /// Raw pulse width in microseconds.
    PulseWidth,
    /// Calibration of the minimum pulse width; the maximum follows.
    MinPulseWidth,
}

impl Mode {
    /// Short label for logs and dials.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Angle => "angle",
            Self::PulseWidth => "pulse width",
            Self::MinPulseWidth => "min pulse width",
        }
    }
}

/// Persisted settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct Settings {
    /// Active mode.
    pub mode: Mode,
    /// Calibrated minimum pulse width.
    pub min_pulse_width_us: u16,
    /// Last commanded percent.
    pub percent: u8,
    /// Last commanded raw pulse width.
    pub pulse_width_us: u16,
    /// Last commanded angle.
    pub angle_deg: u16,
}

impl Settings {
    /// Settings used when storage is empty or unreadable.
    pub const DEFAULT: Self = Self {
        mode: Mode::Percent,
        min_pulse_width_us: MIN_PULSE_WIDTH_US_DEFAULT,
        percent: 0,
        pulse_width_us: MIN_PULSE_WIDTH_US_DEFAULT,
        angle_deg: 0,
    };
}

impl Default for Settings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Backend that can load and save one [`Settings`] record.
pub trait SettingsStorage {
    /// Loads stored settings, or `Ok(None)` if nothing valid was ever written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored record is corrupted.
    fn load(&mut self) -> Result<Option<Settings>>;

    /// Replaces the stored settings.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    fn save(&mut self, settings: &Settings) -> Result<()>;
}

/// Current settings plus a debounced write schedule.
///
/// Call [`schedule_write`](Self::schedule_write) after each change and
/// [`poll`](Self::poll) from the control loop. A burst of changes produces one write,
/// `write_delay_ms` after the last change.
pub struct SettingsStore<S> {
    storage: S,
    settings: Settings,
    write_delay_ms: u64,
    deadline_ms: Option<u64>,
}

impl<S: SettingsStorage> SettingsStore<S> {
    /// Loads settings from `storage`, falling back to `defaults`.
    ///
    /// Corrupted records are logged and replaced by `defaults` rather than failing boot.
    pub fn load(mut storage: S, defaults: Settings, write_delay_ms: u64) -> Self {
        let settings = match storage.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => defaults,
            Err(_err) => {
                #[cfg(not(feature = "host"))]
                defmt::error!("Settings: load failed ({}), using defaults", _err);
                defaults
            }
        };
        Self {
            storage,
            settings,
            write_delay_ms,
            deadline_ms: None,
        }
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access to the current settings. Call [`schedule_write`](Self::schedule_write)
    /// afterwards to persist changes.
    pub const fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Marks the settings dirty and (re)arms the write deadline.
    pub const fn schedule_write(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(self.write_delay_ms));
    }

    /// Returns `true` while a write is scheduled.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Writes the settings if the deadline has passed. Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the write stays scheduled so the next poll retries.
    pub fn poll(&mut self, now_ms: u64) -> Result<bool> {
        match self.deadline_ms {
            Some(deadline_ms) if now_ms >= deadline_ms => {
                self.flush()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Writes immediately if a write is scheduled.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the write stays scheduled.
    pub fn flush(&mut self) -> Result<()> {
        if self.deadline_ms.is_some() {
            self.storage.save(&self.settings)?;
            self.deadline_ms = None;
        }
        Ok(())
    }

    /// Consumes the store and returns the backend.
    pub fn free(self) -> S {
        self.storage
    }
}
