//! The knob control loop: decoder in, actuator and settings out.
//!
//! [`Controller`] is the application context. It is built once at boot and then ticked at
//! the board's loop cadence forever. See [`Controller`] for the per-tick behavior.

use embedded_hal::pwm::SetDutyCycle;

use crate::actuation::Command;
use crate::actuator::Actuator;
use crate::board::BoardConfig;
use crate::dial::DialView;
use crate::quadrature::QuadratureDecoder;
use crate::settings::{Mode, Settings, SettingsStorage, SettingsStore};
use crate::Result;

/// Application context for one knob driving one actuator.
///
/// Each [`tick`](Self::tick):
///
/// 1. If the decoder has pending edges, acknowledges them.
/// 2. A fresh button press advances the mode (see [`BoardConfig::next_mode`]). Rotation
///    while the button is held is discarded.
/// 3. Otherwise, once more than `rotation_threshold` ticks have accumulated, drains them and
///    applies one step in their direction. The magnitude beyond the threshold is ignored.
/// 4. Polls the settings store so changes are persisted after the write delay.
///
/// `tick` returns a [`DialView`] whenever the mode or value changed.
pub struct Controller<'a, O, S> {
    board: BoardConfig,
    decoder: &'a QuadratureDecoder,
    actuator: Actuator<O>,
    store: SettingsStore<S>,
    was_pressed: bool,
}

impl<'a, O: SetDutyCycle, S: SettingsStorage> Controller<'a, O, S> {
    /// Validates the board, loads settings, and drives the actuator to the stored command.
    ///
    /// # Errors
    ///
    /// Returns the board validation error, or [`Error::DutyWrite`](crate::Error::DutyWrite)
    /// if the actuator cannot be driven.
    pub fn new(
        board: BoardConfig,
        decoder: &'a QuadratureDecoder,
        output: O,
        storage: S,
    ) -> Result<Self> {
        board.validate()?;
        let store = SettingsStore::load(storage, board.default_settings(), board.write_delay_ms);
        let actuator = Actuator::new(output, board.timing, board.bounds, board.angle_mapping())?;

        let mut controller = Self {
            board,
            decoder,
            actuator,
            store,
            was_pressed: decoder.is_pressed(),
        };
        controller.restore()?;
        Ok(controller)
    }

    /// Runs one loop iteration at time `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DutyWrite`](crate::Error::DutyWrite) if the actuator rejects an
    /// update. Settings write failures are logged and retried on the next tick.
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<DialView>> {
        let mut changed = false;

        if self.decoder.has_pending() {
            self.decoder.acknowledge();

            let pressed = self.decoder.is_pressed();
            if pressed {
                self.decoder.take_rotation();
                if !self.was_pressed {
                    self.advance_mode(now_ms)?;
                    changed = true;
                }
            } else if self.decoder.peek_rotation().unsigned_abs()
                > u32::from(self.board.rotation_threshold)
            {
                let rotation = self.decoder.take_rotation();
                if rotation != 0 {
                    self.step(rotation.signum(), now_ms)?;
                    changed = true;
                }
            }
            self.was_pressed = pressed;
        }

        if let Err(_err) = self.store.poll(now_ms) {
            #[cfg(not(feature = "host"))]
            defmt::error!("Control: settings write failed: {}", _err);
        }

        Ok(changed.then(|| self.dial_view()))
    }

    /// Snapshot for the display.
    #[must_use]
    pub fn dial_view(&self) -> DialView {
        let settings = self.store.settings();
        let steps = &self.board.steps;
        let bounds = self.actuator.bounds();
        let pulse_width_us = self.actuator.pulse_width_us();
        let (value, min, max, step) = match settings.mode {
            Mode::Percent => (
                u16::from(self.actuator.percent()),
                0,
                100,
                u16::from(steps.percent),
            ),
            Mode::Angle => (
                self.actuator.angle().unwrap_or(0),
                0,
                self.board
                    .angle_mapping()
                    .map_or(0, |mapping| mapping.angle_max()),
                steps.angle_deg,
            ),
            Mode::PulseWidth => (
                pulse_width_us,
                bounds.min_us(),
                bounds.max_us(),
                steps.pulse_width_us,
            ),
            Mode::MinPulseWidth => (
                bounds.min_us(),
                self.board.calibration.min_us,
                self.board.calibration.max_us,
                steps.min_pulse_width_us,
            ),
        };
        DialView {
            mode: settings.mode,
            value,
            min,
            max,
            step,
            pulse_width_us,
        }
    }

    /// Active mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.store.settings().mode
    }

    /// Current settings (as they will be persisted).
    #[must_use]
    pub fn settings(&self) -> &Settings {
        self.store.settings()
    }

    /// The driven actuator.
    #[must_use]
    pub const fn actuator(&self) -> &Actuator<O> {
        &self.actuator
    }

    /// Board description this controller was built with.
    #[must_use]
    pub const fn board(&self) -> &BoardConfig {
        &self.board
    }

    /// Persists pending settings immediately.
    ///
    /// # Errors
    ///
    /// Returns the storage backend error.
    pub fn flush_settings(&mut self) -> Result<()> {
        self.store.flush()
    }

    /// Applies stored settings to the actuator, normalizing anything out of range.
    fn restore(&mut self) -> Result<()> {
        let board = self.board;
        let settings = self.store.settings_mut();
        settings.mode = board.supported_mode(settings.mode);
        settings.min_pulse_width_us = board.calibration.clamp(settings.min_pulse_width_us);
        let settings = *settings;

        self.actuator
            .set_bounds(board.calibration.bounds_for(settings.min_pulse_width_us)?)?;
        let command = match settings.mode {
            Mode::PulseWidth => Command::PulseWidth(settings.pulse_width_us),
            Mode::Percent | Mode::Angle | Mode::MinPulseWidth => self.primary_command(&settings),
        };
        self.actuator.set_command(command)?;
        self.sync_settings();

        #[cfg(not(feature = "host"))]
        defmt::info!(
            "Control: restored {} mode, bounds {}..{}us, {}us",
            settings.mode,
            self.actuator.bounds().min_us(),
            self.actuator.bounds().max_us(),
            self.actuator.pulse_width_us()
        );
        Ok(())
    }

    /// Moves to the next mode, making the new mode's quantity authoritative at the current
    /// output so the actuator does not jump.
    fn advance_mode(&mut self, now_ms: u64) -> Result<()> {
        let mode = self.board.next_mode(self.mode());
        let command = match mode {
            Mode::Percent => Some(Command::Percent(self.actuator.percent())),
            Mode::Angle => self.actuator.angle().map(Command::Angle),
            Mode::PulseWidth => Some(Command::PulseWidth(self.actuator.pulse_width_us())),
            // Calibration keeps whatever is currently authoritative.
            Mode::MinPulseWidth => None,
        };
        if let Some(command) = command {
            self.actuator.set_command(command)?;
        }

        self.store.settings_mut().mode = mode;
        self.sync_settings();
        self.store.schedule_write(now_ms);

        #[cfg(not(feature = "host"))]
        defmt::info!("Control: mode {}", mode.label());
        Ok(())
    }

    /// Applies one knob step in `direction` (+1 or -1) to the active mode's quantity.
    fn step(&mut self, direction: i32, now_ms: u64) -> Result<()> {
        let steps = self.board.steps;
        match self.mode() {
            Mode::Percent => {
                let percent = offset(
                    u16::from(self.actuator.percent()),
                    u16::from(steps.percent),
                    direction,
                    0,
                    100,
                );
                self.actuator
                    .set_percent(u8::try_from(percent).unwrap_or(100))?;
            }
            Mode::Angle => {
                let angle_max = self
                    .board
                    .angle_mapping()
                    .map_or(0, |mapping| mapping.angle_max());
                let angle = offset(
                    self.actuator.angle().unwrap_or(0),
                    steps.angle_deg,
                    direction,
                    0,
                    angle_max,
                );
                self.actuator.set_angle(angle)?;
            }
            Mode::PulseWidth => {
                let bounds = self.actuator.bounds();
                let pulse_us = offset(
                    self.actuator.pulse_width_us(),
                    steps.pulse_width_us,
                    direction,
                    bounds.min_us(),
                    bounds.max_us(),
                );
                self.actuator.set_pulse_width(pulse_us)?;
            }
            Mode::MinPulseWidth => {
                let calibration = self.board.calibration;
                let min_us = offset(
                    self.actuator.bounds().min_us(),
                    steps.min_pulse_width_us,
                    direction,
                    calibration.min_us,
                    calibration.max_us,
                );
                let bounds = calibration.bounds_for(min_us)?;
                self.actuator.set_bounds(bounds)?;
                self.store.settings_mut().min_pulse_width_us = min_us;

                #[cfg(not(feature = "host"))]
                defmt::info!(
                    "Control: pulse width range {}..{}us",
                    bounds.min_us(),
                    bounds.max_us()
                );
            }
        }

        self.sync_settings();
        self.store.schedule_write(now_ms);

        #[cfg(not(feature = "host"))]
        defmt::info!(
            "Control: {} -> {}us (duty {})",
            self.actuator.command(),
            self.actuator.pulse_width_us(),
            self.actuator.duty()
        );
        Ok(())
    }

    fn primary_command(&self, settings: &Settings) -> Command {
        match self.board.primary_mode() {
            Mode::Angle => Command::Angle(settings.angle_deg),
            _ => Command::Percent(settings.percent),
        }
    }

    /// Copies the actuator's authoritative command into the persisted settings.
    fn sync_settings(&mut self) {
        let command = self.actuator.command();
        let settings = self.store.settings_mut();
        match command {
            Command::PulseWidth(pulse_us) => settings.pulse_width_us = pulse_us,
            Command::Percent(percent) => settings.percent = percent,
            Command::Angle(degrees) => settings.angle_deg = degrees,
        }
    }
}

/// `value + direction * step`, clamped to `min..=max`.
fn offset(value: u16, step: u16, direction: i32, min: u16, max: u16) -> u16 {
    let stepped = i32::from(value) + direction * i32::from(step);
    let clamped = stepped.clamp(i32::from(min), i32::from(max));
    u16::try_from(clamped).unwrap_or(min)
}
