//! Settings storage in the Pico's internal flash.
//!
//! The record lives in the last 4 KB erase block, away from firmware growing up from the
//! start of flash. See [`FlashSettings`].

use defmt::{error, info};
use embassy_rp::Peri;
use embassy_rp::flash::{Blocking, ERASE_SIZE, Flash as EmbassyFlash};
use embassy_rp::peripherals::FLASH;

use super::{Settings, SettingsStorage, record};
use crate::{Error, Result};

// Internal flash size for Raspberry Pi Pico 2 (4 MB).
#[cfg(feature = "pico2")]
const INTERNAL_FLASH_SIZE: usize = 4 * 1024 * 1024;

// Internal flash size for Raspberry Pi Pico 1 (2 MB).
#[cfg(not(feature = "pico2"))]
const INTERNAL_FLASH_SIZE: usize = 2 * 1024 * 1024;

// One flash page; records are far smaller.
const WRITE_SIZE: usize = 256;

#[allow(clippy::cast_possible_truncation, reason = "flash offsets fit in u32")]
const SETTINGS_OFFSET: u32 = (INTERNAL_FLASH_SIZE - ERASE_SIZE) as u32;

const _: () = assert!(record::RECORD_SIZE <= WRITE_SIZE);

/// [`SettingsStorage`] backed by the last erase block of internal flash.
///
/// Each save erases the block, so writes should go through a
/// [`SettingsStore`](super::SettingsStore) that debounces them. Flash is typically good for
/// ~100K erase cycles per block.
pub struct FlashSettings {
    flash: EmbassyFlash<'static, FLASH, Blocking, INTERNAL_FLASH_SIZE>,
}

impl FlashSettings {
    /// Takes ownership of the flash peripheral.
    #[must_use]
    pub fn new(peripheral: Peri<'static, FLASH>) -> Self {
        Self {
            flash: EmbassyFlash::new_blocking(peripheral),
        }
    }

    /// Erases the stored record so the next boot uses defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Flash`] if the erase fails.
    pub fn clear(&mut self) -> Result<()> {
        self.erase()?;
        info!("Flash: Cleared settings");
        Ok(())
    }

    fn erase(&mut self) -> Result<()> {
        #[allow(clippy::cast_possible_truncation, reason = "ERASE_SIZE is 4096")]
        let end = SETTINGS_OFFSET + ERASE_SIZE as u32;
        self.flash
            .blocking_erase(SETTINGS_OFFSET, end)
            .map_err(Error::Flash)
    }
}

impl SettingsStorage for FlashSettings {
    fn load(&mut self) -> Result<Option<Settings>> {
        let mut buffer = [0u8; WRITE_SIZE];
        self.flash
            .blocking_read(SETTINGS_OFFSET, &mut buffer)
            .map_err(Error::Flash)?;

        match record::decode(&buffer) {
            Ok(Some(settings)) => {
                info!("Flash: Loaded {}", settings);
                Ok(Some(settings))
            }
            Ok(None) => {
                info!("Flash: No settings stored");
                Ok(None)
            }
            Err(err) => {
                error!("Flash: Settings record corrupted");
                Err(err)
            }
        }
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        let mut buffer = [0xFFu8; WRITE_SIZE];
        let len = record::encode(settings, &mut buffer)?;

        self.erase()?;
        self.flash
            .blocking_write(SETTINGS_OFFSET, &buffer)
            .map_err(Error::Flash)?;

        info!("Flash: Saved {} bytes", len);
        Ok(())
    }
}
