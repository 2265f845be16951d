#![allow(missing_docs, reason = "integration tests")]
#![allow(clippy::unwrap_used, reason = "tests fail loudly")]
//! Host-level tests for settings records and the debounced store.

use knob_drive::settings::record::{self, RECORD_SIZE};
use knob_drive::settings::{Mode, Settings, SettingsStorage, SettingsStore};
use knob_drive::{Error, Result};

/// Flash-like storage: one erasable record buffer.
struct MemoryStorage {
    bytes: [u8; 64],
    saves: usize,
    fail_saves: bool,
}

impl MemoryStorage {
    fn erased() -> Self {
        Self {
            bytes: [0xFF; 64],
            saves: 0,
            fail_saves: false,
        }
    }

    fn holding(settings: &Settings) -> Self {
        let mut storage = Self::erased();
        record::encode(settings, &mut storage.bytes).unwrap();
        storage
    }
}

impl SettingsStorage for MemoryStorage {
    fn load(&mut self) -> Result<Option<Settings>> {
        record::decode(&self.bytes)
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        if self.fail_saves {
            return Err(Error::FormatError);
        }
        self.bytes = [0xFF; 64];
        record::encode(settings, &mut self.bytes)?;
        self.saves += 1;
        Ok(())
    }
}

const CALIBRATED: Settings = Settings {
    mode: Mode::MinPulseWidth,
    min_pulse_width_us: 1_150,
    percent: 35,
    pulse_width_us: 1_420,
    angle_deg: 0,
};

#[test]
fn record_decodes_what_it_encodes() {
    let mut buffer = [0xFF; RECORD_SIZE];
    let len = record::encode(&CALIBRATED, &mut buffer).unwrap();
    assert!(len <= RECORD_SIZE);
    assert_eq!(buffer[..4], *b"KNB1");
    assert_eq!(record::decode(&buffer).unwrap(), Some(CALIBRATED));
}

#[test]
fn erased_flash_holds_no_record() {
    assert_eq!(record::decode(&[0xFF; RECORD_SIZE]).unwrap(), None);
    assert_eq!(record::decode(&[0x00; RECORD_SIZE]).unwrap(), None);
    assert_eq!(record::decode(&[]).unwrap(), None);
}

#[test]
fn flipped_payload_bit_is_corruption() {
    let mut buffer = [0xFF; RECORD_SIZE];
    record::encode(&CALIBRATED, &mut buffer).unwrap();
    buffer[7] ^= 0x01;
    assert!(matches!(
        record::decode(&buffer),
        Err(Error::StorageCorrupted)
    ));
}

#[test]
fn oversized_length_is_corruption() {
    let mut buffer = [0xFF; RECORD_SIZE];
    record::encode(&CALIBRATED, &mut buffer).unwrap();
    buffer[4..6].copy_from_slice(&200_u16.to_le_bytes());
    assert!(matches!(
        record::decode(&buffer),
        Err(Error::StorageCorrupted)
    ));
}

#[test]
fn truncated_record_is_corruption() {
    let mut buffer = [0xFF; RECORD_SIZE];
    let len = record::encode(&CALIBRATED, &mut buffer).unwrap();
    assert!(matches!(
        record::decode(&buffer[..len - 1]),
        Err(Error::StorageCorrupted)
    ));
}

#[test]
fn encode_needs_a_full_record_buffer() {
    let mut buffer = [0u8; RECORD_SIZE - 1];
    assert!(matches!(
        record::encode(&CALIBRATED, &mut buffer),
        Err(Error::FormatError)
    ));
}

#[test]
fn store_loads_saved_settings() {
    let store = SettingsStore::load(MemoryStorage::holding(&CALIBRATED), Settings::DEFAULT, 1_500);
    assert_eq!(store.settings(), &CALIBRATED);
    assert!(!store.is_dirty());
}

#[test]
fn store_falls_back_to_defaults() {
    let store = SettingsStore::load(MemoryStorage::erased(), Settings::DEFAULT, 1_500);
    assert_eq!(store.settings(), &Settings::DEFAULT);

    let mut corrupted = MemoryStorage::holding(&CALIBRATED);
    corrupted.bytes[8] ^= 0xFF;
    let store = SettingsStore::load(corrupted, Settings::DEFAULT, 1_500);
    assert_eq!(store.settings(), &Settings::DEFAULT);
}

#[test]
fn writes_wait_for_the_delay() {
    let mut store = SettingsStore::load(MemoryStorage::erased(), Settings::DEFAULT, 1_500);
    store.settings_mut().percent = 40;
    store.schedule_write(1_000);
    assert!(store.is_dirty());

    assert!(!store.poll(1_000).unwrap());
    assert!(!store.poll(2_499).unwrap());
    assert!(store.poll(2_500).unwrap());
    assert!(!store.is_dirty());
    assert!(!store.poll(10_000).unwrap());

    let mut storage = store.free();
    assert_eq!(storage.saves, 1);
    assert_eq!(storage.load().unwrap().map(|settings| settings.percent), Some(40));
}

#[test]
fn a_burst_of_changes_is_one_write() {
    let mut store = SettingsStore::load(MemoryStorage::erased(), Settings::DEFAULT, 1_500);
    for (step, now_ms) in (0..10_u8).zip((0..).step_by(100)) {
        store.settings_mut().percent = step * 5;
        store.schedule_write(now_ms);
        assert!(!store.poll(now_ms).unwrap());
    }
    // Last change at 900 ms.
    assert!(!store.poll(2_399).unwrap());
    assert!(store.poll(2_400).unwrap());

    let mut storage = store.free();
    assert_eq!(storage.saves, 1);
    assert_eq!(storage.load().unwrap().map(|settings| settings.percent), Some(45));
}

#[test]
fn failed_writes_stay_scheduled() {
    let mut storage = MemoryStorage::erased();
    storage.fail_saves = true;
    let mut store = SettingsStore::load(storage, Settings::DEFAULT, 100);
    store.schedule_write(0);

    assert!(store.poll(100).is_err());
    assert!(store.is_dirty());
    assert!(store.flush().is_err());
    assert!(store.is_dirty());
}

#[test]
fn flush_writes_only_when_dirty() {
    let mut store = SettingsStore::load(MemoryStorage::erased(), Settings::DEFAULT, 1_500);
    store.flush().unwrap();
    store.settings_mut().mode = Mode::PulseWidth;
    store.schedule_write(0);
    store.flush().unwrap();
    store.flush().unwrap();
    assert!(!store.is_dirty());

    let mut storage = store.free();
    assert_eq!(storage.saves, 1);
    assert_eq!(
        storage.load().unwrap().map(|settings| settings.mode),
        Some(Mode::PulseWidth)
    );
}
