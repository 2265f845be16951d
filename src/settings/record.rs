//! Self-checking storage record for [`Settings`].
//!
//! Layout (little endian):
//!
//! | Offset | Size | Field |
//! | ------ | ---- | ----- |
//! | 0 | 4 | magic `KNB1` |
//! | 4 | 2 | payload length |
//! | 6 | n | `postcard` payload |
//! | 6 + n | 4 | CRC-32 of everything before it |
//!
//! Bytes after the CRC are left as they were (erased flash reads `0xFF`).

use crc32fast::Hasher;

use super::Settings;
use crate::{Error, Result};

const MAGIC: u32 = 0x3142_4E4B; // 'KNB1'
const HEADER_SIZE: usize = 4 + 2; // Magic + PayloadLen
const CRC_SIZE: usize = 4;

/// Largest postcard payload a record carries.
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Bytes needed to hold the largest record.
pub const RECORD_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CRC_SIZE;

/// Encodes `settings` into the front of `buffer`, returning the record length.
///
/// # Errors
///
/// Returns [`Error::FormatError`] if `buffer` is shorter than [`RECORD_SIZE`] or the payload
/// does not fit.
pub fn encode(settings: &Settings, buffer: &mut [u8]) -> Result<usize> {
    if buffer.len() < RECORD_SIZE {
        return Err(Error::FormatError);
    }
    let mut payload_buffer = [0u8; MAX_PAYLOAD_SIZE];
    let payload_len = postcard::to_slice(settings, &mut payload_buffer)
        .map_err(|_| Error::FormatError)?
        .len();

    let stored_len = u16::try_from(payload_len).map_err(|_| Error::FormatError)?;

    buffer[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    buffer[4..HEADER_SIZE].copy_from_slice(&stored_len.to_le_bytes());
    buffer[HEADER_SIZE..HEADER_SIZE + payload_len].copy_from_slice(&payload_buffer[..payload_len]);

    let crc_offset = HEADER_SIZE + payload_len;
    let crc = compute_crc(&buffer[..crc_offset]);
    buffer[crc_offset..crc_offset + CRC_SIZE].copy_from_slice(&crc.to_le_bytes());
    Ok(crc_offset + CRC_SIZE)
}

/// Decodes a record from the front of `buffer`.
///
/// Returns `Ok(None)` when no record was ever written (magic missing, e.g. erased flash).
///
/// # Errors
///
/// Returns [`Error::StorageCorrupted`] if the length, CRC, or payload is invalid.
pub fn decode(buffer: &[u8]) -> Result<Option<Settings>> {
    if buffer.len() < HEADER_SIZE {
        return Ok(None);
    }
    if read_u32(buffer, 0) != Some(MAGIC) {
        return Ok(None);
    }

    let payload_len = usize::from(read_u16(buffer, 4).ok_or(Error::StorageCorrupted)?);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(Error::StorageCorrupted);
    }

    let crc_offset = HEADER_SIZE + payload_len;
    let stored_crc = read_u32(buffer, crc_offset).ok_or(Error::StorageCorrupted)?;
    if stored_crc != compute_crc(&buffer[..crc_offset]) {
        return Err(Error::StorageCorrupted);
    }

    let settings = postcard::from_bytes(&buffer[HEADER_SIZE..crc_offset])
        .map_err(|_| Error::StorageCorrupted)?;
    Ok(Some(settings))
}

fn read_u16(buffer: &[u8], offset: usize) -> Option<u16> {
    let bytes = buffer.get(offset..offset + 2)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u32(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// Compute CRC32 checksum.
fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
