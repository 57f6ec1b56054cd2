//! Batch codec
//!
//! Encoding and decoding of [`DirtyBatch`] frames.

use crate::error::{CacheError, Result};

use super::DirtyBatch;

/// Frame magic: "NDBC"
pub const BATCH_MAGIC: u32 = 0x4E44_4243;

/// Header size: magic (4) + payload length (4) + CRC32 (4)
pub const HEADER_SIZE: usize = 12;

/// Encode a batch to a checksummed frame
///
/// Format: magic (4) + payload_len (4) + crc (4) + payload
pub fn encode_batch(batch: &DirtyBatch) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(batch).map_err(|e| CacheError::Serialization(e.to_string()))?;

    let payload_len = u32::try_from(payload.len()).map_err(|_| {
        CacheError::Serialization(format!("batch payload too large: {} bytes", payload.len()))
    })?;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&BATCH_MAGIC.to_be_bytes());
    frame.extend_from_slice(&payload_len.to_be_bytes());
    frame.extend_from_slice(&crc.to_be_bytes());
    frame.extend_from_slice(&payload);

    Ok(frame)
}

/// Decode a batch from a checksummed frame
///
/// The frame must contain exactly one batch; trailing bytes are rejected.
pub fn decode_batch(bytes: &[u8]) -> Result<DirtyBatch> {
    if bytes.len() < HEADER_SIZE {
        return Err(CacheError::Corruption(format!(
            "frame too short: {} bytes, header needs {}",
            bytes.len(),
            HEADER_SIZE
        )));
    }

    let magic = read_u32(bytes, 0);
    if magic != BATCH_MAGIC {
        return Err(CacheError::Corruption(format!("bad magic: {:#010x}", magic)));
    }

    let payload_len = read_u32(bytes, 4) as usize;
    let expected_crc = read_u32(bytes, 8);

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len {
        return Err(CacheError::Corruption(format!(
            "payload length mismatch: header says {}, frame has {}",
            payload_len,
            payload.len()
        )));
    }

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(CacheError::Corruption(format!(
            "checksum mismatch: expected {:#010x}, got {:#010x}",
            expected_crc, actual_crc
        )));
    }

    bincode::deserialize(payload).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Read a big-endian u32 at `offset` (caller checked bounds)
fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(buf)
}
