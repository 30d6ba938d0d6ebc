//! The variable-length integer used by every count and length field.
//!
//! The first byte is a tag: values below 253 are stored inline, 253/254/255
//! announce a trailing little-endian u16/u32/u64.

use blkfile_types::{DecodeError, DecodeResult};

/// Decode a varint from the front of `data`. Returns `(value, consumed)`.
pub fn decode(data: &[u8]) -> DecodeResult<(u64, usize)> {
    let tag = match data.first() {
        Some(&tag) => tag,
        None => return Err(DecodeError::MalformedVarint { offset: 0 }),
    };

    let width = match tag {
        0..=252 => return Ok((u64::from(tag), 1)),
        253 => 2,
        254 => 4,
        255 => 8,
    };

    if data.len() < 1 + width {
        return Err(DecodeError::Truncated {
            offset: 1,
            needed: width,
            available: data.len() - 1,
        });
    }

    let mut raw = [0u8; 8];
    raw[..width].copy_from_slice(&data[1..1 + width]);
    Ok((u64::from_le_bytes(raw), 1 + width))
}

/// Encode `value` with the canonical minimal-length rule. Returns the number
/// of bytes appended.
pub fn encode(buf: &mut Vec<u8>, value: u64) -> usize {
    match value {
        0..=252 => {
            buf.push(value as u8);
            1
        }
        253..=0xFFFF => {
            buf.push(253);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
            3
        }
        0x1_0000..=0xFFFF_FFFF => {
            buf.push(254);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
            5
        }
        _ => {
            buf.push(255);
            buf.extend_from_slice(&value.to_le_bytes());
            9
        }
    }
}
