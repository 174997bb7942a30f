//! Bounds-checked little-endian field readers.

use crate::header::CounterDescriptor;
use crate::{FormatError, Result, UNREADABLE_RAW_VALUE};

/// Borrow `len` bytes at `offset`, or report how far the buffer falls short.
#[inline]
pub(crate) fn bytes(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(FormatError::Truncated {
            offset,
            needed: len,
            len: data.len(),
        })
}

#[inline]
fn array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    buf.copy_from_slice(bytes(data, offset, N)?);
    Ok(buf)
}

/// Read little-endian u32.
#[inline]
pub fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    array(data, offset).map(u32::from_le_bytes)
}

/// Read little-endian i32.
#[inline]
pub fn read_i32(data: &[u8], offset: usize) -> Result<i32> {
    array(data, offset).map(i32::from_le_bytes)
}

/// Read little-endian i64.
#[inline]
pub fn read_i64(data: &[u8], offset: usize) -> Result<i64> {
    array(data, offset).map(i64::from_le_bytes)
}

/// Add a header-relative offset to an absolute one.
#[inline]
pub(crate) fn advance(base: usize, delta: u32) -> Result<usize> {
    base.checked_add(delta as usize)
        .ok_or(FormatError::TooLarge {
            what: "offset",
            value: u64::from(delta),
        })
}

/// Read one counter's raw value from the counter block starting at `block`.
///
/// 4-byte counters are unsigned and widened, 8-byte counters are signed.
/// Any other declared size yields [`UNREADABLE_RAW_VALUE`].
pub fn read_counter_value(data: &[u8], block: usize, counter: &CounterDescriptor) -> Result<i64> {
    let offset = advance(block, counter.offset)?;
    match counter.size {
        4 => read_u32(data, offset).map(i64::from),
        8 => read_i64(data, offset),
        _ => Ok(UNREADABLE_RAW_VALUE),
    }
}

/// Decode a NUL-terminated UTF-16LE string stored in `len` bytes at `offset`.
pub(crate) fn utf16_string(data: &[u8], offset: usize, len: usize) -> Result<String> {
    let raw = bytes(data, offset, len)?;
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_le_fields() {
        let data = [0x78, 0x56, 0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(read_u32(&data, 0).unwrap(), 0x1234_5678);
        assert_eq!(read_i32(&data, 4).unwrap(), -1);
        assert_eq!(read_i64(&data, 0).unwrap(), 0xFFFF_FFFF_1234_5678_u64 as i64);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0u8; 6];
        assert_eq!(
            read_u32(&data, 4),
            Err(FormatError::Truncated {
                offset: 4,
                needed: 4,
                len: 6
            })
        );
        assert!(read_i64(&data, usize::MAX - 2).is_err());
    }

    #[test]
    fn test_counter_value_sizes() {
        let mut block = vec![0u8; 24];
        block[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        block[16..24].copy_from_slice(&(-5i64).to_le_bytes());

        let mut counter = CounterDescriptor {
            byte_length: 40,
            name_id: 2,
            help_id: 3,
            default_scale: 0,
            detail_level: 100,
            counter_type: 0,
            size: 4,
            offset: 8,
        };
        assert_eq!(read_counter_value(&block, 0, &counter).unwrap(), i64::from(u32::MAX));

        counter.size = 8;
        counter.offset = 16;
        assert_eq!(read_counter_value(&block, 0, &counter).unwrap(), -5);

        counter.size = 2;
        assert_eq!(read_counter_value(&block, 0, &counter).unwrap(), UNREADABLE_RAW_VALUE);

        counter.size = 8;
        counter.offset = 20;
        assert!(read_counter_value(&block, 0, &counter).is_err());
    }

    #[test]
    fn test_utf16_string_stops_at_nul() {
        let mut data = Vec::new();
        for unit in "cpu0".encode_utf16().chain([0, b'x' as u16]) {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(utf16_string(&data, 0, data.len()).unwrap(), "cpu0");
    }
}
