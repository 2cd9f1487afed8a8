//! Primitive reads over a header buffer.
//!
//! Fixed-width little-endian integers and the RAR 5.0 variable-length
//! integer (vint): each byte carries 7 data bits, low group first, and the
//! high bit says another byte follows. At most 10 bytes are read. The tenth
//! byte only contributes its lowest bit (bit 63), since 9 * 7 = 63 bits
//! are already filled by then.

use crate::error::{RarError, Result};

/// Maximum encoded length of a vint.
pub const VINT_MAX_LEN: usize = 10;

/// Decode a vint from the start of `data`.
///
/// Returns the value and the number of bytes consumed, or `None` if no
/// terminating byte appears within [`VINT_MAX_LEN`] bytes.
#[inline]
pub fn read_vint(data: &[u8]) -> Option<(u64, usize)> {
    let mut result = 0u64;

    for (i, &byte) in data.iter().take(VINT_MAX_LEN).enumerate() {
        if i == VINT_MAX_LEN - 1 {
            result |= u64::from(byte & 0x01) << 63;
        } else {
            result |= u64::from(byte & 0x7F) << (7 * i);
        }

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }
    }

    // Ran out of bytes, or the tenth byte still had its continuation bit
    None
}

/// Cursor over a byte slice that knows its absolute position in the archive.
pub struct ByteReader<'a> {
    data: &'a [u8],
    base: u64,
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// Reader whose first byte sits at absolute offset `base` of the source.
    /// Only affects the offsets reported in errors.
    pub fn with_base(data: &'a [u8], base: u64) -> Self {
        Self {
            data,
            base,
            offset: 0,
        }
    }

    /// Read the next vint.
    #[inline]
    pub fn read_vint(&mut self) -> Result<u64> {
        let (value, consumed) =
            read_vint(self.remaining()).ok_or(RarError::MalformedVarInt {
                offset: self.absolute_position(),
            })?;
        self.offset += consumed;
        Ok(value)
    }

    /// Read a fixed number of bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let have = self.data.len() - self.offset;
        if count > have {
            return Err(RarError::TruncatedInput {
                offset: self.absolute_position(),
                needed: count,
                have,
            });
        }
        let slice = &self.data[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    #[inline]
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    #[inline]
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[inline]
    pub fn read_u64_le(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Current position relative to the start of the buffer.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Current position in the source.
    pub fn absolute_position(&self) -> u64 {
        self.base + self.offset as u64
    }

    /// Move to `position` (relative to the start of the buffer).
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(RarError::TruncatedInput {
                offset: self.base + position as u64,
                needed: position - self.data.len(),
                have: 0,
            });
        }
        self.offset = position;
        Ok(())
    }

    /// Remaining bytes in the buffer.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }
}
