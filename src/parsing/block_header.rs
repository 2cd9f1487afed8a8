//! Block header decoder.
//!
//! Decodes the fields every block shares, for either format era, and leaves
//! the type-specific remainder of the header (file names, timestamps,
//! ...) and the block body untouched. Both are skipped by offset arithmetic.
//!
//! RAR 5.0 common header:
//! ```text
//! CRC32        u32   CRC32 of the header from the size field on
//! HEADER_SIZE  vint  bytes following this field
//! TYPE         vint
//! FLAGS        vint
//! EXTRA_SIZE   vint  if FLAGS & 0x0001
//! DATA_SIZE    vint  if FLAGS & 0x0002
//! ```
//!
//! RAR 1.5-4.x common header:
//! ```text
//! CRC16        u16   low 16 bits of the CRC32 of the header after this field
//! TYPE         u8
//! FLAGS        u16
//! SIZE         u16   total header size
//! ADD_SIZE     u32   if FLAGS & 0x8000, or for file and service blocks
//! ```

use super::reader::VINT_MAX_LEN;
use super::{ArchiveVersion, BlockKind, ByteReader, HeaderFlags};
use crate::crc32::{current_header_checksum, legacy_header_checksum};
use crate::error::{RarError, Result};

/// Bytes that always cover the common fields of one header: a 4-byte CRC
/// plus five 10-byte vints for RAR 5.0, or 36 bytes for a RAR 4.x file header.
pub const HEADER_PREFETCH_SIZE: usize = 64;

/// Largest RAR 5.0 header accepted, as in unrar.
pub const MAX_HEADER_SIZE: u64 = 0x20_0000;

const LEGACY_COMMON_SIZE: u64 = 7;
/// Legacy main header flag `MHD_PASSWORD`: headers after this one are encrypted.
const LEGACY_MAIN_PASSWORD: u64 = 0x0080;
/// Legacy file flag `LHD_LARGE`: high 32 bits of the packed size are present.
const LEGACY_LARGE: u16 = 0x0100;
/// Header offset of `HIGH_PACK_SIZE` in a legacy file header.
const LEGACY_HIGH_PACK_SIZE_OFFSET: usize = 32;

/// One decoded block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Absolute offset of the first header byte.
    pub offset: u64,
    /// Stored header checksum. RAR 4.x stores 16 bits, zero-extended here.
    pub crc32: u32,
    /// Total header length in bytes, checksum field included.
    pub header_size: u64,
    pub raw_type: u64,
    pub kind: BlockKind,
    pub flags: HeaderFlags,
    /// The flag word as stored (vint for RAR 5.0, u16 for RAR 4.x).
    pub raw_flags: u64,
    pub extra_area_size: Option<u64>,
    pub data_area_size: Option<u64>,
}

impl BlockHeader {
    /// Offset of the block body, right after the header.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size
    }

    /// Size of the block body, zero when there is no data area.
    pub fn data_size(&self) -> u64 {
        self.data_area_size.unwrap_or(0)
    }

    /// Offset of the next block header, or `None` on overflow.
    pub fn next_offset(&self) -> Option<u64> {
        self.data_offset().checked_add(self.data_size())
    }

    /// Whether every header after this block is encrypted and cannot be decoded.
    pub fn encrypts_following_headers(&self, version: ArchiveVersion) -> bool {
        match version {
            ArchiveVersion::Current => self.kind == BlockKind::Encryption,
            ArchiveVersion::Legacy => {
                self.kind == BlockKind::Main && self.raw_flags & LEGACY_MAIN_PASSWORD != 0
            }
        }
    }

    /// Check the stored checksum against the complete header bytes.
    pub fn verify_checksum(&self, version: ArchiveVersion, header: &[u8]) -> Result<()> {
        let actual = match version {
            ArchiveVersion::Current => current_header_checksum(header),
            ArchiveVersion::Legacy => legacy_header_checksum(header),
        };
        if actual != self.crc32 {
            return Err(RarError::ChecksumMismatch {
                offset: self.offset,
                expected: self.crc32,
                actual,
            });
        }
        Ok(())
    }
}

/// Decode the block header at the start of `buffer`.
///
/// `offset` is the absolute position of `buffer[0]` in the source. The
/// buffer needs to hold the common fields ([`HEADER_PREFETCH_SIZE`] bytes is
/// always enough) but not the whole header.
pub fn decode_block_header(
    buffer: &[u8],
    offset: u64,
    version: ArchiveVersion,
) -> Result<BlockHeader> {
    decode(buffer, offset, version, false)
}

/// Decode the block header at the start of `buffer`, where `buffer` holds
/// every remaining byte of the source.
///
/// A header cut off by the end of the source is a `CorruptHeader` here,
/// whichever field it stops in.
pub fn decode_block_header_to_eof(
    buffer: &[u8],
    offset: u64,
    version: ArchiveVersion,
) -> Result<BlockHeader> {
    decode(buffer, offset, version, true)
}

fn decode(
    buffer: &[u8],
    offset: u64,
    version: ArchiveVersion,
    ends_at_eof: bool,
) -> Result<BlockHeader> {
    let header = match version {
        ArchiveVersion::Current => decode_current(buffer, offset, ends_at_eof)?,
        ArchiveVersion::Legacy => decode_legacy(buffer, offset, ends_at_eof)?,
    };

    if header.kind.is_unknown() && !header.flags.skip_unknown {
        return Err(RarError::UnrecognizedCriticalBlock {
            offset,
            raw_type: header.raw_type,
        });
    }

    Ok(header)
}

/// Reader confined to the declared header.
///
/// Running off the end of the declared header is a `CorruptHeader`; running
/// off the end of `buffer` before that is a genuine truncation.
fn bounded_reader<'a>(
    buffer: &'a [u8],
    offset: u64,
    header_size: u64,
    position: usize,
) -> Result<(ByteReader<'a>, bool)> {
    let buffer_len = buffer.len() as u64;
    let limit = header_size.min(buffer_len) as usize;
    let mut reader = ByteReader::with_base(&buffer[..limit], offset);
    if position > limit {
        return Err(overrun(offset));
    }
    reader.seek(position)?;
    Ok((reader, header_size <= buffer_len))
}

fn overrun(offset: u64) -> RarError {
    RarError::CorruptHeader {
        offset,
        reason: "header fields run past the declared header size",
    }
}

fn past_eof(offset: u64) -> RarError {
    RarError::CorruptHeader {
        offset,
        reason: "header runs past end of file",
    }
}

/// Map a fixed-width read that ran out of source bytes.
fn cut_off<T>(result: Result<T>, ends_at_eof: bool, offset: u64) -> Result<T> {
    match result {
        Err(RarError::TruncatedInput { .. }) if ends_at_eof => Err(past_eof(offset)),
        other => other,
    }
}

/// Check that a header of `header_size` bytes fits in what is left of the source.
fn check_fits(header_size: u64, buffer: &[u8], ends_at_eof: bool, offset: u64) -> Result<()> {
    if ends_at_eof && header_size > buffer.len() as u64 {
        return Err(past_eof(offset));
    }
    Ok(())
}

/// Map a failed read inside a header whose end lies within the buffer.
fn confine<T>(result: Result<T>, whole_header: bool, offset: u64) -> Result<T> {
    match result {
        Err(RarError::TruncatedInput { .. } | RarError::MalformedVarInt { .. }) if whole_header => {
            Err(overrun(offset))
        }
        other => other,
    }
}

fn decode_current(buffer: &[u8], offset: u64, ends_at_eof: bool) -> Result<BlockHeader> {
    let mut reader = ByteReader::with_base(buffer, offset);

    let crc32 = cut_off(reader.read_u32_le(), ends_at_eof, offset)?;
    let stored_size = match reader.read_vint() {
        // Fewer than ten bytes left: the vint was cut off, not overlong
        Err(RarError::MalformedVarInt { .. })
            if ends_at_eof && reader.remaining().len() < VINT_MAX_LEN =>
        {
            return Err(past_eof(offset))
        }
        other => other?,
    };
    let header_size = (reader.position() as u64)
        .checked_add(stored_size)
        .ok_or(RarError::CorruptHeader {
            offset,
            reason: "header size overflows",
        })?;

    if header_size > MAX_HEADER_SIZE {
        return Err(RarError::CorruptHeader {
            offset,
            reason: "header size exceeds the 2 MB limit",
        });
    }
    check_fits(header_size, buffer, ends_at_eof, offset)?;

    let (mut reader, whole_header) =
        bounded_reader(buffer, offset, header_size, reader.position())?;

    let raw_type = confine(reader.read_vint(), whole_header, offset)?;
    let raw_flags = confine(reader.read_vint(), whole_header, offset)?;
    let flags = HeaderFlags::from(raw_flags);

    let extra_area_size = if flags.extra_area {
        Some(confine(reader.read_vint(), whole_header, offset)?)
    } else {
        None
    };
    let data_area_size = if flags.data_area {
        Some(confine(reader.read_vint(), whole_header, offset)?)
    } else {
        None
    };

    if let Some(extra) = extra_area_size {
        if extra > header_size - reader.position() as u64 {
            return Err(RarError::CorruptHeader {
                offset,
                reason: "extra area is larger than the header",
            });
        }
    }

    Ok(BlockHeader {
        offset,
        crc32,
        header_size,
        raw_type,
        kind: ArchiveVersion::Current.block_kind(raw_type),
        flags,
        raw_flags,
        extra_area_size,
        data_area_size,
    })
}

fn decode_legacy(buffer: &[u8], offset: u64, ends_at_eof: bool) -> Result<BlockHeader> {
    let mut reader = ByteReader::with_base(buffer, offset);

    let crc16 = cut_off(reader.read_u16_le(), ends_at_eof, offset)?;
    let raw_type = u64::from(cut_off(reader.read_u8(), ends_at_eof, offset)?);
    let raw_flags = cut_off(reader.read_u16_le(), ends_at_eof, offset)?;
    let header_size = u64::from(cut_off(reader.read_u16_le(), ends_at_eof, offset)?);

    if header_size < LEGACY_COMMON_SIZE {
        return Err(RarError::CorruptHeader {
            offset,
            reason: "header size is smaller than the common header",
        });
    }

    check_fits(header_size, buffer, ends_at_eof, offset)?;

    let kind = ArchiveVersion::Legacy.block_kind(raw_type);
    let flags = HeaderFlags::from_legacy(raw_flags, kind);

    let (mut reader, whole_header) =
        bounded_reader(buffer, offset, header_size, reader.position())?;

    let data_area_size = if flags.data_area {
        let low = u64::from(confine(reader.read_u32_le(), whole_header, offset)?);
        let high = if matches!(kind, BlockKind::File | BlockKind::Service)
            && raw_flags & LEGACY_LARGE != 0
        {
            confine(reader.seek(LEGACY_HIGH_PACK_SIZE_OFFSET), whole_header, offset)?;
            u64::from(confine(reader.read_u32_le(), whole_header, offset)?)
        } else {
            0
        };
        Some((high << 32) | low)
    } else {
        None
    };

    Ok(BlockHeader {
        offset,
        crc32: u32::from(crc16),
        header_size,
        raw_type,
        kind,
        flags,
        raw_flags: u64::from(raw_flags),
        extra_area_size: None,
        data_area_size,
    })
}
