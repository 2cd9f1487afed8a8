//! Builders for synthetic archives used across the unit tests.

use crate::crc32::{crc32, legacy_header_checksum};

pub const RAR5_MARKER: &[u8] = b"Rar!\x1a\x07\x01\x00";
pub const RAR4_MARKER: &[u8] = b"Rar!\x1a\x07\x00";

/// LEB128-style encoding, the inverse of `read_vint`.
pub fn encode_vint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// A RAR 5.0 block with a valid CRC.
///
/// `fields` are the type-specific bytes after the common fields. When
/// `flags` has the data area bit, `data` is appended as the block body and
/// its length becomes the data area size.
pub fn current_block(
    raw_type: u64,
    flags: u64,
    extra_area_size: Option<u64>,
    fields: &[u8],
    data: &[u8],
) -> Vec<u8> {
    let mut body = encode_vint(raw_type);
    body.extend(encode_vint(flags));
    if let Some(size) = extra_area_size {
        body.extend(encode_vint(size));
    }
    if flags & 0x0002 != 0 {
        body.extend(encode_vint(data.len() as u64));
    }
    body.extend_from_slice(fields);

    let mut header = encode_vint(body.len() as u64);
    header.extend(body);

    let mut block = crc32(&header).to_le_bytes().to_vec();
    block.extend(header);
    block.extend_from_slice(data);
    block
}

pub fn current_main() -> Vec<u8> {
    current_block(1, 0, None, &[0x00], &[])
}

pub fn current_end() -> Vec<u8> {
    current_block(5, 0, None, &[0x00], &[])
}

/// A RAR 5.0 file block carrying `data` (file fields are opaque filler).
pub fn current_file(flags: u64, data: &[u8]) -> Vec<u8> {
    current_block(2, 0x0002 | flags, None, &[0x00, 0x04, b't', b'e', b's', b't'], data)
}

/// A RAR 1.5-4.x block with a valid CRC16. `fields` follow the 7-byte
/// common header (and the ADD_SIZE word, if given).
pub fn legacy_block(
    raw_type: u8,
    flags: u16,
    add_size: Option<u32>,
    fields: &[u8],
    data: &[u8],
) -> Vec<u8> {
    let size = 7 + add_size.map_or(0, |_| 4) + fields.len();
    let mut block = vec![0, 0, raw_type];
    block.extend_from_slice(&flags.to_le_bytes());
    block.extend_from_slice(&(size as u16).to_le_bytes());
    if let Some(add) = add_size {
        block.extend_from_slice(&add.to_le_bytes());
    }
    block.extend_from_slice(fields);
    let crc = legacy_header_checksum(&block) as u16;
    block[..2].copy_from_slice(&crc.to_le_bytes());
    block.extend_from_slice(data);
    block
}

pub fn legacy_main(flags: u16) -> Vec<u8> {
    legacy_block(0x73, flags, None, &[0; 6], &[])
}

pub fn legacy_end() -> Vec<u8> {
    legacy_block(0x7B, 0x4000, None, &[], &[])
}

/// A RAR 1.5-4.x file block named "test" carrying `data`.
pub fn legacy_file(flags: u16, data: &[u8]) -> Vec<u8> {
    let mut fields = vec![0u8; 21];
    // UNP_SIZE
    fields[0..4].copy_from_slice(&(data.len() as u32).to_le_bytes());
    // METHOD = store
    fields[14] = 0x30;
    // NAME_SIZE
    fields[15] = 4;
    fields.extend_from_slice(b"test");
    legacy_block(0x74, 0x8000 | flags, Some(data.len() as u32), &fields, data)
}

pub fn archive(marker: &[u8], blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = marker.to_vec();
    for block in blocks {
        out.extend_from_slice(block);
    }
    out
}
