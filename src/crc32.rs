//! CRC32 calculation for RAR header checksums.

/// CRC32 lookup table (polynomial 0xEDB88320)
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Calculate CRC32 of data (standard RAR CRC32)
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFFFFFF_u32;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFFFFFF
}

/// Checksum of a RAR 5.0 header: CRC32 of everything after the 4-byte CRC field.
///
/// `header` must hold the complete header, CRC field included.
pub fn current_header_checksum(header: &[u8]) -> u32 {
    crc32(header.get(4..).unwrap_or_default())
}

/// Checksum of a RAR 1.5-4.x header: low 16 bits of the CRC32 of everything
/// after the 2-byte CRC field.
pub fn legacy_header_checksum(header: &[u8]) -> u32 {
    crc32(header.get(2..).unwrap_or_default()) & 0xFFFF
}
