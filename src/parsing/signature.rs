//! Signature scanner - locates the RAR marker.
//!
//! The marker is `Rar!\x1A\x07` followed by a version byte:
//! RAR4: 0x52 0x61 0x72 0x21 0x1A 0x07 0x00
//! RAR5: 0x52 0x61 0x72 0x21 0x1A 0x07 0x01 0x00
//!
//! Self-extracting archives put an executable stub in front of the marker,
//! so the marker is searched for in a bounded prefix of the source rather
//! than expected at offset 0.

use tracing::debug;

use super::ArchiveVersion;
use crate::byte_search::find_sequence;
use crate::byte_source::{ByteSource, ReadInterval};
use crate::error::{RarError, Result};

/// The six marker bytes shared by every RAR version.
pub const RAR_SIGNATURE: [u8; 6] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07];

/// Largest prefix searched for the marker. Self-extractor stubs above this
/// size are not supported.
pub const MAX_SIGNATURE_SCAN: u64 = 1_000_000;

/// Version byte that follows the marker in RAR 5.0 archives.
const CURRENT_VERSION_MARKER: u8 = 0x01;

/// Where the marker was found and what it says about the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureMatch {
    /// Offset of the first marker byte (the stub length).
    pub offset: u64,
    pub version: ArchiveVersion,
}

impl SignatureMatch {
    /// Offset of the first block header.
    pub fn header_start(&self) -> u64 {
        self.offset + self.version.lead_in()
    }
}

/// Search the first `window` bytes of `source` for the RAR marker.
///
/// `window` is capped at [`MAX_SIGNATURE_SCAN`]. The marker must lie
/// entirely inside the window; the version byte after it may not.
pub fn scan_for_signature<S: ByteSource + ?Sized>(
    source: &mut S,
    window: u64,
) -> Result<SignatureMatch> {
    let window = window.min(MAX_SIGNATURE_SCAN);
    let interval =
        ReadInterval::with_len(0, window).ok_or(RarError::SignatureNotFound { window })?;

    let prefix = source.read_range(interval)?;
    let offset = find_sequence(&prefix, &RAR_SIGNATURE)
        .ok_or(RarError::SignatureNotFound { window })? as u64;

    let version_offset = offset + RAR_SIGNATURE.len() as u64;
    let version_byte = match ReadInterval::with_len(version_offset, 1) {
        Some(interval) => source.read_range(interval)?,
        None => Vec::new(),
    };
    let version = match version_byte.first() {
        Some(&CURRENT_VERSION_MARKER) => ArchiveVersion::Current,
        Some(_) => ArchiveVersion::Legacy,
        None => {
            return Err(RarError::TruncatedInput {
                offset: version_offset,
                needed: 1,
                have: 0,
            })
        }
    };

    debug!(offset, %version, "found RAR signature");

    Ok(SignatureMatch { offset, version })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use std::io::Cursor;

    fn scan(data: Vec<u8>) -> Result<SignatureMatch> {
        scan_for_signature(&mut Cursor::new(data), MAX_SIGNATURE_SCAN)
    }

    #[test]
    fn test_current_at_start() {
        let found = scan(b"Rar!\x1a\x07\x01\x00rest".to_vec()).unwrap();
        assert_eq!(found.offset, 0);
        assert_eq!(found.version, ArchiveVersion::Current);
        assert_eq!(found.header_start(), 8);
    }

    #[test]
    fn test_legacy_at_start() {
        let found = scan(b"Rar!\x1a\x07\x00rest".to_vec()).unwrap();
        assert_eq!(found.version, ArchiveVersion::Legacy);
        assert_eq!(found.header_start(), 7);
    }

    #[test]
    fn test_after_sfx_stub() {
        let mut data = b"MZ".to_vec();
        data.resize(70_000, 0x90);
        data.extend_from_slice(b"Rar!\x1a\x07\x01\x00");
        let found = scan(data).unwrap();
        assert_eq!(found.offset, 70_000);
        assert_eq!(found.header_start(), 70_008);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut data = b"xxRar!\x1a\x07\x00".to_vec();
        data.extend_from_slice(b"Rar!\x1a\x07\x01\x00");
        let found = scan(data).unwrap();
        assert_eq!(found.offset, 2);
        assert_eq!(found.version, ArchiveVersion::Legacy);
    }

    #[test]
    fn test_not_a_rar() {
        assert!(matches!(
            scan(b"PK\x03\x04 definitely a zip".to_vec()),
            Err(RarError::SignatureNotFound { window: MAX_SIGNATURE_SCAN })
        ));
        assert!(matches!(
            scan(Vec::new()),
            Err(RarError::SignatureNotFound { .. })
        ));
    }

    #[test]
    fn test_stub_larger_than_window() {
        let mut data = vec![0u8; MAX_SIGNATURE_SCAN as usize];
        data.extend_from_slice(b"Rar!\x1a\x07\x01\x00");
        assert!(matches!(scan(data), Err(RarError::SignatureNotFound { .. })));
    }

    #[test]
    fn test_marker_straddling_window_end() {
        let mut data = vec![0u8; MAX_SIGNATURE_SCAN as usize - 3];
        data.extend_from_slice(b"Rar!\x1a\x07\x01\x00");
        assert!(matches!(scan(data), Err(RarError::SignatureNotFound { .. })));
    }

    #[test]
    fn test_version_byte_outside_window() {
        let mut data = vec![0u8; MAX_SIGNATURE_SCAN as usize - 6];
        data.extend_from_slice(b"Rar!\x1a\x07\x01\x00");
        let found = scan(data).unwrap();
        assert_eq!(found.offset, MAX_SIGNATURE_SCAN - 6);
        assert_eq!(found.version, ArchiveVersion::Current);
    }

    #[test]
    fn test_narrow_window() {
        let mut data = vec![0u8; 100];
        data.extend_from_slice(b"Rar!\x1a\x07\x01\x00");
        let mut source = Cursor::new(data);
        assert!(matches!(
            scan_for_signature(&mut source, 50),
            Err(RarError::SignatureNotFound { window: 50 })
        ));
        assert_eq!(scan_for_signature(&mut source, 106).unwrap().offset, 100);
        assert!(scan_for_signature(&mut source, 0).is_err());
    }

    #[test]
    fn test_missing_version_byte() {
        assert!(matches!(
            scan(b"Rar!\x1a\x07".to_vec()),
            Err(RarError::TruncatedInput { offset: 6, .. })
        ));
    }

    #[quickcheck]
    fn version_follows_trailing_byte(stub: Vec<u8>, trailing: u8) -> bool {
        // Keep the generated stub from containing a marker of its own
        let stub: Vec<u8> = stub.into_iter().map(|b| b & 0x3F).collect();
        let mut data = stub.clone();
        data.extend_from_slice(&RAR_SIGNATURE);
        data.push(trailing);

        let found = scan(data).unwrap();
        let expected = if trailing == 0x01 {
            (ArchiveVersion::Current, 8)
        } else {
            (ArchiveVersion::Legacy, 7)
        };
        found.offset == stub.len() as u64
            && found.version == expected.0
            && found.header_start() == stub.len() as u64 + expected.1
    }

    #[quickcheck]
    fn no_marker_means_not_found(data: Vec<u8>) -> bool {
        // 0x52 ('R') never survives the mask, so no marker can appear
        let data: Vec<u8> = data.into_iter().map(|b| b & 0x3F).collect();
        matches!(scan(data), Err(RarError::SignatureNotFound { .. }))
    }
}
