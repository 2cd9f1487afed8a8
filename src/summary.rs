//! Archive-level facts reduced from a block walk.

use crate::error::Result;
use crate::parsing::{ArchiveVersion, BlockHeader, BlockKind};

/// Legacy main header flag: archive is a volume of a multi-volume set.
const LEGACY_MAIN_VOLUME: u64 = 0x0001;
/// Legacy file header flag: file data is encrypted.
const LEGACY_FILE_ENCRYPTED: u64 = 0x0004;

/// What a caller usually wants to know about an archive without reading
/// any file data.
///
/// Only the common header fields are consulted. A RAR 5.0 archive whose
/// file data (but not headers) is encrypted keeps that fact in the file
/// header's extra area, which is not decoded, so `is_encrypted` only
/// reports header encryption for that format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub version: ArchiveVersion,
    /// Number of blocks walked.
    pub block_count: usize,
    /// Number of file blocks.
    pub file_count: usize,
    /// Number of service blocks (comments, NTFS streams, ...).
    pub service_count: usize,
    /// Headers or file data are password protected.
    pub is_encrypted: bool,
    /// Some block continues from or into another volume.
    pub is_multi_volume: bool,
    /// The walk reached an end-of-archive block.
    pub has_end_marker: bool,
    /// Sum of the data area sizes of all file blocks.
    pub packed_size: u64,
}

impl ArchiveSummary {
    pub fn new(version: ArchiveVersion) -> Self {
        Self {
            version,
            block_count: 0,
            file_count: 0,
            service_count: 0,
            is_encrypted: false,
            is_multi_volume: false,
            has_end_marker: false,
            packed_size: 0,
        }
    }

    /// Fold one block into the summary.
    pub fn record(&mut self, block: &BlockHeader) {
        self.block_count += 1;

        if block.flags.data_continues_prev || block.flags.data_continues_next {
            self.is_multi_volume = true;
        }
        if block.encrypts_following_headers(self.version) {
            self.is_encrypted = true;
        }

        match block.kind {
            BlockKind::File => {
                self.file_count += 1;
                self.packed_size = self.packed_size.saturating_add(block.data_size());
                if self.version == ArchiveVersion::Legacy
                    && block.raw_flags & LEGACY_FILE_ENCRYPTED != 0
                {
                    self.is_encrypted = true;
                }
            }
            BlockKind::Service => self.service_count += 1,
            BlockKind::End => self.has_end_marker = true,
            BlockKind::Main
                if self.version == ArchiveVersion::Legacy
                    && block.raw_flags & LEGACY_MAIN_VOLUME != 0 =>
            {
                self.is_multi_volume = true;
            }
            _ => {}
        }
    }

    /// Reduce a block sequence, stopping at the first error.
    pub fn from_blocks<I>(version: ArchiveVersion, blocks: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<BlockHeader>>,
    {
        let mut summary = Self::new(version);
        for block in blocks {
            summary.record(&block?);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive_walker::{ArchiveWalker, ParseOptions};
    use crate::error::RarError;
    use crate::testutil::{
        archive, current_block, current_end, current_file, current_main, legacy_end, legacy_file,
        legacy_main, RAR4_MARKER, RAR5_MARKER,
    };
    use std::io::Cursor;

    fn summarize(data: Vec<u8>) -> Result<ArchiveSummary> {
        let mut source = Cursor::new(data);
        ArchiveWalker::open(&mut source, ParseOptions::default())?.summarize()
    }

    #[test]
    fn test_plain_archive() {
        let data = archive(
            RAR5_MARKER,
            &[
                current_main(),
                current_file(0, &[0; 10]),
                current_file(0, &[0; 20]),
                current_block(3, 0x0002, None, &[], b"cmt"),
                current_end(),
            ],
        );
        let summary = summarize(data).unwrap();
        assert_eq!(summary.version, ArchiveVersion::Current);
        assert_eq!(summary.block_count, 5);
        assert_eq!(summary.file_count, 2);
        assert_eq!(summary.service_count, 1);
        assert_eq!(summary.packed_size, 30);
        assert!(summary.has_end_marker);
        assert!(!summary.is_encrypted);
        assert!(!summary.is_multi_volume);
    }

    #[test]
    fn test_split_volume() {
        let data = archive(
            RAR5_MARKER,
            &[current_main(), current_file(0x0010, &[0; 64]), current_end()],
        );
        let summary = summarize(data).unwrap();
        assert!(summary.is_multi_volume);
    }

    #[test]
    fn test_encrypted_headers() {
        let data = archive(
            RAR5_MARKER,
            &[current_block(4, 0, None, &[0x00, 0x00, 0x0F], &[])],
        );
        let summary = summarize(data).unwrap();
        assert!(summary.is_encrypted);
        assert!(!summary.has_end_marker);
    }

    #[test]
    fn test_encrypted_headers_with_ciphertext() {
        let mut ciphertext = vec![0x5Au8; 16];
        ciphertext.extend((0u8..32).map(|b| b ^ 0xC3));
        let data = archive(
            RAR5_MARKER,
            &[current_block(4, 0, None, &[0x00, 0x00, 0x0F], &[]), ciphertext],
        );
        let summary = summarize(data).unwrap();
        assert_eq!(summary.block_count, 1);
        assert!(summary.is_encrypted);
        assert!(!summary.has_end_marker);

        let data = archive(RAR4_MARKER, &[legacy_main(0x0080), vec![0xA7; 40]]);
        let summary = summarize(data).unwrap();
        assert_eq!(summary.block_count, 1);
        assert!(summary.is_encrypted);
        assert!(!summary.has_end_marker);
    }

    #[test]
    fn test_legacy_flags() {
        let data = archive(
            RAR4_MARKER,
            &[legacy_main(0x0001), legacy_file(0x0004, b"secret"), legacy_end()],
        );
        let summary = summarize(data).unwrap();
        assert_eq!(summary.version, ArchiveVersion::Legacy);
        assert_eq!(summary.file_count, 1);
        assert_eq!(summary.packed_size, 6);
        assert!(summary.is_encrypted);
        assert!(summary.is_multi_volume);
    }

    #[test]
    fn test_error_propagates() {
        let critical = current_block(77, 0, None, &[], &[]);
        let data = archive(RAR5_MARKER, &[current_main(), critical]);
        assert!(matches!(
            summarize(data),
            Err(RarError::UnrecognizedCriticalBlock { .. })
        ));
    }
}
