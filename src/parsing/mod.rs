//! RAR block header parsing modules.
//!
//! Two incompatible format eras share one walker:
//! - RAR 1.5-4.x ("legacy"): fixed-width common header, CRC-16, type codes 0x72-0x7B
//! - RAR 5.0+ ("current"): vint sizes, CRC-32, type codes 0-5
//!
//! The era is detected once from the signature and then threaded through
//! every decode as an [`ArchiveVersion`].

pub mod block_header;
pub mod reader;
pub mod signature;

use std::fmt;

pub use block_header::{decode_block_header, decode_block_header_to_eof, BlockHeader};
pub use reader::{read_vint, ByteReader};
pub use signature::{scan_for_signature, SignatureMatch, MAX_SIGNATURE_SCAN, RAR_SIGNATURE};

/// RAR archive format era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveVersion {
    /// RAR 1.5 - 4.x
    Legacy,
    /// RAR 5.0+
    Current,
}

impl ArchiveVersion {
    /// Bytes from the start of the signature to the first block header.
    pub const fn lead_in(self) -> u64 {
        match self {
            Self::Legacy => 7,
            Self::Current => 8,
        }
    }

    /// Resolve a raw type code through this version's type table.
    pub fn block_kind(self, raw_type: u64) -> BlockKind {
        match self {
            Self::Legacy => match raw_type {
                0x72 => BlockKind::Mark,
                0x73 => BlockKind::Main,
                0x74 => BlockKind::File,
                0x75 => BlockKind::Comment,
                0x76 => BlockKind::Authenticity,
                0x77 => BlockKind::SubBlock,
                0x78 => BlockKind::Recovery,
                0x79 => BlockKind::Signature,
                0x7A => BlockKind::Service,
                0x7B => BlockKind::End,
                other => BlockKind::Unknown(other),
            },
            Self::Current => match raw_type {
                0 => BlockKind::Mark,
                1 => BlockKind::Main,
                2 => BlockKind::File,
                3 => BlockKind::Service,
                4 => BlockKind::Encryption,
                5 => BlockKind::End,
                other => BlockKind::Unknown(other),
            },
        }
    }
}

impl fmt::Display for ArchiveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "RAR 1.5"),
            Self::Current => write!(f, "RAR 5.0"),
        }
    }
}

/// Resolved block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Marker block
    Mark,
    /// Main archive header
    Main,
    /// File header
    File,
    /// Service header (NTFS streams, ACL, comments in RAR 5.0; new-style sub-blocks in RAR 4.x)
    Service,
    /// Archive encryption header (RAR 5.0 only)
    Encryption,
    /// End of archive
    End,
    /// Old-style comment block (legacy only)
    Comment,
    /// Old-style authenticity verification block (legacy only)
    Authenticity,
    /// Old-style sub-block (legacy only)
    SubBlock,
    /// Recovery record (legacy only)
    Recovery,
    /// Archive signature block (legacy only)
    Signature,
    /// Type code not present in the version's table
    Unknown(u64),
}

impl BlockKind {
    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

/// Common header flags.
///
/// Flags are independent; any combination may be set. For RAR 5.0 they are
/// read straight from the header flags vint. For RAR 1.5-4.x the
/// equivalents are mapped from the 16-bit flag word, see
/// [`HeaderFlags::from_legacy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFlags {
    /// Extra area size follows the type-specific fields
    pub extra_area: bool,
    /// Data area follows the header
    pub data_area: bool,
    /// Block may be skipped if its type is unknown
    pub skip_unknown: bool,
    /// Data continues from previous volume
    pub data_continues_prev: bool,
    /// Data continues in next volume
    pub data_continues_next: bool,
    /// Block depends on the preceding file block
    pub depends_on_prev: bool,
    /// Preserve a child block if the host block is modified
    pub preserve_child: bool,
}

impl HeaderFlags {
    pub const EXTRA_AREA: u64 = 0x0001;
    pub const DATA_AREA: u64 = 0x0002;
    pub const SKIP_UNKNOWN: u64 = 0x0004;
    pub const DATA_CONTINUES_PREV: u64 = 0x0008;
    pub const DATA_CONTINUES_NEXT: u64 = 0x0010;
    pub const DEPENDS_ON_PREV: u64 = 0x0020;
    pub const PRESERVE_CHILD: u64 = 0x0040;

    /// Legacy `LONG_BLOCK`: a 32-bit data size follows the common header.
    pub const LEGACY_LONG_BLOCK: u16 = 0x8000;
    /// Legacy `SKIP_IF_UNKNOWN`.
    pub const LEGACY_SKIP_IF_UNKNOWN: u16 = 0x4000;
    /// Legacy file flag: data continues from previous volume.
    pub const LEGACY_SPLIT_BEFORE: u16 = 0x0001;
    /// Legacy file flag: data continues in next volume.
    pub const LEGACY_SPLIT_AFTER: u16 = 0x0002;

    /// Map a RAR 1.5-4.x flag word onto the common flag set.
    ///
    /// The low bits are block-specific there, so split flags are only
    /// honoured for file and service blocks. Those two always carry a packed
    /// data size, whether or not `LONG_BLOCK` is set.
    pub fn from_legacy(flags: u16, kind: BlockKind) -> Self {
        let file_like = matches!(kind, BlockKind::File | BlockKind::Service);
        Self {
            extra_area: false,
            data_area: file_like || flags & Self::LEGACY_LONG_BLOCK != 0,
            skip_unknown: flags & Self::LEGACY_SKIP_IF_UNKNOWN != 0,
            data_continues_prev: file_like && flags & Self::LEGACY_SPLIT_BEFORE != 0,
            data_continues_next: file_like && flags & Self::LEGACY_SPLIT_AFTER != 0,
            depends_on_prev: false,
            preserve_child: false,
        }
    }
}

impl From<u64> for HeaderFlags {
    fn from(flags: u64) -> Self {
        Self {
            extra_area: flags & Self::EXTRA_AREA != 0,
            data_area: flags & Self::DATA_AREA != 0,
            skip_unknown: flags & Self::SKIP_UNKNOWN != 0,
            data_continues_prev: flags & Self::DATA_CONTINUES_PREV != 0,
            data_continues_next: flags & Self::DATA_CONTINUES_NEXT != 0,
            depends_on_prev: flags & Self::DEPENDS_ON_PREV != 0,
            preserve_child: flags & Self::PRESERVE_CHILD != 0,
        }
    }
}
