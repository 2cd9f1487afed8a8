//! Read-only RAR container parser.
//!
//! Locates the RAR signature (skipping any self-extractor stub), detects the
//! format era and walks the block headers of the archive without touching
//! file data.
//!
//! Supports RAR15 (RAR 1.5-4.x) and RAR50 (RAR 5.0+) formats.
//!
//! ```rust,ignore
//! use rar_blocks::{ArchiveWalker, BlockKind, ParseOptions};
//!
//! let mut file = std::fs::File::open("archive.rar")?;
//! let walker = ArchiveWalker::open(&mut file, ParseOptions::default())?;
//! let files = walker
//!     .filter_map(Result::ok)
//!     .filter(|block| block.kind == BlockKind::File)
//!     .count();
//! ```
//!
//! Decompression, decryption and recovery records are out of scope.

mod byte_search;
pub mod byte_source;
mod crc32;
pub mod error;
pub mod parsing;

mod archive_walker;
mod summary;

#[cfg(test)]
mod testutil;

pub use archive_walker::{ArchiveWalker, ParseOptions};
pub use byte_source::{ByteSource, ReadInterval};
pub use error::{RarError, Result};
pub use parsing::{
    scan_for_signature, ArchiveVersion, BlockHeader, BlockKind, HeaderFlags, SignatureMatch,
    MAX_SIGNATURE_SCAN,
};
pub use summary::ArchiveSummary;
