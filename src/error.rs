//! Error types for RAR container parsing.
//!
//! This module provides the [`RarError`] type which covers every way a parse
//! session can fail. All of them are terminal for the current archive: the
//! parser never re-scans for a later signature or skips over a bad block.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Format | [`SignatureNotFound`] | No RAR magic in the scan window (not a RAR, or stub too large) |
//! | Corruption | [`TruncatedInput`], [`MalformedVarInt`], [`CorruptHeader`], [`ChecksumMismatch`] | Header bytes are missing or inconsistent |
//! | Unsupported | [`UnrecognizedCriticalBlock`] | Unknown block type that may not be skipped |
//! | I/O | [`Io`] | The byte source failed |
//!
//! ## Example
//!
//! ```rust,ignore
//! use rar_blocks::{ArchiveWalker, ParseOptions, RarError};
//!
//! match ArchiveWalker::open(&mut file, ParseOptions::default()) {
//!     Ok(walker) => println!("{} archive", walker.version()),
//!     Err(RarError::SignatureNotFound { .. }) => eprintln!("Not a RAR file"),
//!     Err(e) => eprintln!("Corrupt archive: {}", e),
//! }
//! ```
//!
//! [`SignatureNotFound`]: RarError::SignatureNotFound
//! [`TruncatedInput`]: RarError::TruncatedInput
//! [`MalformedVarInt`]: RarError::MalformedVarInt
//! [`CorruptHeader`]: RarError::CorruptHeader
//! [`ChecksumMismatch`]: RarError::ChecksumMismatch
//! [`UnrecognizedCriticalBlock`]: RarError::UnrecognizedCriticalBlock
//! [`Io`]: RarError::Io

use std::io;

use thiserror::Error;

/// Error type for RAR container parsing.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RarError {
    /// The RAR magic `52 61 72 21 1A 07` was not found in the scan window.
    ///
    /// Either the source is not a RAR archive, or it is a self-extracting
    /// archive whose stub is larger than the window.
    #[error("RAR signature not found in the first {window} bytes")]
    SignatureNotFound {
        /// Number of bytes that were searched.
        window: u64,
    },

    /// Fewer bytes were available than a field requires.
    #[error("truncated input at offset {offset}: need {needed} bytes, have {have}")]
    TruncatedInput {
        /// Absolute offset of the field.
        offset: u64,
        /// Number of bytes the field needs.
        needed: usize,
        /// Number of bytes that were available.
        have: usize,
    },

    /// A variable-length integer did not terminate within 10 bytes, or the
    /// input ended before its terminating byte.
    #[error("malformed variable-length integer at offset {offset}")]
    MalformedVarInt {
        /// Absolute offset of the first byte of the integer.
        offset: u64,
    },

    /// Decoded header sizes or offsets are internally inconsistent.
    #[error("corrupt block header at offset {offset}: {reason}")]
    CorruptHeader {
        /// Absolute offset of the block.
        offset: u64,
        /// What was inconsistent.
        reason: &'static str,
    },

    /// A block type that is not in the version's type table, without the
    /// `skip_unknown` flag.
    #[error("unrecognized critical block type {raw_type} at offset {offset}")]
    UnrecognizedCriticalBlock {
        /// Absolute offset of the block.
        offset: u64,
        /// The raw type code.
        raw_type: u64,
    },

    /// The stored header checksum does not match the header bytes.
    ///
    /// Only reported when [`ParseOptions::verify_crc`] is set.
    ///
    /// [`ParseOptions::verify_crc`]: crate::ParseOptions::verify_crc
    #[error(
        "header checksum mismatch at offset {offset}: \
         stored {expected:#010x}, computed {actual:#010x}"
    )]
    ChecksumMismatch {
        /// Absolute offset of the block.
        offset: u64,
        /// Checksum stored in the header.
        expected: u32,
        /// Checksum computed over the header bytes.
        actual: u32,
    },

    /// The underlying byte source failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, RarError>;
