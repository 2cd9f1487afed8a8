//! ArchiveWalker - forward-only iteration over the blocks of one archive.

use tracing::{debug, trace, warn};

use crate::byte_source::{ByteSource, ReadInterval};
use crate::error::{RarError, Result};
use crate::parsing::block_header::HEADER_PREFETCH_SIZE;
use crate::parsing::{
    decode_block_header, decode_block_header_to_eof, scan_for_signature, ArchiveVersion,
    BlockHeader, BlockKind,
    SignatureMatch, MAX_SIGNATURE_SCAN,
};
use crate::summary::ArchiveSummary;

/// Options for a parse session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// How many leading bytes to search for the signature. Capped at
    /// [`MAX_SIGNATURE_SCAN`].
    pub scan_window: u64,
    /// Check every header's stored checksum.
    pub verify_crc: bool,
    /// Stop after this many blocks.
    pub max_blocks: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            scan_window: MAX_SIGNATURE_SCAN,
            verify_crc: false,
            max_blocks: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    AtBlock(u64),
    Done,
}

/// Lazy sequence of the block headers of one archive, in file order.
///
/// The walker borrows the source for its whole lifetime and yields
/// `Result<BlockHeader>` items. It stops after an end marker, after a block
/// that encrypts the remaining headers, at end of file, or after the first
/// error. It cannot be restarted; walk again with
/// a new walker.
///
/// ```rust,ignore
/// let mut file = std::fs::File::open("release.part01.rar")?;
/// let walker = ArchiveWalker::open(&mut file, ParseOptions::default())?;
/// for block in walker {
///     let block = block?;
///     println!("{:?} at {} ({} bytes)", block.kind, block.offset, block.data_size());
/// }
/// ```
pub struct ArchiveWalker<'a, S: ByteSource + ?Sized> {
    source: &'a mut S,
    signature: SignatureMatch,
    length: u64,
    state: WalkState,
    opts: ParseOptions,
    yielded: usize,
}

impl<'a, S: ByteSource + ?Sized> ArchiveWalker<'a, S> {
    /// Find the signature in `source` and position the walker at the first block.
    pub fn open(source: &'a mut S, opts: ParseOptions) -> Result<Self> {
        let signature = scan_for_signature(&mut *source, opts.scan_window)?;
        Self::with_signature(source, signature, opts)
    }

    /// Walker for a source whose signature has already been located.
    pub fn with_signature(
        source: &'a mut S,
        signature: SignatureMatch,
        opts: ParseOptions,
    ) -> Result<Self> {
        let length = source.length()?;
        Ok(Self {
            source,
            signature,
            length,
            state: WalkState::AtBlock(signature.header_start()),
            opts,
            yielded: 0,
        })
    }

    pub fn version(&self) -> ArchiveVersion {
        self.signature.version
    }

    pub fn signature(&self) -> SignatureMatch {
        self.signature
    }

    /// Offset of the next block to decode, `None` once the walk is over.
    pub fn position(&self) -> Option<u64> {
        match self.state {
            WalkState::AtBlock(offset) => Some(offset),
            WalkState::Done => None,
        }
    }

    /// Consume the walker, reducing every remaining block into a summary.
    pub fn summarize(self) -> Result<ArchiveSummary> {
        let version = self.version();
        ArchiveSummary::from_blocks(version, self)
    }

    fn finish(&mut self) {
        if self.state != WalkState::Done {
            debug!(blocks = self.yielded, "finished walking archive");
        }
        self.state = WalkState::Done;
    }

    fn next_block(&mut self) -> Result<Option<BlockHeader>> {
        let offset = match self.state {
            WalkState::AtBlock(offset) => offset,
            WalkState::Done => return Ok(None),
        };

        let limit_reached = self.opts.max_blocks.is_some_and(|max| self.yielded >= max);
        if limit_reached || offset >= self.length {
            self.finish();
            return Ok(None);
        }

        let version = self.version();
        let remaining = self.length - offset;
        let head_len = (HEADER_PREFETCH_SIZE as u64).min(remaining);
        let interval =
            ReadInterval::with_len(offset, head_len).ok_or(RarError::CorruptHeader {
                offset,
                reason: "header offset overflows",
            })?;
        let head = self.source.read_range(interval)?;
        let header = if head_len == remaining {
            decode_block_header_to_eof(&head, offset, version)?
        } else {
            decode_block_header(&head, offset, version)?
        };

        if header.header_size > self.length - offset {
            return Err(RarError::CorruptHeader {
                offset,
                reason: "header runs past end of file",
            });
        }

        if self.opts.verify_crc {
            self.verify(&header, &head)?;
        }

        let next = header.next_offset().ok_or(RarError::CorruptHeader {
            offset,
            reason: "data area size overflows",
        })?;

        trace!(
            offset,
            kind = ?header.kind,
            header_size = header.header_size,
            data_size = header.data_size(),
            "decoded block"
        );

        self.yielded += 1;
        if header.kind == BlockKind::End {
            if next < self.length {
                warn!(
                    offset = next,
                    trailing = self.length - next,
                    "ignoring bytes after end of archive"
                );
            }
            self.finish();
        } else if header.encrypts_following_headers(version) {
            debug!(offset, "remaining headers are encrypted, stopping");
            self.finish();
        } else if next < self.length {
            self.state = WalkState::AtBlock(next);
        } else {
            if next > self.length {
                warn!(
                    offset,
                    missing = next - self.length,
                    "block data runs past end of file, archive is truncated"
                );
            }
            self.finish();
        }

        Ok(Some(header))
    }

    fn verify(&mut self, header: &BlockHeader, head: &[u8]) -> Result<()> {
        let size = header.header_size as usize;
        if size <= head.len() {
            return header.verify_checksum(self.version(), &head[..size]);
        }
        // Header sizes are capped by the decoder, so this read stays small
        let interval = ReadInterval::with_len(header.offset, header.header_size).ok_or(
            RarError::CorruptHeader {
                offset: header.offset,
                reason: "header offset overflows",
            },
        )?;
        let bytes = self.source.read_range(interval)?;
        header.verify_checksum(self.version(), &bytes)
    }
}

impl<S: ByteSource + ?Sized> Iterator for ArchiveWalker<'_, S> {
    type Item = Result<BlockHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_block() {
            Ok(Some(header)) => Some(Ok(header)),
            Ok(None) => None,
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

impl<S: ByteSource + ?Sized> std::iter::FusedIterator for ArchiveWalker<'_, S> {}
