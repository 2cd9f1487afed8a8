//! ByteSource trait - abstract seekable byte source for RAR reading.
//!
//! The parser borrows a source for one parse session and only ever reads
//! from it. Opening and closing the underlying file is the caller's job.

use std::io::{self, Read, Seek, SeekFrom};

/// Inclusive byte range `[start, end]` within a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadInterval {
    pub start: u64,
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ReadInterval {
    /// Interval covering `len` bytes starting at `start`.
    ///
    /// Returns `None` when `len` is zero or the interval would end past
    /// `u64::MAX`.
    pub fn with_len(start: u64, len: u64) -> Option<Self> {
        let end = start.checked_add(len.checked_sub(1)?)?;
        Some(Self { start, end })
    }

    /// Number of bytes covered by the interval, saturating at `u64::MAX`.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }
}

/// A seekable, readable binary source: an open file or an in-memory buffer.
///
/// Implemented for every `Read + Seek` type, so `std::fs::File` and
/// `std::io::Cursor` work out of the box.
pub trait ByteSource {
    /// Total length of the source in bytes.
    fn length(&mut self) -> io::Result<u64>;

    /// Read the bytes of `interval`.
    ///
    /// Returns fewer bytes than requested only when the source ends inside
    /// the interval. The read position is left where it was before the call.
    fn read_range(&mut self, interval: ReadInterval) -> io::Result<Vec<u8>>;
}

impl<T: Read + Seek + ?Sized> ByteSource for T {
    fn length(&mut self) -> io::Result<u64> {
        let current = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(current))?;
        Ok(end)
    }

    fn read_range(&mut self, interval: ReadInterval) -> io::Result<Vec<u8>> {
        let len = usize::try_from(interval.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "read range too large"))?;
        let current = self.stream_position()?;
        self.seek(SeekFrom::Start(interval.start))?;
        let mut buffer = Vec::with_capacity(len.min(1 << 20));
        let read = Read::take(&mut *self, interval.len()).read_to_end(&mut buffer);
        self.seek(SeekFrom::Start(current))?;
        read?;
        Ok(buffer)
    }
}
