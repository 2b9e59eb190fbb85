// SPDX-License-Identifier: MIT
//
// Frame buffering.
//
// A frame is hundreds of small pieces: escape sequences, row text, erase
// codes. Written one by one, the terminal would paint them as they arrive
// and the user would see the screen tear. Instead everything goes into a
// `ScreenBuffer` and leaves in a single retried write at frame end.

use std::io::{self, Write};
use std::os::fd::RawFd;

use crate::io::{self as fdio, FileIo};

/// Default capacity: enough for a full 80×24 frame with escapes.
const DEFAULT_CAPACITY: usize = 4096;

/// A byte buffer holding one frame of output.
///
/// Append-only within a frame; [`begin_frame`](Self::begin_frame) clears
/// it and [`flush_to`](Self::flush_to) sends it.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    buf: Vec<u8>,
}

impl ScreenBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Start a new frame. Keeps the allocation.
    #[inline]
    pub fn begin_frame(&mut self) {
        self.buf.clear();
    }

    /// Append raw bytes.
    #[inline]
    pub fn push(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append a string.
    #[inline]
    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.push(s.as_bytes())
    }

    /// Write the frame to `fd` in one retried write.
    ///
    /// Returns the number of bytes written, which is short of
    /// [`len`](Self::len) only if the sink stalled. The buffer is not
    /// cleared; the next [`begin_frame`](Self::begin_frame) does that.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient write error.
    pub fn flush_to(&self, io: &mut impl FileIo, fd: RawFd) -> io::Result<usize> {
        fdio::write_all(io, fd, &self.buf)
    }
}

impl Write for ScreenBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via ScreenBuffer::flush_to.
        Ok(())
    }
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
