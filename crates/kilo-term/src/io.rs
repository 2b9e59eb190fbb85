// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// The byte-level seam between the editor and the operating system.
//
// Everything that touches a file descriptor goes through `FileIo`, a trait
// with exactly two operations: read and write. The process implementation
// (`Stdio`) is a thin wrapper over `read(2)` / `write(2)`; `MemoryIo` is an
// in-memory script used for headless runs and for every test in the
// workspace. Retry policy lives in the free functions below, not in the
// implementations, so a scripted EINTR exercises the same loop a real one
// would.

use std::collections::VecDeque;
use std::io;
use std::os::fd::RawFd;

use tracing::warn;

/// Standard input file descriptor.
pub const STDIN: RawFd = libc::STDIN_FILENO;

/// Standard output file descriptor.
pub const STDOUT: RawFd = libc::STDOUT_FILENO;

// ─── FileIo ──────────────────────────────────────────────────────────────────

/// Raw read/write on a file descriptor.
///
/// Both operations behave like their syscalls: they may transfer fewer
/// bytes than requested, return `Ok(0)` (timeout on read, stalled sink on
/// write), or fail with `Interrupted` / `WouldBlock`. Callers decide what
/// to retry.
pub trait FileIo {
    /// Read up to `buf.len()` bytes from `fd`.
    ///
    /// # Errors
    ///
    /// Returns the OS error for the underlying read.
    fn read(&mut self, fd: RawFd, buf: &mut [u8]) -> io::Result<usize>;

    /// Write up to `buf.len()` bytes to `fd`.
    ///
    /// # Errors
    ///
    /// Returns the OS error for the underlying write.
    fn write(&mut self, fd: RawFd, buf: &[u8]) -> io::Result<usize>;
}

/// The process's real file descriptors.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdio;

impl FileIo for Stdio {
    fn read(&mut self, fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
        Ok(n as usize)
    }

    fn write(&mut self, fd: RawFd, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)]
        Ok(n as usize)
    }
}

// ─── Retry helpers ───────────────────────────────────────────────────────────

/// Whether an error is a transient condition that should simply be retried.
#[inline]
#[must_use]
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

/// Make a single one-byte read.
///
/// Returns `Ok(None)` when the read times out with zero bytes.
///
/// # Errors
///
/// Returns whatever the read returned, transient errors included.
pub fn read_byte(io: &mut impl FileIo, fd: RawFd) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    match io.read(fd, &mut byte)? {
        0 => Ok(None),
        _ => Ok(Some(byte[0])),
    }
}

/// Write all of `bytes` to `fd`, retrying transient errors and partial writes.
///
/// A zero-byte write means the sink has stalled. The loop stops there and
/// reports how far it got; that is neither success nor failure, so the
/// caller sees a short count rather than an error.
///
/// # Errors
///
/// Returns the first non-transient write error.
pub fn write_all(io: &mut impl FileIo, fd: RawFd, bytes: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < bytes.len() {
        match io.write(fd, &bytes[written..]) {
            Ok(0) => {
                warn!(written, total = bytes.len(), "write stalled, dropping rest of frame");
                break;
            }
            Ok(n) => written += n.min(bytes.len() - written),
            Err(err) if is_transient(&err) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(written)
}

// ─── MemoryIo ────────────────────────────────────────────────────────────────

/// One scripted read outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStep {
    /// The read delivers this byte.
    Byte(u8),
    /// The read times out with zero bytes.
    Timeout,
    /// The read fails with this error kind.
    Fail(io::ErrorKind),
}

/// One scripted write outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    /// Accept at most this many bytes (zero means a stalled sink).
    Accept(usize),
    /// The write fails with this error kind.
    Fail(io::ErrorKind),
}

/// An in-memory, scripted [`FileIo`].
///
/// Reads pop [`ReadStep`]s in order; once the script is exhausted reads
/// fail with `UnexpectedEof` so a runaway loop surfaces as an error.
/// Writes pop [`WriteStep`]s and accept everything once those run out.
/// All accepted output is captured regardless of descriptor.
#[derive(Debug, Default)]
pub struct MemoryIo {
    reads: VecDeque<ReadStep>,
    writes: VecDeque<WriteStep>,
    output: Vec<u8>,
    write_calls: usize,
}

impl MemoryIo {
    /// An empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A script that delivers `bytes` one read at a time.
    #[must_use]
    pub fn with_input(bytes: &[u8]) -> Self {
        let mut io = Self::new();
        io.push_bytes(bytes);
        io
    }

    /// Queue bytes to be read.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.reads.extend(bytes.iter().copied().map(ReadStep::Byte));
        self
    }

    /// Queue a single read outcome.
    pub fn push_read(&mut self, step: ReadStep) -> &mut Self {
        self.reads.push_back(step);
        self
    }

    /// Queue a single write outcome.
    pub fn push_write(&mut self, step: WriteStep) -> &mut Self {
        self.writes.push_back(step);
        self
    }

    /// Number of scripted reads not yet consumed.
    #[must_use]
    pub fn pending_reads(&self) -> usize {
        self.reads.len()
    }

    /// Number of calls made to [`FileIo::write`].
    #[must_use]
    pub const fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// Everything written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

impl FileIo for MemoryIo {
    fn read(&mut self, _fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.reads.pop_front() {
            Some(ReadStep::Byte(b)) => {
                buf[0] = b;
                Ok(1)
            }
            Some(ReadStep::Timeout) => Ok(0),
            Some(ReadStep::Fail(kind)) => Err(kind.into()),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input script exhausted",
            )),
        }
    }

    fn write(&mut self, _fd: RawFd, buf: &[u8]) -> io::Result<usize> {
        self.write_calls += 1;
        let limit = match self.writes.pop_front() {
            Some(WriteStep::Accept(n)) => n,
            Some(WriteStep::Fail(kind)) => return Err(kind.into()),
            None => buf.len(),
        };
        let n = limit.min(buf.len());
        self.output.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── read_byte ─────────────────────────────────────────────────────

    #[test]
    fn read_byte_returns_byte() {
        let mut io = MemoryIo::with_input(b"x");
        assert_eq!(read_byte(&mut io, STDIN).unwrap(), Some(b'x'));
    }

    #[test]
    fn read_byte_timeout_is_none() {
        let mut io = MemoryIo::new();
        io.push_read(ReadStep::Timeout);
        assert_eq!(read_byte(&mut io, STDIN).unwrap(), None);
    }

    #[test]
    fn read_byte_passes_errors_through() {
        let mut io = MemoryIo::new();
        io.push_read(ReadStep::Fail(io::ErrorKind::Interrupted));
        let err = read_byte(&mut io, STDIN).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }

    #[test]
    fn exhausted_script_is_eof() {
        let mut io = MemoryIo::new();
        let err = read_byte(&mut io, STDIN).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    // ── write_all ─────────────────────────────────────────────────────

    #[test]
    fn write_all_single_write() {
        let mut io = MemoryIo::new();
        assert_eq!(write_all(&mut io, STDOUT, b"hello").unwrap(), 5);
        assert_eq!(io.output(), b"hello");
        assert_eq!(io.write_calls(), 1);
    }

    #[test]
    fn write_all_retries_on_eintr() {
        let mut io = MemoryIo::new();
        io.push_write(WriteStep::Fail(io::ErrorKind::Interrupted));
        assert_eq!(write_all(&mut io, STDOUT, b"hello").unwrap(), 5);
        assert_eq!(io.output(), b"hello");
        assert_eq!(io.write_calls(), 2);
    }

    #[test]
    fn write_all_retries_on_would_block() {
        let mut io = MemoryIo::new();
        io.push_write(WriteStep::Fail(io::ErrorKind::WouldBlock))
            .push_write(WriteStep::Fail(io::ErrorKind::WouldBlock));
        assert_eq!(write_all(&mut io, STDOUT, b"xyz").unwrap(), 3);
        assert_eq!(io.output(), b"xyz");
    }

    #[test]
    fn write_all_handles_partial_writes() {
        let mut io = MemoryIo::new();
        io.push_write(WriteStep::Accept(2))
            .push_write(WriteStep::Accept(2))
            .push_write(WriteStep::Accept(2));
        assert_eq!(write_all(&mut io, STDOUT, b"abcdefg").unwrap(), 7);
        assert_eq!(io.output(), b"abcdefg");
        assert_eq!(io.write_calls(), 4);
    }

    #[test]
    fn write_all_stops_on_zero_byte_write() {
        let mut io = MemoryIo::new();
        io.push_write(WriteStep::Accept(3))
            .push_write(WriteStep::Accept(0));
        assert_eq!(write_all(&mut io, STDOUT, b"abcdef").unwrap(), 3);
        assert_eq!(io.output(), b"abc");
        assert_eq!(io.write_calls(), 2);
    }

    #[test]
    fn write_all_propagates_hard_errors() {
        let mut io = MemoryIo::new();
        io.push_write(WriteStep::Accept(1))
            .push_write(WriteStep::Fail(io::ErrorKind::BrokenPipe));
        let err = write_all(&mut io, STDOUT, b"abc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(io.output(), b"a");
    }

    #[test]
    fn write_all_empty_is_noop() {
        let mut io = MemoryIo::new();
        assert_eq!(write_all(&mut io, STDOUT, b"").unwrap(), 0);
        assert_eq!(io.write_calls(), 0);
    }

    #[test]
    fn transient_classification() {
        assert!(is_transient(&io::ErrorKind::Interrupted.into()));
        assert!(is_transient(&io::ErrorKind::WouldBlock.into()));
        assert!(!is_transient(&io::ErrorKind::BrokenPipe.into()));
    }
}
