// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Window size — ioctl first, cursor report as the fallback.
//
// Some terminals (and some pty setups) answer TIOCGWINSZ with an error or
// with zero columns. For those we push the cursor as far right and down as
// it will go and ask the terminal where it ended up. The reply arrives on
// stdin as `ESC [ rows ; cols R`, read byte-by-byte under the raw-mode
// read timeout, so a terminal that never answers can't hang us.

use crate::ansi;
use crate::error::{Error, Result};
use crate::io::{self, FileIo, STDIN, STDOUT};

/// Longest cursor report we accept, in bytes.
const REPORT_MAX: usize = 31;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

impl Size {
    /// Create a size.
    #[inline]
    #[must_use]
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Rows as `usize`, for document arithmetic.
    #[inline]
    #[must_use]
    pub const fn rows(self) -> usize {
        self.rows as usize
    }

    /// Columns as `usize`, for document arithmetic.
    #[inline]
    #[must_use]
    pub const fn cols(self) -> usize {
        self.cols as usize
    }

    /// Both dimensions non-zero.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.rows > 0 && self.cols > 0
    }
}

/// Query the size via `ioctl(TIOCGWINSZ)` on stdout.
///
/// Returns `None` if the query fails or reports zero columns or rows.
#[must_use]
pub fn ioctl_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(STDOUT, libc::TIOCGWINSZ, &raw mut ws) };

    let size = Size::new(ws.ws_row, ws.ws_col);
    (result == 0 && size.is_valid()).then_some(size)
}

/// Determine the window size, falling back to a cursor report.
///
/// Must run in raw mode: the fallback reads the terminal's reply from
/// stdin and relies on the read timeout.
///
/// # Errors
///
/// Returns [`Error::WindowSize`] or [`Error::CursorReport`] if the fallback
/// can't produce a size, and [`Error::Io`] on write failure.
pub fn query_size(io: &mut impl FileIo) -> Result<Size> {
    if let Some(size) = ioctl_size() {
        return Ok(size);
    }
    tracing::debug!("TIOCGWINSZ unavailable, falling back to cursor report");
    size_from_cursor_report(io)
}

/// Move the cursor to the bottom-right corner and read back its position.
///
/// # Errors
///
/// See [`query_size`].
pub fn size_from_cursor_report(io: &mut impl FileIo) -> Result<Size> {
    let mut seq = Vec::with_capacity(12);
    ansi::cursor_far_corner(&mut seq)?;
    if io::write_all(io, STDOUT, &seq)? != seq.len() {
        return Err(Error::WindowSize(
            "could not move the cursor to the bottom-right corner".into(),
        ));
    }
    cursor_position(io)
}

/// Ask the terminal for the cursor position (1-indexed rows/cols).
///
/// # Errors
///
/// Returns [`Error::CursorReport`] if the reply is missing or malformed,
/// and [`Error::Io`] if a read fails with a non-transient error.
pub fn cursor_position(io: &mut impl FileIo) -> Result<Size> {
    let mut seq = Vec::with_capacity(4);
    ansi::query_cursor_position(&mut seq)?;
    if io::write_all(io, STDOUT, &seq)? != seq.len() {
        return Err(Error::WindowSize("could not query the cursor position".into()));
    }

    let mut reply = Vec::with_capacity(REPORT_MAX);
    while reply.len() < REPORT_MAX {
        match io::read_byte(io, STDIN) {
            Ok(Some(b'R') | None) => break,
            Ok(Some(b)) => reply.push(b),
            Err(err) if io::is_transient(&err) => {}
            Err(err) => return Err(err.into()),
        }
    }

    let size = parse_cursor_report(&reply)?;
    if !size.is_valid() {
        return Err(Error::WindowSize(format!(
            "terminal reported {}x{}",
            size.cols, size.rows
        )));
    }
    Ok(size)
}

/// Parse `ESC [ rows ; cols` (the trailing `R` already stripped).
///
/// # Errors
///
/// Returns [`Error::CursorReport`] with the offending reply.
pub fn parse_cursor_report(reply: &[u8]) -> Result<Size> {
    let malformed = || Error::CursorReport(String::from_utf8_lossy(reply).into_owned());

    let body = reply.strip_prefix(b"\x1b[").ok_or_else(malformed)?;
    let text = std::str::from_utf8(body).map_err(|_| malformed())?;
    let (rows, cols) = text.split_once(';').ok_or_else(malformed)?;

    let rows = rows.parse::<u16>().map_err(|_| malformed())?;
    let cols = cols.parse::<u16>().map_err(|_| malformed())?;
    Ok(Size::new(rows, cols))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemoryIo, ReadStep, WriteStep};
    use pretty_assertions::assert_eq;

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn size_accessors() {
        let s = Size::new(24, 80);
        assert_eq!(s.rows(), 24);
        assert_eq!(s.cols(), 80);
        assert!(s.is_valid());
    }

    #[test]
    fn zero_size_is_invalid() {
        assert!(!Size::new(0, 80).is_valid());
        assert!(!Size::new(24, 0).is_valid());
    }

    #[test]
    fn ioctl_size_does_not_panic() {
        let _ = ioctl_size();
    }

    // ── parse_cursor_report ───────────────────────────────────────────

    #[test]
    fn parse_report() {
        assert_eq!(parse_cursor_report(b"\x1b[35;76").unwrap(), Size::new(35, 76));
    }

    #[test]
    fn parse_report_without_escape() {
        assert!(matches!(
            parse_cursor_report(b"[35;76"),
            Err(Error::CursorReport(_))
        ));
    }

    #[test]
    fn parse_report_without_separator() {
        assert!(parse_cursor_report(b"\x1b[3576").is_err());
    }

    #[test]
    fn parse_report_non_numeric() {
        assert!(parse_cursor_report(b"\x1b[a;b").is_err());
    }

    #[test]
    fn parse_report_empty() {
        assert!(parse_cursor_report(b"").is_err());
    }

    // ── Fallback ──────────────────────────────────────────────────────

    #[test]
    fn fallback_moves_then_queries() {
        let mut io = MemoryIo::with_input(b"\x1b[50;132R");
        let size = size_from_cursor_report(&mut io).unwrap();
        assert_eq!(size, Size::new(50, 132));
        assert_eq!(io.output(), b"\x1b[999C\x1b[999B\x1b[6n");
        assert_eq!(io.pending_reads(), 0);
    }

    #[test]
    fn cursor_position_stops_at_r() {
        let mut io = MemoryIo::with_input(b"\x1b[10;20Rxyz");
        assert_eq!(cursor_position(&mut io).unwrap(), Size::new(10, 20));
        assert_eq!(io.pending_reads(), 3);
    }

    #[test]
    fn cursor_position_timeout_without_reply() {
        let mut io = MemoryIo::new();
        io.push_read(ReadStep::Timeout);
        assert!(matches!(
            cursor_position(&mut io),
            Err(Error::CursorReport(_))
        ));
    }

    #[test]
    fn cursor_position_retries_transient_errors() {
        let mut io = MemoryIo::with_input(b"\x1b[");
        io.push_read(ReadStep::Fail(std::io::ErrorKind::Interrupted))
            .push_bytes(b"24;")
            .push_read(ReadStep::Fail(std::io::ErrorKind::WouldBlock))
            .push_bytes(b"80R");
        assert_eq!(cursor_position(&mut io).unwrap(), Size::new(24, 80));
        assert_eq!(io.pending_reads(), 0);
    }

    #[test]
    fn cursor_position_hard_read_error_is_io() {
        let mut io = MemoryIo::with_input(b"\x1b[24");
        io.push_read(ReadStep::Fail(std::io::ErrorKind::BrokenPipe));
        assert!(matches!(cursor_position(&mut io), Err(Error::Io(_))));
    }

    #[test]
    fn cursor_position_rejects_zero() {
        let mut io = MemoryIo::with_input(b"\x1b[0;80R");
        assert!(matches!(cursor_position(&mut io), Err(Error::WindowSize(_))));
    }

    #[test]
    fn cursor_position_caps_reply_length() {
        let mut io = MemoryIo::with_input(&[b'9'; 40]);
        assert!(cursor_position(&mut io).is_err());
        assert_eq!(io.pending_reads(), 40 - REPORT_MAX);
    }

    #[test]
    fn stalled_output_is_window_size_error() {
        let mut io = MemoryIo::new();
        io.push_write(WriteStep::Accept(0));
        assert!(matches!(
            size_from_cursor_report(&mut io),
            Err(Error::WindowSize(_))
        ));
    }
}
