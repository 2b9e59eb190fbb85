// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write VT100 sequences to any `impl Write`. No state,
// no decisions about when to emit. Cursor positions are 0-indexed in our
// API and converted to 1-indexed for the terminal.
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to a `ScreenBuffer` or a `Vec`.

use std::io::{self, Write};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(row, col)` using CUP. Both 0-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: usize, col: usize) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", row + 1, col + 1)
}

/// Move the cursor to the top-left corner.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Push the cursor to the bottom-right corner.
///
/// `C` and `B` stop at the screen edge, unlike `H` with large arguments
/// whose behavior is unspecified.
#[inline]
pub fn cursor_far_corner(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[999C\x1b[999B")
}

/// Ask for a cursor position report (DSR 6). The reply is `ESC [ r ; c R`.
#[inline]
pub fn query_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[6n")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Erase from the cursor to the end of the line (EL 0).
#[inline]
pub fn erase_line_right(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> Vec<u8> {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        out
    }

    #[test]
    fn cursor_to_is_one_indexed() {
        assert_eq!(emit(|w| cursor_to(w, 0, 0)), b"\x1b[1;1H");
        assert_eq!(emit(|w| cursor_to(w, 9, 19)), b"\x1b[10;20H");
    }

    #[test]
    fn fixed_sequences() {
        assert_eq!(emit(|w| cursor_home(w)), b"\x1b[H");
        assert_eq!(emit(|w| cursor_far_corner(w)), b"\x1b[999C\x1b[999B");
        assert_eq!(emit(|w| query_cursor_position(w)), b"\x1b[6n");
        assert_eq!(emit(|w| cursor_hide(w)), b"\x1b[?25l");
        assert_eq!(emit(|w| cursor_show(w)), b"\x1b[?25h");
        assert_eq!(emit(|w| clear_screen(w)), b"\x1b[2J");
        assert_eq!(emit(|w| erase_line_right(w)), b"\x1b[K");
    }
}
