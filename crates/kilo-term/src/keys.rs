// SPDX-License-Identifier: MIT
//
// Key decoder.
//
// Turns raw stdin bytes into one logical key per call. Anything that isn't
// ESC is a key by itself. ESC starts a sequence:
//
//   ESC [ A/B/C/D      arrows
//   ESC [ H / ESC [ F  Home / End
//   ESC O H / ESC O F  Home / End (application cursor mode)
//   ESC [ n ~          1,7 Home · 3 Delete · 4,8 End · 5 PageUp · 6 PageDown
//
// A lone ESC is ambiguous until the read timeout expires: if the next byte
// doesn't arrive within one raw-mode read (100ms), the user pressed Escape.
// Unknown or truncated sequences also decode to Escape. Nothing here is an
// error except a read that fails outright.
//
// The decoder never reads more than four bytes (ESC plus at most three) per
// call, so a garbled sequence can't swallow the keys typed after it.

use crate::error::Result;
use crate::io::{self, FileIo, STDIN};

/// The escape byte.
pub const ESC: u8 = 0x1b;

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Any byte that doesn't start an escape sequence, control bytes included.
    Char(u8),
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Forward delete.
    Delete,
    /// The Escape key, or a sequence we don't recognize.
    Escape,
}

/// The byte a terminal sends for Ctrl plus `key`.
#[inline]
#[must_use]
pub const fn ctrl_key(key: u8) -> u8 {
    key & 0x1f
}

/// Read and decode one key.
///
/// Blocks until a first byte arrives: zero-byte timeouts and transient
/// errors on that first read are retried. Follow-up bytes of an escape
/// sequence get one read each.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if any read fails with a
/// non-transient error. Timeouts and transient errors after ESC decode to
/// [`Key::Escape`].
pub fn read_key(io: &mut impl FileIo) -> Result<Key> {
    let first = loop {
        match io::read_byte(io, STDIN) {
            Ok(Some(b)) => break b,
            Ok(None) => {}
            Err(err) if io::is_transient(&err) => {}
            Err(err) => return Err(err.into()),
        }
    };

    if first != ESC {
        return Ok(Key::Char(first));
    }
    let key = decode_escape(|| match io::read_byte(io, STDIN) {
        Err(err) if io::is_transient(&err) => Ok(None),
        other => other,
    })?;
    Ok(key)
}

/// Decode the bytes after ESC. `next` yields `None` on timeout.
fn decode_escape(
    mut next: impl FnMut() -> std::io::Result<Option<u8>>,
) -> std::io::Result<Key> {
    let Some(lead) = next()? else {
        return Ok(Key::Escape);
    };
    let Some(code) = next()? else {
        return Ok(Key::Escape);
    };

    Ok(match (lead, code) {
        (b'[', b'0'..=b'9') => match next()? {
            Some(b'~') => tilde_key(code),
            _ => Key::Escape,
        },
        (b'[', b'A') => Key::Up,
        (b'[', b'B') => Key::Down,
        (b'[', b'C') => Key::Right,
        (b'[', b'D') => Key::Left,
        (b'[' | b'O', b'H') => Key::Home,
        (b'[' | b'O', b'F') => Key::End,
        _ => Key::Escape,
    })
}

/// `ESC [ digit ~` keys.
const fn tilde_key(digit: u8) -> Key {
    match digit {
        b'1' | b'7' => Key::Home,
        b'3' => Key::Delete,
        b'4' | b'8' => Key::End,
        b'5' => Key::PageUp,
        b'6' => Key::PageDown,
        _ => Key::Escape,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
