//! Render — one frame of the document, as bytes.
//!
//! Every frame is painted from scratch into a [`ScreenBuffer`]:
//!
//! ```text
//! ESC[?25l  ESC[H                hide cursor, go home
//! row 0 ESC[K \r\n               each row, erased to the right
//! row 1 ESC[K \r\n
//! ...
//! row N-1 ESC[K                  no newline after the last row
//! ESC[{y};{x}H  ESC[?25h         place cursor, show it
//! ```
//!
//! Rows past the end of the document show a `~`. An empty document shows a
//! centered welcome banner a third of the way down. The last row has no
//! trailing newline: emitting one would scroll the terminal by a line.

use std::io::{self, Write};

use kilo_term::ansi;
use kilo_term::output::ScreenBuffer;
use kilo_term::window::Size;

use crate::document::Document;
use crate::viewport::{Cursor, Offset, Viewport};

/// Marker drawn at the start of rows past the end of the document.
pub const ROW_MARKER: u8 = b'~';

/// Version shown in the welcome banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The welcome banner text, untruncated.
#[must_use]
pub fn welcome_message() -> String {
    format!("Kilo editor -- version {VERSION}")
}

/// Write the banner row for a window `cols` wide.
///
/// The message is truncated to fit, then centered. The row marker takes
/// the first padding column, so a banner wider than the window has no
/// marker at all.
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn write_welcome(out: &mut impl Write, cols: usize) -> io::Result<()> {
    let mut msg = welcome_message();
    msg.truncate(cols);

    let mut padding = (cols - msg.len()) / 2;
    if padding > 0 {
        out.write_all(&[ROW_MARKER])?;
        padding -= 1;
    }
    write!(out, "{:padding$}{msg}", "")
}

/// The banner row for a window `cols` wide, as bytes.
#[must_use]
pub fn welcome_row(cols: usize) -> Vec<u8> {
    let mut row = Vec::with_capacity(cols);
    // Writing to a Vec cannot fail.
    let _ = write_welcome(&mut row, cols);
    row
}

/// Write every visible row of `doc`.
///
/// Exactly `size.rows` rows, each followed by an erase-to-end-of-line,
/// with `\r\n` between rows (raw mode has no output post-processing).
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn draw_rows(out: &mut impl Write, size: Size, offset: Offset, doc: &Document) -> io::Result<()> {
    let rows = size.rows();
    let cols = size.cols();

    for y in 0..rows {
        let file_row = y + offset.row;

        if let Some(text) = doc.rendered(file_row) {
            let bytes = text.as_bytes();
            let start = offset.col.min(bytes.len());
            let end = start + (bytes.len() - start).min(cols);
            out.write_all(&bytes[start..end])?;
        } else if doc.is_empty() && y == rows / 3 {
            out.write_all(&welcome_row(cols))?;
        } else {
            out.write_all(&[ROW_MARKER])?;
        }

        ansi::erase_line_right(out)?;
        if y + 1 < rows {
            out.write_all(b"\r\n")?;
        }
    }
    Ok(())
}

/// Write the sequence that puts the terminal cursor on `cursor`.
///
/// `offset` must already contain the cursor (see
/// [`scroll`](crate::viewport::scroll)).
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn write_cursor_position(out: &mut impl Write, cursor: Cursor, offset: Offset) -> io::Result<()> {
    ansi::cursor_to(
        out,
        cursor.y.saturating_sub(offset.row),
        cursor.x.saturating_sub(offset.col),
    )
}

/// The cursor placement sequence for `cursor` under `offset`.
#[must_use]
pub fn cursor_position_sequence(cursor: Cursor, offset: Offset) -> String {
    let mut seq = Vec::with_capacity(16);
    // Writing to a Vec cannot fail.
    let _ = write_cursor_position(&mut seq, cursor, offset);
    String::from_utf8_lossy(&seq).into_owned()
}

/// Compose a complete frame into `screen`, replacing its contents.
///
/// Scrolls the viewport first so the cursor is visible. The caller
/// flushes `screen` once afterwards.
///
/// # Errors
///
/// Propagates errors from the buffer (which never fails in practice).
pub fn refresh_screen(
    screen: &mut ScreenBuffer,
    size: Size,
    viewport: &mut Viewport,
    doc: &Document,
) -> io::Result<()> {
    viewport.scroll(size);

    screen.begin_frame();
    ansi::cursor_hide(screen)?;
    ansi::cursor_home(screen)?;
    draw_rows(screen, size, viewport.offset(), doc)?;
    write_cursor_position(screen, viewport.cursor(), viewport.offset())?;
    ansi::cursor_show(screen)?;
    Ok(())
}
