//! Viewport — cursor, scroll offset, and the arithmetic that relates them.
//!
//! The cursor lives in document coordinates: `y` is a line index, `x` a
//! column within that line. The offset is the document coordinate shown in
//! the window's top-left cell. [`scroll`] moves the offset just far enough
//! that the cursor is inside the window; it runs once per frame, before
//! drawing.
//!
//! Cursor movement is document-aware:
//!
//! - **Left** at column 0 wraps to the end of the previous line.
//! - **Right** at the end of a line wraps to the start of the next.
//! - **Up/Down** keep the column, but never past the end of the
//!   destination line.
//! - **Down** may move one line past the last one, so the cursor can sit
//!   on the empty row below the text.
//! - **Home** goes to column 0. **End** goes to the last *window* column,
//!   not the end of the line.
//! - **PageUp/PageDown** repeat Up/Down once per window row.

use kilo_term::keys::Key;
use kilo_term::window::Size;

use crate::document::Document;

/// Cursor position in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Cursor {
    /// Column (0-indexed).
    pub x: usize,
    /// Line (0-indexed).
    pub y: usize,
}

impl Cursor {
    /// The origin.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a cursor at column `x`, line `y`.
    #[inline]
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Document coordinate at the window's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Offset {
    /// First visible line.
    pub row: usize,
    /// First visible column.
    pub col: usize,
}

impl Offset {
    /// Create an offset.
    #[inline]
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Adjust `offset` so that `cursor` falls inside a window of `size`.
///
/// Each axis moves independently and only as far as needed: a cursor above
/// or left of the window pulls that edge to it, one below or right pushes
/// the far edge to it. A zero-sized axis is left alone.
pub fn scroll(cursor: Cursor, offset: &mut Offset, size: Size) {
    scroll_axis(cursor.y, &mut offset.row, size.rows());
    scroll_axis(cursor.x, &mut offset.col, size.cols());
}

fn scroll_axis(pos: usize, start: &mut usize, extent: usize) {
    if extent == 0 {
        return;
    }
    if pos < *start {
        *start = pos;
    } else if pos >= *start + extent {
        *start = pos - extent + 1;
    }
}

/// Move `cursor` in response to `key`. Keys without a movement are ignored.
pub fn move_cursor(key: Key, cursor: &mut Cursor, doc: &Document, size: Size) {
    match key {
        Key::Left | Key::Right | Key::Up | Key::Down => step(key, cursor, doc),
        Key::Home => cursor.x = 0,
        Key::End => cursor.x = size.cols().saturating_sub(1),
        Key::PageUp | Key::PageDown => {
            let dir = if key == Key::PageUp { Key::Up } else { Key::Down };
            for _ in 0..size.rows() {
                step(dir, cursor, doc);
            }
        }
        Key::Char(_) | Key::Delete | Key::Escape => {}
    }
}

/// One arrow-key step, then clamp to the line the cursor landed on.
fn step(key: Key, cursor: &mut Cursor, doc: &Document) {
    let line_len = doc.line_len(cursor.y);

    match key {
        Key::Left => {
            if cursor.x != 0 {
                cursor.x -= 1;
            } else if cursor.y > 0 {
                cursor.y -= 1;
                cursor.x = doc.line_len(cursor.y).unwrap_or(0);
            }
        }
        Key::Right => match line_len {
            Some(len) if cursor.x < len => cursor.x += 1,
            Some(len) if cursor.x == len => {
                cursor.y += 1;
                cursor.x = 0;
            }
            _ => {}
        },
        Key::Up => cursor.y = cursor.y.saturating_sub(1),
        Key::Down => {
            if cursor.y < doc.len() {
                cursor.y += 1;
            }
        }
        _ => return,
    }

    let len = doc.line_len(cursor.y).unwrap_or(0);
    cursor.x = cursor.x.min(len);
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Cursor and scroll offset together.
///
/// Doesn't own the document; it's passed to each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    cursor: Cursor,
    offset: Offset,
}

impl Viewport {
    /// Cursor and offset both at the origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cursor: Cursor::ZERO,
            offset: Offset::new(0, 0),
        }
    }

    /// Current cursor.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Current offset.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> Offset {
        self.offset
    }

    /// Place the cursor directly. The offset catches up on the next
    /// [`scroll`](Self::scroll).
    pub const fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Bring the cursor into view.
    pub fn scroll(&mut self, size: Size) {
        scroll(self.cursor, &mut self.offset, size);
    }

    /// Move the cursor for `key`.
    pub fn move_cursor(&mut self, key: Key, doc: &Document, size: Size) {
        move_cursor(key, &mut self.cursor, doc, size);
    }
}
