//! Session: everything the frame loop needs, in one place.
//!
//! A `Session` owns the document, the viewport, the window size, and the
//! frame buffer. It is passed by reference; there is no global editor
//! state. The terminal itself is not part of it: the caller puts the
//! terminal in raw mode and hands the session a [`FileIo`] to talk to.

use kilo_term::Result;
use kilo_term::ansi;
use kilo_term::io::{FileIo, STDOUT, write_all};
use kilo_term::keys::{Key, ctrl_key, read_key};
use kilo_term::output::ScreenBuffer;
use kilo_term::window::Size;
use tracing::{debug, trace};

use crate::document::Document;
use crate::render::refresh_screen;
use crate::viewport::Viewport;

/// Byte that ends the session.
pub const QUIT_KEY: u8 = ctrl_key(b'q');

/// What the frame loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Frame-loop context.
#[derive(Debug)]
pub struct Session {
    doc: Document,
    viewport: Viewport,
    size: Size,
    screen: ScreenBuffer,
}

impl Session {
    /// Start viewing `doc` in a window of `size`, cursor at the origin.
    #[must_use]
    pub fn new(doc: Document, size: Size) -> Self {
        Self {
            doc,
            viewport: Viewport::new(),
            size,
            screen: ScreenBuffer::new(),
        }
    }

    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The most recently composed frame.
    #[must_use]
    pub const fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    /// Route one key. Movement keys go to the viewport; Ctrl-Q quits;
    /// everything else is ignored.
    pub fn process_key(&mut self, key: Key) -> Flow {
        trace!(?key, "key");
        match key {
            Key::Char(QUIT_KEY) => Flow::Quit,
            Key::Up
            | Key::Down
            | Key::Left
            | Key::Right
            | Key::Home
            | Key::End
            | Key::PageUp
            | Key::PageDown => {
                self.viewport.move_cursor(key, &self.doc, self.size);
                Flow::Continue
            }
            Key::Char(_) | Key::Delete | Key::Escape => Flow::Continue,
        }
    }

    /// Compose one frame and send it in a single flush.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient write error.
    pub fn refresh(&mut self, io: &mut impl FileIo) -> Result<()> {
        refresh_screen(&mut self.screen, self.size, &mut self.viewport, &self.doc)?;
        self.screen.flush_to(io, STDOUT)?;
        Ok(())
    }

    /// Clear the screen and home the cursor.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient write error.
    pub fn clear_screen(io: &mut impl FileIo) -> Result<()> {
        let mut seq = Vec::with_capacity(8);
        ansi::clear_screen(&mut seq)?;
        ansi::cursor_home(&mut seq)?;
        write_all(io, STDOUT, &seq)?;
        Ok(())
    }

    /// Draw, read a key, repeat until Ctrl-Q. Clears the screen on quit.
    ///
    /// # Errors
    ///
    /// Any fatal read or write error. The screen is left as it was.
    pub fn run(&mut self, io: &mut impl FileIo) -> Result<()> {
        debug!(rows = self.size.rows, cols = self.size.cols, lines = self.doc.len(), "session start");
        loop {
            self.refresh(io)?;
            let key = read_key(io)?;
            if self.process_key(key) == Flow::Quit {
                break;
            }
        }
        debug!("session quit");
        Self::clear_screen(io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::Cursor;
    use kilo_term::Error;
    use kilo_term::io::{MemoryIo, ReadStep, WriteStep};
    use pretty_assertions::assert_eq;

    fn session(text: &str, rows: u16, cols: u16) -> Session {
        Session::new(Document::from_text(text), Size::new(rows, cols))
    }

    #[test]
    fn quit_key_is_ctrl_q() {
        assert_eq!(QUIT_KEY, 0x11);
        let mut s = session("", 24, 80);
        assert_eq!(s.process_key(Key::Char(0x11)), Flow::Quit);
    }

    #[test]
    fn plain_keys_are_ignored() {
        let mut s = session("abc\ndef", 24, 80);
        for key in [Key::Char(b'q'), Key::Char(b'j'), Key::Delete, Key::Escape] {
            assert_eq!(s.process_key(key), Flow::Continue);
        }
        assert_eq!(s.viewport().cursor(), Cursor::ZERO);
    }

    #[test]
    fn movement_keys_move_cursor() {
        let mut s = session("abc\ndef", 24, 80);
        s.process_key(Key::Right);
        s.process_key(Key::Down);
        assert_eq!(s.viewport().cursor(), Cursor::new(1, 1));
        s.process_key(Key::Home);
        assert_eq!(s.viewport().cursor(), Cursor::new(0, 1));
        s.process_key(Key::PageUp);
        assert_eq!(s.viewport().cursor(), Cursor::ZERO);
    }

    #[test]
    fn refresh_is_one_write() {
        let mut s = session("hello", 3, 10);
        let mut io = MemoryIo::new();
        s.refresh(&mut io).unwrap();

        assert_eq!(io.write_calls(), 1);
        assert_eq!(io.output(), s.screen().as_bytes());
        assert_eq!(
            io.output(),
            b"\x1b[?25l\x1b[Hhello\x1b[K\r\n~\x1b[K\r\n~\x1b[K\x1b[1;1H\x1b[?25h"
        );
    }

    #[test]
    fn refresh_propagates_write_failure() {
        let mut s = session("hello", 3, 10);
        let mut io = MemoryIo::new();
        io.push_write(WriteStep::Fail(std::io::ErrorKind::BrokenPipe));
        assert!(matches!(s.refresh(&mut io), Err(Error::Io(_))));
    }

    #[test]
    fn clear_screen_sequence() {
        let mut io = MemoryIo::new();
        Session::clear_screen(&mut io).unwrap();
        assert_eq!(io.output(), b"\x1b[2J\x1b[H");
    }

    #[test]
    fn run_until_quit() {
        let mut s = session("one\ntwo\nthree", 5, 20);
        // Down, Down, Right, then Ctrl-Q.
        let mut io = MemoryIo::with_input(b"\x1b[B\x1b[B\x1b[C\x11");

        s.run(&mut io).unwrap();

        assert_eq!(s.viewport().cursor(), Cursor::new(1, 2));
        assert_eq!(io.pending_reads(), 0);
        assert!(io.output().ends_with(b"\x1b[2J\x1b[H"));
        // One frame per key read.
        assert_eq!(io.write_calls(), 5);
    }

    #[test]
    fn run_retries_timeouts_before_a_key() {
        let mut s = session("", 5, 20);
        let mut io = MemoryIo::new();
        io.push_read(ReadStep::Timeout)
            .push_read(ReadStep::Fail(std::io::ErrorKind::Interrupted))
            .push_bytes(b"\x11");

        s.run(&mut io).unwrap();
        assert_eq!(io.pending_reads(), 0);
    }

    #[test]
    fn run_fails_on_read_error() {
        let mut s = session("", 5, 20);
        let mut io = MemoryIo::new();
        io.push_read(ReadStep::Fail(std::io::ErrorKind::BrokenPipe));

        assert!(matches!(s.run(&mut io), Err(Error::Io(_))));
        assert!(!io.output().ends_with(b"\x1b[2J\x1b[H"));
    }

    #[test]
    fn run_scrolls_with_cursor() {
        let text = "line\n".repeat(30);
        let mut s = session(&text, 4, 20);
        let mut input = b"\x1b[B".repeat(10);
        input.push(0x11);
        let mut io = MemoryIo::with_input(&input);

        s.run(&mut io).unwrap();

        assert_eq!(s.viewport().cursor(), Cursor::new(0, 10));
        assert_eq!(s.viewport().offset().row, 7);
    }
}
