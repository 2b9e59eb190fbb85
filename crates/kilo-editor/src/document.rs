//! Document — the lines being viewed, plus their on-screen form.
//!
//! A `Document` keeps two parallel sequences: the lines as they appear in
//! the file, and a *rendered* copy of each line with tabs expanded to the
//! next tab stop. Cursor movement uses the first; drawing uses the second.
//!
//! Columns are byte offsets. There is no Unicode-aware column mapping: a
//! multi-byte character occupies as many columns as it has bytes, and the
//! renderer clips on byte boundaries.
//!
//! The viewer never edits text. The only mutation is appending whole
//! lines, which is how a file gets loaded.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Tab stop used unless configured otherwise.
pub const DEFAULT_TAB_STOP: usize = 8;

/// Expand tabs in `line` to the next multiple of `tab_stop`.
///
/// A `tab_stop` of 0 is treated as 1.
#[must_use]
pub fn render_line(line: &str, tab_stop: usize) -> String {
    let tab_stop = tab_stop.max(1);
    let tabs = line.bytes().filter(|&b| b == b'\t').count();
    let mut out = String::with_capacity(line.len() + tabs * (tab_stop - 1));

    for ch in line.chars() {
        if ch == '\t' {
            out.push(' ');
            while out.len() % tab_stop != 0 {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// An ordered sequence of lines and their tab-expanded rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    rendered: Vec<String>,
    tab_stop: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with the default tab stop.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_tab_stop(DEFAULT_TAB_STOP)
    }

    /// An empty document with a custom tab stop (minimum 1).
    #[must_use]
    pub const fn with_tab_stop(tab_stop: usize) -> Self {
        Self {
            lines: Vec::new(),
            rendered: Vec::new(),
            tab_stop: if tab_stop == 0 { 1 } else { tab_stop },
        }
    }

    /// Build a document from text, splitting on `\n` and `\r\n`.
    ///
    /// A trailing newline does not produce an extra empty line.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut doc = Self::new();
        for line in text.lines() {
            doc.push_line(line);
        }
        doc
    }

    /// Load a file line by line.
    ///
    /// Invalid UTF-8 is replaced rather than rejected: the viewer should
    /// still show the rest of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn open(path: &Path, tab_stop: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::read_from(file, tab_stop)
    }

    /// Load lines from any reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub fn read_from(reader: impl Read, tab_stop: usize) -> io::Result<Self> {
        let mut doc = Self::with_tab_stop(tab_stop);
        for chunk in BufReader::new(reader).split(b'\n') {
            let mut bytes = chunk?;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            doc.push_line(String::from_utf8_lossy(&bytes));
        }
        Ok(doc)
    }

    /// Append a line. `line` must not contain a newline.
    pub fn push_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.rendered.push(render_line(&line, self.tab_stop));
        self.lines.push(line);
    }

    /// Number of lines.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document has no lines at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The text of line `idx`.
    #[inline]
    #[must_use]
    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Length of line `idx` in columns, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn line_len(&self, idx: usize) -> Option<usize> {
        self.lines.get(idx).map(String::len)
    }

    /// The tab-expanded form of line `idx`.
    #[inline]
    #[must_use]
    pub fn rendered(&self, idx: usize) -> Option<&str> {
        self.rendered.get(idx).map(String::as_str)
    }

    /// Current tab stop.
    #[inline]
    #[must_use]
    pub const fn tab_stop(&self) -> usize {
        self.tab_stop
    }

    /// Change the tab stop (minimum 1) and re-render every line.
    pub fn set_tab_stop(&mut self, tab_stop: usize) {
        self.tab_stop = tab_stop.max(1);
        self.rendered = self
            .lines
            .iter()
            .map(|line| render_line(line, self.tab_stop))
            .collect();
    }
}
