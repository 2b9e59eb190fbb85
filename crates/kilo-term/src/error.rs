// SPDX-License-Identifier: MIT
//
// Error taxonomy for terminal control.
//
// Only fatal conditions live here. Transient I/O results (EINTR, EAGAIN)
// are retried where they happen and never become an `Error`, and an
// unrecognized escape sequence is not an error at all: it decodes to
// `Key::Escape`.

use std::io;

use thiserror::Error;

use crate::terminal::RawFlags;

/// A fatal terminal error.
#[derive(Debug, Error)]
pub enum Error {
    /// `tcgetattr` / `tcsetattr` failed.
    #[error("could not {op} terminal attributes: {source}")]
    Attributes {
        /// What we were doing: "read", "apply", "verify", or "restore".
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// `tcsetattr` reported success but some raw-mode changes did not stick.
    /// The original attributes have already been restored.
    #[error("raw mode only partially applied (unapplied: {unapplied:?})")]
    PartialRawMode {
        /// The targeted changes the driver ignored.
        unapplied: RawFlags,
    },

    /// Another controller already owns the process terminal.
    #[error("the process terminal is already claimed by another controller")]
    AlreadyClaimed,

    /// Neither the ioctl nor the cursor-report fallback produced a size.
    #[error("could not determine the window size: {0}")]
    WindowSize(String),

    /// The terminal's reply to a cursor position query was malformed.
    #[error("malformed cursor position report: {0:?}")]
    CursorReport(String),

    /// Any other non-recoverable read or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for terminal operations.
pub type Result<T> = std::result::Result<T, Error>;
