// SPDX-License-Identifier: MIT
//
// kilo-term — Terminal plumbing for kilo.
//
// Exclusive byte-level control of a Unix terminal: raw mode that is
// verified after it's applied and always restored, a key decoder for the
// escape sequences arrow and editing keys send, the window size (with a
// cursor-report fallback when the ioctl comes back empty), and a frame
// buffer that reaches the terminal in a single retried write.
//
// No TUI framework underneath. Everything that touches a file descriptor
// goes through the two-method `FileIo` trait, so the whole crate runs
// against an in-memory script in tests.

#[cfg(not(unix))]
compile_error!("kilo-term drives a termios terminal and only builds on Unix");

pub mod ansi;
pub mod error;
pub mod io;
pub mod keys;
pub mod output;
pub mod terminal;
pub mod window;

pub use error::{Error, Result};
