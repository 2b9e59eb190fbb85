//! # kilo-editor — Viewer core for kilo
//!
//! The pieces between a file on disk and a frame on the terminal:
//!
//! - **[`document`]**: lines and their tab-expanded rendering
//! - **[`viewport`]**: cursor, scroll offset, and document-aware movement
//! - **[`render`]**: one frame of rows, banner, and cursor placement
//! - **[`session`]**: the frame loop: draw, read a key, move
//! - **[`options`]**: `--set name=value` settings
//!
//! Terminal control lives in `kilo-term`; this crate only produces bytes
//! and consumes decoded keys.

pub mod document;
pub mod options;
pub mod render;
pub mod session;
pub mod viewport;

pub use document::Document;
pub use session::{Flow, Session};
