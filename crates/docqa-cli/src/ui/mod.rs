//! # CLI UI Module
//!
//! Styling and formatting layer for docqa output.
//!
//! - Every human-readable line starts with a typed prefix (`[ok]`, `[err]`, ...)
//! - Colors are optional and respect `NO_COLOR`
//! - `--json` output bypasses this module entirely
//!
//! ## Module Structure
//!
//! - `color`: Color mode detection and terminal capability checks
//! - `style`: Message types, prefixes, and styling functions
//! - `format`: Text truncation and timestamps
//! - `table`: Citation, history and metric tables with comfy-table
//! - `progress`: Spinner for ingestion and evaluation runs

pub mod color;
pub mod format;
pub mod progress;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use progress::{Progress, ProgressMode};
pub use style::{MessageType, Style};
