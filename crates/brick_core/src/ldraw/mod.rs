//! LDraw support for brick.
//!
//! This module parses LDraw text and flattens a model's sub-file reference
//! graph into triangle geometry.
//!
//! ## Supported Line Types
//!
//! - `1` sub-file reference (transform, color, file name)
//! - `3` triangle
//! - `4` quad (split into two triangles)
//! - `0 FILE` / `0 NOFILE` multi-part document blocks
//!
//! Every other line (comments, meta commands, line types `2` and `5`) is
//! skipped.
//!
//! ## Not Yet Supported
//!
//! - BFC winding certification
//! - Texture mapping (`!TEXMAP`)
//! - Edge lines and conditional lines
//!
//! # Example
//!
//! ```ignore
//! use brick_core::ldraw::{parse_line, Command};
//!
//! let parsed = parse_line("3 4 0 0 0 1 0 0 0 1 0").unwrap();
//! assert!(matches!(parsed.command, Command::Triangle(_)));
//! ```

mod accumulator;
mod cache;
mod color;
mod command;
mod model;
mod palette;
mod source;

pub use accumulator::*;
pub use cache::*;
pub use color::*;
pub use command::*;
pub use model::*;
pub use palette::*;
pub use source::*;

pub(crate) use model::walk_command;
