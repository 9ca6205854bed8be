//! Source locations for csl
//!
//! This crate tracks where values and reference tokens came from so that
//! merge and resolution failures can point back at the exact line and
//! column of the offending `.csl` file.
//!
//! # Overview
//!
//! The core types are:
//! - [`Location`] and [`Range`]: 0-indexed positions inside one file
//! - [`SourceInfo`]: a range tagged with the file it belongs to
//! - [`FileInformation`]: a line-break index for offset lookups
//! - [`SourceContext`]: file contents, loaded eagerly or lazily from disk
//!
//! # Example
//!
//! ```rust
//! use csl_source_map::*;
//!
//! let mut ctx = SourceContext::new();
//! ctx.add_file("/configs/app.csl", "name: app\nurl: @base:app:.\n");
//!
//! let info = SourceInfo::point("/configs/app.csl", Location { offset: 15, row: 1, column: 5 });
//! assert_eq!(ctx.line_text(&info.file, info.range.start.row), Some("url: @base:app:."));
//! ```

pub mod context;
pub mod file_info;
pub mod source_info;
pub mod types;

pub use context::SourceContext;
pub use file_info::FileInformation;
pub use source_info::SourceInfo;
pub use types::{Location, Range};
