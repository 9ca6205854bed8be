//! Parser and converter for `.csl` configuration files.
//!
//! A `.csl` file is an indentation-based list of `key: value` entries:
//!
//! ```text
//! # comment
//! source:
//!   alias: base
//!   type: file
//! database:
//!   host: localhost
//!   port: 5432
//! ports:
//!   - 80
//!   - 443
//! app:
//!   db: @base:base:database
//!   url: "postgres://@base:base:database.host:5432"
//! ```
//!
//! [`parse_document`] turns a file into a [`csl_config::Document`] plus the
//! [`SourceDecl`]s it declares. Literal scalars are always strings. A value
//! that is exactly one reference token becomes [`csl_config::Value::Reference`];
//! a value mixing tokens with text becomes [`csl_config::Value::Template`].
//! Both keep the file location of every token.

mod error;
mod lines;
mod parser;
mod scalar;
mod source;

pub use error::{ParseError, Result};
pub use parser::{ParsedFile, parse_document};
pub use source::SourceDecl;
