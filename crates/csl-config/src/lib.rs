//! Values and merging for csl.
//!
//! Every input file is converted into a [`Document`]: an ordered map of
//! [`Value`]s. Documents are folded into a single map with [`fold`], which
//! deep-merges maps, lets later documents win everywhere else, and records
//! which file last touched each top-level key.
//!
//! # Key Features
//!
//! - **Explicit tagged union**: [`Value`] covers null, booleans, numbers,
//!   strings, lists and maps, plus the two reference forms the resolver
//!   consumes ([`Value::Reference`] and [`Value::Template`])
//! - **Last wins**: lists and scalars are replaced, never concatenated
//! - **Provenance**: [`Folded::provenance`] maps each top-level key to the
//!   last file that supplied it
//!
//! # Example
//!
//! ```rust
//! use csl_config::{Document, Value, fold};
//!
//! let base = Document::new("/cfg/base.csl", [("region", Value::from("us-east-1"))]);
//! let prod = Document::new("/cfg/prod.csl", [("region", Value::from("us-west-2"))]);
//!
//! let folded = fold(vec![base, prod]);
//! assert_eq!(folded.data["region"], Value::from("us-west-2"));
//! assert_eq!(folded.provenance["region"].source.to_str(), Some("/cfg/prod.csl"));
//! ```

mod merge;
mod reference;
mod value;

pub use merge::{Document, Folded, Provenance, fold, merge_maps, merge_value};
pub use reference::{
    Fragment, Reference, ReferenceSyntaxError, Template, TemplatePart, contains_reference,
    is_alias_char, parse_reference, scan_references,
};
pub use value::{Map, Value};

// Re-export for convenience
pub use csl_source_map::SourceInfo;
