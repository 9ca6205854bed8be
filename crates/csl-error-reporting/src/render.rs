//! Compact located rendering.
//!
//! Downstream tooling parses diagnostics in this exact shape:
//!
//! ```text
//! /configs/app.csl:2:6: Circular reference: base:app → base:app
//! 2 | url: @base:app:.
//!          ^
//! ```
//!
//! The first line is `file:line:col: message`, the second the offending
//! source line prefixed with `N | `, the third a caret under the column.

use csl_source_map::{SourceContext, SourceInfo};

use crate::diagnostic::DiagnosticMessage;

/// Render `message` in the compact located form.
///
/// Files not yet present in `ctx` are read from disk. When the diagnostic
/// has no location only the headline is returned; when the source line
/// cannot be read only the first line is returned.
pub fn render_located(message: &DiagnosticMessage, ctx: &mut SourceContext) -> String {
    match &message.location {
        Some(location) => render_at(&message.headline(), location, ctx),
        None => message.headline(),
    }
}

/// Render an arbitrary one-line `message` at `location`.
pub fn render_at(message: &str, location: &SourceInfo, ctx: &mut SourceContext) -> String {
    let header = format!("{}: {}", location, message);
    let Some(line) = ctx.source_line(location) else {
        return header;
    };

    let gutter = format!("{} | ", location.line());
    let padding = gutter.chars().count() + location.range.start.column;
    format!("{header}\n{gutter}{line}\n{}^", " ".repeat(padding))
}
