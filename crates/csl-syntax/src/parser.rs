//! Block structure: maps, lists and the top-level document.

use std::collections::HashMap;
use std::path::Path;

use csl_config::{Document, Map, Value, merge_value};
use csl_source_map::FileInformation;

use crate::error::{Result, syntax_error};
use crate::lines::{Line, split_lines};
use crate::source::{SourceDecl, source_decl};

/// One parsed `.csl` file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    /// Data entries, with `source:` blocks removed
    pub document: Document,
    /// Provider declarations, in file order
    pub sources: Vec<SourceDecl>,
}

/// A `key: value` entry as written, before `source:` blocks are split off.
#[derive(Debug)]
pub(crate) struct Entry {
    pub key: String,
    /// Byte offset of the key
    pub offset: usize,
    pub value: Value,
}

pub(crate) struct Parser<'a> {
    pub path: &'a Path,
    pub content: &'a str,
    pub info: FileInformation,
    pub vars: &'a HashMap<String, String>,
    lines: Vec<Line>,
    pos: usize,
}

/// Parse and convert one `.csl` file.
///
/// `path` should be absolute; it is recorded in the document and in every
/// source location. `${name}` placeholders are replaced from `vars`.
///
/// ```
/// use std::collections::HashMap;
/// use csl_config::Value;
/// use csl_syntax::parse_document;
///
/// let parsed = parse_document("/cfg/app.csl", "region: \"us-west-2\"\n", &HashMap::new()).unwrap();
/// assert_eq!(parsed.document.data["region"], Value::from("us-west-2"));
/// ```
pub fn parse_document(
    path: impl AsRef<Path>,
    content: &str,
    vars: &HashMap<String, String>,
) -> Result<ParsedFile> {
    let path = path.as_ref();
    let info = FileInformation::new(content);
    let lines = split_lines(path, content, &info)?;
    let mut parser = Parser {
        path,
        content,
        info,
        vars,
        lines,
        pos: 0,
    };
    parser.document()
}

fn is_list_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Split `key: value`. Returns the key length and the offset where the
/// value starts (equal to `text.len()` when the value is empty).
fn split_entry(text: &str) -> Option<(usize, usize)> {
    let colon = text
        .char_indices()
        .find(|&(idx, ch)| ch == ':' && text[idx + 1..].chars().next().is_none_or(|c| c == ' '))
        .map(|(idx, _)| idx)?;
    let key = &text[..colon];
    let valid = !key.is_empty()
        && !key.contains(char::is_whitespace)
        && !key.starts_with(['@', '"', '\'', '-']);
    if !valid {
        return None;
    }
    let after = &text[colon + 1..];
    Some((colon, text.len() - after.trim_start().len()))
}

impl Parser<'_> {
    fn peek(&self) -> Option<Line> {
        self.lines.get(self.pos).copied()
    }

    fn document(&mut self) -> Result<ParsedFile> {
        let mut data = Map::new();
        let mut sources = Vec::new();

        if let Some(first) = self.peek() {
            if first.indent() > 0 {
                return Err(self.error(first.text_start, "CSL-1-3", "unexpected indentation"));
            }
            if is_list_item(first.text(self.content)) {
                return Err(self.error(
                    first.text_start,
                    "CSL-1-1",
                    "the top level of a .csl file must be `key: value` entries",
                ));
            }
        }

        for entry in self.entries(0)? {
            if entry.key == "source" {
                sources.push(source_decl(self, entry)?);
            } else {
                insert_merged(&mut data, entry.key, entry.value);
            }
        }

        Ok(ParsedFile {
            document: Document::from_map(self.path, data),
            sources,
        })
    }

    /// A nested block: a list when its first line is a `- ` item, otherwise a map.
    fn block(&mut self, indent: usize) -> Result<Value> {
        match self.peek() {
            Some(line) if is_list_item(line.text(self.content)) => {
                Ok(Value::List(self.list(indent)?))
            }
            _ => {
                let mut map = Map::new();
                for entry in self.entries(indent)? {
                    insert_merged(&mut map, entry.key, entry.value);
                }
                Ok(Value::Map(map))
            }
        }
    }

    /// Value of a `key:` or `-` with nothing after it: the following deeper
    /// block, or null.
    fn nested(&mut self, indent: usize) -> Result<Value> {
        match self.peek() {
            Some(next) if next.indent() > indent => self.block(next.indent()),
            _ => Ok(Value::Null),
        }
    }

    pub(crate) fn entries(&mut self, indent: usize) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent() < indent {
                break;
            }
            if line.indent() > indent {
                return Err(self.error(line.text_start, "CSL-1-3", "unexpected indentation"));
            }
            let text = line.text(self.content);
            if is_list_item(text) {
                return Err(self.error(
                    line.text_start,
                    "CSL-1-1",
                    "found a list item where a `key: value` entry was expected",
                ));
            }
            let Some((key_len, value_at)) = split_entry(text) else {
                return Err(self.error(line.text_start, "CSL-1-1", "expected `key: value`"));
            };
            self.pos += 1;

            let value = if value_at < text.len() {
                self.scalar(line.text_start + value_at, line.text_end)?
            } else {
                match self.peek() {
                    // `key:` followed by `- item` lines at the same indentation
                    Some(next)
                        if next.indent() == indent && is_list_item(next.text(self.content)) =>
                    {
                        Value::List(self.list(indent)?)
                    }
                    _ => self.nested(indent)?,
                }
            };
            entries.push(Entry {
                key: text[..key_len].to_string(),
                offset: line.text_start,
                value,
            });
        }
        Ok(entries)
    }

    fn list(&mut self, indent: usize) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        while let Some(line) = self.peek() {
            let text = line.text(self.content);
            if line.indent() != indent || !is_list_item(text) {
                if line.indent() > indent {
                    return Err(self.error(line.text_start, "CSL-1-3", "unexpected indentation"));
                }
                break;
            }

            let rest = text[1..].trim_start();
            let rest_at = line.text_end - rest.len();
            if rest.is_empty() {
                self.pos += 1;
                items.push(self.nested(indent)?);
            } else if is_list_item(rest) || split_entry(rest).is_some() {
                // `- key: value` opens a block at the column of `key`; the
                // item's line is re-read as the first line of that block.
                self.lines[self.pos].text_start = rest_at;
                let item_indent = rest_at - line.line_start;
                items.push(self.block(item_indent)?);
            } else {
                self.pos += 1;
                items.push(self.scalar(rest_at, line.text_end)?);
            }
        }
        Ok(items)
    }

    pub(crate) fn error(&self, offset: usize, code: &str, problem: &str) -> crate::ParseError {
        syntax_error(self.path, self.content, &self.info, offset, code, problem)
    }
}

/// Duplicate keys merge the same way documents do.
fn insert_merged(map: &mut Map, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(existing) => merge_value(existing, value),
        None => {
            map.insert(key, value);
        }
    }
}
