//! `source:` blocks.
//!
//! ```text
//! source:
//!   alias: base
//!   type: file
//!   version: 0.1.0
//!   directory: ./shared
//! ```
//!
//! `alias` and `type` are required, `version` is optional, and every other
//! key is handed to the provider as its configuration.

use csl_config::{Map, Value, is_alias_char};
use csl_source_map::SourceInfo;

use crate::error::{Result, locate};
use crate::parser::{Entry, Parser};

/// A provider declaration found in a `.csl` file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDecl {
    pub alias: String,
    pub provider_type: String,
    pub version: Option<String>,
    /// Remaining keys of the block
    pub config: Map,
    /// Location of the `source:` key
    pub source: SourceInfo,
}

pub(crate) fn source_decl(parser: &Parser<'_>, entry: Entry) -> Result<SourceDecl> {
    let invalid = |problem: &str| parser.error(entry.offset, "CSL-1-2", problem);

    let Value::Map(mut config) = entry.value else {
        return Err(invalid("`source` must be a block of `key: value` entries"));
    };

    let alias = match config.shift_remove("alias") {
        Some(Value::String(alias)) if !alias.is_empty() && alias.chars().all(is_alias_char) => {
            alias
        }
        Some(_) => {
            return Err(invalid(
                "`alias` may only contain letters, digits, `-` and `_`",
            ));
        }
        None => return Err(invalid("`source` is missing `alias`")),
    };
    let provider_type = match config.shift_remove("type") {
        Some(Value::String(t)) if !t.is_empty() => t,
        Some(_) => return Err(invalid("`type` must be a non-empty string")),
        None => return Err(invalid("`source` is missing `type`")),
    };
    let version = match config.shift_remove("version") {
        Some(Value::String(v)) => Some(v),
        Some(Value::Null) | None => None,
        Some(_) => return Err(invalid("`version` must be a string")),
    };

    Ok(SourceDecl {
        alias,
        provider_type,
        version,
        config,
        source: locate(parser.path, parser.content, &parser.info, entry.offset),
    })
}

#[cfg(test)]
mod tests {
    use crate::parse_document;
    use csl_config::Value;
    use std::collections::HashMap;

    fn parse(content: &str) -> crate::Result<crate::ParsedFile> {
        parse_document("/cfg/app.csl", content, &HashMap::new())
    }

    #[test]
    fn test_source_blocks_are_collected() {
        let parsed = parse(
            "source:\n  alias: base\n  type: file\n  directory: ./shared\nname: app\nsource:\n  alias: vault\n  type: secrets\n  version: 1.2.0\n",
        )
        .unwrap();

        assert_eq!(parsed.document.data.len(), 1);
        assert_eq!(parsed.document.data["name"], Value::from("app"));
        assert_eq!(parsed.sources.len(), 2);

        let base = &parsed.sources[0];
        assert_eq!(base.alias, "base");
        assert_eq!(base.provider_type, "file");
        assert_eq!(base.version, None);
        assert_eq!(base.config["directory"], Value::from("./shared"));
        assert_eq!(base.source.to_string(), "/cfg/app.csl:1:1");

        let vault = &parsed.sources[1];
        assert_eq!(vault.version.as_deref(), Some("1.2.0"));
        assert!(vault.config.is_empty());
        assert_eq!(vault.source.line(), 6);
    }

    #[test]
    fn test_invalid_source_blocks() {
        for content in [
            "source: base\n",
            "source:\n  type: file\n",
            "source:\n  alias: base\n",
            "source:\n  alias: bad alias\n  type: file\n",
            "source:\n  alias: base\n  type:\n",
        ] {
            let err = parse(content).unwrap_err();
            assert_eq!(err.diagnostic.code.as_deref(), Some("CSL-1-2"), "{content}");
        }
    }
}
