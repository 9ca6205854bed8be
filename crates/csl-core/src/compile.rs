/*
 * compile.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Compiling a directory of .csl files into a snapshot.
 */

//! Compiling a directory of `.csl` files into a [`Snapshot`].
//!
//! ```text
//! discover ─▶ parse each file ─▶ fold ─▶ resolve ─▶ Snapshot
//!                 │                        ▲
//!                 └─ source: declarations ─┘ (ProviderArena)
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use csl_config::fold;
use csl_error_reporting::render_located;
use csl_source_map::SourceContext;
use csl_syntax::{SourceDecl, parse_document};
use tracing::Instrument;

use crate::cancellation::Cancellation;
use crate::discovery::discover_files;
use crate::error::{CompileError, Result};
use crate::options::Options;
use crate::provider::{ProviderArena, ProviderDefinition, ProviderRegistry};
use crate::resolve::Resolver;
use crate::snapshot::{Metadata, Snapshot};

/// Compile the `.csl` files at `options.path`.
///
/// Files are merged in lexicographic order of their absolute paths, later
/// files winning. References are then resolved through the providers
/// registered in `options` or declared by `source:` blocks. Providers live
/// for this call only.
pub async fn compile(cancel: &Cancellation, options: Options) -> Result<Snapshot> {
    let span = tracing::info_span!("compile", path = %options.path.display());
    run(cancel, options).instrument(span).await
}

async fn run(cancel: &Cancellation, options: Options) -> Result<Snapshot> {
    let start_time = SystemTime::now();
    let Options {
        path,
        mut provider_registry,
        provider_type_registry,
        vars,
        allow_missing_provider,
        timeouts,
    } = options;

    let input_files = discover_files(&path)?;
    let mut ctx = SourceContext::new();
    let mut documents = Vec::with_capacity(input_files.len());

    for file in &input_files {
        if cancel.is_cancelled() {
            return Err(CompileError::Cancelled);
        }
        let content = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| CompileError::io(file, e))?;
        let parsed = parse_document(file, &content, &vars);
        ctx.add_file(file.clone(), content);
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(error) => {
                let rendered = render_located(&error.diagnostic, &mut ctx);
                return Err(CompileError::Parse { error, rendered });
            }
        };
        for decl in &parsed.sources {
            declare(&mut provider_registry, decl);
        }
        documents.push(parsed.document);
    }

    let folded = fold(documents);
    tracing::debug!(
        files = input_files.len(),
        keys = folded.data.len(),
        aliases = provider_registry.len(),
        "folded input files"
    );

    if cancel.is_cancelled() {
        return Err(CompileError::Cancelled);
    }

    let arena = Arc::new(ProviderArena::new(
        provider_registry,
        provider_type_registry,
    ));
    let outcome = Resolver::new(arena.clone(), cancel, &timeouts)
        .allow_missing(allow_missing_provider)
        .resolve(folded.data)
        .await;
    for failure in arena.shutdown().await {
        tracing::warn!(error = %failure, "provider shutdown failed");
    }
    let resolved = outcome?;

    let (errors, diagnostics): (Vec<String>, Vec<serde_json::Value>) = resolved
        .errors
        .iter()
        .map(|e| {
            let diagnostic = e.to_diagnostic();
            (render_located(&diagnostic, &mut ctx), diagnostic.to_json())
        })
        .unzip();

    tracing::info!(
        files = input_files.len(),
        keys = resolved.data.len(),
        errors = errors.len(),
        "compile finished"
    );

    Ok(Snapshot {
        data: resolved.data,
        metadata: Metadata {
            input_files,
            start_time,
            end_time: SystemTime::now(),
            per_key_provenance: folded.provenance,
            errors,
            diagnostics,
        },
    })
}

/// Add a `source:` declaration. Aliases registered in code keep their
/// definition; a later declaration replaces an earlier one.
fn declare(registry: &mut ProviderRegistry, decl: &SourceDecl) {
    match registry.get(&decl.alias) {
        Some(ProviderDefinition::Constructor { .. }) => {
            tracing::debug!(alias = %decl.alias, at = %decl.source, "declaration shadowed by registered provider");
        }
        Some(ProviderDefinition::Declared { source_file, .. }) => {
            tracing::warn!(
                alias = %decl.alias,
                previous = ?source_file,
                at = %decl.source,
                "provider alias declared again; the later declaration wins"
            );
            registry.declare(decl);
        }
        None => {
            registry.declare(decl);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::provider::MemoryProvider;
    use csl_config::Map;
    use csl_source_map::{Location, SourceInfo};

    fn decl(alias: &str, file: &str) -> SourceDecl {
        SourceDecl {
            alias: alias.into(),
            provider_type: "file".into(),
            version: None,
            config: Map::new(),
            source: SourceInfo::point(file, Location::default()),
        }
    }

    #[test]
    fn test_registered_alias_wins_over_declaration() {
        let mut registry = ProviderRegistry::new();
        registry.register("base", MemoryProvider::default);
        declare(&mut registry, &decl("base", "/cfg/a.csl"));
        assert!(!registry.get("base").unwrap().is_declared());
    }

    #[test]
    fn test_later_declaration_wins() {
        let mut registry = ProviderRegistry::new();
        declare(&mut registry, &decl("base", "/cfg/a.csl"));
        declare(&mut registry, &decl("base", "/cfg/b.csl"));
        let Some(ProviderDefinition::Declared { source_file, .. }) = registry.get("base") else {
            panic!("expected a declaration");
        };
        assert_eq!(source_file.as_deref(), Some(Path::new("/cfg/b.csl")));
    }
}
