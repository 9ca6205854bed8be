/*
 * tests/compile.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end tests for compile runs over on-disk .csl files.
 */

//! End-to-end tests for compile runs over on-disk `.csl` files.

use std::time::{Duration, Instant};

use csl_config::Value;
use csl_core::provider::{MemoryProvider, ProviderRegistry};
use csl_core::{Cancellation, CompileError, Options, ResolveError, Snapshot, compile};
use serde_json::json;
use tempfile::TempDir;

const SOURCE: &str = "source:\n  alias: base\n  type: file\n";

fn write(dir: &TempDir, files: &[(&str, &str)]) {
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
}

async fn run(dir: &TempDir) -> Result<Snapshot, CompileError> {
    compile(&Cancellation::new(), Options::new(dir.path())).await
}

fn resolve_error(err: CompileError) -> ResolveError {
    match err {
        CompileError::Resolve(e) => e,
        other => panic!("expected a resolve error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_single_scalar() {
    let dir = TempDir::new().unwrap();
    write(&dir, &[("main.csl", "region: \"us-west-2\"\n")]);

    let snapshot = run(&dir).await.unwrap();
    assert_eq!(snapshot.to_json(), json!({"region": "us-west-2"}));
    assert!(snapshot.is_complete());
    assert_eq!(snapshot.metadata.input_files, vec![dir.path().join("main.csl")]);
    assert!(snapshot.metadata.start_time <= snapshot.metadata.end_time);
}

#[tokio::test]
async fn test_override_merges_with_provenance() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        &[
            (
                "base.csl",
                "region: us-east-1\ndatabase:\n  host: localhost\n  port: 5432\n",
            ),
            ("override.csl", "database:\n  port: 6543\n  user: admin\n"),
        ],
    );

    let snapshot = run(&dir).await.unwrap();
    assert_eq!(
        snapshot.to_json(),
        json!({
            "region": "us-east-1",
            "database": {"host": "localhost", "port": "6543", "user": "admin"},
        })
    );

    let provenance = &snapshot.metadata.per_key_provenance;
    assert_eq!(provenance["region"].source, dir.path().join("base.csl"));
    assert_eq!(provenance["database"].source, dir.path().join("override.csl"));
}

#[tokio::test]
async fn test_resource_path_reference() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        &[
            (
                "base.csl",
                &format!("{SOURCE}database:\n  host: db.internal\n  port: 5432\n"),
            ),
            (
                "service.csl",
                "app:\n  host: @base:base:database.host\n  db: @base:base:database\n  url: \"postgres://@base:base:database.host:@base:base:database.port/app\"\n",
            ),
        ],
    );

    let snapshot = run(&dir).await.unwrap();
    assert_eq!(snapshot.get("app.host"), Some(&Value::from("db.internal")));
    assert_eq!(
        snapshot.get("app.db").unwrap().to_json(),
        json!({"host": "db.internal", "port": "5432"})
    );
    assert_eq!(
        snapshot.get("app.url"),
        Some(&Value::from("postgres://db.internal:5432/app"))
    );
}

#[tokio::test]
async fn test_chain_is_not_a_cycle() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        &[
            ("a.csl", &format!("{SOURCE}x: @base:b:y\n")),
            ("b.csl", "y: @base:c:z\n"),
            ("c.csl", "z: end\n"),
        ],
    );

    let snapshot = run(&dir).await.unwrap();
    assert_eq!(snapshot.to_json(), json!({"x": "end", "y": "end", "z": "end"}));
}

/// `n` files where file `k` references file `k + 1` and the last
/// references the first.
async fn cycle_of(n: usize) -> (TempDir, ResolveError, Duration) {
    let dir = TempDir::new().unwrap();
    for k in 0..n {
        let next = (k + 1) % n;
        let header = if k == 0 { SOURCE } else { "" };
        std::fs::write(
            dir.path().join(format!("f{k}.csl")),
            format!("{header}v{k}: @base:f{next}:v{next}\n"),
        )
        .unwrap();
    }

    let started = Instant::now();
    let outcome = tokio::time::timeout(Duration::from_secs(10), run(&dir))
        .await
        .expect("cycle detection must terminate");
    let elapsed = started.elapsed();
    (dir, resolve_error(outcome.unwrap_err()), elapsed)
}

#[tokio::test]
async fn test_cycles_are_detected_quickly() {
    for n in 1..=4 {
        let (_dir, err, elapsed) = cycle_of(n).await;
        let ResolveError::CircularReference { cycle, .. } = &err else {
            panic!("expected a cycle for n = {n}, got {err:?}");
        };
        assert_eq!(cycle.len(), n + 1, "{cycle:?}");
        assert_eq!(cycle.first(), cycle.last());
        assert!(elapsed < Duration::from_secs(1), "n = {n} took {elapsed:?}");
    }
}

#[tokio::test]
async fn test_two_file_cycle_path() {
    let (_dir, err, _) = cycle_of(2).await;
    assert_eq!(
        err.to_string(),
        "circular reference: base:f1.v1 → base:f0.v0 → base:f1.v1"
    );
}

#[tokio::test]
async fn test_self_reference_through_root() {
    let dir = TempDir::new().unwrap();
    write(&dir, &[("app.csl", &format!("{SOURCE}url: @base:app:.\n"))]);

    let err = resolve_error(run(&dir).await.unwrap_err());
    let ResolveError::CircularReference { cycle, .. } = &err else {
        panic!("expected a cycle, got {err:?}");
    };
    assert_eq!(cycle, &["base:app", "base:app"]);
    let location = err.location().unwrap();
    assert_eq!((location.line(), location.column()), (4, 6));
}

#[tokio::test]
async fn test_unregistered_alias_fails() {
    let dir = TempDir::new().unwrap();
    write(&dir, &[("main.csl", "secret: @vault:db.password\n")]);

    let err = run(&dir).await.unwrap_err();
    let message = err
        .to_string()
        .replace(&dir.path().display().to_string(), "<dir>");
    assert_eq!(
        message,
        "<dir>/main.csl:1:9: no provider is registered for alias `vault` (in `@vault:db.password`)"
    );
    assert!(matches!(
        resolve_error(err),
        ResolveError::ProviderNotRegistered { .. }
    ));
}

#[tokio::test]
async fn test_allow_missing_records_located_errors() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        &[("main.csl", "region: us-west-2\nsecret: @vault:db.password\n")],
    );

    let snapshot = compile(
        &Cancellation::new(),
        Options::new(dir.path()).allow_missing_provider(true),
    )
    .await
    .unwrap();

    assert_eq!(
        snapshot.to_json(),
        json!({"region": "us-west-2", "secret": null})
    );
    assert!(!snapshot.is_complete());
    assert_eq!(snapshot.metadata.errors.len(), 1);

    let error = snapshot.metadata.errors[0].replace(&dir.path().display().to_string(), "<dir>");
    insta::assert_snapshot!(error, @r"
    <dir>/main.csl:2:9: no provider is registered for alias `vault` (in `@vault:db.password`)
    2 | secret: @vault:db.password
                ^
    ");

    let diagnostic = &snapshot.metadata.diagnostics[0];
    assert_eq!(diagnostic["code"], "CSL-2-1");
    assert_eq!(diagnostic["location"]["line"], 2);
    assert_eq!(diagnostic["location"]["column"], 9);
    assert_eq!(diagnostic["hints"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_registered_provider_and_vars() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        &[("main.csl", "env: ${env}\nhost: @secrets:${env}.db.host\n")],
    );

    let mut registry = ProviderRegistry::new();
    registry.register("secrets", || {
        MemoryProvider::from_json(json!({"prod": {"db": {"host": "prod.internal"}}}))
    });

    let snapshot = compile(
        &Cancellation::new(),
        Options::new(dir.path())
            .with_provider_registry(registry)
            .with_var("env", "prod"),
    )
    .await
    .unwrap();
    assert_eq!(
        snapshot.to_json(),
        json!({"env": "prod", "host": "prod.internal"})
    );
}

#[tokio::test]
async fn test_missing_path_segment_is_not_found() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        &[
            ("base.csl", &format!("{SOURCE}database:\n  host: localhost\n")),
            ("app.csl", "user: @base:base:database.user\n"),
        ],
    );

    let err = resolve_error(run(&dir).await.unwrap_err());
    assert!(matches!(err, ResolveError::NotFound { .. }), "{err:?}");
    assert_eq!(err.location().unwrap().line(), 1);
}

#[tokio::test]
async fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        run(&dir).await,
        Err(CompileError::NoInputFiles { .. })
    ));
}

#[tokio::test]
async fn test_parse_error_is_rendered() {
    let dir = TempDir::new().unwrap();
    write(&dir, &[("bad.csl", "ok: 1\n\tbad: 2\n")]);

    let err = run(&dir).await.unwrap_err();
    let CompileError::Parse { error, rendered } = &err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert_eq!(error.diagnostic.code.as_deref(), Some("CSL-1-3"));
    assert!(rendered.contains("bad.csl:2:"), "{rendered}");
    assert!(rendered.lines().count() >= 2, "{rendered}");
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let dir = TempDir::new().unwrap();
    write(&dir, &[("main.csl", "a: b\n")]);
    let cancel = Cancellation::new();
    cancel.cancel();
    assert!(matches!(
        compile(&cancel, Options::new(dir.path())).await,
        Err(CompileError::Cancelled)
    ));
}
