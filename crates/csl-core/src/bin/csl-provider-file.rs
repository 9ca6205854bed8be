//! `csl-provider-file`: the built-in file provider as a remote provider.
//!
//! Speaks the provider protocol on stdin/stdout. Logs go to stderr,
//! filtered by `CSL_LOG` (e.g. `CSL_LOG=debug`).

use csl_core::provider::FileProvider;
use csl_core::provider::remote::serve;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_env("CSL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    serve(FileProvider::new(), tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}
