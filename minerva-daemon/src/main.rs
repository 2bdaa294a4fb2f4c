//! Binary entry point: loads configuration, wires up the pipeline, reads a
//! single journal template off stdin, and runs it through to completion.
//! Deliberately thin — no HTTP/gRPC/CLI surface, just enough process
//! wiring to run the pipeline locally or from an integration harness.

use std::io::Read;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "minerva-daemon exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), minerva_daemon::DaemonError> {
    let config = minerva_daemon::DaemonConfig::load(None)?;
    tracing::info!(graph_backend = %config.graph_backend, llm_backend = %config.llm_backend, "starting minerva-daemon");

    let engine = minerva_daemon::build_engine(&config).await?;

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let journal = minerva_core::types::JournalEntry::from_text(&raw)?;

    tracing::info!(journal_id = %journal.meta.uuid, "submitting journal entry");
    engine.run(journal, Vec::new()).await?;
    Ok(())
}
