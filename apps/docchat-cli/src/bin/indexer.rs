use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use docchat_cli::services::{base_dir, build_indexer, build_retriever};
use docchat_cli::telemetry::init_tracing;
use docchat_core::config::Config;
use docchat_core::ingest::DataProcessor;
use docchat_hybrid::namespace_dir;

/// Index every uploaded file of a namespace into the vector and lexical indexes.
#[derive(Parser, Debug)]
#[command(name = "docchat-indexer", version)]
struct Cli {
    #[arg(long, short)]
    namespace: String,
    /// Copy supported files from this directory into the namespace uploads first
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Config::load().context("Error loading config")?.settings()?;
    init_tracing(&settings.logging);
    let base = base_dir()?;

    if let Some(dir) = &cli.dir {
        let target = namespace_dir(&settings.data.uploads_path(&base), &cli.namespace)?;
        std::fs::create_dir_all(&target)?;
        let files = DataProcessor::new().list_files(dir);
        for f in &files {
            if let Some(name) = f.file_name() {
                std::fs::copy(f, target.join(name)).with_context(|| format!("Failed to copy {}", f.display()))?;
            }
        }
        info!("Copied {} files from {} into {}", files.len(), dir.display(), target.display());
    }

    let retriever = build_retriever(&settings, &base).await?;
    let indexer = build_indexer(&settings, &base, retriever);
    let summary = indexer.index_namespace(&cli.namespace).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
