use anyhow::{Context, Result};
use clap::Parser;

use docchat_cli::services::{base_dir, build_retriever};
use docchat_cli::telemetry::init_tracing;
use docchat_core::config::Config;

/// Run a hybrid search against one namespace and print the fused results.
#[derive(Parser, Debug)]
#[command(name = "docchat-search", version)]
struct Cli {
    #[arg(long, short)]
    namespace: String,
    /// Number of results
    #[arg(long, short, default_value_t = 8)]
    k: usize,
    /// Dense weight in [0, 1]; defaults to retrieval.default_alpha
    #[arg(long, short)]
    alpha: Option<f32>,
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Config::load().context("Error loading config")?.settings()?;
    init_tracing(&settings.logging);

    let query = cli.query.join(" ");
    let alpha = cli.alpha.unwrap_or(settings.retrieval.default_alpha);
    let retriever = build_retriever(&settings, &base_dir()?).await?;
    let results = retriever.search(&query, &cli.namespace, cli.k, alpha).await?;

    println!("{} results for \"{}\" in '{}' (alpha {})", results.len(), query, cli.namespace, alpha);
    for (i, r) in results.iter().enumerate() {
        let page = r.chunk.page.map(|p| format!(" p.{p}")).unwrap_or_default();
        let preview: String = r.chunk.text.chars().take(160).collect();
        println!("{:2}. [{:.4}] {}{} (dense {:?}, lexical {:?})", i + 1, r.score, r.chunk.filename, page, r.dense_score, r.lexical_score);
        println!("    {}", preview);
    }
    Ok(())
}
