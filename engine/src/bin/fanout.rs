use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use fanout_core::ingest::decode_snapshot;
use fanout_core::AnalysisConfig;
use fanout_engine::{Analyzer, VisualGraph};
use query::{parse_llm_payload, Decompositions};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "fanout",
    about = "Content graph and query fan-out analysis for a crawled site"
)]
struct Cli {
    /// Base URL of the analyzed site
    site_url: String,
    /// JSON array of content records
    #[arg(long)]
    records: PathBuf,
    /// Query decompositions: model output or a JSON array of {query, sub_queries}
    #[arg(long)]
    queries: Option<PathBuf>,
    /// Report file
    #[arg(long, default_value = "seo_report.json")]
    output: PathBuf,
    /// Also write the graph visualization payload
    #[arg(long, num_args = 0..=1, default_missing_value = "content_graph.json")]
    visualize: Option<PathBuf>,
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    fanout_core::init_tracing(if cli.debug { "debug" } else { "info" });

    let config = AnalysisConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let raw = fs::read_to_string(&cli.records)
        .with_context(|| format!("reading records: {:?}", cli.records))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing records: {:?}", cli.records))?;
    let entries = decode_snapshot(values);

    let decompositions = match &cli.queries {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading queries: {:?}", path))?;
            parse_llm_payload(&text).with_context(|| format!("parsing queries: {:?}", path))?
        }
        None => Decompositions::default(),
    };

    let result = Analyzer::new(config)
        .run_snapshot(&cli.site_url, &entries, &decompositions)
        .context("analysis failed")?;

    fs::write(&cli.output, result.to_json_pretty()?)
        .with_context(|| format!("writing report: {:?}", cli.output))?;
    info!("Report exported to {:?}", cli.output);

    if let Some(path) = &cli.visualize {
        let visual = VisualGraph::from_result(&result);
        fs::write(path, serde_json::to_string_pretty(&visual)?)
            .with_context(|| format!("writing visualization: {:?}", path))?;
        info!("Content graph visualization saved to {:?}", path);
    }

    let summary = &result.summary;
    println!();
    println!("{}", "=".repeat(50));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(50));
    println!("Site: {}", result.site_url);
    println!("Content nodes: {}", summary.node_count);
    println!("Orphan content: {}", summary.orphan_count);
    println!("Hub candidates: {}", summary.hub_count);
    println!("Semantic clusters: {}", summary.cluster_count);
    println!("Skipped records: {}", summary.skipped_records);
    println!("Recommendations: {}", result.recommendations.len());
    println!("Report saved to: {}", cli.output.display());

    if !result.action_plan.immediate.is_empty() {
        println!();
        println!("Top immediate actions:");
        for (i, rec) in result.action_plan.immediate.iter().take(3).enumerate() {
            println!("{}. {}: {}", i + 1, rec.action, rec.rationale);
        }
    }

    Ok(())
}
