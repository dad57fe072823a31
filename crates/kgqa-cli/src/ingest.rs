use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use kgqa_ingest::read_relations_file;
use kgqa_store::{load_relations, GraphStore, IngestReport, LoadOptions, MemoryGraph};

pub async fn cmd_ingest(store: &dyn GraphStore, input: &Path, batch_size: usize) -> Result<()> {
    println!(
        "{} {} into {}",
        "Ingesting".green().bold(),
        input.display(),
        store.describe()
    );
    let parsed = read_relations_file(input)?;
    let report = load_relations(store, &parsed, LoadOptions { batch_size }).await?;
    print_report(&report);
    let stats = store.stats().await?;
    println!("  {} {} nodes, {} edges in store", "→".yellow(), stats.nodes, stats.edges);
    println!("{}", completion_line(&report));
    Ok(())
}

fn completion_line(report: &IngestReport) -> String {
    if report.failed == 0 {
        "Success! Your graph has been created.".green().bold().to_string()
    } else {
        format!(
            "{} {} triple(s) could not be written; the graph is incomplete",
            "warning:".yellow().bold(),
            report.failed
        )
    }
}

/// Parse and load into a scratch in-memory graph; nothing else is touched.
pub async fn cmd_ingest_dry_run(input: &Path, batch_size: usize) -> Result<()> {
    println!("{} {} (dry run)", "Checking".green().bold(), input.display());
    let parsed = read_relations_file(input)?;
    let scratch = MemoryGraph::new();
    let report = load_relations(&scratch, &parsed, LoadOptions { batch_size }).await?;
    print_report(&report);
    let stats = scratch.stats().await?;
    println!(
        "  {} would write {} nodes, {} edges",
        "→".yellow(),
        stats.nodes,
        stats.edges
    );
    Ok(())
}

pub async fn preload(store: &dyn GraphStore, input: &Path) -> Result<()> {
    let parsed = read_relations_file(input)?;
    let report = load_relations(store, &parsed, LoadOptions::default()).await?;
    tracing::info!(file = %input.display(), %report, "preloaded relations");
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!("  {} {} lines read", "→".yellow(), report.lines);
    println!(
        "  {} {} triples ({} upserted, {} failed)",
        "→".yellow(),
        report.triples,
        report.upserted,
        report.failed
    );
    if report.skipped > 0 {
        println!("  {} {} non-relation lines skipped", "→".yellow(), report.skipped);
    }
    if report.rejected > 0 {
        println!(
            "  {} {} relation lines rejected (empty after cleaning)",
            "warning:".yellow().bold(),
            report.rejected
        );
    }
}
