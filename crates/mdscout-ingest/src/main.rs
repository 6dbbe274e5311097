//! mdscout - small protein-ligand complex finder

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdscout_common::logging::{init_logging, LogConfig, LogLevel};
use mdscout_ingest::{
    config::FinderConfig,
    export::{RankedRow, ResultTable, ANNOTATED_OUTPUT_FILE, DIRECT_OUTPUT_FILE},
    pipeline::{Pipeline, RunCounters},
    progress::progress_for,
    rcsb::RcsbClient,
    throttle::FixedDelay,
    uniprot::UniProtClient,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mdscout")]
#[command(author, version, about = "Find small protein-ligand complexes for laptop-scale MD")]
struct Cli {
    #[command(subcommand)]
    workflow: Workflow,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable the progress bar
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Workflow {
    /// UniProt enzymes with annotated cofactors, then their PDB structures
    Annotated {
        /// Longest UniProt sequence accepted
        #[arg(long)]
        max_length: Option<u32>,

        /// Atom budget per structure
        #[arg(long)]
        max_atoms: Option<u64>,

        /// UniProt candidates to retain
        #[arg(long)]
        candidates: Option<usize>,

        /// Stop once this many suitable structures are found
        #[arg(long)]
        target: Option<usize>,

        /// CSV output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep only the first row per PDB id
        #[arg(long)]
        dedupe: bool,
    },

    /// RCSB criteria search, then details for each hit
    Direct {
        /// Atom budget per structure
        #[arg(long)]
        max_atoms: Option<u64>,

        /// Structure ids to examine
        #[arg(long)]
        structures: Option<usize>,

        /// CSV output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("mdscout")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let mut config = FinderConfig::from_env()?;
    let show_progress = !cli.no_progress && std::io::stderr().is_terminal();

    match cli.workflow {
        Workflow::Annotated {
            max_length,
            max_atoms,
            candidates,
            target,
            output,
            dedupe,
        } => {
            if let Some(v) = max_length {
                config.max_length = v;
            }
            if let Some(v) = max_atoms {
                config.max_atoms = v;
            }
            if let Some(v) = candidates {
                config.num_candidates = v;
            }
            if let Some(v) = target {
                config.target_results = v;
            }
            config.validate()?;

            let output = output.unwrap_or_else(|| PathBuf::from(ANNOTATED_OUTPUT_FILE));
            run_annotated(config, &output, dedupe, show_progress).await?;
        },
        Workflow::Direct {
            max_atoms,
            structures,
            output,
        } => {
            if let Some(v) = max_atoms {
                config.max_atoms = v;
            }
            if let Some(v) = structures {
                config.num_structures = v;
            }
            config.validate()?;

            let output = output.unwrap_or_else(|| PathBuf::from(DIRECT_OUTPUT_FILE));
            run_direct(config, &output, show_progress).await?;
        },
    }

    Ok(())
}

async fn run_annotated(
    config: FinderConfig,
    output: &Path,
    dedupe: bool,
    show_progress: bool,
) -> Result<()> {
    banner("RCSB PDB Small Protein-Ligand Complex Finder (via UniProt)");

    let http = config.http_client()?;
    let throttle = Arc::new(FixedDelay::new(config.delays));
    let uniprot = UniProtClient::new(http.clone(), &config);
    let rcsb = RcsbClient::new(http, &config, throttle.clone());

    let report = Pipeline::new(config, throttle)
        .with_progress(progress_for("Candidates", show_progress))
        .run_annotated(&uniprot, &rcsb)
        .await
        .context("Annotated search aborted")?;

    let mut table = ResultTable::from_matches(&report.matches);
    if dedupe {
        let removed = table.dedupe_by_structure();
        info!(removed, "Collapsed repeated structures");
    }

    present(&table, &report.counters, output)
}

async fn run_direct(config: FinderConfig, output: &Path, show_progress: bool) -> Result<()> {
    banner("RCSB PDB Small Protein-Ligand Complex Finder");
    println!(
        "Constraints: max {} atoms, resolution <= {} Å",
        config.max_atoms, config.max_resolution
    );

    let http = config.http_client()?;
    let throttle = Arc::new(FixedDelay::new(config.delays));
    let rcsb = RcsbClient::new(http, &config, throttle.clone());

    let report = Pipeline::new(config, throttle)
        .with_progress(progress_for("Structures", show_progress))
        .run_direct(&rcsb)
        .await;

    let table = ResultTable::from_records(&report.matches);
    present(&table, &report.counters, output)
}

fn present<R: RankedRow>(table: &ResultTable<R>, counters: &RunCounters, output: &Path) -> Result<()> {
    println!();
    banner(&format!("Found {} suitable protein-ligand complexes", table.len()));
    println!(
        "Examined {} structures: {} too large, {} without ligands, {} unavailable",
        counters.examined,
        counters.too_large,
        counters.no_ligands,
        counters.ligands_unavailable + counters.details_missing
    );

    let Some(stats) = table.statistics() else {
        println!("No suitable complexes found. Try adjusting the search parameters.");
        return Ok(());
    };

    println!();
    println!("{}", table.to_console_table());

    table
        .write_csv(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!();
    println!("Results saved to: {}", output.display());

    println!();
    println!("{}", stats);

    if let Some(hint) = table.download_hint() {
        println!();
        println!("{}", hint);
    }

    Ok(())
}

fn banner(title: &str) {
    println!("{}", "=".repeat(70));
    println!("{}", title);
    println!("{}", "=".repeat(70));
}
