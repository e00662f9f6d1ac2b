//! carpstat - structural statistics for capacitated arc routing instances.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use carpstat::{
    export::{self, PathTable, Report},
    loader::{self, NodeId},
    stats::Statistics,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

/// Analyse arc routing instances.
///
/// Loads an instance into a mixed multigraph, computes its statistics and all pairs shortest
/// paths, and writes both to JSON snapshots that can be reported on later.
#[derive(Parser)]
#[command(name = "carpstat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress progress and info messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Output format options.
#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable report
    #[default]
    Table,
    /// The statistics as JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an instance, compute its statistics and save the snapshots
    Analyze {
        /// Path to the instance file
        instance: PathBuf,

        /// Where to write the statistics snapshot
        #[arg(long, default_value = "graph_statistics.json")]
        stats_out: PathBuf,

        /// Where to write the shortest paths snapshot
        #[arg(long, default_value = "shortest_paths.json")]
        paths_out: PathBuf,

        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print a report from previously saved snapshots
    Report {
        /// Path to the statistics snapshot
        #[arg(long, default_value = "graph_statistics.json")]
        stats: PathBuf,

        /// Path to the shortest paths snapshot, skipped when absent
        #[arg(long, default_value = "shortest_paths.json")]
        paths: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else if !cli.quiet {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let result = match cli.command {
        Commands::Analyze {
            instance,
            stats_out,
            paths_out,
            format,
        } => analyze(&instance, &stats_out, &paths_out, format),
        Commands::Report { stats, paths } => report(&stats, &paths),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn analyze(
    instance: &Path,
    stats_out: &Path,
    paths_out: &Path,
    format: OutputFormat,
) -> Result<()> {
    let mut graph = loader::load_instance(instance)
        .with_context(|| format!("failed to load instance {}", instance.display()))?;

    let statistics = graph.compute_statistics();
    export::save_statistics(&statistics, stats_out)
        .with_context(|| format!("failed to write {}", stats_out.display()))?;
    info!("statistics saved to {}", stats_out.display());

    let table = PathTable::from_paths(graph.shortest_paths());
    export::save_paths(&table, paths_out)
        .with_context(|| format!("failed to write {}", paths_out.display()))?;
    info!("shortest paths saved to {}", paths_out.display());

    println!("{}", render(&statistics, &table, format)?);

    Ok(())
}

/// Renders the outcome of an analysis in the requested format. Logging flags don't affect it.
fn render(
    statistics: &Statistics<NodeId>,
    table: &PathTable<NodeId>,
    format: OutputFormat,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Table => Report::new(statistics).with_paths(table).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(statistics)?,
    })
}

fn report(stats: &Path, paths: &Path) -> Result<()> {
    let statistics = export::load_statistics::<NodeId, _>(stats)
        .with_context(|| format!("failed to read {}", stats.display()))?;

    let table = if paths.exists() {
        Some(
            export::load_paths::<NodeId, _>(paths)
                .with_context(|| format!("failed to read {}", paths.display()))?,
        )
    } else {
        debug!("no shortest paths at {}, skipping the distance sample", paths.display());
        None
    };

    let mut report = Report::new(&statistics);
    if let Some(table) = &table {
        report = report.with_paths(table);
    }
    println!("{report}");

    Ok(())
}
