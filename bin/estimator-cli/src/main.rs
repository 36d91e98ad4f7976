//! Storage Estimator CLI
//!
//! Walks a directory tree and reports how much metadata and data the target
//! store would write for it.

mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use estimator_common::{EstimatorConfig, LayoutConfig};
use estimator_explorer::Explorer;
use std::path::PathBuf;
use summary::{Mode, Report, Summary};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "estimator-cli")]
#[command(about = "Storage layout estimator")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/estimator/estimator.toml")]
    config: PathBuf,

    /// Log level (overrides the configuration file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Walk a directory tree and estimate its layout
    Explore {
        /// Root of the tree
        path: PathBuf,

        /// Extrapolate from average directory and file sizes
        #[arg(long)]
        average: bool,

        /// Print the summary and full layout as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// Layout parameters; unset flags keep the configuration file value
#[derive(clap::Args, Debug, Default)]
struct LayoutArgs {
    /// Chunk size (e.g. 1M)
    #[arg(long, value_parser = parse_size)]
    chunk_size: Option<u64>,

    /// I/O unit size (e.g. 128K)
    #[arg(long, value_parser = parse_size)]
    io_size: Option<u64>,

    /// EC cell size (e.g. 64K)
    #[arg(long, value_parser = parse_size)]
    stripe_size: Option<u64>,

    /// EC payload cells per stripe
    #[arg(long)]
    cells: Option<u32>,

    /// EC parity cells per stripe
    #[arg(long)]
    parity: Option<u32>,
}

impl LayoutArgs {
    fn apply(&self, config: &mut LayoutConfig) {
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(io_size) = self.io_size {
            config.io_size = io_size;
        }
        if let Some(stripe_size) = self.stripe_size {
            config.stripe_size = stripe_size;
        }
        if let Some(cells) = self.cells {
            config.cell_count = cells;
        }
        if let Some(parity) = self.parity {
            config.parity_count = parity;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = EstimatorConfig::load_or_default(&args.config)?;

    // CLI takes precedence over the config file
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Config file: {}", args.config.display());

    match args.command {
        Commands::Explore {
            path,
            average,
            json,
            layout,
        } => {
            let mut layout_config = config.layout;
            layout.apply(&mut layout_config);
            explore(path, layout_config, average, json)?;
        }
    }

    Ok(())
}

fn explore(path: PathBuf, config: LayoutConfig, average: bool, json: bool) -> Result<()> {
    let mut explorer = Explorer::new(&path, config.clone())?;
    let stats = *explorer.explore()?;

    if stats.errors > 0 {
        warn!("{} entries could not be read", stats.errors);
    }

    let (mode, layout) = if average {
        (Mode::Average, explorer.average_layout()?)
    } else {
        (Mode::Walk, explorer.into_layout())
    };

    let summary = Summary::new(&path, mode, stats, &layout, &config)?;

    if json {
        let report = Report {
            summary: &summary,
            layout: &layout,
        };
        println!("{}", report.to_json()?);
    } else {
        println!("{summary}");
    }

    Ok(())
}

/// Parse a human-readable size string (e.g. "128K", "1M", "4G") into bytes.
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    let (num, multiplier) = if let Some(n) = s.strip_suffix('T') {
        (n, 1024 * 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('K') {
        (n, 1024)
    } else {
        // Assume bytes if no suffix
        (s, 1)
    };
    let value: u64 = num
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size: '{s}'"))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Size too large: '{s}'"))
}
