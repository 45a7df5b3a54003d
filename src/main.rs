use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use legendary::cli::{self, ReportFormat};
use legendary::config::{Config, Mode};
use legendary::ingest::LineBase;

/// legendary — merge Go coverage profiles into vim-legend files, or report
/// on the worst covered files.
#[derive(Parser)]
#[command(name = "legendary", version, about)]
#[command(override_usage = "legendary [OPTIONS] <OUT_PATH> <PROFILE>...\n       \
    legendary [OPTIONS] --hitlist [--limit <N>] <PROFILE>...")]
struct Cli {
    /// Treat the profiles as referring to files rooted at DIR (default: $GOPATH/src).
    #[arg(long, value_name = "DIR")]
    coverage_root: Option<PathBuf>,

    /// Emit paths relative to DIR (default: current directory).
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Don't write a report; print the worst covered files instead.
    #[arg(long)]
    hitlist: bool,

    /// Limit the number of files in the hitlist.
    #[arg(long, value_name = "N", requires = "hitlist")]
    limit: Option<usize>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Vim)]
    format: ReportFormat,

    /// Numbering of profile line numbers.
    #[arg(long, value_enum, default_value_t = LineBase::One)]
    line_base: LineBase,

    /// Ingest and classify on a single thread.
    #[arg(long)]
    sequential: bool,

    /// Log progress to stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Output path followed by coverage profiles, or only profiles with --hitlist.
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut paths = cli.paths;
    let mode = if cli.hitlist {
        Mode::Hitlist { limit: cli.limit }
    } else {
        if paths.len() < 2 {
            bail!("an output path and at least one coverage profile are required");
        }
        Mode::Report {
            out_path: paths.remove(0),
        }
    };

    let config = Config::resolve(cli.coverage_root, cli.project_root, paths, mode)?
        .with_line_base(cli.line_base)
        .with_parallel(!cli.sequential);

    let output = cli::run(&config, cli.format)?;
    print!("{output}");
    Ok(())
}
