//! Command handler functions for the legendary CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use crate::classify::classify_all;
use crate::config::{Config, Mode};
use crate::error::LegendaryError;
use crate::ingest::Aggregator;
use crate::model::ReportContext;
use crate::rank::rank;
use crate::report::{self, JsonFormatter, ReportFormatter, VimLegendFormatter};

/// Output format for report mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// vim-legend script.
    #[default]
    Vim,
    /// JSON document.
    Json,
}

impl ReportFormat {
    fn formatter(self) -> &'static dyn ReportFormatter {
        match self {
            ReportFormat::Vim => &VimLegendFormatter,
            ReportFormat::Json => &JsonFormatter,
        }
    }
}

/// Classified coverage plus everything that was skipped on the way.
#[derive(Debug)]
pub struct Collected {
    pub context: ReportContext,
    /// Profiles that could not be (fully) ingested.
    pub profile_errors: Vec<LegendaryError>,
    /// Source files whose coverage was dropped.
    pub source_errors: Vec<LegendaryError>,
}

/// Ingest every profile, then classify every tallied file.
pub fn collect_coverage(config: &Config) -> Collected {
    let mut aggregator = Aggregator::new(config.roots.clone(), config.line_base);
    let profile_errors = if config.parallel {
        aggregator.ingest_all_parallel(&config.profiles)
    } else {
        aggregator.ingest_all(&config.profiles)
    };

    let tallies = aggregator.into_tallies();
    let classification = classify_all(&tallies, &config.roots.project_root, config.parallel);

    info!(
        "Classified {} of {} files from {} profiles",
        classification.results.len(),
        tallies.len(),
        config.profiles.len()
    );

    Collected {
        context: ReportContext::new(classification.results),
        profile_errors,
        source_errors: classification.errors,
    }
}

/// Run whichever mode `config` asks for.
pub fn run(config: &Config, format: ReportFormat) -> Result<String> {
    match &config.mode {
        Mode::Report { out_path } => cmd_report(config, out_path, format),
        Mode::Hitlist { limit } => cmd_hitlist(config, *limit),
    }
}

pub fn cmd_report(config: &Config, out_path: &Path, format: ReportFormat) -> Result<String> {
    let collected = collect_coverage(config);
    let body = format
        .formatter()
        .format(&collected.context)
        .context("Failed to render report")?;
    report::write_report(out_path, &body)?;

    let mut out = String::new();
    writeln!(
        out,
        "Wrote coverage for {} files to {}",
        collected.context.results.len(),
        out_path.display()
    )
    .unwrap();
    if !collected.profile_errors.is_empty() || !collected.source_errors.is_empty() {
        writeln!(
            out,
            "Skipped {} profiles and {} source files (see warnings)",
            collected.profile_errors.len(),
            collected.source_errors.len()
        )
        .unwrap();
    }
    Ok(out)
}

pub fn cmd_hitlist(config: &Config, limit: Option<usize>) -> Result<String> {
    let collected = collect_coverage(config);
    let ranking = rank(collected.context.ordered());
    Ok(report::format_hitlist(&ranking.rows(limit)))
}
