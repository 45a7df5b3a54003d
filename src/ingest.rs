//! Merging coverage profiles into per-file tallies.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{LegendaryError, Result};
use crate::model::{Block, CanonicalPath, FileProfile, FileTally};
use crate::parsers::gocover::GocoverParser;
use crate::parsers::parse_profile_file;
use crate::paths::Roots;

/// Per-file tallies keyed by canonical path.
pub type Tallies = BTreeMap<CanonicalPath, FileTally>;

/// Numbering used by profile block line numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LineBase {
    /// Profile line `n` lands on index `n`.
    #[value(name = "0")]
    Zero,
    /// Profile line `n` lands on index `n - 1` (Go's own numbering).
    #[default]
    #[value(name = "1")]
    One,
}

impl LineBase {
    /// Inclusive index range covered by `block`, or `None` when nothing in
    /// the block maps onto a valid index.
    fn index_range(self, block: &Block) -> Option<(u32, u32)> {
        let (start, end) = match self {
            LineBase::Zero => (block.start_line, block.end_line),
            LineBase::One => (
                block.start_line.max(1) - 1,
                block.end_line.checked_sub(1)?,
            ),
        };
        (start <= end).then_some((start, end))
    }
}

/// What one merge pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub files: usize,
    pub blocks: usize,
    /// Blocks that referenced line 0 under 1-based numbering, either
    /// entirely or in part.
    pub clipped_blocks: usize,
}

/// Accumulates block counts from any number of profiles.
///
/// Counts are summed: ingesting the same profile twice doubles every count.
pub struct Aggregator {
    roots: Roots,
    line_base: LineBase,
    tallies: Tallies,
}

impl Aggregator {
    pub fn new(roots: Roots, line_base: LineBase) -> Self {
        Self {
            roots,
            line_base,
            tallies: Tallies::new(),
        }
    }

    pub fn tallies(&self) -> &Tallies {
        &self.tallies
    }

    pub fn into_tallies(self) -> Tallies {
        self.tallies
    }

    /// Merge already-parsed file profiles.
    ///
    /// If a file name cannot be canonicalized, the remaining entries are
    /// skipped and the error returned; entries merged before it stay merged.
    pub fn ingest_profiles(&mut self, profiles: &[FileProfile]) -> Result<IngestStats> {
        merge_into(&mut self.tallies, &self.roots, self.line_base, profiles)
    }

    /// Parse one profile from disk and merge it.
    pub fn ingest_file(&mut self, path: &Path) -> Result<IngestStats> {
        let profiles = parse_profile_file(&GocoverParser, path)?;
        let stats = self.ingest_profiles(&profiles)?;
        log_stats(path, &stats);
        Ok(stats)
    }

    /// Ingest every profile in order. Failures are logged and returned, but
    /// never stop the remaining profiles from being ingested.
    pub fn ingest_all(&mut self, paths: &[PathBuf]) -> Vec<LegendaryError> {
        let mut errors = Vec::new();
        for path in paths {
            if let Err(e) = self.ingest_file(path) {
                warn!("Skipping profile {}: {e}", path.display());
                errors.push(e);
            }
        }
        errors
    }

    /// Like [`Aggregator::ingest_all`], but parses and merges each profile
    /// into a private delta on the rayon pool, then sums the deltas into the
    /// shared tallies one at a time in the order given.
    pub fn ingest_all_parallel(&mut self, paths: &[PathBuf]) -> Vec<LegendaryError> {
        let roots = &self.roots;
        let line_base = self.line_base;

        let deltas: Vec<(Tallies, Option<LegendaryError>)> = paths
            .par_iter()
            .map(|path| {
                let mut delta = Tallies::new();
                let outcome = parse_profile_file(&GocoverParser, path)
                    .and_then(|profiles| merge_into(&mut delta, roots, line_base, &profiles));
                match outcome {
                    Ok(stats) => {
                        log_stats(path, &stats);
                        (delta, None)
                    }
                    Err(e) => {
                        warn!("Skipping profile {}: {e}", path.display());
                        (delta, Some(e))
                    }
                }
            })
            .collect();

        let mut errors = Vec::new();
        for (delta, error) in deltas {
            for (filename, tally) in delta {
                self.tallies
                    .entry(filename.clone())
                    .or_insert_with(|| FileTally::new(filename))
                    .absorb(tally);
            }
            errors.extend(error);
        }
        errors
    }
}

fn log_stats(path: &Path, stats: &IngestStats) {
    debug!(
        "Ingested {}: {} files, {} blocks",
        path.display(),
        stats.files,
        stats.blocks
    );
    if stats.clipped_blocks > 0 {
        warn!(
            "{}: {} blocks reference line 0, which 1-based numbering cannot place",
            path.display(),
            stats.clipped_blocks
        );
    }
}

fn merge_into(
    tallies: &mut Tallies,
    roots: &Roots,
    line_base: LineBase,
    profiles: &[FileProfile],
) -> Result<IngestStats> {
    let mut stats = IngestStats::default();

    for profile in profiles {
        let filename = roots.canonicalize(&profile.file_name)?;
        let tally = tallies
            .entry(filename.clone())
            .or_insert_with(|| FileTally::new(filename));
        stats.files += 1;

        for block in &profile.blocks {
            stats.blocks += 1;
            if line_base == LineBase::One && block.start_line == 0 {
                stats.clipped_blocks += 1;
            }
            if let Some((start, end)) = line_base.index_range(block) {
                tally.add_range(start, end, block.count);
            }
        }
    }

    Ok(stats)
}
