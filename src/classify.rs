//! Reconciling merged tallies with the real source files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{LegendaryError, Result};
use crate::ingest::Tallies;
use crate::model::{CanonicalPath, ClassifiedResult, FileTally};

const READ_CHUNK: usize = 32 * 1024;

/// Count the lines in `reader`.
///
/// Every `\n` ends a line, and trailing bytes after the last `\n` form one
/// more line. An empty input has no lines.
pub fn count_lines(mut reader: impl Read) -> io::Result<usize> {
    let mut buf = vec![0u8; READ_CHUNK];
    let mut count = 0;
    let mut last = None;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        count += buf[..n].iter().filter(|&&b| b == b'\n').count();
        last = Some(buf[n - 1]);
    }

    if matches!(last, Some(b) if b != b'\n') {
        count += 1;
    }
    Ok(count)
}

/// Partition `0..total_lines` into hits, misses and ignored lines.
///
/// Tallied indices at or past `total_lines` are dropped.
#[must_use]
pub fn classify(tally: &FileTally, total_lines: u32) -> ClassifiedResult {
    let mut hits = Vec::new();
    let mut misses = Vec::new();
    let mut ignored = Vec::new();

    for (index, count) in (0..total_lines).zip(tally.line_counts(total_lines)) {
        match count {
            None => ignored.push(index),
            Some(count) if count > 0 => hits.push(index),
            Some(_) => misses.push(index),
        }
    }

    ClassifiedResult {
        filename: tally.filename.clone(),
        total_lines,
        hits,
        misses,
        ignored,
    }
}

/// Read the source file behind `tally` and classify it.
pub fn classify_file(tally: &FileTally, project_root: &Path) -> Result<ClassifiedResult> {
    let path = project_root.join(&tally.filename);
    let source_err = |source| LegendaryError::SourceRead {
        path: path.clone(),
        source,
    };

    let file = File::open(&path).map_err(source_err)?;
    let lines = count_lines(file).map_err(source_err)?;
    let total_lines = u32::try_from(lines).map_err(|_| {
        source_err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{lines} lines is more than can be indexed"),
        ))
    })?;

    let beyond = tally.spans_past(total_lines);
    if beyond > 0 {
        debug!(
            "{}: {beyond} blocks reach past the last of {total_lines} lines, cutting them short",
            tally.filename
        );
    }

    Ok(classify(tally, total_lines))
}

/// Outcome of classifying every tally.
#[derive(Debug, Default)]
pub struct Classification {
    pub results: BTreeMap<CanonicalPath, ClassifiedResult>,
    /// One entry per file that was dropped.
    pub errors: Vec<LegendaryError>,
}

/// Classify every tally against its source file under `project_root`.
///
/// A file that cannot be read is left out of `results` entirely and its
/// error logged and recorded.
pub fn classify_all(tallies: &Tallies, project_root: &Path, parallel: bool) -> Classification {
    let outcomes: Vec<(&CanonicalPath, Result<ClassifiedResult>)> = if parallel {
        tallies
            .par_iter()
            .map(|(name, tally)| (name, classify_file(tally, project_root)))
            .collect()
    } else {
        tallies
            .iter()
            .map(|(name, tally)| (name, classify_file(tally, project_root)))
            .collect()
    };

    let mut classification = Classification::default();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                classification.results.insert(name.clone(), result);
            }
            Err(e) => {
                warn!("Dropping coverage for {name}: {e}");
                classification.errors.push(e);
            }
        }
    }
    classification
}
