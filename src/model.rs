//! In-memory representation of merged coverage, from the raw profile blocks
//! through the per-file tallies to the frozen per-line classification.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Key identifying a source file across all profiles: the file's path
/// relative to the project root, always `/`-separated.
pub type CanonicalPath = String;

/// Compute a fraction, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// How the profile counted executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverMode {
    /// Did each statement run (count is 0 or 1).
    Set,
    /// How many times did each statement run.
    Count,
    /// Like `Count`, but safe for multithreaded tests.
    Atomic,
}

impl std::str::FromStr for CoverMode {
    type Err = crate::error::LegendaryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "set" => Ok(CoverMode::Set),
            "count" => Ok(CoverMode::Count),
            "atomic" => Ok(CoverMode::Atomic),
            _ => Err(crate::error::LegendaryError::Parse(format!(
                "Unknown cover mode: '{}'. Supported: set, count, atomic",
                s
            ))),
        }
    }
}

/// A contiguous run of source lines sharing one execution count.
///
/// `end_line` is inclusive. Line numbers are as written in the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub num_stmt: u32,
    pub count: u64,
}

impl Block {
    /// A block spanning whole lines; columns and statement count are
    /// irrelevant to aggregation.
    pub fn lines(start_line: u32, end_line: u32, count: u64) -> Self {
        Self {
            start_line,
            start_col: 1,
            end_line,
            end_col: 1,
            num_stmt: 1,
            count,
        }
    }
}

/// One profile's blocks for one source file.
#[derive(Debug, Clone)]
pub struct FileProfile {
    /// File name exactly as reported by the profile.
    pub file_name: String,
    pub mode: CoverMode,
    pub blocks: Vec<Block>,
}

impl FileProfile {
    pub fn new(file_name: impl Into<String>, mode: CoverMode) -> Self {
        Self {
            file_name: file_name.into(),
            mode,
            blocks: Vec::new(),
        }
    }
}

/// Cumulative execution counts for one source file.
///
/// Counts are kept per inclusive range of 0-based line indices, as reported
/// by the profiles, and only expanded to lines once the file length is
/// known. A line covered by no range was never reported by any profile. That
/// is not the same as a line covered with a count of zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTally {
    pub filename: CanonicalPath,
    pub spans: BTreeMap<(u32, u32), u64>,
}

impl FileTally {
    pub fn new(filename: CanonicalPath) -> Self {
        Self {
            filename,
            ..Default::default()
        }
    }

    /// Add `count` to every index in `start..=end`.
    pub fn add_range(&mut self, start: u32, end: u32, count: u64) {
        if start > end {
            return;
        }
        let entry = self.spans.entry((start, end)).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Fold another tally's counts into this one.
    pub fn absorb(&mut self, other: FileTally) {
        for ((start, end), count) in other.spans {
            self.add_range(start, end, count);
        }
    }

    /// Summed count of every index in `0..total_lines`, or `None` for an
    /// index no range covers. Ranges reaching past `total_lines` are cut
    /// short.
    #[must_use]
    pub fn line_counts(&self, total_lines: u32) -> Vec<Option<u64>> {
        let mut counts = vec![None; total_lines as usize];
        let Some(last) = total_lines.checked_sub(1) else {
            return counts;
        };
        for (&(start, end), &count) in self.spans.range(..(total_lines, 0)) {
            let end = end.min(last);
            if start > end {
                continue;
            }
            for slot in &mut counts[start as usize..=end as usize] {
                *slot = Some(slot.unwrap_or(0).saturating_add(count));
            }
        }
        counts
    }

    /// Number of ranges that reach index `total_lines` or beyond.
    #[must_use]
    pub fn spans_past(&self, total_lines: u32) -> usize {
        self.spans
            .keys()
            .filter(|&&(_, end)| end >= total_lines)
            .count()
    }
}

/// The category a single source line falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineClass {
    /// Instrumented and executed at least once.
    Hit,
    /// Instrumented but never executed.
    Miss,
    /// Not mentioned by any profile.
    Ignored,
}

/// Final per-line classification of one source file.
///
/// `hits`, `misses` and `ignored` are ascending and together contain every
/// index in `0..total_lines` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedResult {
    #[serde(skip)]
    pub filename: CanonicalPath,
    pub total_lines: u32,
    pub hits: Vec<u32>,
    pub misses: Vec<u32>,
    pub ignored: Vec<u32>,
}

impl ClassifiedResult {
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    #[must_use]
    pub fn miss_count(&self) -> usize {
        self.misses.len()
    }

    /// Share of instrumented lines that were never executed, in `[0, 1]`.
    /// A file with no instrumented lines has a miss fraction of 0.
    #[must_use]
    pub fn miss_fraction(&self) -> f64 {
        rate(
            self.miss_count() as u64,
            (self.hit_count() + self.miss_count()) as u64,
        )
    }

    /// Category of a single line index, or `None` past the end of the file.
    #[must_use]
    pub fn class_of(&self, index: u32) -> Option<LineClass> {
        if index >= self.total_lines {
            None
        } else if self.hits.binary_search(&index).is_ok() {
            Some(LineClass::Hit)
        } else if self.misses.binary_search(&index).is_ok() {
            Some(LineClass::Miss)
        } else {
            Some(LineClass::Ignored)
        }
    }
}

/// Everything a report formatter needs.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_at: DateTime<Utc>,
    pub results: BTreeMap<CanonicalPath, ClassifiedResult>,
}

impl ReportContext {
    pub fn new(results: BTreeMap<CanonicalPath, ClassifiedResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            results,
        }
    }

    /// Results in emission order (ascending path).
    pub fn ordered(&self) -> Vec<&ClassifiedResult> {
        self.results.values().collect()
    }
}
