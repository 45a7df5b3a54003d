//! Output formatting for classified coverage and the hitlist.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{LegendaryError, Result};
use crate::model::{CanonicalPath, ClassifiedResult, ReportContext};
use crate::rank::HitlistRow;

/// Trait for rendering a report context into a file body.
pub trait ReportFormatter {
    /// Render the context to a string.
    fn format(&self, ctx: &ReportContext) -> Result<String>;
}

/// vim-legend script, loaded by the plugin through `AddSimplecovResults`.
pub struct VimLegendFormatter;

impl ReportFormatter for VimLegendFormatter {
    fn format(&self, ctx: &ReportContext) -> Result<String> {
        let mut out = String::new();
        let generated = ctx.generated_at.timestamp();

        writeln!(out, "let s:generatedTime = {generated}").unwrap();
        out.push_str("let s:coverageResults = {\n");
        for (path, result) in &ctx.results {
            writeln!(out, "\\'{}': {{", vim_quote(path)).unwrap();
            writeln!(out, "\\  'hits': [{}],", vim_list(&result.hits)).unwrap();
            writeln!(out, "\\  'misses': [{}],", vim_list(&result.misses)).unwrap();
            writeln!(out, "\\  'ignored': [{}],", vim_list(&result.ignored)).unwrap();
            out.push_str("\\  },\n");
        }
        out.push_str("\\}\n");
        out.push_str("call AddSimplecovResults(expand(\"<sfile>:p\"), s:coverageResults)\n");

        Ok(out)
    }
}

/// Escape for a vim single-quoted string, where only `'` is special.
fn vim_quote(s: &str) -> String {
    s.replace('\'', "''")
}

/// `1,2,3,` — every element is followed by a comma, as vim allows.
fn vim_list(lines: &[u32]) -> String {
    let mut out = String::new();
    for line in lines {
        write!(out, "{line},").unwrap();
    }
    out
}

/// Pretty-printed JSON document.
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: i64,
    generated_at_rfc3339: String,
    results: &'a BTreeMap<CanonicalPath, ClassifiedResult>,
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, ctx: &ReportContext) -> Result<String> {
        let report = JsonReport {
            generated_at: ctx.generated_at.timestamp(),
            generated_at_rfc3339: ctx.generated_at.to_rfc3339(),
            results: &ctx.results,
        };
        let mut body = serde_json::to_string_pretty(&report)?;
        body.push('\n');
        Ok(body)
    }
}

/// Space between hitlist columns.
const COLUMN_PADDING: usize = 2;

/// Render hitlist rows as an aligned table.
///
/// Each row holds `(file, missed lines, file, percent missed)`; the first
/// three columns are padded to their widest cell.
#[must_use]
pub fn format_hitlist(rows: &[HitlistRow<'_>]) -> String {
    let header = [
        "File".to_string(),
        "Missed Lines".to_string(),
        "File".to_string(),
        "Percent missed".to_string(),
    ];
    let mut table: Vec<[String; 4]> = vec![header];
    for row in rows {
        table.push([
            row.worst_by_count.filename.clone(),
            row.worst_by_count.miss_count().to_string(),
            row.worst_by_fraction.filename.clone(),
            format!("{:.2}", row.worst_by_fraction.miss_fraction() * 100.0),
        ]);
    }

    let mut widths = [0usize; 3];
    for cells in &table {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for [a, b, c, d] in &table {
        let (wa, wb, wc) = (
            widths[0] + COLUMN_PADDING,
            widths[1] + COLUMN_PADDING,
            widths[2] + COLUMN_PADDING,
        );
        writeln!(out, "{a:<wa$}{b:<wb$}{c:<wc$}{d}").unwrap();
    }
    out
}

/// Write `body` to `path` without leaving a half-written file behind.
///
/// The body goes to a sibling `.tmp` file first and is then renamed over
/// the target.
pub fn write_report(path: &Path, body: &str) -> Result<()> {
    let tmp = tmp_path(path);
    let emit_err = |source| LegendaryError::Emit {
        path: path.to_path_buf(),
        source,
    };

    if let Err(e) = std::fs::write(&tmp, body) {
        let _ = std::fs::remove_file(&tmp);
        return Err(emit_err(e));
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(emit_err(e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
