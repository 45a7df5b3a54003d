/// Parser for Go's `-coverprofile` format.
///
/// Reference: https://go.dev/blog/cover
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Each line describes a basic block (a range of source lines) with the number
/// of statements in the block and how many times it was executed. Blocks are
/// kept as ranges here; expanding them into lines is the aggregator's job.
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::ProfileParser;
use crate::error::{LegendaryError, Result};
use crate::model::*;

/// Block line. The file part is greedy so that paths containing colons
/// still split on the last `:` before the range.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+):([0-9]+)\.([0-9]+),([0-9]+)\.([0-9]+) ([0-9]+) ([0-9]+)$").unwrap()
});

/// Go coverage profile parser.
pub struct GocoverParser;

impl ProfileParser for GocoverParser {
    fn parse(&self, input: &[u8]) -> Result<Vec<FileProfile>> {
        parse(input)
    }
}

/// Parse a Go coverage profile from raw bytes.
///
/// Files come back in order of first appearance, each with its blocks sorted
/// by start position and duplicate locations folded together.
pub fn parse(input: &[u8]) -> Result<Vec<FileProfile>> {
    let text = std::str::from_utf8(input)
        .map_err(|e| LegendaryError::Parse(format!("Invalid UTF-8 in Go coverage data: {e}")))?;

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty());

    let mode = match lines.next() {
        None => return Ok(Vec::new()),
        Some((lineno, first)) => parse_mode_line(lineno, first)?,
    };

    let mut file_order: Vec<String> = Vec::new();
    let mut file_blocks: HashMap<String, Vec<Block>> = HashMap::new();

    for (lineno, line) in lines {
        let (file, block) = parse_block_line(line).ok_or_else(|| {
            LegendaryError::Parse(format!(
                "line {lineno}: {line:?} doesn't match expected format"
            ))
        })?;
        if !file_blocks.contains_key(file) {
            file_order.push(file.to_string());
        }
        file_blocks.entry(file.to_string()).or_default().push(block);
    }

    let mut profiles = Vec::with_capacity(file_order.len());
    for file_name in file_order {
        let blocks = file_blocks.remove(&file_name).unwrap_or_default();
        let blocks = merge_duplicate_blocks(mode, blocks)
            .map_err(|msg| LegendaryError::Parse(format!("{file_name}: {msg}")))?;
        profiles.push(FileProfile {
            file_name,
            mode,
            blocks,
        });
    }

    Ok(profiles)
}

fn parse_mode_line(lineno: usize, line: &str) -> Result<CoverMode> {
    let mode = line
        .strip_prefix("mode: ")
        .ok_or_else(|| LegendaryError::Parse(format!("line {lineno}: bad mode line: {line:?}")))?;
    mode.trim().parse()
}

/// Parse a single block line, returning (file_path, Block).
fn parse_block_line(line: &str) -> Option<(&str, Block)> {
    let caps = BLOCK_RE.captures(line)?;
    let file = caps.get(1)?.as_str();
    let num = |i: usize| -> Option<u64> { caps.get(i)?.as_str().parse().ok() };
    let small = |i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };

    Some((
        file,
        Block {
            start_line: small(2)?,
            start_col: small(3)?,
            end_line: small(4)?,
            end_col: small(5)?,
            num_stmt: small(6)?,
            count: num(7)?,
        },
    ))
}

/// Sort blocks by position and fold blocks that share an exact location.
///
/// In `set` mode the counts are OR'd (any execution marks the block), in the
/// counting modes they are summed.
fn merge_duplicate_blocks(
    mode: CoverMode,
    mut blocks: Vec<Block>,
) -> std::result::Result<Vec<Block>, String> {
    blocks.sort_by_key(|b| (b.start_line, b.start_col));

    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.last_mut() {
            Some(last)
                if last.start_line == block.start_line
                    && last.start_col == block.start_col
                    && last.end_line == block.end_line
                    && last.end_col == block.end_col =>
            {
                if last.num_stmt != block.num_stmt {
                    return Err(format!(
                        "inconsistent NumStmt: changed from {} to {}",
                        last.num_stmt, block.num_stmt
                    ));
                }
                last.count = match mode {
                    CoverMode::Set => u64::from(last.count > 0 || block.count > 0),
                    CoverMode::Count | CoverMode::Atomic => last.count.saturating_add(block.count),
                };
            }
            _ => merged.push(block),
        }
    }
    Ok(merged)
}
