//! Run configuration and root-directory defaults.

use std::path::{Path, PathBuf};

use crate::error::{LegendaryError, Result};
use crate::ingest::LineBase;
use crate::paths::Roots;

/// What to do with the classified results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Write a report to `out_path`.
    Report { out_path: PathBuf },
    /// Print the worst-covered files, at most `limit` rows.
    Hitlist { limit: Option<usize> },
}

/// Everything a run needs, with defaults already applied.
#[derive(Debug, Clone)]
pub struct Config {
    pub roots: Roots,
    pub profiles: Vec<PathBuf>,
    pub mode: Mode,
    pub line_base: LineBase,
    pub parallel: bool,
}

impl Config {
    /// Build a configuration, filling in missing roots from the environment.
    pub fn resolve(
        coverage_root: Option<PathBuf>,
        project_root: Option<PathBuf>,
        profiles: Vec<PathBuf>,
        mode: Mode,
    ) -> Result<Self> {
        let coverage_root = match coverage_root {
            Some(dir) => dir,
            None => default_coverage_root()?,
        };
        let project_root = match project_root {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|e| {
                LegendaryError::Config(format!("cannot determine current directory: {e}"))
            })?,
        };
        require_non_empty("coverage root", &coverage_root)?;
        require_non_empty("project root", &project_root)?;

        if profiles.is_empty() {
            return Err(LegendaryError::Config(
                "at least one coverage profile is required".to_string(),
            ));
        }

        Ok(Self {
            roots: Roots::new(coverage_root, project_root),
            profiles,
            mode,
            line_base: LineBase::default(),
            parallel: true,
        })
    }

    pub fn with_line_base(mut self, line_base: LineBase) -> Self {
        self.line_base = line_base;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// `$GOPATH/src`, or `$HOME/go/src` when `GOPATH` is unset (Go's own
/// default workspace). Only the first `GOPATH` entry is used.
pub fn default_coverage_root() -> Result<PathBuf> {
    coverage_root_from(std::env::var_os("GOPATH"), std::env::var_os("HOME"))
}

fn coverage_root_from(
    gopath: Option<std::ffi::OsString>,
    home: Option<std::ffi::OsString>,
) -> Result<PathBuf> {
    if let Some(gopath) = gopath.filter(|g| !g.is_empty()) {
        if let Some(first) = std::env::split_paths(&gopath).find(|p| !p.as_os_str().is_empty()) {
            return Ok(first.join("src"));
        }
    }
    match home.filter(|h| !h.is_empty()) {
        Some(home) => Ok(Path::new(&home).join("go").join("src")),
        None => Err(LegendaryError::Config(
            "no --coverage-root given and neither GOPATH nor HOME is set".to_string(),
        )),
    }
}

fn require_non_empty(what: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(LegendaryError::Config(format!("{what} must not be empty")));
    }
    Ok(())
}
