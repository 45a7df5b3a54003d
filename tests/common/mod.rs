#![allow(dead_code)]

use std::path::{Path, PathBuf};

use legendary::paths::Roots;
use tempfile::TempDir;

/// A scratch GOPATH-style tree: `<tmp>/src` is the coverage root and
/// `<tmp>/src/example.com/app` the project root.
///
/// The caller must hold onto the `Project` to keep the temp directory alive.
pub struct Project {
    pub dir: TempDir,
    pub coverage_root: PathBuf,
    pub project_root: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let coverage_root = dir.path().join("src");
        let project_root = coverage_root.join("example.com").join("app");
        std::fs::create_dir_all(&project_root).unwrap();
        Self {
            dir,
            coverage_root,
            project_root,
        }
    }

    pub fn roots(&self) -> Roots {
        Roots::new(&self.coverage_root, &self.project_root)
    }

    /// Write a source file with `lines` newline-terminated lines, relative
    /// to the project root.
    pub fn source(&self, rel: &str, lines: usize) -> PathBuf {
        let path = self.project_root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let body: String = (0..lines).map(|i| format!("// line {}\n", i + 1)).collect();
        std::fs::write(&path, body).unwrap();
        path
    }

    /// Write a profile into the scratch directory (outside the project).
    pub fn profile(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
