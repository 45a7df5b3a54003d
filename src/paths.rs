//! Turning profile-reported file names into stable, project-relative keys.
//!
//! Everything here is lexical: no path is ever looked up on disk, so a
//! profile can be canonicalized even when its sources have moved.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::error::{LegendaryError, Result};
use crate::model::CanonicalPath;

/// The two roots every profile entry is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    /// Directory the profile's file names are relative to (`$GOPATH/src`).
    pub coverage_root: PathBuf,
    /// Directory the emitted keys are relative to.
    pub project_root: PathBuf,
}

impl Roots {
    pub fn new(coverage_root: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            coverage_root: coverage_root.into(),
            project_root: project_root.into(),
        }
    }

    pub fn canonicalize(&self, reported: &str) -> Result<CanonicalPath> {
        canonicalize(&self.coverage_root, &self.project_root, reported)
    }
}

/// Resolve `reported` under `coverage_root`, then express the result
/// relative to `project_root`.
///
/// A reported name that is itself absolute is still placed under the
/// coverage root. Targets outside the project root come back with leading
/// `../` components.
pub fn canonicalize(
    coverage_root: &Path,
    project_root: &Path,
    reported: &str,
) -> Result<CanonicalPath> {
    let joined = join(coverage_root, reported);
    let base = Lexical::new(project_root);
    let rel = base.relative(&joined).ok_or_else(|| LegendaryError::PathResolution {
        base: project_root.display().to_string(),
        target: joined.display(),
    })?;
    Ok(rel)
}

fn join(root: &Path, reported: &str) -> Lexical {
    let mut lexical = Lexical::new(root);
    for component in Path::new(reported).components() {
        match component {
            Component::Normal(part) => lexical.push(part.to_os_string()),
            Component::ParentDir => lexical.pop_or_climb(),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    lexical
}

/// A cleaned path split into its pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Lexical {
    prefix: Option<OsString>,
    rooted: bool,
    /// Normal components, possibly led by `..` when the path is relative.
    parts: Vec<OsString>,
}

impl Lexical {
    fn new(path: &Path) -> Self {
        let mut lexical = Lexical {
            prefix: None,
            rooted: false,
            parts: Vec::new(),
        };
        for component in path.components() {
            match component {
                Component::Prefix(p) => lexical.prefix = Some(p.as_os_str().to_os_string()),
                Component::RootDir => lexical.rooted = true,
                Component::CurDir => {}
                Component::ParentDir => lexical.pop_or_climb(),
                Component::Normal(part) => lexical.push(part.to_os_string()),
            }
        }
        lexical
    }

    fn push(&mut self, part: OsString) {
        self.parts.push(part);
    }

    fn pop_or_climb(&mut self) {
        match self.parts.last() {
            Some(last) if last != ".." => {
                self.parts.pop();
            }
            // `/..` is `/`
            _ if self.rooted => {}
            _ => self.parts.push(OsString::from("..")),
        }
    }

    /// Relative `/`-separated path from `self` to `target`, or `None` when
    /// no such path exists.
    fn relative(&self, target: &Lexical) -> Option<String> {
        if self.prefix != target.prefix || self.rooted != target.rooted {
            return None;
        }

        let common = self
            .parts
            .iter()
            .zip(&target.parts)
            .take_while(|(a, b)| a == b)
            .count();

        let remaining_base = &self.parts[common..];
        if remaining_base.iter().any(|p| p == "..") {
            return None;
        }

        let mut pieces: Vec<String> = vec!["..".to_string(); remaining_base.len()];
        pieces.extend(
            target.parts[common..]
                .iter()
                .map(|p| p.to_string_lossy().into_owned()),
        );

        if pieces.is_empty() {
            Some(".".to_string())
        } else {
            Some(pieces.join("/"))
        }
    }

    fn to_path_buf(&self) -> PathBuf {
        let mut out = PathBuf::new();
        if let Some(prefix) = &self.prefix {
            out.push(prefix);
        }
        if self.rooted {
            out.push(Component::RootDir.as_os_str());
        }
        for part in &self.parts {
            out.push(part);
        }
        if out.as_os_str().is_empty() {
            out.push(".");
        }
        out
    }

    fn display(&self) -> String {
        self.to_path_buf().display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(path: &Path) -> PathBuf {
        Lexical::new(path).to_path_buf()
    }

    fn canon(coverage_root: &str, project_root: &str, reported: &str) -> Result<String> {
        canonicalize(Path::new(coverage_root), Path::new(project_root), reported)
    }

    #[test]
    fn test_canonicalize_under_project_root() {
        assert_eq!(canon("/src", "/src/app", "app/main.go").unwrap(), "main.go");
    }

    #[test]
    fn test_canonicalize_nested() {
        assert_eq!(
            canon("/go/src", "/go/src/github.com/user/proj", "github.com/user/proj/pkg/a/a.go")
                .unwrap(),
            "pkg/a/a.go"
        );
    }

    #[test]
    fn test_canonicalize_outside_project_root() {
        assert_eq!(
            canon("/src", "/src/app", "lib/util.go").unwrap(),
            "../lib/util.go"
        );
    }

    #[test]
    fn test_canonicalize_absolute_reported_name_stays_under_root() {
        assert_eq!(canon("/src", "/src", "/app/main.go").unwrap(), "app/main.go");
    }

    #[test]
    fn test_canonicalize_dot_segments() {
        assert_eq!(
            canon("/src/./x/..", "/src/app/", "app/./sub/../main.go").unwrap(),
            "main.go"
        );
    }

    #[test]
    fn test_canonicalize_relative_roots() {
        assert_eq!(canon("src", "src/app", "app/main.go").unwrap(), "main.go");
        assert_eq!(canon("", ".", "app/main.go").unwrap(), "app/main.go");
    }

    #[test]
    fn test_canonicalize_mixed_absolute_and_relative_fails() {
        let err = canon("src", "/abs/project", "main.go").unwrap_err();
        assert!(matches!(err, LegendaryError::PathResolution { .. }));

        let err = canon("/src", "project", "main.go").unwrap_err();
        assert!(matches!(err, LegendaryError::PathResolution { .. }));
    }

    #[test]
    fn test_canonicalize_unresolvable_parent_in_base_fails() {
        let err = canon("src", "../elsewhere", "main.go").unwrap_err();
        assert!(matches!(err, LegendaryError::PathResolution { .. }));
    }

    #[test]
    fn test_canonicalize_project_root_itself() {
        assert_eq!(canon("/src", "/src/app", "app").unwrap(), ".");
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(clean(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean(Path::new("a/../..")), PathBuf::from(".."));
        assert_eq!(clean(Path::new("")), PathBuf::from("."));
    }

    #[test]
    fn test_roots_canonicalize() {
        let roots = Roots::new("/src", "/src/app");
        assert_eq!(roots.canonicalize("app/cmd/run.go").unwrap(), "cmd/run.go");
    }
}
