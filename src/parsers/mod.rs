pub mod gocover;

use std::path::Path;

use crate::error::{LegendaryError, Result};
use crate::model::FileProfile;

/// Every profile format parser implements this trait.
pub trait ProfileParser {
    /// Parse the input bytes into per-file block lists.
    fn parse(&self, input: &[u8]) -> Result<Vec<FileProfile>>;
}

/// Read and parse a profile from disk.
///
/// Any failure, including I/O, is reported as a `ProfileParse` error naming
/// the profile so the caller can skip it and carry on.
pub fn parse_profile_file(parser: &dyn ProfileParser, path: &Path) -> Result<Vec<FileProfile>> {
    let content = std::fs::read(path).map_err(|e| LegendaryError::ProfileParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parser
        .parse(&content)
        .map_err(|e| LegendaryError::ProfileParse {
            path: path.to_path_buf(),
            message: match e {
                LegendaryError::Parse(message) => message,
                other => other.to_string(),
            },
        })
}
