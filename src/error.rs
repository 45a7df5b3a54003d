use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LegendaryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Profile parse error in {}: {message}", .path.display())]
    ProfileParse { path: PathBuf, message: String },

    #[error("Cannot express {target} relative to {base}")]
    PathResolution { base: String, target: String },

    #[error("Cannot read source file {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write report to {}: {source}", .path.display())]
    Emit {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LegendaryError>;
