pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod paths;
pub mod rank;
pub mod report;
