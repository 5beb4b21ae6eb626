//! Error types for the scraper

use crate::provider::ProviderFailure;
use crate::walker::CrawlPathError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Scraper error type
///
/// Everything here is fatal for a run. Per-file provider failures are
/// recovered inside the scrape loop and never surface as `ScraperError`.
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Categories file not found: {}", .0.display())]
    CategoriesNotFound(PathBuf),

    #[error("Invalid line {line} in categories file {}: {content:?} (expected '<slot> : <name>')", path.display())]
    InvalidCategoryLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Discovery sample file does not exist: {}", .0.display())]
    SampleFileMissing(PathBuf),

    #[error("Crawl directory unusable: {0}")]
    CrawlDirectory(#[from] CrawlPathError),

    #[error("Output file {} is not valid UTF-16: {reason}", path.display())]
    Encoding { path: PathBuf, reason: String },

    #[error("Output file is empty: {}", .0.display())]
    EmptyOutput(PathBuf),

    #[error("Metadata provider error: {0}")]
    Provider(#[from] ProviderFailure),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScraperError>;
