//! DiskScraper - extended file properties to a delimited text file
//!
//! A scrape run walks a directory tree, asks a [`MetadataProvider`] for the
//! property slots named by a [`CategorySet`], and appends one row per file to
//! an output file that doubles as the resume index for later runs.
//!
//! ```text
//! config.txt ─▶ ScraperConfig ─▶ resolve() ─▶ CategorySet
//!                                                 │
//!   walk_files() ─▶ ExistingFileIndex? ─▶ MetadataExtractor ─▶ OutputStore
//! ```

pub mod categories;
pub mod config;
pub mod error;
pub mod extractor;
pub mod provider;
pub mod scraper;
pub mod split;
pub mod store;
pub mod tabular;
pub mod walker;

pub use categories::{resolve, Category, CategoryOrigin, CategorySet};
pub use config::{FailurePolicy, ScraperConfig};
pub use error::{Result, ScraperError};
pub use extractor::{ExtractError, FileRecord, MetadataExtractor};
pub use provider::{MetadataProvider, ProviderFailure};
pub use scraper::{ScrapeCancelToken, ScrapeFailure, ScrapeReport, Scraper};
pub use split::split_output;
pub use store::{ExistingFileIndex, OutputStore};
