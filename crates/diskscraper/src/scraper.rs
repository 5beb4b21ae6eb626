//! Scrape run: walk, skip, extract, append.
//!
//! Everything happens on the calling thread, one file at a time. A provider
//! failure only costs the file it happened on; I/O errors on the output file
//! end the run because later rows could not be written either.

use crate::categories::CategorySet;
use crate::config::{FailurePolicy, ScraperConfig};
use crate::error::Result;
use crate::extractor::{ExtractError, MetadataExtractor};
use crate::provider::MetadataProvider;
use crate::store::{ExistingFileIndex, OutputStore};
use crate::walker::{path_key, validate_crawl_dir, walk_files};
use chrono::Local;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Format of the "Timestamp of reading" column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Shared flag that asks a running scrape to stop after the current
/// provider call.
#[derive(Debug, Clone, Default)]
pub struct ScrapeCancelToken {
    cancelled: Arc<AtomicBool>,
}

impl ScrapeCancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A file whose metadata could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeFailure {
    pub path: String,
    pub message: String,
}

/// Outcome of one scrape run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeReport {
    pub output_file: PathBuf,
    pub categories: usize,
    /// Rows already present when the run started
    pub existing_rows: usize,
    /// Existing rows whose column count did not match the header
    pub malformed_rows: usize,
    /// Files yielded by the walk
    pub files_seen: u64,
    /// Files skipped because a previous run already recorded them
    pub files_skipped: u64,
    pub rows_written: u64,
    /// Error rows written under `failed files = record`
    pub failure_rows: u64,
    /// Directory entries the walk could not read
    pub walk_errors: u64,
    pub failures: Vec<ScrapeFailure>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

pub struct Scraper<'a, P: MetadataProvider + ?Sized> {
    config: &'a ScraperConfig,
    provider: &'a P,
    categories: CategorySet,
    store: OutputStore,
    existing: ExistingFileIndex,
    excluded: HashSet<PathBuf>,
    cancel: ScrapeCancelToken,
}

impl<'a, P: MetadataProvider + ?Sized> Scraper<'a, P> {
    /// Validate the crawl directory, read back any existing output file and
    /// make sure the output file has a header.
    pub fn prepare(config: &'a ScraperConfig, provider: &'a P, categories: CategorySet) -> Result<Self> {
        validate_crawl_dir(&config.crawl_dir)?;
        std::fs::create_dir_all(&config.output_dir)?;

        let output_file = config.output_file();
        let existing = if output_file.exists() {
            OutputStore::load_existing(&output_file)?
        } else {
            ExistingFileIndex::default()
        };

        // Rows follow the header already on disk so every column keeps its name.
        let resolved = categories.header();
        let header = match existing.header() {
            Some(previous) if previous != resolved.as_slice() => {
                let dropped: Vec<&str> = resolved
                    .iter()
                    .filter(|name| !previous.contains(*name))
                    .map(String::as_str)
                    .collect();
                warn!(
                    path = %output_file.display(),
                    existing_columns = previous.len(),
                    resolved_columns = resolved.len(),
                    not_in_file = ?dropped,
                    "Existing output header differs from the resolved categories; keeping the existing header"
                );
                previous.to_vec()
            }
            Some(previous) => previous.to_vec(),
            None => resolved,
        };
        let store = OutputStore::initialize(&output_file, header)?;

        let mut excluded = HashSet::new();
        excluded.insert(output_file);

        Ok(Self {
            config,
            provider,
            categories,
            store,
            existing,
            excluded,
            cancel: ScrapeCancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: ScrapeCancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Never scrape `path` (the log file, for instance).
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.insert(path.into());
        self
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn existing(&self) -> &ExistingFileIndex {
        &self.existing
    }

    pub fn output_file(&self) -> &Path {
        self.store.path()
    }

    /// Walk the crawl directory and append a row for every file not already
    /// in the output file.
    pub fn run(&self) -> Result<ScrapeReport> {
        let start = Instant::now();
        let mut report = ScrapeReport {
            output_file: self.store.path().to_path_buf(),
            categories: self.categories.len(),
            existing_rows: self.existing.rows(),
            malformed_rows: self.existing.malformed_rows(),
            ..ScrapeReport::default()
        };

        info!(
            crawl_dir = %self.config.crawl_dir.display(),
            output = %self.store.path().display(),
            categories = self.categories.len(),
            existing = self.existing.len(),
            "Starting scrape"
        );

        let extractor = MetadataExtractor::new(self.provider, &self.categories)
            .with_cancel_token(self.cancel.clone());

        for entry in walk_files(&self.config.crawl_dir) {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable directory entry");
                    report.walk_errors += 1;
                    continue;
                }
            };
            if self.excluded.contains(&path) {
                continue;
            }

            report.files_seen += 1;
            let key = path_key(&path);
            debug!(n = report.files_seen, path = %key, "Reading file");

            if self.existing.contains(&key) {
                debug!(path = %key, "File already read");
                report.files_skipped += 1;
                continue;
            }

            match extractor.extract(&path) {
                Ok(record) => {
                    self.store.append_row(&record, &key, &reading_timestamp())?;
                    report.rows_written += 1;
                }
                Err(ExtractError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(ExtractError::Provider(failure)) => {
                    error!(error = %failure, filepath = %key, "Failed to read metadata");
                    if self.config.failure_policy == FailurePolicy::Record {
                        self.store.append_failure(&key, &failure.message)?;
                        report.failure_rows += 1;
                    }
                    report.failures.push(ScrapeFailure {
                        path: key,
                        message: failure.message,
                    });
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        if report.cancelled {
            warn!(rows_written = report.rows_written, "Scrape cancelled");
        }
        info!(
            seen = report.files_seen,
            skipped = report.files_skipped,
            written = report.rows_written,
            failed = report.failures.len(),
            walk_errors = report.walk_errors,
            duration_ms = report.duration_ms,
            "Scrape complete"
        );
        Ok(report)
    }
}

/// Local wall-clock time in the output file's timestamp format.
pub fn reading_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{Category, CategoryOrigin};
    use crate::provider::FixedProvider;
    use crate::tabular;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ScraperConfig) {
        let temp = TempDir::new().unwrap();
        let crawl = temp.path().join("crawl");
        let out = temp.path().join("out");
        std::fs::create_dir_all(&crawl).unwrap();
        let mut config = ScraperConfig::in_dir(temp.path());
        config.crawl_dir = crawl;
        config.output_dir = out;
        (temp, config)
    }

    fn size_only() -> CategorySet {
        CategorySet::new(
            CategoryOrigin::UserDefined {
                file: PathBuf::from("cats.txt"),
            },
            vec![Category::new(1, "Size")],
        )
    }

    #[test]
    fn test_cancel_token() {
        let token = ScrapeCancelToken::new();
        let shared = token.clone();
        assert!(!token.is_cancelled());
        shared.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_timestamp_format() {
        let ts = reading_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(ts.len(), "2024-01-01 00:00:00.000000".len());
    }

    #[test]
    fn test_prepare_rejects_missing_crawl_dir() {
        let (_temp, mut config) = setup();
        config.crawl_dir = config.crawl_dir.join("missing");
        let provider = FixedProvider::new();
        assert!(Scraper::prepare(&config, &provider, size_only()).is_err());
    }

    #[test]
    fn test_run_excludes_output_and_extra_paths() {
        let (_temp, mut config) = setup();
        // Output lands inside the crawl directory.
        config.output_dir = config.crawl_dir.clone();
        let log = config.crawl_dir.join("error.log");
        std::fs::write(&log, b"").unwrap();
        std::fs::write(config.crawl_dir.join("a.txt"), b"a").unwrap();

        let provider = FixedProvider::new();
        let scraper = Scraper::prepare(&config, &provider, size_only())
            .unwrap()
            .exclude(&log);
        let report = scraper.run().unwrap();

        assert_eq!(report.files_seen, 1);
        assert_eq!(report.rows_written, 1);
    }

    #[test]
    fn test_run_records_failure_rows_when_configured() {
        let (_temp, mut config) = setup();
        config.failure_policy = FailurePolicy::Record;
        let bad = config.crawl_dir.join("bad.bin");
        std::fs::write(&bad, b"x").unwrap();

        let provider = FixedProvider::new().failing_on(&bad, "The device is not ready");
        let report = Scraper::prepare(&config, &provider, size_only())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.failure_rows, 1);
        assert_eq!(report.rows_written, 0);
        let rows = tabular::read_rows(&config.output_file()).unwrap();
        assert_eq!(rows[1], vec![path_key(&bad), "The device is not ready".to_string()]);
    }

    #[test]
    fn test_run_skip_policy_writes_nothing_for_failures() {
        let (_temp, config) = setup();
        let bad = config.crawl_dir.join("bad.bin");
        std::fs::write(&bad, b"x").unwrap();

        let provider = FixedProvider::new().failing_on(&bad, "boom");
        let report = Scraper::prepare(&config, &provider, size_only())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failure_rows, 0);
        assert_eq!(tabular::read_rows(&config.output_file()).unwrap().len(), 1);
    }

    #[test]
    fn test_run_stops_when_cancelled() {
        let (_temp, config) = setup();
        std::fs::write(config.crawl_dir.join("a.txt"), b"a").unwrap();

        let provider = FixedProvider::new();
        let token = ScrapeCancelToken::new();
        token.cancel();
        let report = Scraper::prepare(&config, &provider, size_only())
            .unwrap()
            .with_cancel_token(token)
            .run()
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.rows_written, 0);
        assert_eq!(provider.value_calls(), 0);
    }
}
