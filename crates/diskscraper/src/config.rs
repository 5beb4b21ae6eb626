//! `config.txt` loading
//!
//! The file is line oriented: `#` comments, blank lines, and `key = value`
//! pairs. A missing file is not an error; every setting then falls back to
//! the working directory and discovery mode.

use crate::error::{Result, ScraperError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Config file read when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.txt";

/// Highest slot index queried (exclusive) during discovery.
///
/// Explorer currently exposes a little over 320 columns; the margin is
/// arbitrary, which is why `discovery slots` can override it.
pub const DEFAULT_DISCOVERY_SLOTS: u32 = 350;

/// Directory value that stands for the working directory.
pub const HERE: &str = "here";

const KEY_CRAWL_DIR: &str = "crawl directory";
const KEY_OUTPUT_DIR: &str = "output directory";
const KEY_CATEGORIES: &str = "pre-configured categories";
const KEY_DISCOVERY_SLOTS: &str = "discovery slots";
const KEY_FAILED_FILES: &str = "failed files";

/// What to do with a file whose metadata could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and write no row; the file is retried on the next run
    #[default]
    Skip,
    /// Log the failure and write a row holding the path and the error message
    Record,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Skip => "skip",
            FailurePolicy::Record => "record",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "skip" => Some(FailurePolicy::Skip),
            "record" => Some(FailurePolicy::Record),
            _ => None,
        }
    }
}

/// Settings for one scrape run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScraperConfig {
    /// Root of the directory walk
    pub crawl_dir: PathBuf,
    /// Directory that receives the output file
    pub output_dir: PathBuf,
    /// User category list; `None` selects discovery mode
    pub categories_file: Option<PathBuf>,
    /// Exclusive upper bound of the discovery sweep
    pub discovery_slots: u32,
    pub failure_policy: FailurePolicy,
}

impl ScraperConfig {
    /// Defaults rooted at `cwd`.
    pub fn in_dir(cwd: &Path) -> Self {
        Self {
            crawl_dir: cwd.to_path_buf(),
            output_dir: cwd.to_path_buf(),
            categories_file: None,
            discovery_slots: DEFAULT_DISCOVERY_SLOTS,
            failure_policy: FailurePolicy::Skip,
        }
    }

    /// Load `path`, resolving `here` and relative paths against the process
    /// working directory.
    pub fn load(path: &Path) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load_from(path, &cwd)
    }

    /// Load `path`, resolving `here` and relative paths against `cwd`.
    pub fn load_from(path: &Path, cwd: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "Reading configuration file");
                Self::parse(&text, cwd)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    cwd = %cwd.display(),
                    "Configuration file not found, using working directory and discovery mode"
                );
                Ok(Self::in_dir(cwd))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Parse configuration text. Keys that are absent keep their defaults.
    pub fn parse(text: &str, cwd: &Path) -> Result<Self> {
        let mut config = Self::in_dir(cwd);

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                ScraperError::Config(format!(
                    "line {}: expected '<key> = <value>', got {:?}",
                    idx + 1,
                    raw
                ))
            })?;
            let key = key.trim();
            let value = value.trim();

            match key {
                KEY_CRAWL_DIR => {
                    let value = strip_trailing_slash(value);
                    config.crawl_dir = resolve_dir(value, cwd);
                }
                KEY_OUTPUT_DIR => {
                    config.output_dir = resolve_dir(value, cwd);
                }
                KEY_CATEGORIES => {
                    config.categories_file = if value.eq_ignore_ascii_case("false") || value.is_empty() {
                        None
                    } else {
                        Some(cwd.join(value))
                    };
                }
                KEY_DISCOVERY_SLOTS => {
                    config.discovery_slots = value.parse().map_err(|_| {
                        ScraperError::Config(format!(
                            "line {}: '{}' must be a non-negative integer, got {:?}",
                            idx + 1,
                            KEY_DISCOVERY_SLOTS,
                            value
                        ))
                    })?;
                }
                KEY_FAILED_FILES => {
                    config.failure_policy = FailurePolicy::parse(value).ok_or_else(|| {
                        ScraperError::Config(format!(
                            "line {}: '{}' must be 'skip' or 'record', got {:?}",
                            idx + 1,
                            KEY_FAILED_FILES,
                            value
                        ))
                    })?;
                }
                other => {
                    warn!(key = other, line = idx + 1, "Ignoring unknown configuration key");
                }
            }
        }

        Ok(config)
    }

    /// Full path of the output file for this configuration.
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(output_file_name(&self.crawl_dir))
    }
}

/// Derive the output file name from the crawl directory.
///
/// `G:\Photos 2020` becomes `G-Photos2020.csv`: spaces and dashes are dropped,
/// drive colons and separators turn into dashes.
pub fn output_file_name(crawl_dir: &Path) -> String {
    let source = crawl_dir.to_string_lossy();
    let name = source
        .replace(' ', "")
        .replace('-', "")
        .replace(":/", "-")
        .replace(':', "-")
        .replace('/', "-")
        .replace('\\', "-")
        .replace("--", "-");
    format!("{}.csv", name)
}

fn resolve_dir(value: &str, cwd: &Path) -> PathBuf {
    if value.is_empty() || value == HERE {
        cwd.to_path_buf()
    } else {
        cwd.join(value)
    }
}

fn strip_trailing_slash(value: &str) -> &str {
    if value.len() > 1 {
        value.strip_suffix('/').unwrap_or(value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let cwd = Path::new("/work");
        let text = "\
# where to look
crawl directory = /data/photos/
output directory = here

pre-configured categories = categories.txt
discovery slots = 330
failed files = record
";
        let config = ScraperConfig::parse(text, cwd).unwrap();

        assert_eq!(config.crawl_dir, PathBuf::from("/data/photos"));
        assert_eq!(config.output_dir, PathBuf::from("/work"));
        assert_eq!(config.categories_file, Some(PathBuf::from("/work/categories.txt")));
        assert_eq!(config.discovery_slots, 330);
        assert_eq!(config.failure_policy, FailurePolicy::Record);
    }

    #[test]
    fn test_parse_here_and_false() {
        let cwd = Path::new("/work");
        let text = "crawl directory = here\npre-configured categories = False\n";
        let config = ScraperConfig::parse(text, cwd).unwrap();

        assert_eq!(config.crawl_dir, PathBuf::from("/work"));
        assert_eq!(config.categories_file, None);
        assert_eq!(config.discovery_slots, DEFAULT_DISCOVERY_SLOTS);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
    }

    #[test]
    fn test_parse_relative_dirs_resolve_against_cwd() {
        let cwd = Path::new("/work");
        let config = ScraperConfig::parse("output directory = out\n", cwd).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/work/out"));
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let cwd = Path::new("/work");
        let config = ScraperConfig::parse("colour = blue\n", cwd).unwrap();
        assert_eq!(config, ScraperConfig::in_dir(cwd));
    }

    #[test]
    fn test_parse_rejects_line_without_separator() {
        let err = ScraperConfig::parse("crawl directory /data\n", Path::new("/work")).unwrap_err();
        assert!(matches!(err, ScraperError::Config(msg) if msg.contains("line 1")));
    }

    #[test]
    fn test_parse_rejects_bad_slot_count() {
        let err = ScraperConfig::parse("discovery slots = many\n", Path::new("/work")).unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));
    }

    #[test]
    fn test_parse_rejects_bad_failure_policy() {
        let err = ScraperConfig::parse("failed files = retry\n", Path::new("/work")).unwrap_err();
        assert!(matches!(err, ScraperError::Config(msg) if msg.contains("skip")));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ScraperConfig::load_from(&temp.path().join("config.txt"), temp.path()).unwrap();
        assert_eq!(config, ScraperConfig::in_dir(temp.path()));
    }

    #[test]
    fn test_load_from_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.txt");
        std::fs::write(&path, "failed files = record\r\n").unwrap();

        let config = ScraperConfig::load_from(&path, temp.path()).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Record);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(Path::new("G:\\Photos 2020")), "G-Photos2020.csv");
        assert_eq!(output_file_name(Path::new("C:/")), "C-.csv");
        assert_eq!(output_file_name(Path::new("/home/user/my-data")), "-home-user-mydata.csv");
    }

    #[test]
    fn test_output_file_joins_output_dir() {
        let mut config = ScraperConfig::in_dir(Path::new("/work"));
        config.crawl_dir = PathBuf::from("/data");
        assert_eq!(config.output_file(), PathBuf::from("/work/-data.csv"));
    }
}
