//! Category resolution
//!
//! A category is one metadata column: a provider slot plus the name used in
//! the output header. The set comes either from a user file of
//! `<slot> : <name>` lines or from probing every slot below an upper bound.

use crate::config::ScraperConfig;
use crate::error::{Result, ScraperError};
use crate::provider::MetadataProvider;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FILEPATH_COLUMN: &str = "Filepath read by program";
pub const TIMESTAMP_COLUMN: &str = "Timestamp of reading";

/// Columns that lead every header and are filled by the scraper itself.
pub const SYNTHETIC_COLUMNS: [&str; 2] = [FILEPATH_COLUMN, TIMESTAMP_COLUMN];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub slot: u32,
    pub name: String,
}

impl Category {
    pub fn new(slot: u32, name: impl Into<String>) -> Self {
        Self {
            slot,
            name: name.into(),
        }
    }
}

/// Where a category set came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CategoryOrigin {
    UserDefined { file: PathBuf },
    Discovered { sample: PathBuf, upper_bound: u32 },
}

/// Ordered categories to extract for every file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySet {
    pub origin: CategoryOrigin,
    categories: Vec<Category>,
}

impl CategorySet {
    pub fn new(origin: CategoryOrigin, categories: Vec<Category>) -> Self {
        Self { origin, categories }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Output header: synthetic columns, then category names in order.
    pub fn header(&self) -> Vec<String> {
        SYNTHETIC_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.categories.iter().map(|c| c.name.clone()))
            .collect()
    }
}

/// Resolve the category set for a run.
///
/// With a categories file configured the file is authoritative and must
/// exist. Otherwise slots `0..discovery_slots` are queried; `sample_file`
/// must already exist (the log file is used for this).
pub fn resolve<P: MetadataProvider + ?Sized>(
    config: &ScraperConfig,
    provider: &P,
    sample_file: &Path,
) -> Result<CategorySet> {
    match &config.categories_file {
        Some(file) => {
            let categories = load_category_file(file)?;
            info!(
                file = %file.display(),
                count = categories.len(),
                "Loaded user-defined categories"
            );
            Ok(CategorySet::new(
                CategoryOrigin::UserDefined { file: file.clone() },
                categories,
            ))
        }
        None => {
            let categories = discover(provider, sample_file, config.discovery_slots)?;
            info!(
                sample = %sample_file.display(),
                upper_bound = config.discovery_slots,
                count = categories.len(),
                "Discovered categories"
            );
            Ok(CategorySet::new(
                CategoryOrigin::Discovered {
                    sample: sample_file.to_path_buf(),
                    upper_bound: config.discovery_slots,
                },
                categories,
            ))
        }
    }
}

pub fn load_category_file(path: &Path) -> Result<Vec<Category>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScraperError::CategoriesNotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    parse_category_list(&text, path)
}

/// Parse `<slot> : <name>` lines, keeping file order and duplicates.
/// `source` is only used in error messages.
pub fn parse_category_list(text: &str, source: &Path) -> Result<Vec<Category>> {
    let mut categories = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let invalid = || ScraperError::InvalidCategoryLine {
            path: source.to_path_buf(),
            line: idx + 1,
            content: raw.to_string(),
        };

        let (slot, name) = line.split_once(':').ok_or_else(invalid)?;
        let slot: u32 = slot.trim().parse().map_err(|_| invalid())?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        categories.push(Category::new(slot, name));
    }

    Ok(categories)
}

/// Query slots `0..upper_bound` and keep every slot with a display name.
pub fn discover<P: MetadataProvider + ?Sized>(
    provider: &P,
    sample_file: &Path,
    upper_bound: u32,
) -> Result<Vec<Category>> {
    if !sample_file.exists() {
        return Err(ScraperError::SampleFileMissing(sample_file.to_path_buf()));
    }

    let mut categories = Vec::new();
    for slot in 0..upper_bound {
        let name = provider.display_name(slot)?;
        if !name.is_empty() {
            debug!(slot, name = %name, "Discovered category");
            categories.push(Category::new(slot, name));
        }
    }
    Ok(categories)
}
