//! Per-file metadata extraction

use crate::categories::CategorySet;
use crate::provider::{MetadataProvider, ProviderFailure};
use crate::scraper::ScrapeCancelToken;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Sparse field name → value mapping for one file.
///
/// Only non-empty values are stored; absent fields serialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecord {
    fields: HashMap<String, String>,
}

impl FileRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing an earlier value under the same name.
    /// Empty names and values are ignored.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if !name.is_empty() && !value.is_empty() {
            self.fields.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Lay the record out in `header` order. The first two columns are the
    /// synthetic path and timestamp columns and always come from the
    /// arguments, never from the record.
    pub fn project(&self, header: &[String], file_path: &str, timestamp: &str) -> Vec<String> {
        header
            .iter()
            .enumerate()
            .map(|(idx, name)| match idx {
                0 => file_path.to_string(),
                1 => timestamp.to_string(),
                _ => self.get(name).unwrap_or_default().to_string(),
            })
            .collect()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error(transparent)]
    Provider(#[from] ProviderFailure),

    #[error("cancelled")]
    Cancelled,
}

/// Queries a provider across a category set.
pub struct MetadataExtractor<'a, P: MetadataProvider + ?Sized> {
    provider: &'a P,
    categories: &'a CategorySet,
    cancel: ScrapeCancelToken,
}

impl<'a, P: MetadataProvider + ?Sized> MetadataExtractor<'a, P> {
    pub fn new(provider: &'a P, categories: &'a CategorySet) -> Self {
        Self {
            provider,
            categories,
            cancel: ScrapeCancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: ScrapeCancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Read every category for `path`.
    ///
    /// The first provider failure abandons the file; no partial record is
    /// returned. The cancel token is checked before each provider call.
    pub fn extract(&self, path: &Path) -> Result<FileRecord, ExtractError> {
        let mut record = FileRecord::new();
        for category in self.categories.iter() {
            if self.cancel.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }
            let value = self.provider.value(path, category.slot)?;
            record.insert(category.name.as_str(), value);
        }
        Ok(record)
    }
}
