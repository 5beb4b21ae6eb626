//! Table-driven provider with deterministic answers.
//!
//! Used by tests and by anyone who wants to exercise the pipeline without a
//! platform property system.

use super::{MetadataProvider, ProviderFailure};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct FixedProvider {
    names: BTreeMap<u32, String>,
    values: HashMap<(PathBuf, u32), String>,
    failures: HashMap<PathBuf, String>,
    value_calls: Cell<usize>,
}

impl FixedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name slot `slot`.
    pub fn with_slot(mut self, slot: u32, name: impl Into<String>) -> Self {
        self.names.insert(slot, name.into());
        self
    }

    /// Answer `value` for `(path, slot)`.
    pub fn with_value(mut self, path: impl Into<PathBuf>, slot: u32, value: impl Into<String>) -> Self {
        self.values.insert((path.into(), slot), value.into());
        self
    }

    /// Fail every value query for `path` with `message`.
    pub fn failing_on(mut self, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        self.failures.insert(path.into(), message.into());
        self
    }

    /// Number of `value` calls answered so far, failures included.
    pub fn value_calls(&self) -> usize {
        self.value_calls.get()
    }
}

impl MetadataProvider for FixedProvider {
    fn display_name(&self, slot: u32) -> Result<String, ProviderFailure> {
        Ok(self.names.get(&slot).cloned().unwrap_or_default())
    }

    fn value(&self, path: &Path, slot: u32) -> Result<String, ProviderFailure> {
        self.value_calls.set(self.value_calls.get() + 1);
        if let Some(message) = self.failures.get(path) {
            return Err(ProviderFailure::new(message.clone()));
        }
        Ok(self
            .values
            .get(&(path.to_path_buf(), slot))
            .cloned()
            .unwrap_or_default())
    }
}
