//! Metadata providers
//!
//! A provider answers two questions: what is the display name of property
//! slot `n`, and what is the value of slot `n` for a given file. An empty
//! string means "not applicable". Everything else that goes wrong is a
//! [`ProviderFailure`] carrying only a message; the platform services behind
//! these adapters do not expose anything more structured.

pub mod fixed;
pub mod fs;
#[cfg(windows)]
pub mod shell;

use std::path::Path;
use thiserror::Error;

pub use fixed::FixedProvider;
pub use fs::FsProvider;
#[cfg(windows)]
pub use shell::ShellProvider;

/// Opaque failure reported by a metadata provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderFailure {
    pub message: String,
}

impl ProviderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Source of per-file property values, addressed by slot index.
pub trait MetadataProvider {
    /// Human readable name of `slot`, or an empty string if the slot is unused.
    fn display_name(&self, slot: u32) -> Result<String, ProviderFailure>;

    /// Value of `slot` for the file at `path`, or an empty string if the
    /// property does not apply to that file.
    fn value(&self, path: &Path, slot: u32) -> Result<String, ProviderFailure>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for &P {
    fn display_name(&self, slot: u32) -> Result<String, ProviderFailure> {
        (**self).display_name(slot)
    }

    fn value(&self, path: &Path, slot: u32) -> Result<String, ProviderFailure> {
        (**self).value(path, slot)
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Box<P> {
    fn display_name(&self, slot: u32) -> Result<String, ProviderFailure> {
        (**self).display_name(slot)
    }

    fn value(&self, path: &Path, slot: u32) -> Result<String, ProviderFailure> {
        (**self).value(path, slot)
    }
}

/// The native provider for this platform.
///
/// On Windows this is the shell (Explorer) property system, which names its
/// columns relative to a folder; `reference_file` picks that folder. Other
/// platforms use [`FsProvider`], which ignores it.
#[cfg(windows)]
pub fn platform_provider(reference_file: &Path) -> crate::Result<Box<dyn MetadataProvider>> {
    Ok(Box::new(ShellProvider::new(reference_file)?))
}

/// The native provider for this platform.
///
/// On Windows this is the shell (Explorer) property system, which names its
/// columns relative to a folder; `reference_file` picks that folder. Other
/// platforms use [`FsProvider`], which ignores it.
#[cfg(not(windows))]
pub fn platform_provider(reference_file: &Path) -> crate::Result<Box<dyn MetadataProvider>> {
    let _ = reference_file;
    Ok(Box::new(FsProvider::new()))
}
