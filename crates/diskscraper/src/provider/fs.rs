//! Portable provider backed by `std::fs::Metadata`.
//!
//! Only a handful of properties can be answered without a platform property
//! system. Slot numbers follow the Explorer column layout so a category file
//! written for Windows keeps pointing at the same properties here; every
//! other slot is unnamed.

use super::{MetadataProvider, ProviderFailure};
use chrono::{DateTime, Local};
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

const SLOT_NAME: u32 = 0;
const SLOT_SIZE: u32 = 1;
const SLOT_ITEM_TYPE: u32 = 2;
const SLOT_DATE_MODIFIED: u32 = 3;
const SLOT_DATE_CREATED: u32 = 4;
const SLOT_DATE_ACCESSED: u32 = 5;
const SLOT_ATTRIBUTES: u32 = 6;
const SLOT_PERCEIVED_TYPE: u32 = 9;
const SLOT_FILE_EXTENSION: u32 = 164;
const SLOT_FILENAME: u32 = 165;
const SLOT_FOLDER_NAME: u32 = 190;
const SLOT_FOLDER_PATH: u32 = 191;
const SLOT_FOLDER: u32 = 192;
const SLOT_PATH: u32 = 194;

const SLOTS: &[(u32, &str)] = &[
    (SLOT_NAME, "Name"),
    (SLOT_SIZE, "Size"),
    (SLOT_ITEM_TYPE, "Item type"),
    (SLOT_DATE_MODIFIED, "Date modified"),
    (SLOT_DATE_CREATED, "Date created"),
    (SLOT_DATE_ACCESSED, "Date accessed"),
    (SLOT_ATTRIBUTES, "Attributes"),
    (SLOT_PERCEIVED_TYPE, "Perceived type"),
    (SLOT_FILE_EXTENSION, "File extension"),
    (SLOT_FILENAME, "Filename"),
    (SLOT_FOLDER_NAME, "Folder name"),
    (SLOT_FOLDER_PATH, "Folder path"),
    (SLOT_FOLDER, "Folder"),
    (SLOT_PATH, "Path"),
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Default, Clone, Copy)]
pub struct FsProvider;

impl FsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataProvider for FsProvider {
    fn display_name(&self, slot: u32) -> Result<String, ProviderFailure> {
        Ok(SLOTS
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, name)| name.to_string())
            .unwrap_or_default())
    }

    fn value(&self, path: &Path, slot: u32) -> Result<String, ProviderFailure> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| ProviderFailure::new(format!("{}: {}", path.display(), e)))?;

        let value = match slot {
            SLOT_NAME | SLOT_FILENAME => file_name(path),
            SLOT_SIZE => format_size(metadata.len()),
            SLOT_ITEM_TYPE => item_type(path),
            SLOT_DATE_MODIFIED => format_time(metadata.modified().ok()),
            SLOT_DATE_CREATED => format_time(metadata.created().ok()),
            SLOT_DATE_ACCESSED => format_time(metadata.accessed().ok()),
            SLOT_ATTRIBUTES => attributes(path, &metadata),
            SLOT_PERCEIVED_TYPE => perceived_type(&extension(path)).to_string(),
            SLOT_FILE_EXTENSION => {
                let ext = extension(path);
                if ext.is_empty() {
                    String::new()
                } else {
                    format!(".{}", ext)
                }
            }
            SLOT_FOLDER_NAME => path
                .parent()
                .map(file_name)
                .unwrap_or_default(),
            SLOT_FOLDER_PATH => path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            SLOT_FOLDER => folder(path),
            SLOT_PATH => path.display().to_string(),
            _ => String::new(),
        };
        Ok(value)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Format a file size the way Explorer's Size column does
///
/// Examples:
/// - 500 -> "500 bytes"
/// - 1536 -> "1.5 KB"
/// - 1048576 -> "1.0 MB"
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => {
            let datetime: DateTime<Local> = time.into();
            datetime.format(DATE_FORMAT).to_string()
        }
        None => String::new(),
    }
}

fn item_type(path: &Path) -> String {
    let ext = extension(path);
    if ext.is_empty() {
        "File".to_string()
    } else {
        format!("{} File", ext.to_uppercase())
    }
}

fn attributes(path: &Path, metadata: &Metadata) -> String {
    let mut attrs = String::new();
    if metadata.permissions().readonly() {
        attrs.push('R');
    }
    if file_name(path).starts_with('.') {
        attrs.push('H');
    }
    attrs
}

fn perceived_type(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tif" | "tiff" | "webp" | "heic" => "Image",
        "mp4" | "mov" | "avi" | "mkv" | "wmv" | "webm" => "Video",
        "mp3" | "wav" | "flac" | "ogg" | "m4a" | "wma" => "Audio",
        "txt" | "csv" | "log" | "md" | "json" | "xml" => "Text",
        "zip" | "gz" | "tar" | "7z" | "rar" => "Compressed",
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt" => "Document",
        "exe" | "msi" | "bat" | "sh" => "Application",
        _ => "",
    }
}

/// Explorer shows the containing folder as `name (parent)`.
fn folder(path: &Path) -> String {
    let Some(parent) = path.parent() else {
        return String::new();
    };
    let name = file_name(parent);
    match parent.parent() {
        Some(grandparent) if !name.is_empty() => {
            format!("{} ({})", name, grandparent.display())
        }
        _ => parent.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slot_names_are_sparse() {
        let provider = FsProvider::new();
        assert_eq!(provider.display_name(0).unwrap(), "Name");
        assert_eq!(provider.display_name(3).unwrap(), "Date modified");
        assert_eq!(provider.display_name(7).unwrap(), "");
        assert_eq!(provider.display_name(194).unwrap(), "Path");
        assert_eq!(provider.display_name(349).unwrap(), "");
    }

    #[test]
    fn test_values_for_real_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("holiday.JPG");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let provider = FsProvider::new();
        assert_eq!(provider.value(&path, SLOT_NAME).unwrap(), "holiday.JPG");
        assert_eq!(provider.value(&path, SLOT_SIZE).unwrap(), "2.0 KB");
        assert_eq!(provider.value(&path, SLOT_ITEM_TYPE).unwrap(), "JPG File");
        assert_eq!(provider.value(&path, SLOT_PERCEIVED_TYPE).unwrap(), "Image");
        assert_eq!(provider.value(&path, SLOT_FILE_EXTENSION).unwrap(), ".jpg");
        assert_eq!(provider.value(&path, SLOT_PATH).unwrap(), path.display().to_string());
        assert!(!provider.value(&path, SLOT_DATE_MODIFIED).unwrap().is_empty());
        assert_eq!(provider.value(&path, 7).unwrap(), "");
    }

    #[test]
    fn test_missing_file_is_failure() {
        let temp = TempDir::new().unwrap();
        let provider = FsProvider::new();
        assert!(provider.value(&temp.path().join("gone.txt"), SLOT_NAME).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1048576), "1.0 MB");
        assert_eq!(format_size(1073741824), "1.0 GB");
    }

    #[test]
    fn test_item_type_without_extension() {
        assert_eq!(item_type(Path::new("/data/Makefile")), "File");
    }
}
