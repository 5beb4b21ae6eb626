//! Crawl directory validation and the depth-first file walk.

use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub enum CrawlPathError {
    NotFound(PathBuf),
    NotDirectory(PathBuf),
    NotReadable(PathBuf),
}

impl fmt::Display for CrawlPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlPathError::NotFound(path) => write!(f, "Path not found: {}", path.display()),
            CrawlPathError::NotDirectory(path) => write!(f, "Not a directory: {}", path.display()),
            CrawlPathError::NotReadable(path) => {
                write!(f, "Cannot read directory: {}", path.display())
            }
        }
    }
}

impl std::error::Error for CrawlPathError {}

pub fn validate_crawl_dir(path: &Path) -> Result<(), CrawlPathError> {
    if !path.exists() {
        return Err(CrawlPathError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(CrawlPathError::NotDirectory(path.to_path_buf()));
    }
    if std::fs::read_dir(path).is_err() {
        return Err(CrawlPathError::NotReadable(path.to_path_buf()));
    }
    Ok(())
}

/// Lazily yield every regular file below `root`, depth first.
///
/// Order within a directory is whatever the OS returns. Symlinks are neither
/// followed nor yielded. Unreadable entries come through as `Err` so the
/// caller can log them and keep going.
pub fn walk_files(root: &Path) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
}

/// The string form of a path used in the output file's first column.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_walk_yields_nested_files_only() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.txt");
        touch(temp.path(), "sub/b.txt");
        touch(temp.path(), "sub/deeper/c.txt");
        std::fs::create_dir_all(temp.path().join("empty")).unwrap();

        let found: BTreeSet<PathBuf> = walk_files(temp.path()).map(|p| p.unwrap()).collect();
        let expected: BTreeSet<PathBuf> = ["a.txt", "sub/b.txt", "sub/deeper/c.txt"]
            .iter()
            .map(|rel| temp.path().join(rel))
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_walk_is_depth_first() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "one/x/1.txt");
        touch(temp.path(), "one/x/2.txt");
        touch(temp.path(), "two/3.txt");

        let found: Vec<PathBuf> = walk_files(temp.path()).map(|p| p.unwrap()).collect();
        let x_files: Vec<usize> = found
            .iter()
            .enumerate()
            .filter(|(_, p)| p.starts_with(temp.path().join("one/x")))
            .map(|(i, _)| i)
            .collect();
        // The two files of one/x are never interleaved with two/.
        assert_eq!(x_files.len(), 2);
        assert_eq!(x_files[1], x_files[0] + 1);
    }

    #[test]
    fn test_validate_crawl_dir() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "file.txt");

        assert!(validate_crawl_dir(temp.path()).is_ok());
        assert!(matches!(
            validate_crawl_dir(&temp.path().join("missing")),
            Err(CrawlPathError::NotFound(_))
        ));
        assert!(matches!(
            validate_crawl_dir(&temp.path().join("file.txt")),
            Err(CrawlPathError::NotDirectory(_))
        ));
    }
}
