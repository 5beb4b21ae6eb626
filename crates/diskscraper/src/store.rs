//! Output store
//!
//! The output file is both the result and the resume index: on start-up the
//! first column of every existing row is read back so those files can be
//! skipped. Rows are appended one at a time with the file opened and closed
//! around each write, so a crash loses at most the row being written.

use crate::error::Result;
use crate::extractor::FileRecord;
use crate::tabular;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct OutputStore {
    path: PathBuf,
    header: Vec<String>,
}

impl OutputStore {
    /// Open the store at `path`, writing `header` only if the file does not
    /// exist yet or holds no rows (empty, or only a BOM). An existing header
    /// is never rewritten.
    pub fn initialize(path: impl Into<PathBuf>, header: Vec<String>) -> Result<Self> {
        let path = path.into();
        let needs_header = match std::fs::metadata(&path) {
            Ok(meta) => meta.len() == 0 || tabular::read_rows(&path)?.is_empty(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
            Err(err) => return Err(err.into()),
        };

        if needs_header {
            tabular::write_file(&path, [&header])?;
            info!(path = %path.display(), columns = header.len(), "Created output file");
        }

        Ok(Self { path, header })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Append one row for `file_path`, read at `timestamp`.
    pub fn append_row(&self, record: &FileRecord, file_path: &str, timestamp: &str) -> Result<()> {
        let row = record.project(&self.header, file_path, timestamp);
        tabular::append_row(&self.path, &row)
    }

    /// Append a short row recording a file that could not be read: the path
    /// followed by the error message.
    pub fn append_failure(&self, file_path: &str, message: &str) -> Result<()> {
        tabular::append_row(&self.path, [file_path, message])
    }

    /// Read back the paths already present in the output file at `path`.
    ///
    /// Rows are not validated against the header beyond counting the ones
    /// whose column count differs. Such rows usually mean the file was
    /// written by a different category set and later columns are misaligned.
    pub fn load_existing(path: &Path) -> Result<ExistingFileIndex> {
        let mut rows = tabular::read_rows(path)?.into_iter();
        let header = rows.next();
        let width = header.as_ref().map_or(0, Vec::len);

        let mut index = ExistingFileIndex {
            header,
            ..ExistingFileIndex::default()
        };
        for row in rows {
            if row.len() != width {
                index.malformed_rows += 1;
            }
            if let Some(first) = row.into_iter().next() {
                index.paths.insert(first);
                index.rows += 1;
            }
        }

        if index.malformed_rows > 0 {
            warn!(
                path = %path.display(),
                malformed = index.malformed_rows,
                expected_columns = width,
                "Existing output file has rows that do not match its header; columns may be misaligned"
            );
        }
        info!(path = %path.display(), rows = index.rows, "Loaded existing output file");
        Ok(index)
    }
}

/// Paths found in the first column of an existing output file.
#[derive(Debug, Clone, Default)]
pub struct ExistingFileIndex {
    paths: HashSet<String>,
    header: Option<Vec<String>>,
    rows: usize,
    malformed_rows: usize,
}

impl ExistingFileIndex {
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Header row of the file, if it had one.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Data rows read, duplicates included.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Data rows whose column count differs from the header.
    pub fn malformed_rows(&self) -> usize {
        self.malformed_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::SYNTHETIC_COLUMNS;
    use tempfile::TempDir;

    fn header(extra: &[&str]) -> Vec<String> {
        SYNTHETIC_COLUMNS
            .iter()
            .chain(extra.iter())
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_initialize_writes_header_once() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");

        OutputStore::initialize(&path, header(&["Size"])).unwrap();
        let store = OutputStore::initialize(&path, header(&["Other"])).unwrap();
        store.append_row(&FileRecord::new(), "/a", "t").unwrap();

        let rows = tabular::read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], header(&["Size"]));
    }

    #[test]
    fn test_initialize_fills_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        std::fs::write(&path, b"").unwrap();

        OutputStore::initialize(&path, header(&["Size"])).unwrap();
        assert_eq!(tabular::read_rows(&path).unwrap(), vec![header(&["Size"])]);
    }

    #[test]
    fn test_initialize_fills_bom_only_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        std::fs::write(&path, [0xFFu8, 0xFE]).unwrap();

        let store = OutputStore::initialize(&path, header(&["Size"])).unwrap();
        store.append_row(&FileRecord::new(), "/a.txt", "t").unwrap();

        let rows = tabular::read_rows(&path).unwrap();
        assert_eq!(rows[0], header(&["Size"]));
        assert_eq!(rows[1][0], "/a.txt");

        let index = OutputStore::load_existing(&path).unwrap();
        assert!(index.contains("/a.txt"));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.windows(2).filter(|w| *w == [0xFFu8, 0xFE]).count(), 1);
    }

    #[test]
    fn test_append_row_projects_sparse_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        let store = OutputStore::initialize(&path, header(&["A", "B", "C", "D"])).unwrap();

        let mut record = FileRecord::new();
        record.insert("B", "2");
        record.insert("D", "4");
        store.append_row(&record, "/data/f.txt", "2024-05-01 10:00:00.000000").unwrap();

        let rows = tabular::read_rows(&path).unwrap();
        assert_eq!(
            rows[1],
            vec!["/data/f.txt", "2024-05-01 10:00:00.000000", "", "2", "", "4"]
        );
    }

    #[test]
    fn test_load_existing_collects_first_column() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        let store = OutputStore::initialize(&path, header(&["Size"])).unwrap();
        store.append_row(&FileRecord::new(), "/a;b.txt", "t").unwrap();
        store.append_row(&FileRecord::new(), "/c.txt", "t").unwrap();

        let index = OutputStore::load_existing(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains("/a;b.txt"));
        assert!(index.contains("/c.txt"));
        assert!(!index.contains(SYNTHETIC_COLUMNS[0]));
        assert_eq!(index.malformed_rows(), 0);
        assert_eq!(index.header(), Some(header(&["Size"]).as_slice()));
    }

    #[test]
    fn test_load_existing_counts_malformed_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        let store = OutputStore::initialize(&path, header(&["Size"])).unwrap();
        store.append_row(&FileRecord::new(), "/ok.txt", "t").unwrap();
        store.append_failure("/bad.txt", "access denied").unwrap();

        let index = OutputStore::load_existing(&path).unwrap();
        assert_eq!(index.rows(), 2);
        assert_eq!(index.malformed_rows(), 1);
        assert!(index.contains("/bad.txt"));
    }
}
