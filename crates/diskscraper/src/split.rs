//! Output splitter
//!
//! Large output files are awkward to open in a spreadsheet. Splitting writes
//! `<stem>_part<i>.csv` next to the source, each part carrying the header and
//! a run of consecutive data rows.

use crate::error::{Result, ScraperError};
use crate::tabular;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_LINES_PER_FILE: usize = 25_000;

/// Path of part `index` (1-based) for the output file at `path`.
pub fn part_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}_part{}.csv", stem, index))
}

/// Split the output file at `path` into parts of at most `lines_per_file`
/// data rows each. Returns the written parts in order.
pub fn split_output(path: &Path, lines_per_file: usize) -> Result<Vec<PathBuf>> {
    if lines_per_file == 0 {
        return Err(ScraperError::Config(
            "lines per file must be greater than zero".to_string(),
        ));
    }

    let mut rows = tabular::read_rows(path)?.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| ScraperError::EmptyOutput(path.to_path_buf()))?;
    let data: Vec<Vec<String>> = rows.collect();

    let mut parts = Vec::new();
    if data.is_empty() {
        let part = part_path(path, 1);
        tabular::write_file(&part, [&header])?;
        parts.push(part);
    } else {
        for (idx, chunk) in data.chunks(lines_per_file).enumerate() {
            let part = part_path(path, idx + 1);
            tabular::write_file(&part, std::iter::once(&header).chain(chunk))?;
            parts.push(part);
        }
    }

    info!(
        source = %path.display(),
        rows = data.len(),
        parts = parts.len(),
        "Split output file"
    );
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_output(dir: &TempDir, data_rows: usize) -> PathBuf {
        let path = dir.path().join("D-Music.csv");
        let mut rows = vec![vec!["Filepath read by program".to_string(), "Size".to_string()]];
        for i in 0..data_rows {
            rows.push(vec![format!("/music/{i}.mp3"), format!("{i} KB")]);
        }
        tabular::write_file(&path, &rows).unwrap();
        path
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/out/G-Photos2020.csv"), 3),
            PathBuf::from("/out/G-Photos2020_part3.csv")
        );
    }

    #[test]
    fn test_split_keeps_every_row_once() {
        let temp = TempDir::new().unwrap();
        let path = write_output(&temp, 7);

        let parts = split_output(&path, 3).unwrap();
        assert_eq!(parts.len(), 3);

        let mut seen = Vec::new();
        for part in &parts {
            let rows = tabular::read_rows(part).unwrap();
            assert_eq!(rows[0][0], "Filepath read by program");
            seen.extend(rows.into_iter().skip(1).map(|r| r[0].clone()));
        }
        let expected: Vec<String> = (0..7).map(|i| format!("/music/{i}.mp3")).collect();
        assert_eq!(seen, expected);
        assert_eq!(tabular::read_rows(&parts[2]).unwrap().len(), 2);
    }

    #[test]
    fn test_split_header_only() {
        let temp = TempDir::new().unwrap();
        let path = write_output(&temp, 0);

        let parts = split_output(&path, 10).unwrap();
        assert_eq!(parts, vec![temp.path().join("D-Music_part1.csv")]);
        assert_eq!(tabular::read_rows(&parts[0]).unwrap().len(), 1);
    }

    #[test]
    fn test_split_rejects_zero_and_empty() {
        let temp = TempDir::new().unwrap();
        let path = write_output(&temp, 2);
        assert!(matches!(split_output(&path, 0), Err(ScraperError::Config(_))));

        let empty = temp.path().join("empty.csv");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            split_output(&empty, 10),
            Err(ScraperError::EmptyOutput(_))
        ));
    }
}
