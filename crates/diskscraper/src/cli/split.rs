//! `diskscraper split` - break an output file into parts

use crate::cli::error::HelpfulError;
use crate::cli::output::print_table;
use diskscraper::split::DEFAULT_LINES_PER_FILE;
use diskscraper::{split_output, ScraperError};
use std::path::PathBuf;

#[derive(Debug)]
pub struct SplitArgs {
    pub file: PathBuf,
    pub lines: usize,
}

pub fn run(args: SplitArgs) -> anyhow::Result<()> {
    if !args.file.is_file() {
        return Err(HelpfulError::file_not_found(&args.file).into());
    }
    if args.lines == 0 {
        return Err(HelpfulError::new("--lines must be greater than zero")
            .with_suggestion(format!("TRY: Omit --lines to use {} rows per part", DEFAULT_LINES_PER_FILE))
            .into());
    }

    let parts = split_output(&args.file, args.lines).map_err(|e| -> anyhow::Error {
        match e {
            ScraperError::EmptyOutput(path) => {
                HelpfulError::new(format!("Output file is empty: {}", path.display()))
                    .with_context("There is no header row to copy into the parts")
                    .into()
            }
            ScraperError::Encoding { path, reason } => HelpfulError::unreadable_output(&path, &reason).into(),
            other => other.into(),
        }
    })?;

    let rows = parts
        .iter()
        .enumerate()
        .map(|(idx, part)| vec![(idx + 1).to_string(), part.display().to_string()])
        .collect();
    print_table(&["Part", "File"], rows);
    Ok(())
}
