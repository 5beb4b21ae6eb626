//! `diskscraper run` - scrape the configured directory

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_duration_ms, print_json, print_table};
use anyhow::Context;
use diskscraper::provider::platform_provider;
use diskscraper::{resolve, ScrapeCancelToken, ScrapeReport, Scraper, ScraperConfig};
use std::path::PathBuf;
use tracing::warn;

/// Failures listed in the console summary; `--json` always has all of them.
const MAX_FAILURES_SHOWN: usize = 20;

#[derive(Debug)]
pub struct RunArgs {
    pub config: PathBuf,
    pub json: bool,
    /// Process log file; used as the discovery sample and never scraped
    pub log_file: PathBuf,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = ScraperConfig::load(&args.config)
        .map_err(|e| HelpfulError::from_scraper(e, &args.config))?;

    let provider = platform_provider(&args.log_file).context("Failed to open the metadata provider")?;
    let categories = resolve(&config, &*provider, &args.log_file)
        .map_err(|e| HelpfulError::from_scraper(e, &args.config))?;

    let cancel = ScrapeCancelToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %err, "Failed to install Ctrl+C handler; the run can only be killed");
    }

    let scraper = Scraper::prepare(&config, &*provider, categories)
        .map_err(|e| HelpfulError::from_scraper(e, &args.config))?
        .exclude(&args.log_file)
        .with_cancel_token(cancel);
    let report = scraper
        .run()
        .with_context(|| format!("Scrape of {} failed", config.crawl_dir.display()))?;

    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ScrapeReport) {
    let rows = vec![
        vec!["Output file".to_string(), report.output_file.display().to_string()],
        vec!["Categories".to_string(), report.categories.to_string()],
        vec!["Rows already present".to_string(), report.existing_rows.to_string()],
        vec!["Files seen".to_string(), report.files_seen.to_string()],
        vec!["Skipped (already read)".to_string(), report.files_skipped.to_string()],
        vec!["Rows written".to_string(), report.rows_written.to_string()],
        vec!["Failed".to_string(), report.failures.len().to_string()],
        vec!["Duration".to_string(), format_duration_ms(report.duration_ms)],
    ];
    print_table(&["", "Value"], rows);

    if report.malformed_rows > 0 {
        println!(
            "WARNING: {} existing rows do not match the header; columns may be misaligned",
            report.malformed_rows
        );
    }
    if report.walk_errors > 0 {
        println!("WARNING: {} directory entries could not be read (see error.log)", report.walk_errors);
    }

    if !report.failures.is_empty() {
        println!();
        let rows = report
            .failures
            .iter()
            .take(MAX_FAILURES_SHOWN)
            .map(|f| vec![f.path.clone(), f.message.clone()])
            .collect();
        print_table(&["Failed file", "Error"], rows);
        if report.failures.len() > MAX_FAILURES_SHOWN {
            println!("... and {} more (see error.log)", report.failures.len() - MAX_FAILURES_SHOWN);
        }
    }

    if report.cancelled {
        println!("Cancelled. Run again to continue where this run stopped.");
    }
}
