//! `diskscraper categories` - show what a run would extract

use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table};
use anyhow::Context;
use diskscraper::provider::platform_provider;
use diskscraper::{resolve, CategoryOrigin, CategorySet, ScraperConfig};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug)]
pub struct CategoriesArgs {
    pub config: PathBuf,
    pub json: bool,
    pub log_file: PathBuf,
}

#[derive(Serialize)]
struct CategoriesOutput<'a> {
    #[serde(flatten)]
    set: &'a CategorySet,
    header: Vec<String>,
}

pub fn run(args: CategoriesArgs) -> anyhow::Result<()> {
    let config = ScraperConfig::load(&args.config)
        .map_err(|e| HelpfulError::from_scraper(e, &args.config))?;
    let provider = platform_provider(&args.log_file).context("Failed to open the metadata provider")?;
    let categories = resolve(&config, &*provider, &args.log_file)
        .map_err(|e| HelpfulError::from_scraper(e, &args.config))?;

    if args.json {
        return print_json(&CategoriesOutput {
            set: &categories,
            header: categories.header(),
        });
    }

    match &categories.origin {
        CategoryOrigin::UserDefined { file } => {
            println!("Categories from {}", file.display());
        }
        CategoryOrigin::Discovered { upper_bound, .. } => {
            println!("Discovered categories (slots 0..{})", upper_bound);
        }
    }
    let rows = categories
        .iter()
        .map(|c| vec![c.slot.to_string(), c.name.clone()])
        .collect();
    print_table(&["Slot", "Name"], rows);
    println!("{} categories", categories.len());
    Ok(())
}
