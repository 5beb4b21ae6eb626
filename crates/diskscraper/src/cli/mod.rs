//! CLI module for DiskScraper
//!
//! `run` is the scrape itself; `categories` and `split` are standalone
//! utilities around it.

pub mod error;
pub mod output;

pub mod categories;
pub mod run;
pub mod split;
