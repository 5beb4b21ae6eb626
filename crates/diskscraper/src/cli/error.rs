//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use diskscraper::walker::CrawlPathError;
use diskscraper::ScraperError;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Crawl directory missing, not a directory, or unreadable
    pub fn crawl_dir_unusable(err: &CrawlPathError, config: &Path) -> Self {
        Self::new(err.to_string())
            .with_context(format!("'crawl directory' in {} must name a readable directory", config.display()))
            .with_suggestions([
                format!("TRY: Check the crawl directory setting in {}", config.display()),
                "TRY: Use 'crawl directory = here' to scrape the working directory".to_string(),
            ])
    }

    /// Configured categories file does not exist
    pub fn categories_file_missing(path: &Path, config: &Path) -> Self {
        Self::new(format!("Categories file not found: {}", path.display()))
            .with_context("A categories file is configured, so discovery mode is off")
            .with_suggestions([
                format!("TRY: Create {} with one '<slot> : <name>' line per column", path.display()),
                format!(
                    "TRY: Set 'pre-configured categories = false' in {} to discover categories instead",
                    config.display()
                ),
            ])
    }

    /// Categories file has a line that is not `<slot> : <name>`
    pub fn invalid_category_line(path: &Path, line: usize, content: &str) -> Self {
        Self::new(format!("Invalid categories line {}: {:?}", line, content))
            .with_context(format!("While reading {}", path.display()))
            .with_suggestions([
                "TRY: Every line must look like '3 : Date modified'".to_string(),
                "TRY: Start a line with '#' to turn it into a comment".to_string(),
            ])
    }

    /// config.txt could not be parsed
    pub fn invalid_config(config: &Path, details: &str) -> Self {
        Self::new(format!("Invalid configuration: {}", details))
            .with_context(format!("While reading {}", config.display()))
            .with_suggestions([
                "TRY: Lines must look like 'crawl directory = D:\\Music'".to_string(),
                "TRY: Known keys: crawl directory, output directory, pre-configured categories, discovery slots, failed files".to_string(),
            ])
    }

    /// Output file exists but cannot be decoded
    pub fn unreadable_output(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read output file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Make sure the file was written by diskscraper (UTF-16, ';' separated)".to_string(),
                "TRY: Move the file aside to start a fresh output file".to_string(),
            ])
    }

    /// File does not exist
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                format!(
                    "TRY: Look for similar files: ls {}",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| ".".to_string())
                ),
            ])
    }

    /// Map a library error to a user-facing one, where there is something
    /// useful to suggest.
    pub fn from_scraper(err: ScraperError, config: &Path) -> anyhow::Error {
        match &err {
            ScraperError::CrawlDirectory(inner) => Self::crawl_dir_unusable(inner, config).into(),
            ScraperError::CategoriesNotFound(path) => Self::categories_file_missing(path, config).into(),
            ScraperError::InvalidCategoryLine { path, line, content } => {
                Self::invalid_category_line(path, *line, content).into()
            }
            ScraperError::Config(details) => Self::invalid_config(config, details).into(),
            ScraperError::Encoding { path, reason } => Self::unreadable_output(path, reason).into(),
            _ => err.into(),
        }
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[derive(Serialize)]
struct JsonError<'a> {
    error: String,
    context: Option<&'a str>,
    suggestions: &'a [String],
}

/// Print `err` to stdout as a JSON object, for `--json` callers.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => JsonError {
            error: helpful.message.clone(),
            context: helpful.context.as_deref(),
            suggestions: &helpful.suggestions,
        },
        None => JsonError {
            error: format!("{:#}", err),
            context: None,
            suggestions: &[],
        },
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(json) => println!("{}", json),
        Err(_) => eprintln!("{:?}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While processing data")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While processing data"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_categories_file_missing() {
        let err = HelpfulError::categories_file_missing(
            &PathBuf::from("/cfg/categories.txt"),
            &PathBuf::from("config.txt"),
        );

        let display = format!("{}", err);
        assert!(display.contains("/cfg/categories.txt"));
        assert!(display.contains("pre-configured categories = false"));
    }

    #[test]
    fn test_from_scraper_keeps_unmapped_errors() {
        let err = HelpfulError::from_scraper(
            ScraperError::EmptyOutput(PathBuf::from("x.csv")),
            Path::new("config.txt"),
        );
        assert!(err.downcast_ref::<HelpfulError>().is_none());
        assert!(err.to_string().contains("x.csv"));

        let err = HelpfulError::from_scraper(
            ScraperError::Config("line 2: bad".to_string()),
            Path::new("config.txt"),
        );
        assert!(err.downcast_ref::<HelpfulError>().is_some());
    }
}
