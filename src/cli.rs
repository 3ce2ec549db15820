use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::FetcherKind;
use crate::search::Category;

pub const USAGE: &str = "Usage: craigslist-jobs <directory> <search term>[,<search term>...]";

#[derive(Debug, Parser)]
#[command(version, about = "Keyword job search across regional Craigslist sites")]
pub struct Cli {
    /// Existing directory the HTML reports are appended into
    pub output_dir: PathBuf,

    /// Comma separated search terms, e.g. "qa, software tester"
    pub terms: String,

    /// Job category: all, software or web
    #[arg(long, default_value = "all")]
    pub category: Category,

    /// Search all listings instead of telecommute-only ones
    #[arg(long)]
    pub no_telecommute: bool,

    /// Override CRAIGSLIST_FETCHER (http or chrome)
    #[arg(long)]
    pub fetcher: Option<FetcherKind>,

    /// Fail the run at the end if any report write failed
    #[arg(long)]
    pub strict_writes: bool,
}

impl Cli {
    pub fn search_terms(&self) -> Vec<String> {
        split_terms(&self.terms)
    }
}

/// Splits on `,` and trims each part. Empty parts are kept.
pub fn split_terms(arg: &str) -> Vec<String> {
    arg.split(',').map(|t| t.trim().to_string()).collect()
}

pub fn check_output_dir(dir: &Path) -> Result<(), String> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(format!(
            "Error: ensure the directory results are saved to exists. Directory {}",
            dir.display()
        ))
    }
}
