use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain a document from a remote site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport, DNS, non-2xx status, timeout or browser failure.
    #[error("failed to fetch {url}: {cause}")]
    Fetch { url: String, cause: String },

    /// An expected form control is not present on the page.
    #[error("{url} has no control matching '{selector}'")]
    SelectorMissing { url: String, selector: String },
}

impl FetchError {
    pub fn fetch(url: impl Into<String>, cause: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    pub fn selector_missing(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::SelectorMissing {
            url: url.into(),
            selector: selector.into(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Fetch { url, .. } | Self::SelectorMissing { url, .. } => url,
        }
    }
}

/// The country hub page could not be loaded, so no city was searched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not load hub page {hub_url}: {source}")]
pub struct HubLoadError {
    pub hub_url: String,
    #[source]
    pub source: FetchError,
}

/// Append to a report file failed.
#[derive(Error, Debug)]
#[error("could not append to {}: {source}", .path.display())]
pub struct ReportError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
