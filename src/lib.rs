pub mod browser;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod error;
pub mod fetcher;
pub mod form;
pub mod links;
pub mod orchestrator;
pub mod region;
pub mod report;
pub mod search;
pub mod stats;

pub use error::{FetchError, HubLoadError, ReportError};
pub use fetcher::{ClickTarget, Document, Fetcher, FormField, HttpFetcher, HttpFetcherConfig};
pub use orchestrator::{Orchestrator, ReportSummary, RunSummary};
pub use region::Region;
pub use search::{Category, SearchRequest};
pub use stats::RunStats;
