use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::crawl::{crawl_country, CountryResults};
use crate::error::ReportError;
use crate::fetcher::Fetcher;
use crate::region::{Region, DEFAULT_HUB_URL};
use crate::report::ReportWriter;
use crate::search::{Category, SearchRequest};
use crate::stats::RunStats;

/// One finished report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub region: String,
    pub term: String,
    pub path: PathBuf,
    pub stats: RunStats,
    /// Set when a surfaced write to this report failed.
    pub write_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<ReportSummary>,
    /// First surfaced write failure, when the writer is not swallowing them.
    pub write_error: Option<ReportError>,
}

impl RunSummary {
    pub fn into_result(self) -> Result<Vec<ReportSummary>, ReportError> {
        match self.write_error {
            Some(e) => Err(e),
            None => Ok(self.reports),
        }
    }
}

/// Drives every (region, term) pair through the crawl and into its report.
pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    regions: Vec<Region>,
    writer: ReportWriter,
    hub_base: String,
    max_concurrent_cities: usize,
}

impl Orchestrator {
    pub fn new(fetcher: Arc<dyn Fetcher>, regions: Vec<Region>, writer: ReportWriter) -> Self {
        Self {
            fetcher,
            regions,
            writer,
            hub_base: DEFAULT_HUB_URL.to_string(),
            max_concurrent_cities: 1,
        }
    }

    pub fn with_hub_base(mut self, hub_base: impl Into<String>) -> Self {
        self.hub_base = hub_base.into();
        self
    }

    pub fn with_max_concurrent_cities(mut self, n: usize) -> Self {
        self.max_concurrent_cities = n.max(1);
        self
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub async fn run(&self, terms: &[String], category: Category, telecommute: bool) -> RunSummary {
        let mut summary = RunSummary::default();

        for region in &self.regions {
            info!("Country: {}", region.name);
            let hub_url = region.hub_url(&self.hub_base);

            for term in terms {
                let request = SearchRequest::new(term.as_str(), category, telecommute);
                let (done, failure) = self.run_report(region, &hub_url, &request).await;
                info!("✅ {} | {}: {}", done.region, done.term, done.stats);
                summary.reports.push(done);
                if summary.write_error.is_none() {
                    summary.write_error = failure;
                }
            }
        }

        summary
    }

    async fn run_report(
        &self,
        region: &Region,
        hub_url: &str,
        request: &SearchRequest,
    ) -> (ReportSummary, Option<ReportError>) {
        let mut stats = RunStats::default();
        let mut report = self.writer.open(&region.name, &request.term);
        report.write_header(&request.term);

        let results = match crawl_country(
            self.fetcher.as_ref(),
            hub_url,
            request,
            self.max_concurrent_cities,
        )
        .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!("⚠️ {}", e);
                CountryResults::default()
            }
        };

        for fragment in results.fragments() {
            report.append(&fragment);
        }
        stats.merge(results.stats);
        report.write_stats(&stats);
        report.write_tail();

        let path = report.path().to_path_buf();
        let failure = report.finish().err();
        let summary = ReportSummary {
            region: region.name.clone(),
            term: request.term.clone(),
            path,
            stats,
            write_error: failure.as_ref().map(ToString::to_string),
        };
        (summary, failure)
    }
}
