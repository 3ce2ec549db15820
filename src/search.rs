use std::fmt;
use std::str::FromStr;

use html_escape::{encode_double_quoted_attribute, encode_single_quoted_attribute, encode_text};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetcher::{ClickTarget, Document, Fetcher, FormField};
use crate::links::{paragraph_anchors, uri_of, ParagraphAnchor};
use crate::stats::RunStats;

pub const QUERY_FIELD: &str = "query";
pub const TELECOMMUTE_FIELD: &str = "addOne";
pub const SUBMIT_VALUE: &str = "Search";

/// Job category searched on every city site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Category {
    #[default]
    AllJobs,
    SoftwareJobs,
    WebJobs,
}

impl Category {
    /// Path appended to a city root to reach its category search page.
    pub fn path(&self) -> &'static str {
        match self {
            Category::AllJobs => "jjj/",
            Category::SoftwareJobs => "sof/",
            Category::WebJobs => "web/",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::AllJobs => "all-jobs",
            Category::SoftwareJobs => "software-jobs",
            Category::WebJobs => "web-jobs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('/').to_ascii_lowercase().as_str() {
            "all" | "all-jobs" | "jjj" => Ok(Category::AllJobs),
            "software" | "software-jobs" | "sof" => Ok(Category::SoftwareJobs),
            "web" | "web-jobs" => Ok(Category::WebJobs),
            other => Err(format!(
                "unknown category '{}' (expected all, software or web)",
                other
            )),
        }
    }
}

/// One search term in one category, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub term: String,
    pub category: Category,
    pub telecommute: bool,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>, category: Category, telecommute: bool) -> Self {
        Self {
            term: term.into(),
            category,
            telecommute,
        }
    }

    fn form_fields(&self) -> Vec<FormField> {
        let mut fields = vec![FormField::text(QUERY_FIELD, self.term.as_str())];
        if self.telecommute {
            fields.push(FormField::toggle(TELECOMMUTE_FIELD));
        }
        fields
    }
}

/// A listing link found on a city's results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    /// Canonical anchor start tag as extracted.
    pub anchor_html: String,
    pub text: String,
    pub city_title: String,
    pub city_url: String,
    /// First entry of its city; rendered behind a site header line.
    pub site_header: bool,
}

impl ResultEntry {
    pub fn site_header_line(&self) -> String {
        format!(
            "<br /><br />Site: {} --> <a href='{}'>results page</a><br />",
            encode_text(&self.city_title),
            encode_single_quoted_attribute(&self.city_url)
        )
    }

    /// Page text was decoded by the parser, so it is re-escaped on the way out.
    pub fn fragment(&self) -> String {
        let line = format!(
            "<a href=\"{}\">{}</a><br />",
            encode_double_quoted_attribute(&uri_of(&self.anchor_html)),
            encode_text(&self.text)
        );
        if self.site_header {
            format!("{}\n{}", self.site_header_line(), line)
        } else {
            line
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityResults {
    pub entries: Vec<ResultEntry>,
    pub stats: RunStats,
}

impl CityResults {
    fn failed() -> Self {
        Self {
            entries: Vec::new(),
            stats: RunStats::for_site(0),
        }
    }
}

pub fn category_url(city_url: &str, category: Category) -> String {
    if city_url.ends_with('/') {
        format!("{}{}", city_url, category.path())
    } else {
        format!("{}/{}", city_url, category.path())
    }
}

/// Runs `request` against one city. Failures are contained: the city still
/// counts as searched but contributes nothing.
pub async fn search_city(fetcher: &dyn Fetcher, city_url: &str, request: &SearchRequest) -> CityResults {
    info!("Visiting page: {}", city_url);
    match run_search(fetcher, city_url, request).await {
        Ok(results) => results,
        Err(e) => {
            warn!("⚠️ Search on {} failed: {}", city_url, e);
            CityResults::failed()
        }
    }
}

async fn run_search(
    fetcher: &dyn Fetcher,
    city_url: &str,
    request: &SearchRequest,
) -> Result<CityResults, FetchError> {
    let search_page = fetcher.load(&category_url(city_url, request.category)).await?;
    let results_page = fetcher
        .submit(
            &search_page,
            &request.form_fields(),
            &ClickTarget::value(SUBMIT_VALUE),
        )
        .await?;

    let entries = collect_entries(&results_page, city_url, paragraph_anchors(&results_page));
    debug!("{} results on {}", entries.len(), results_page.url);

    let stats = RunStats::for_site(entries.len() as u32);
    Ok(CityResults { entries, stats })
}

fn collect_entries(page: &Document, city_url: &str, anchors: Vec<ParagraphAnchor>) -> Vec<ResultEntry> {
    anchors
        .into_iter()
        .filter(|a| !a.href().is_empty())
        .enumerate()
        .map(|(i, a)| ResultEntry {
            anchor_html: a.anchor_html,
            text: a.text,
            city_title: page.title.clone(),
            city_url: city_url.to_string(),
            site_header: i == 0,
        })
        .collect()
}
