use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use reqwest::Method;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;
use crate::form;

pub(crate) static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    ]
});

const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

pub(crate) fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_USER_AGENT)
}

/// A fetched page: where it ended up after redirects, its markup and title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub html: String,
    pub title: String,
}

impl Document {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        let title = extract_title(&html);
        Self {
            url: url.into(),
            html,
            title,
        }
    }
}

fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// An action on a form control, addressed by its `id` or `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    /// Replace the control's value.
    Text { field: String, value: String },
    /// Click a checkbox once, flipping its checked state.
    Toggle { field: String },
}

impl FormField {
    pub fn text(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn toggle(field: impl Into<String>) -> Self {
        Self::Toggle {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Text { field, .. } | Self::Toggle { field } => field,
        }
    }
}

/// The control clicked to send a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// Submit control whose `value` attribute equals this string.
    Value(String),
}

impl ClickTarget {
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }
}

/// Retrieves documents and submits forms. One instance serves a whole run.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn load(&self, url: &str) -> Result<Document, FetchError>;

    async fn submit(
        &self,
        document: &Document,
        fields: &[FormField],
        click: &ClickTarget,
    ) -> Result<Document, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub max_redirects: usize,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            max_redirects: 10,
        }
    }
}

/// Plain HTTP backend: forms are encoded and sent directly, no JavaScript.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let user_agent = config
            .user_agent
            .unwrap_or_else(|| random_user_agent().to_string());

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::fetch("<client>", e))?;

        Ok(Self { client })
    }

    async fn execute(&self, url: &str, request: reqwest::RequestBuilder) -> Result<Document, FetchError> {
        let resp = request
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| FetchError::fetch(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::fetch(url, format!("HTTP status {}", status)));
        }

        let final_url = resp.url().to_string();
        let html = resp.text().await.map_err(|e| FetchError::fetch(url, e))?;
        debug!("Fetched {} bytes from {}", html.len(), final_url);

        Ok(Document::new(final_url, html))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn load(&self, url: &str) -> Result<Document, FetchError> {
        debug!("GET {}", url);
        self.execute(url, self.client.get(url)).await
    }

    async fn submit(
        &self,
        document: &Document,
        fields: &[FormField],
        click: &ClickTarget,
    ) -> Result<Document, FetchError> {
        let submission = form::build_submission(document, fields, click)?;
        let target = submission.action.to_string();
        debug!("{} {} ({} pairs)", submission.method, target, submission.pairs.len());

        let request = if submission.method == Method::POST {
            self.client.post(submission.action).form(&submission.pairs)
        } else {
            self.client.get(submission.action).query(&submission.pairs)
        };
        self.execute(&target, request).await
    }
}
