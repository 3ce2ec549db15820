use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::fetcher::{random_user_agent, ClickTarget, Document, Fetcher, FormField};

/// Headless Chrome backend, for search forms that only submit through script.
#[derive(Clone)]
pub struct ChromeFetcher {
    browser: Browser,
    timeout: Duration,
}

impl ChromeFetcher {
    pub fn launch(timeout: Duration, user_agent: Option<String>) -> Result<Self, FetchError> {
        let user_agent = user_agent.unwrap_or_else(|| random_user_agent().to_string());
        let ua_arg = format!("--user-agent={}", user_agent);

        let args = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-infobars"),
            OsStr::new(&ua_arg),
        ];

        let browser = Browser::new(LaunchOptions {
            headless: true,
            window_size: Some((1920, 1080)),
            idle_browser_timeout: timeout.max(Duration::from_secs(30)),
            args,
            ..Default::default()
        })
        .map_err(|e| FetchError::fetch("<browser>", e))?;

        info!("Headless browser launched");
        Ok(Self { browser, timeout })
    }

    fn open(&self, url: &str) -> Result<Arc<Tab>, FetchError> {
        let tab = self.browser.new_tab().map_err(|e| FetchError::fetch(url, e))?;
        tab.set_default_timeout(self.timeout);
        tab.navigate_to(url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| FetchError::fetch(url, e))?;
        Ok(tab)
    }

    fn snapshot(tab: &Tab, url: &str) -> Result<Document, FetchError> {
        let html = tab.get_content().map_err(|e| FetchError::fetch(url, e))?;
        let final_url = tab.get_url();
        debug!("Rendered {} bytes from {}", html.len(), final_url);
        Ok(Document::new(final_url, html))
    }

    fn load_blocking(&self, url: &str) -> Result<Document, FetchError> {
        let tab = self.open(url)?;
        let doc = Self::snapshot(&tab, url);
        let _ = tab.close(true);
        doc
    }

    fn submit_blocking(
        &self,
        url: &str,
        fields: &[FormField],
        click: &ClickTarget,
    ) -> Result<Document, FetchError> {
        let tab = self.open(url)?;
        let result = Self::fill_and_send(&tab, url, fields, click);
        let _ = tab.close(true);
        result
    }

    fn fill_and_send(
        tab: &Tab,
        url: &str,
        fields: &[FormField],
        click: &ClickTarget,
    ) -> Result<Document, FetchError> {
        for field in fields {
            let selector = control_selector(field.field());
            let element = tab
                .find_element(&selector)
                .map_err(|_| FetchError::selector_missing(url, field.field()))?;
            match field {
                FormField::Text { field, value } => {
                    tab.evaluate(&clear_script(field), false)
                        .map_err(|e| FetchError::fetch(url, e))?;
                    element
                        .click()
                        .and_then(|e| e.type_into(value))
                        .map_err(|e| FetchError::fetch(url, e))?;
                }
                FormField::Toggle { .. } => {
                    element.click().map_err(|e| FetchError::fetch(url, e))?;
                }
            }
        }

        let ClickTarget::Value(value) = click;
        let selector = format!("input[value='{}'], button[value='{}']", value, value);
        tab.find_element(&selector)
            .map_err(|_| FetchError::selector_missing(url, format!("[value='{}']", value)))?
            .click()
            .map_err(|e| FetchError::fetch(url, e))?;
        tab.wait_until_navigated().map_err(|e| FetchError::fetch(url, e))?;

        Self::snapshot(tab, url)
    }
}

fn control_selector(field: &str) -> String {
    format!("#{field}, [name='{field}']")
}

/// Empties a pre-filled control so typing replaces rather than appends.
fn clear_script(field: &str) -> String {
    format!("document.querySelector({:?}).value = ''", control_selector(field))
}

#[async_trait]
impl Fetcher for ChromeFetcher {
    async fn load(&self, url: &str) -> Result<Document, FetchError> {
        let this = self.clone();
        let url = url.to_string();
        let target = url.clone();
        tokio::task::spawn_blocking(move || this.load_blocking(&url))
            .await
            .map_err(|e| FetchError::fetch(target, e))?
    }

    async fn submit(
        &self,
        document: &Document,
        fields: &[FormField],
        click: &ClickTarget,
    ) -> Result<Document, FetchError> {
        let this = self.clone();
        let url = document.url.clone();
        let target = url.clone();
        let fields = fields.to_vec();
        let click = click.clone();
        tokio::task::spawn_blocking(move || this.submit_blocking(&url, &fields, &click))
            .await
            .map_err(|e| FetchError::fetch(target, e))?
    }
}
