use futures::stream::{self, StreamExt};
use tracing::{debug, info};
use url::Url;

use crate::error::HubLoadError;
use crate::fetcher::{Document, Fetcher};
use crate::links::all_anchors;
use crate::search::{search_city, ResultEntry, SearchRequest};
use crate::stats::RunStats;

/// Hub anchors that lead somewhere other than a city site.
pub const RESERVED_LINK_TEXTS: [&str; 3] = ["craigslist", "w", "or suggest a new one"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryResults {
    pub entries: Vec<ResultEntry>,
    pub stats: RunStats,
}

impl CountryResults {
    pub fn fragments(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(ResultEntry::fragment)
    }
}

/// City roots linked from a hub page, in document order. Reserved texts are
/// matched against the raw anchor text, untrimmed.
pub fn city_endpoints(hub: &Document) -> Vec<String> {
    let base = Url::parse(&hub.url).ok();
    all_anchors(hub)
        .into_iter()
        .filter(|a| !RESERVED_LINK_TEXTS.contains(&a.raw_text.as_str()))
        .filter_map(|a| {
            let href = a.href();
            if href.is_empty() {
                debug!("Skipping hub anchor '{}' without href", a.text);
                return None;
            }
            let absolute = base
                .as_ref()
                .and_then(|b| b.join(&href).ok())
                .map(|u| u.to_string())
                .unwrap_or(href);
            Some(absolute)
        })
        .collect()
}

/// Loads a country hub and searches every city it links to.
///
/// At most `max_concurrent_cities` searches are in flight; results are folded
/// in hub order regardless, so report content does not depend on timing.
pub async fn crawl_country(
    fetcher: &dyn Fetcher,
    hub_url: &str,
    request: &SearchRequest,
    max_concurrent_cities: usize,
) -> Result<CountryResults, HubLoadError> {
    let hub = fetcher.load(hub_url).await.map_err(|source| HubLoadError {
        hub_url: hub_url.to_string(),
        source,
    })?;

    let cities = city_endpoints(&hub);
    info!("Found {} city sites on {}", cities.len(), hub_url);

    let per_city: Vec<_> = stream::iter(cities.iter())
        .map(|city| search_city(fetcher, city, request))
        .buffered(max_concurrent_cities.max(1))
        .collect()
        .await;

    let mut results = CountryResults::default();
    for city in per_city {
        results.stats += city.stats;
        results.entries.extend(city.entries);
    }
    Ok(results)
}
