use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, error};
use url::Url;

use super::read_json;
use crate::{error::AppError, models::country::Country};

pub const MAX_SUGGESTIONS: usize = 10;

/// Country lookup backed by a one-shot download of the full country list.
#[derive(Clone)]
pub struct CountryService {
    client: Client,
    url: Arc<Url>,
    cache: Arc<RwLock<Option<Vec<Country>>>>,
}

impl CountryService {
    pub fn new(client: Client, url: Url) -> Self {
        Self {
            client,
            url: Arc::new(url),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// A service whose list is already known; nothing is ever downloaded.
    pub fn preloaded(client: Client, url: Url, countries: Vec<Country>) -> Self {
        Self {
            client,
            url: Arc::new(url),
            cache: Arc::new(RwLock::new(Some(countries))),
        }
    }

    /// The full list. A failed download yields an empty list and is retried
    /// on the next call.
    pub async fn load_countries(&self) -> Vec<Country> {
        if let Some(countries) = self.cache.read().await.as_ref() {
            return countries.clone();
        }

        let mut cache = self.cache.write().await;
        if let Some(countries) = cache.as_ref() {
            return countries.clone();
        }

        match self.fetch().await {
            Ok(countries) => {
                debug!("loaded {} countries", countries.len());
                *cache = Some(countries.clone());
                countries
            }
            Err(err) => {
                error!("failed to load countries: {err}");
                Vec::new()
            }
        }
    }

    pub async fn search(&self, term: &str) -> Vec<Country> {
        if term.trim().is_empty() {
            return Vec::new();
        }
        let countries = self.load_countries().await;
        filter_countries(&countries, term)
    }

    async fn fetch(&self) -> Result<Vec<Country>, AppError> {
        let response = self.client.get(self.url.as_ref().clone()).send().await?;
        read_json(response).await
    }
}

/// Case-insensitive prefix match on common or official name.
pub fn filter_countries(countries: &[Country], term: &str) -> Vec<Country> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }

    countries
        .iter()
        .filter(|country| country.matches_prefix(&term))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::country::{CountryFlags, CountryName};

    fn country(common: &str, official: &str) -> Country {
        Country {
            name: CountryName {
                common: common.into(),
                official: official.into(),
            },
            flags: CountryFlags {
                png: format!("https://flags.test/{common}.png"),
                svg: format!("https://flags.test/{common}.svg"),
                alt: None,
            },
        }
    }

    fn sample() -> Vec<Country> {
        vec![
            country("Spain", "Kingdom of Spain"),
            country("Portugal", "Portuguese Republic"),
            country("Peru", "Republic of Peru"),
            country("Sweden", "Kingdom of Sweden"),
        ]
    }

    #[test]
    fn blank_terms_find_nothing() {
        assert!(filter_countries(&sample(), "").is_empty());
        assert!(filter_countries(&sample(), "   ").is_empty());
    }

    #[test]
    fn matches_common_or_official_prefix_ignoring_case() {
        let names: Vec<_> = filter_countries(&sample(), " pE ")
            .into_iter()
            .map(|c| c.name.common)
            .collect();
        assert_eq!(names, vec!["Peru"]);

        let names: Vec<_> = filter_countries(&sample(), "kingdom")
            .into_iter()
            .map(|c| c.name.common)
            .collect();
        assert_eq!(names, vec!["Spain", "Sweden"]);
    }

    #[test]
    fn results_are_capped() {
        let many: Vec<_> = (0..25)
            .map(|n| country(&format!("Land {n}"), &format!("Republic of Land {n}")))
            .collect();
        assert_eq!(filter_countries(&many, "land").len(), MAX_SUGGESTIONS);
    }

    #[tokio::test]
    async fn preloaded_service_searches_without_network() {
        let service = CountryService::preloaded(
            Client::new(),
            "http://127.0.0.1:9/countries".parse().unwrap(),
            sample(),
        );
        let found = service.search("port").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.official, "Portuguese Republic");
    }
}
