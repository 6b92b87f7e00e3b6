//! News providers for the periodic digest
//!
//! - CryptoPanic `posts` filtered by the watchlist currencies (primary)
//! - CoinMarketCap `news/latest`, filtered locally by symbol and keyword
//!   (optional second section)

use crate::constants::NEWS_ITEM_LIMIT;
use crate::error::{AppError, Result};
use crate::models::NewsArticle;
use crate::utils::{build_http_client, send_json};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsProvider {
    CryptoPanic,
    CoinMarketCap,
}

impl NewsProvider {
    pub fn name(&self) -> &'static str {
        match self {
            NewsProvider::CryptoPanic => "CryptoPanic",
            NewsProvider::CoinMarketCap => "CoinMarketCap",
        }
    }
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    fn provider(&self) -> NewsProvider;

    /// Up to five recent headlines relevant to `symbols`
    async fn fetch_news(&self, symbols: &[String]) -> Result<Vec<NewsArticle>>;
}

#[derive(Debug, Deserialize)]
struct CryptoPanicResponse {
    #[serde(default)]
    results: Vec<CryptoPanicPost>,
}

#[derive(Debug, Deserialize)]
struct CryptoPanicPost {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<CryptoPanicSource>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CryptoPanicSource {
    #[serde(default)]
    title: Option<String>,
}

impl From<CryptoPanicPost> for NewsArticle {
    fn from(post: CryptoPanicPost) -> Self {
        NewsArticle {
            title: post.title.unwrap_or_else(|| "No Title".to_string()),
            url: post.url,
            source: post.source.and_then(|s| s.title),
            published_at: post.published_at,
            description: post.description,
        }
    }
}

pub struct CryptoPanicClient {
    base_url: String,
    auth_token: String,
    client: reqwest::Client,
}

impl CryptoPanicClient {
    pub fn new(base_url: String, auth_token: String, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "Invalid CP_API: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }
        Ok(Self {
            base_url,
            auth_token,
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl NewsSource for CryptoPanicClient {
    fn provider(&self) -> NewsProvider {
        NewsProvider::CryptoPanic
    }

    async fn fetch_news(&self, symbols: &[String]) -> Result<Vec<NewsArticle>> {
        let currencies = symbols
            .iter()
            .map(|s| s.to_uppercase())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/posts/", self.base_url);

        debug!(url = %url, currencies = %currencies, "Fetching CryptoPanic news");

        let request = self.client.get(&url).query(&[
            ("auth_token", self.auth_token.as_str()),
            ("currencies", currencies.as_str()),
            ("kind", "news"),
            ("public", "true"),
        ]);

        let response: CryptoPanicResponse = send_json(request, "CryptoPanic").await?;
        let articles: Vec<NewsArticle> = response
            .results
            .into_iter()
            .take(NEWS_ITEM_LIMIT)
            .map(NewsArticle::from)
            .collect();

        info!("Fetched {} CryptoPanic articles", articles.len());
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct CmcNewsResponse {
    #[serde(default)]
    data: Vec<CmcNewsItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmcNewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<CmcNewsItem> for NewsArticle {
    fn from(item: CmcNewsItem) -> Self {
        NewsArticle {
            title: if item.title.is_empty() {
                "No Title".to_string()
            } else {
                item.title
            },
            url: item.url,
            source: Some(NewsProvider::CoinMarketCap.name().to_string()),
            published_at: item.created_at,
            description: None,
        }
    }
}

pub struct CmcNewsClient {
    base_url: String,
    api_key: String,
    keywords: Vec<String>,
    client: reqwest::Client,
}

impl CmcNewsClient {
    pub fn new(
        base_url: String,
        api_key: String,
        keywords: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key,
            keywords,
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl NewsSource for CmcNewsClient {
    fn provider(&self) -> NewsProvider {
        NewsProvider::CoinMarketCap
    }

    async fn fetch_news(&self, symbols: &[String]) -> Result<Vec<NewsArticle>> {
        let url = format!("{}/news/latest", self.base_url);
        let limit = NEWS_ITEM_LIMIT.to_string();

        let request = self
            .client
            .get(&url)
            .header("Accepts", "application/json")
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .query(&[("limit", limit.as_str())]);

        let response: CmcNewsResponse = send_json(request, "CoinMarketCap news").await?;
        let articles: Vec<NewsArticle> = filter_cmc_news(response.data, symbols, &self.keywords)
            .into_iter()
            .map(NewsArticle::from)
            .collect();

        info!("Fetched {} relevant CoinMarketCap articles", articles.len());
        Ok(articles)
    }
}

/// Keep items whose title or body mentions a symbol or keyword (case-insensitive)
pub fn filter_cmc_news(
    items: Vec<CmcNewsItem>,
    symbols: &[String],
    keywords: &[String],
) -> Vec<CmcNewsItem> {
    let needles: Vec<String> = symbols
        .iter()
        .chain(keywords)
        .map(|n| n.to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    items
        .into_iter()
        .filter(|item| {
            let title = item.title.to_lowercase();
            let body = item.body.as_deref().unwrap_or("").to_lowercase();
            needles
                .iter()
                .any(|needle| title.contains(needle) || body.contains(needle))
        })
        .collect()
}
