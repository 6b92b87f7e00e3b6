//! CoinMarketCap listings client and watchlist extraction
//!
//! Fetches the top-N listing in the quote currency with a single call and
//! aligns it to the configured watchlist:
//!
//! ```text
//! GET {base}/cryptocurrency/listings/latest?start=1&limit=100&convert=IDR
//! X-CMC_PRO_API_KEY: <key>
//! ```
//!
//! Watchlist symbols that are not in the listing become empty slots; the
//! extraction step itself never fails.

use crate::error::{AppError, Result};
use crate::models::{CoinInfo, WatchlistQuotes};
use crate::services::message_format::format_local_time;
use crate::utils::{build_http_client, send_json};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// One coin from the listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CoinListing {
    pub symbol: String,
    pub name: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub quote: HashMap<String, ListingQuote>,
}

/// Per-currency quote object
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuote {
    pub price: Option<f64>,
    pub percent_change_1h: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ListingsResponse {
    #[serde(default)]
    status: Option<ApiStatus>,
    #[serde(default)]
    data: Vec<CoinListing>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiStatus {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ApiStatus {
    pub(crate) fn into_result(self) -> Result<()> {
        if self.error_code != 0 {
            return Err(AppError::Provider(format!(
                "CoinMarketCap error {}: {}",
                self.error_code,
                self.error_message.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

/// Source of the full-market listing
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_listings(&self) -> Result<Vec<CoinListing>>;
}

/// CoinMarketCap Pro API client
pub struct CoinMarketCapClient {
    base_url: String,
    api_key: String,
    quote_currency: String,
    listing_limit: u32,
    client: reqwest::Client,
}

impl CoinMarketCapClient {
    pub fn new(
        base_url: String,
        api_key: String,
        quote_currency: String,
        listing_limit: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "Invalid CMC_API: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        info!(
            "Created CoinMarketCapClient: base_url='{}', convert={}, limit={}",
            base_url, quote_currency, listing_limit
        );

        Ok(Self {
            base_url,
            api_key,
            quote_currency,
            listing_limit,
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl MarketDataSource for CoinMarketCapClient {
    async fn fetch_listings(&self) -> Result<Vec<CoinListing>> {
        let url = format!("{}/cryptocurrency/listings/latest", self.base_url);
        let limit = self.listing_limit.to_string();

        debug!(url = %url, convert = %self.quote_currency, "Fetching listings");

        let request = self
            .client
            .get(&url)
            .header("Accepts", "application/json")
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .query(&[
                ("start", "1"),
                ("limit", limit.as_str()),
                ("convert", self.quote_currency.as_str()),
            ]);

        let response: ListingsResponse = send_json(request, "CoinMarketCap listings").await?;
        if let Some(status) = response.status {
            status.into_result()?;
        }

        info!("Fetched {} listings from CoinMarketCap", response.data.len());
        Ok(response.data)
    }
}

/// Align a listing to the watchlist
///
/// The first listing per symbol wins (listings arrive in rank order). Coins
/// without a usable quote in `quote_currency` are treated as missing.
pub fn extract_watchlist(
    listings: &[CoinListing],
    watchlist: &[String],
    quote_currency: &str,
    tz: &Tz,
) -> WatchlistQuotes {
    let slots = watchlist
        .iter()
        .map(|symbol| {
            listings
                .iter()
                .find(|listing| listing.symbol.trim().eq_ignore_ascii_case(symbol))
                .and_then(|listing| to_coin_info(listing, quote_currency, tz))
        })
        .collect();

    WatchlistQuotes {
        symbols: watchlist.to_vec(),
        slots,
    }
}

fn to_coin_info(listing: &CoinListing, quote_currency: &str, tz: &Tz) -> Option<CoinInfo> {
    let quote = listing.quote.get(quote_currency)?;
    let price = quote.price.filter(|p| p.is_finite())?;

    Some(CoinInfo {
        symbol: listing.symbol.trim().to_uppercase(),
        name: listing.name.clone(),
        price,
        percent_change_1h: quote.percent_change_1h.unwrap_or(0.0),
        percent_change_24h: quote.percent_change_24h.unwrap_or(0.0),
        market_cap: quote.market_cap.unwrap_or(0.0),
        volume_24h: quote.volume_24h.unwrap_or(0.0),
        last_updated: listing.last_updated,
        last_updated_label: format_local_time(&listing.last_updated, tz),
    })
}
