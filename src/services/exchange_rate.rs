use crate::error::{AppError, Result};
use crate::utils::{build_http_client, send_json};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Currency conversion lookup
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Units of `target` per one unit of `base` (e.g. IDR per USD)
    async fn fetch_rate(&self, base: &str, target: &str) -> Result<f64>;
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// open.er-api.com style client: `GET {base_url}/latest/{BASE}`
pub struct ExchangeRateClient {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn fetch_rate(&self, base: &str, target: &str) -> Result<f64> {
        let url = format!("{}/latest/{}", self.base_url, base.to_uppercase());
        let response: RatesResponse = send_json(self.client.get(&url), "Exchange rate").await?;
        let rate = extract_rate(response, target)?;
        debug!(base = base, target = target, rate = rate, "Fetched exchange rate");
        Ok(rate)
    }
}

fn extract_rate(response: RatesResponse, target: &str) -> Result<f64> {
    if let Some(result) = response.result.as_deref() {
        if result != "success" {
            return Err(AppError::Provider(format!(
                "Exchange rate lookup returned result '{}'",
                result
            )));
        }
    }

    let rate = response
        .rates
        .get(&target.to_uppercase())
        .copied()
        .ok_or_else(|| AppError::Parse(format!("Exchange rate response has no {} rate", target)))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(AppError::Parse(format!("Invalid {} rate: {}", target, rate)));
    }
    Ok(rate)
}
