use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::BucketCategory;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, read once at startup from the environment
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Telegram bot token
    pub telegram_token: String,

    /// Destination chat for every message
    pub chat_id: i64,

    /// Market data base URL and key (CoinMarketCap)
    pub cmc_api: String,
    pub cmc_api_key: String,

    /// News base URL and key (CryptoPanic)
    pub cp_api: String,
    pub cp_api_key: String,

    /// Currency rate base URL
    pub rate_api: String,

    /// Ordered, upper-cased watchlist
    pub watchlist: Vec<String>,

    /// Alert threshold in percent (inclusive)
    pub change_threshold: f64,

    pub quote_currency: String,
    pub secondary_currency: String,
    pub timezone: Tz,
    pub database_path: PathBuf,
    pub listing_limit: u32,
    pub http_timeout: Duration,

    /// Add a CoinMarketCap news section to the digest
    pub news_include_cmc: bool,

    /// Extra keywords for CoinMarketCap news filtering
    pub news_keywords: Vec<String>,
}

impl MonitorConfig {
    /// Load from process environment (after an optional `.env` file)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| AppError::Config(format!("{} is not set", key)))
        };

        let chat_id = required("GROUP_CHAT_ID")?
            .parse::<i64>()
            .map_err(|e| AppError::Config(format!("GROUP_CHAT_ID must be an integer: {}", e)))?;

        let watchlist = parse_watchlist(&required("TARGET_COINS")?)?;

        let change_threshold = match get("CHANGES_THRESHOLD") {
            Some(raw) => raw.parse::<f64>().map_err(|e| {
                AppError::Config(format!("CHANGES_THRESHOLD must be a number: {}", e))
            })?,
            None => DEFAULT_CHANGE_THRESHOLD,
        };
        if !change_threshold.is_finite() || change_threshold <= 0.0 {
            return Err(AppError::Config(format!(
                "CHANGES_THRESHOLD must be a positive percentage, got {}",
                change_threshold
            )));
        }

        // Detection always compares against the 5m baseline
        if let Some(raw) = get("CHANGES_CATEGORY") {
            let category = BucketCategory::from_label(&raw).map_err(AppError::Config)?;
            if category != BucketCategory::FiveMinutes {
                return Err(AppError::Config(format!(
                    "CHANGES_CATEGORY only supports 5m, got {}",
                    category
                )));
            }
        }

        let timezone_name = get("MONITOR_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone_name.parse().map_err(|e| {
            AppError::Config(format!("Invalid MONITOR_TIMEZONE '{}': {}", timezone_name, e))
        })?;

        let listing_limit = match get("LISTING_LIMIT") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| AppError::Config(format!("LISTING_LIMIT must be an integer: {}", e)))?,
            None => DEFAULT_LISTING_LIMIT,
        };

        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                AppError::Config(format!("HTTP_TIMEOUT_SECS must be an integer: {}", e))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        if http_timeout_secs == 0 {
            return Err(AppError::Config(
                "HTTP_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        let news_include_cmc = get("NEWS_INCLUDE_CMC")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let news_keywords = get("NEWS_KEYWORDS")
            .map(|raw| {
                raw.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            telegram_token: required("TELEGRAM_TOKEN")?,
            chat_id,
            cmc_api: trim_base_url(get("CMC_API").unwrap_or_else(|| DEFAULT_CMC_API.to_string())),
            cmc_api_key: required("CMC_API_KEY")?,
            cp_api: trim_base_url(get("CP_API").unwrap_or_else(|| DEFAULT_CP_API.to_string())),
            cp_api_key: required("CP_API_KEY")?,
            rate_api: trim_base_url(get("RATE_API").unwrap_or_else(|| DEFAULT_RATE_API.to_string())),
            watchlist,
            change_threshold,
            quote_currency: get("QUOTE_CURRENCY")
                .unwrap_or_else(|| DEFAULT_QUOTE_CURRENCY.to_string())
                .to_uppercase(),
            secondary_currency: get("SECONDARY_CURRENCY")
                .unwrap_or_else(|| DEFAULT_SECONDARY_CURRENCY.to_string())
                .to_uppercase(),
            timezone,
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            listing_limit,
            http_timeout: Duration::from_secs(http_timeout_secs),
            news_include_cmc,
            news_keywords,
        })
    }
}

/// Split a comma-separated symbol list, normalizing case and rejecting duplicates
pub fn parse_watchlist(raw: &str) -> Result<Vec<String>> {
    let mut symbols: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let symbol = part.trim().to_uppercase();
        if symbol.is_empty() {
            continue;
        }
        if symbols.contains(&symbol) {
            return Err(AppError::Config(format!(
                "TARGET_COINS lists {} more than once",
                symbol
            )));
        }
        symbols.push(symbol);
    }

    if symbols.is_empty() {
        return Err(AppError::Config("TARGET_COINS is empty".to_string()));
    }
    Ok(symbols)
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TELEGRAM_TOKEN", "123:abc"),
            ("GROUP_CHAT_ID", "-1001234"),
            ("CMC_API_KEY", "cmc-key"),
            ("CP_API_KEY", "cp-key"),
            ("TARGET_COINS", "btc, eth,SOL"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<MonitorConfig> {
        MonitorConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.chat_id, -1001234);
        assert_eq!(config.watchlist, vec!["BTC", "ETH", "SOL"]);
        assert_eq!(config.change_threshold, DEFAULT_CHANGE_THRESHOLD);
        assert_eq!(config.quote_currency, "IDR");
        assert_eq!(config.secondary_currency, "USD");
        assert_eq!(config.timezone, chrono_tz::Asia::Jakarta);
        assert_eq!(config.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        assert_eq!(config.cmc_api, DEFAULT_CMC_API);
        assert!(!config.news_include_cmc);
    }

    #[test]
    fn test_overrides() {
        let mut env = base_env();
        env.insert("CHANGES_THRESHOLD", "2.5");
        env.insert("CHANGES_CATEGORY", "5m");
        env.insert("HTTP_TIMEOUT_SECS", "3");
        env.insert("CMC_API", "https://example.test/v1/");
        env.insert("MONITOR_TIMEZONE", "UTC");
        env.insert("NEWS_INCLUDE_CMC", "true");
        env.insert("NEWS_KEYWORDS", "etf, halving");

        let config = load(&env).unwrap();
        assert_eq!(config.change_threshold, 2.5);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.cmc_api, "https://example.test/v1");
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert!(config.news_include_cmc);
        assert_eq!(config.news_keywords, vec!["etf", "halving"]);
    }

    #[test]
    fn test_missing_required() {
        let mut env = base_env();
        env.remove("TELEGRAM_TOKEN");
        assert!(matches!(load(&env), Err(AppError::Config(_))));
    }

    #[test]
    fn test_changes_category_only_accepts_five_minutes() {
        let mut env = base_env();
        for label in ["10m", "15m", "30m", "1h", "weekly"] {
            env.insert("CHANGES_CATEGORY", label);
            assert!(matches!(load(&env), Err(AppError::Config(_))), "{}", label);
        }
        env.insert("CHANGES_CATEGORY", "5M");
        assert!(load(&env).is_ok());
    }

    #[test]
    fn test_rejects_zero_http_timeout() {
        let mut env = base_env();
        env.insert("HTTP_TIMEOUT_SECS", "0");
        assert!(matches!(load(&env), Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let mut env = base_env();
        env.insert("CHANGES_THRESHOLD", "-1");
        assert!(load(&env).is_err());
        env.insert("CHANGES_THRESHOLD", "abc");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_parse_watchlist() {
        assert_eq!(parse_watchlist(" btc ,,eth ").unwrap(), vec!["BTC", "ETH"]);
        assert!(parse_watchlist("btc,BTC").is_err());
        assert!(parse_watchlist(" , ").is_err());
    }
}
