//! Telegram Markdown rendering for alerts, summaries and news digests
//!
//! Every message is rendered to a complete `String` before it is handed to
//! the notifier, so a channel never receives a partially built alert.

use crate::constants::{CURRENCY_PREFIXES, LOCAL_TIME_FORMAT};
use crate::models::{AlertEvent, CoinInfo, NewsArticle, NewsDigest};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Currency codes and conversion used when rendering prices
#[derive(Debug, Clone, PartialEq)]
pub struct PriceDisplay {
    pub quote_currency: String,
    pub secondary_currency: String,
    /// Quote units per secondary unit, when known
    pub rate: Option<f64>,
}

impl PriceDisplay {
    pub fn new(quote_currency: &str, secondary_currency: &str, rate: Option<f64>) -> Self {
        Self {
            quote_currency: quote_currency.to_string(),
            secondary_currency: secondary_currency.to_string(),
            rate,
        }
    }

    /// Convert a quote-currency amount into the secondary currency
    pub fn to_secondary(&self, amount: f64) -> Option<f64> {
        self.rate
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .map(|rate| amount / rate)
    }
}

pub fn format_alert(alert: &AlertEvent, display: &PriceDisplay) -> String {
    let mut message = format!(
        "🚨 *{} ({}) Alert!*\n\n",
        escape_markdown(&alert.name),
        escape_markdown(&alert.symbol)
    );
    message.push_str(&format!(
        "💰 *Current Price:* {}\n",
        format_price(alert.current_price, &display.quote_currency)
    ));
    if let Some(secondary) = alert.secondary_price {
        message.push_str(&format!(
            "💰 *Current Price:* {}\n",
            format_price(secondary, &display.secondary_currency)
        ));
    }
    message.push_str(&format!(
        "\n🔄 *Interval Change ({}):* {}\n\n",
        alert.category,
        format_signed_percent(alert.interval_change)
    ));
    message.push_str(&format!(
        "{} *1h Change:* {}\n",
        trend_emoji(alert.change_1h),
        format_signed_percent(alert.change_1h)
    ));
    message.push_str(&format!(
        "{} *24h Change:* {}\n",
        trend_emoji(alert.change_24h),
        format_signed_percent(alert.change_24h)
    ));
    message.push_str(&format!("🕒 *Last Updated:* {}\n", alert.last_updated_label));
    message
}

pub fn format_summary<'a, I>(coins: I, display: &PriceDisplay) -> String
where
    I: IntoIterator<Item = &'a CoinInfo>,
{
    let mut lines = vec!["🕒 *Hourly Coin Summary*\n".to_string()];

    for coin in coins {
        let mut block = format!(
            "*{} ({})*\n💰 Price: {}\n",
            escape_markdown(&coin.name),
            escape_markdown(&coin.symbol),
            format_price(coin.price, &display.quote_currency)
        );
        if let Some(secondary) = display.to_secondary(coin.price) {
            block.push_str(&format!(
                "💰 Price: {}\n",
                format_price(secondary, &display.secondary_currency)
            ));
        }
        block.push_str(&format!(
            "{} 1h Change: {}\n{} 24h Change: {}\n",
            trend_emoji(coin.percent_change_1h),
            format_signed_percent(coin.percent_change_1h),
            trend_emoji(coin.percent_change_24h),
            format_signed_percent(coin.percent_change_24h)
        ));
        block.push_str(&format!(
            "🏦 Market Cap: {} {}\n📊 Volume 24h: {} {}\n",
            currency_prefix(&display.quote_currency),
            format_compact(coin.market_cap),
            currency_prefix(&display.quote_currency),
            format_compact(coin.volume_24h)
        ));
        block.push_str(&format!("🕓 Updated: {}\n", coin.last_updated_label));
        lines.push(block);
    }

    if lines.len() == 1 {
        lines.push("_No watchlist coins in the latest listing._\n".to_string());
    }

    lines.join("\n")
}

pub fn format_news_digest(digest: &NewsDigest) -> String {
    let mut message = String::from("📰 *Latest Crypto News Roundup*\n\n");

    if digest.is_empty() {
        message.push_str("_No fresh headlines for the watchlist._\n");
        return message;
    }

    if !digest.cryptopanic.is_empty() {
        message.push_str("🔥 _From CryptoPanic:_\n");
        for article in &digest.cryptopanic {
            push_headline(&mut message, article);
            if let Some(description) = article.description.as_deref().filter(|d| !d.trim().is_empty()) {
                message.push_str(&format!("`{}`\n", description.replace('`', "'")));
            }
            message.push_str(&format!(
                "_🗞 {} — 🕒 {}_\n\n",
                escape_markdown(article.source.as_deref().unwrap_or("")),
                article.published_label()
            ));
        }
    }

    if !digest.coinmarketcap.is_empty() {
        message.push_str("🗞 _From CoinMarketCap:_\n");
        for article in &digest.coinmarketcap {
            push_headline(&mut message, article);
            message.push_str(&format!("_🕒 {}_\n\n", article.published_label()));
        }
    }

    message
}

fn push_headline(message: &mut String, article: &NewsArticle) {
    let title = escape_markdown(&article.title);
    match article.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => message.push_str(&format!("• [{}]({})\n", title, url)),
        None => message.push_str(&format!("• {}\n", title)),
    }
}

/// `19-10-2026 14:30:00 WIB`
pub fn format_local_time(instant: &DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format(LOCAL_TIME_FORMAT).to_string()
}

/// Compact magnitude with K/M/B/T/Q suffix, e.g. `1.23B`
pub fn format_compact(number: f64) -> String {
    const SCALES: [(f64, &str); 5] = [
        (1e15, "Q"),
        (1e12, "T"),
        (1e9, "B"),
        (1e6, "M"),
        (1e3, "K"),
    ];

    let abs_number = number.abs();
    for (scale, suffix) in SCALES {
        if abs_number >= scale {
            return format!("{:.2}{}", number / scale, suffix);
        }
    }
    format!("{:.0}", number)
}

/// Thousands-separated number, e.g. `1,234,567.8900`
pub fn format_grouped(number: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, number.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.insert(0, ',');
        }
        grouped.insert(0, c);
    }

    if number.is_sign_negative() && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        grouped.insert(0, '-');
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

/// `Rp 1,234.5678`
pub fn format_price(amount: f64, currency: &str) -> String {
    format!("{} {}", currency_prefix(currency), format_grouped(amount, 4))
}

/// `+1.23%`
pub fn format_signed_percent(value: f64) -> String {
    format!("{:+.2}%", value)
}

pub fn trend_emoji(change: f64) -> &'static str {
    if change >= 0.0 {
        "📈"
    } else {
        "📉"
    }
}

fn currency_prefix(currency: &str) -> &str {
    CURRENCY_PREFIXES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(currency))
        .map(|(_, prefix)| *prefix)
        .unwrap_or(currency)
}

/// Escape Telegram legacy Markdown control characters in free text
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BucketCategory;
    use chrono::TimeZone;

    fn btc() -> CoinInfo {
        CoinInfo {
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            price: 1_750_000_000.5,
            percent_change_1h: 0.213,
            percent_change_24h: -1.5,
            market_cap: 3.4e16,
            volume_24h: 5.1e14,
            last_updated: Utc::now(),
            last_updated_label: "19-10-2026 14:29:00 WIB".to_string(),
        }
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(3.4e16), "34.00Q");
        assert_eq!(format_compact(1.234e12), "1.23T");
        assert_eq!(format_compact(-2.5e9), "-2.50B");
        assert_eq!(format_compact(1_500_000.0), "1.50M");
        assert_eq!(format_compact(1_000.0), "1.00K");
        assert_eq!(format_compact(999.4), "999");
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(1_234_567.891, 4), "1,234,567.8910");
        assert_eq!(format_grouped(999.0, 0), "999");
        assert_eq!(format_grouped(-1234.5, 2), "-1,234.50");
        assert_eq!(format_grouped(-0.00001, 2), "0.00");
    }

    #[test]
    fn test_format_local_time() {
        let instant = Utc.with_ymd_and_hms(2026, 10, 19, 7, 30, 0).unwrap();
        assert_eq!(
            format_local_time(&instant, &chrono_tz::Asia::Jakarta),
            "19-10-2026 14:30:00 WIB"
        );
    }

    #[test]
    fn test_price_display_conversion() {
        let display = PriceDisplay::new("IDR", "USD", Some(16_000.0));
        assert_eq!(display.to_secondary(32_000.0), Some(2.0));
        assert_eq!(PriceDisplay::new("IDR", "USD", Some(0.0)).to_secondary(1.0), None);
        assert_eq!(PriceDisplay::new("IDR", "USD", None).to_secondary(1.0), None);
    }

    #[test]
    fn test_alert_message() {
        let alert = AlertEvent {
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            category: BucketCategory::FiveMinutes,
            baseline_price: 100_000_000.0,
            current_price: 106_000_000.0,
            secondary_price: Some(6_625.0),
            interval_change: 6.0,
            change_1h: 0.4,
            change_24h: -1.2,
            last_updated_label: "19-10-2026 14:30:00 WIB".to_string(),
        };
        let display = PriceDisplay::new("IDR", "USD", Some(16_000.0));
        let message = format_alert(&alert, &display);

        assert!(message.starts_with("🚨 *Bitcoin (BTC) Alert!*"));
        assert!(message.contains("*Current Price:* Rp 106,000,000.0000"));
        assert!(message.contains("*Current Price:* $ 6,625.0000"));
        assert!(message.contains("*Interval Change (5m):* +6.00%"));
        assert!(message.contains("📈 *1h Change:* +0.40%"));
        assert!(message.contains("📉 *24h Change:* -1.20%"));
        assert!(message.contains("19-10-2026 14:30:00 WIB"));
    }

    #[test]
    fn test_alert_without_secondary_price() {
        let alert = AlertEvent {
            symbol: "ETH".to_string(),
            name: "Ethereum".to_string(),
            category: BucketCategory::FiveMinutes,
            baseline_price: 100.0,
            current_price: 90.0,
            secondary_price: None,
            interval_change: -10.0,
            change_1h: 0.0,
            change_24h: 0.0,
            last_updated_label: String::new(),
        };
        let message = format_alert(&alert, &PriceDisplay::new("IDR", "USD", None));
        assert_eq!(message.matches("*Current Price:*").count(), 1);
        assert!(message.contains("-10.00%"));
    }

    #[test]
    fn test_summary_message() {
        let display = PriceDisplay::new("IDR", "USD", Some(16_000.0));
        let coins = vec![btc()];
        let message = format_summary(&coins, &display);

        assert!(message.starts_with("🕒 *Hourly Coin Summary*"));
        assert!(message.contains("*Bitcoin (BTC)*"));
        assert!(message.contains("Price: Rp 1,750,000,000.5000"));
        assert!(message.contains("Price: $ 109,375.0000"));
        assert!(message.contains("📈 1h Change: +0.21%"));
        assert!(message.contains("📉 24h Change: -1.50%"));
        assert!(message.contains("Market Cap: Rp 34.00Q"));
        assert!(message.contains("Volume 24h: Rp 510.00T"));
    }

    #[test]
    fn test_summary_with_no_coins() {
        let message = format_summary(&Vec::<CoinInfo>::new(), &PriceDisplay::new("IDR", "USD", None));
        assert!(message.contains("No watchlist coins"));
    }

    #[test]
    fn test_news_digest() {
        let digest = NewsDigest {
            cryptopanic: vec![
                NewsArticle {
                    title: "BTC_ETF approved".to_string(),
                    url: Some("https://example.test/a".to_string()),
                    source: Some("CoinDesk".to_string()),
                    published_at: Some("2026-10-19T08:00:00Z".to_string()),
                    description: Some("Big `news`".to_string()),
                },
                NewsArticle {
                    title: "No link".to_string(),
                    url: None,
                    source: None,
                    published_at: None,
                    description: None,
                },
            ],
            coinmarketcap: vec![NewsArticle {
                title: "ETH upgrade".to_string(),
                url: Some("https://example.test/b".to_string()),
                source: None,
                published_at: Some("2026-10-19T07:00:00Z".to_string()),
                description: None,
            }],
        };
        let message = format_news_digest(&digest);

        assert!(message.starts_with("📰 *Latest Crypto News Roundup*"));
        assert!(message.contains("• [BTC\\_ETF approved](https://example.test/a)"));
        assert!(message.contains("`Big 'news'`"));
        assert!(message.contains("_🗞 CoinDesk — 🕒 2026-10-19 08:00_"));
        assert!(message.contains("• No link\n"));
        assert!(message.contains("🗞 _From CoinMarketCap:_"));
        assert!(message.contains("_🕒 2026-10-19 07:00_"));
    }

    #[test]
    fn test_empty_news_digest() {
        let message = format_news_digest(&NewsDigest::default());
        assert!(message.contains("No fresh headlines"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c`d[e]"), "a\\_b\\*c\\`d\\[e]");
    }
}
