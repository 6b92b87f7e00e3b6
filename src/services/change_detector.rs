//! Interval change detection against a stored baseline
//!
//! Compares the current watchlist quotes with the baseline of one bucket
//! category and reports every position whose absolute percent change reaches
//! the configured threshold (inclusive).
//!
//! Positions are skipped, not failed, when:
//! - the coin is missing from the current listing
//! - the baseline price is zero or not finite ("no valid history")
//!
//! A missing baseline for the whole category is reported as
//! [`Detection::NoBaseline`]; a baseline that does not line up with the
//! watchlist is an integrity error.

use crate::error::Result;
use crate::models::{AlertEvent, BucketCategory, PriceSnapshot, WatchlistQuotes};

/// Outcome of one detection pass
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// No baseline stored yet for the category
    NoBaseline,
    /// Baseline found and compared
    Compared {
        alerts: Vec<AlertEvent>,
        compared: usize,
        skipped: usize,
    },
}

impl Detection {
    pub fn alerts(&self) -> &[AlertEvent] {
        match self {
            Detection::NoBaseline => &[],
            Detection::Compared { alerts, .. } => alerts,
        }
    }

    pub fn into_alerts(self) -> Vec<AlertEvent> {
        match self {
            Detection::NoBaseline => Vec::new(),
            Detection::Compared { alerts, .. } => alerts,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    threshold: f64,
}

impl ChangeDetector {
    /// `threshold` is a percentage, e.g. `5.0` for 5%
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn detect(
        &self,
        category: BucketCategory,
        baseline: Option<&PriceSnapshot>,
        quotes: &WatchlistQuotes,
    ) -> Result<Detection> {
        let Some(baseline) = baseline else {
            return Ok(Detection::NoBaseline);
        };
        baseline.ensure_matches(&quotes.symbols)?;

        let mut alerts = Vec::new();
        let mut compared = 0;
        let mut skipped = 0;

        for (slot, &past_price) in quotes.slots.iter().zip(&baseline.prices) {
            let Some(coin) = slot else {
                skipped += 1;
                continue;
            };
            let Some(change) = percent_change(past_price, coin.price) else {
                skipped += 1;
                continue;
            };
            compared += 1;

            if change.abs() >= self.threshold {
                alerts.push(AlertEvent {
                    symbol: coin.symbol.clone(),
                    name: coin.name.clone(),
                    category,
                    baseline_price: past_price,
                    current_price: coin.price,
                    secondary_price: None,
                    interval_change: change,
                    change_1h: coin.percent_change_1h,
                    change_24h: coin.percent_change_24h,
                    last_updated_label: coin.last_updated_label.clone(),
                });
            }
        }

        Ok(Detection::Compared {
            alerts,
            compared,
            skipped,
        })
    }
}

/// Percent change from `baseline` to `current`
///
/// `None` when the baseline carries no usable history (zero, negative or not
/// finite), so a division by zero never leaves this function.
pub fn percent_change(baseline: f64, current: f64) -> Option<f64> {
    if !baseline.is_finite() || baseline <= 0.0 || !current.is_finite() {
        return None;
    }
    Some((current - baseline) / baseline * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoinInfo;
    use crate::error::AppError;
    use chrono::Utc;

    fn coin(symbol: &str, price: f64) -> CoinInfo {
        CoinInfo {
            symbol: symbol.to_string(),
            name: format!("{} coin", symbol),
            price,
            percent_change_1h: 0.4,
            percent_change_24h: -1.2,
            market_cap: 1.0e12,
            volume_24h: 1.0e9,
            last_updated: Utc::now(),
            last_updated_label: "19-10-2026 14:30:00 WIB".to_string(),
        }
    }

    fn quotes(entries: &[(&str, Option<f64>)]) -> WatchlistQuotes {
        WatchlistQuotes {
            symbols: entries.iter().map(|(s, _)| s.to_string()).collect(),
            slots: entries
                .iter()
                .map(|(s, price)| price.map(|p| coin(s, p)))
                .collect(),
        }
    }

    fn baseline(entries: &[(&str, f64)]) -> PriceSnapshot {
        PriceSnapshot::new(
            BucketCategory::FiveMinutes,
            entries.iter().map(|(s, _)| s.to_string()).collect(),
            entries.iter().map(|(_, p)| *p).collect(),
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_btc_eth_scenario() {
        let detector = ChangeDetector::new(5.0);
        let base = baseline(&[("BTC", 100_000_000.0), ("ETH", 5_000_000.0)]);
        let current = quotes(&[("BTC", Some(106_000_000.0)), ("ETH", Some(5_100_000.0))]);

        let detection = detector
            .detect(BucketCategory::FiveMinutes, Some(&base), &current)
            .unwrap();
        let alerts = detection.alerts();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "BTC");
        assert!((alerts[0].interval_change - 6.0).abs() < 1e-9);
        assert_eq!(alerts[0].baseline_price, 100_000_000.0);
        assert_eq!(alerts[0].current_price, 106_000_000.0);
        assert_eq!(alerts[0].change_1h, 0.4);
        assert_eq!(alerts[0].change_24h, -1.2);
        assert_eq!(alerts[0].category, BucketCategory::FiveMinutes);
    }

    #[test]
    fn test_missing_baseline_skips_everything() {
        let detector = ChangeDetector::new(1.0);
        let current = quotes(&[("BTC", Some(1.0))]);
        let detection = detector
            .detect(BucketCategory::FiveMinutes, None, &current)
            .unwrap();
        assert_eq!(detection, Detection::NoBaseline);
        assert!(detection.alerts().is_empty());
    }

    #[test]
    fn test_zero_baseline_never_alerts() {
        let detector = ChangeDetector::new(0.0001);
        let base = baseline(&[("BTC", 0.0), ("ETH", 100.0)]);
        let current = quotes(&[("BTC", Some(1_000_000.0)), ("ETH", Some(100.0))]);

        match detector
            .detect(BucketCategory::FiveMinutes, Some(&base), &current)
            .unwrap()
        {
            Detection::Compared {
                alerts,
                compared,
                skipped,
            } => {
                assert!(alerts.is_empty());
                assert_eq!(compared, 1);
                assert_eq!(skipped, 1);
            }
            other => panic!("unexpected detection {:?}", other),
        }
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let detector = ChangeDetector::new(25.0);
        let base = baseline(&[("BTC", 100.0), ("ETH", 100.0)]);

        let at_threshold = quotes(&[("BTC", Some(125.0)), ("ETH", Some(75.0))]);
        let alerts = detector
            .detect(BucketCategory::FiveMinutes, Some(&base), &at_threshold)
            .unwrap()
            .into_alerts();
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].is_rise());
        assert!(!alerts[1].is_rise());

        let below = quotes(&[("BTC", Some(124.999_999)), ("ETH", Some(75.000_001))]);
        let alerts = detector
            .detect(BucketCategory::FiveMinutes, Some(&base), &below)
            .unwrap()
            .into_alerts();
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_missing_coins_are_skipped_without_shifting() {
        let detector = ChangeDetector::new(5.0);
        let base = baseline(&[
            ("BTC", 100.0),
            ("ETH", 100.0),
            ("SOL", 100.0),
            ("XRP", 100.0),
            ("ADA", 100.0),
            ("DOGE", 100.0),
        ]);
        let current = quotes(&[
            ("BTC", Some(100.0)),
            ("ETH", None),
            ("SOL", Some(110.0)),
            ("XRP", Some(100.0)),
            ("ADA", None),
            ("DOGE", Some(90.0)),
        ]);

        match detector
            .detect(BucketCategory::FiveMinutes, Some(&base), &current)
            .unwrap()
        {
            Detection::Compared {
                alerts,
                compared,
                skipped,
            } => {
                let symbols: Vec<_> = alerts.iter().map(|a| a.symbol.as_str()).collect();
                assert_eq!(symbols, vec!["SOL", "DOGE"]);
                assert_eq!(compared, 4);
                assert_eq!(skipped, 2);
            }
            other => panic!("unexpected detection {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_baseline_is_integrity_error() {
        let detector = ChangeDetector::new(5.0);
        let base = baseline(&[("BTC", 100.0)]);
        let current = quotes(&[("BTC", Some(100.0)), ("ETH", Some(100.0))]);

        let result = detector.detect(BucketCategory::FiveMinutes, Some(&base), &current);
        assert!(matches!(result, Err(AppError::Integrity(_))));
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(0.0, 10.0), None);
        assert_eq!(percent_change(-1.0, 10.0), None);
        assert_eq!(percent_change(f64::NAN, 10.0), None);
        assert_eq!(percent_change(4.0, 5.0), Some(25.0));
        assert_eq!(percent_change(4.0, 3.0), Some(-25.0));
    }
}
