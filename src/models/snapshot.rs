use crate::error::{AppError, Result};
use crate::models::BucketCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored baseline for one bucket category
///
/// Superseded, never merged: each write replaces the previous record for the
/// same category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub category: BucketCategory,

    /// Watchlist at write time; `prices[i]` belongs to `symbols[i]`
    pub symbols: Vec<String>,

    /// Prices in the quote currency, 0.0 for coins missing from the listing
    pub prices: Vec<f64>,

    /// Newest provider timestamp among the sampled coins
    pub last_data_at: Option<DateTime<Utc>>,

    /// Wall-clock time the snapshot was taken
    pub observed_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Build a snapshot, rejecting vectors that do not match the symbol list
    pub fn new(
        category: BucketCategory,
        symbols: Vec<String>,
        prices: Vec<f64>,
        last_data_at: Option<DateTime<Utc>>,
        observed_at: DateTime<Utc>,
    ) -> Result<Self> {
        let snapshot = Self {
            category,
            symbols,
            prices,
            last_data_at,
            observed_at,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the one-price-per-symbol invariant
    pub fn validate(&self) -> Result<()> {
        if self.prices.len() != self.symbols.len() {
            return Err(AppError::Integrity(format!(
                "snapshot {} has {} prices for {} symbols",
                self.category,
                self.prices.len(),
                self.symbols.len()
            )));
        }
        Ok(())
    }

    /// Check that this baseline lines up with the configured watchlist
    pub fn ensure_matches(&self, watchlist: &[String]) -> Result<()> {
        self.validate()?;
        if self.symbols.as_slice() != watchlist {
            return Err(AppError::Integrity(format!(
                "baseline {} was written for [{}], watchlist is [{}]",
                self.category,
                self.symbols.join(","),
                watchlist.join(",")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let result = PriceSnapshot::new(
            BucketCategory::FiveMinutes,
            symbols(&["BTC", "ETH"]),
            vec![1.0],
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(AppError::Integrity(_))));
    }

    #[test]
    fn test_ensure_matches_detects_changed_watchlist() {
        let snapshot = PriceSnapshot::new(
            BucketCategory::FiveMinutes,
            symbols(&["BTC", "ETH"]),
            vec![1.0, 2.0],
            None,
            Utc::now(),
        )
        .unwrap();

        assert!(snapshot.ensure_matches(&symbols(&["BTC", "ETH"])).is_ok());
        assert!(snapshot.ensure_matches(&symbols(&["ETH", "BTC"])).is_err());
        assert!(snapshot.ensure_matches(&symbols(&["BTC", "ETH", "SOL"])).is_err());
    }
}
