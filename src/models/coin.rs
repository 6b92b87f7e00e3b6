use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-coin view derived from one market listing, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub symbol: String,
    pub name: String,

    /// Price in the quote currency
    pub price: f64,

    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub market_cap: f64,
    pub volume_24h: f64,

    /// Provider timestamp of the quote
    pub last_updated: DateTime<Utc>,

    /// `last_updated` rendered in the monitor timezone
    pub last_updated_label: String,
}

/// Watchlist-aligned quotes for one tick
///
/// Slot *i* belongs to the *i*-th watchlist symbol. Coins missing from the
/// listing leave an empty slot so positional indexing never shifts.
#[derive(Debug, Clone, Default)]
pub struct WatchlistQuotes {
    pub symbols: Vec<String>,
    pub slots: Vec<Option<CoinInfo>>,
}

impl WatchlistQuotes {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Coins present in the listing, in watchlist order
    pub fn present(&self) -> impl Iterator<Item = &CoinInfo> {
        self.slots.iter().flatten()
    }

    pub fn present_count(&self) -> usize {
        self.present().count()
    }

    /// Watchlist symbols with no quote this tick
    pub fn missing_symbols(&self) -> Vec<&str> {
        self.symbols
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(symbol, _)| symbol.as_str())
            .collect()
    }

    /// Full-length price vector; missing coins are written as 0.0
    pub fn price_vector(&self) -> Vec<f64> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().map(|coin| coin.price).unwrap_or(0.0))
            .collect()
    }

    /// Most recent provider timestamp among present coins
    pub fn latest_update(&self) -> Option<&CoinInfo> {
        self.present().max_by_key(|coin| coin.last_updated)
    }
}
