use crate::models::BucketCategory;

/// Threshold crossing found by the change detector
///
/// Lives only long enough to be formatted and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub symbol: String,
    pub name: String,
    pub category: BucketCategory,
    pub baseline_price: f64,
    pub current_price: f64,

    /// Current price in the secondary currency, when a rate was available
    pub secondary_price: Option<f64>,

    /// Percent change against the baseline
    pub interval_change: f64,

    pub change_1h: f64,
    pub change_24h: f64,
    pub last_updated_label: String,
}

impl AlertEvent {
    pub fn is_rise(&self) -> bool {
        self.interval_change >= 0.0
    }
}
