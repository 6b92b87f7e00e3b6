use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling bucket for stored baselines and cadence markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketCategory {
    /// 5-minute baseline, refreshed on every active tick
    FiveMinutes,
    /// 10-minute baseline
    TenMinutes,
    /// 15-minute baseline
    FifteenMinutes,
    /// 30-minute baseline
    ThirtyMinutes,
    /// Hourly summary cadence (no stored baseline)
    Hourly,
    /// 8-hour news cadence (no stored baseline)
    NewsCadence,
}

impl BucketCategory {
    /// Categories that own a stored baseline, shortest first
    pub const STORED: [BucketCategory; 4] = [
        BucketCategory::FiveMinutes,
        BucketCategory::TenMinutes,
        BucketCategory::FifteenMinutes,
        BucketCategory::ThirtyMinutes,
    ];

    /// Label used as the store key and in messages ("5m", "30m", ...)
    pub fn label(&self) -> &'static str {
        match self {
            BucketCategory::FiveMinutes => "5m",
            BucketCategory::TenMinutes => "10m",
            BucketCategory::FifteenMinutes => "15m",
            BucketCategory::ThirtyMinutes => "30m",
            BucketCategory::Hourly => "1h",
            BucketCategory::NewsCadence => "8h",
        }
    }

    /// Whether this category keeps a baseline snapshot in the store
    pub fn has_baseline(&self) -> bool {
        Self::STORED.contains(self)
    }

    /// Parse from label (case-insensitive)
    pub fn from_label(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "5m" => Ok(BucketCategory::FiveMinutes),
            "10m" => Ok(BucketCategory::TenMinutes),
            "15m" => Ok(BucketCategory::FifteenMinutes),
            "30m" => Ok(BucketCategory::ThirtyMinutes),
            "1h" => Ok(BucketCategory::Hourly),
            "8h" => Ok(BucketCategory::NewsCadence),
            _ => Err(format!(
                "Invalid bucket category: {}. Valid options: 5m, 10m, 15m, 30m, 1h, 8h",
                s
            )),
        }
    }
}

impl fmt::Display for BucketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Default for BucketCategory {
    fn default() -> Self {
        BucketCategory::FiveMinutes
    }
}
