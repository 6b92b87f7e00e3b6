use crate::constants::{ACTIVE_TICK_MINUTES, NEWS_CADENCE_HOURS};
use crate::models::BucketCategory;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// What a single wall-clock minute asks the scheduler to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub minute: u32,
    pub hour: u32,

    /// `minute % 5 == 0`; inactive ticks fetch, write and send nothing
    pub active: bool,

    /// At most one of 30m > 15m > 10m, picked by priority
    pub extra_category: Option<BucketCategory>,

    pub summary_due: bool,
    pub news_due: bool,
}

impl TickPlan {
    /// Plan for a given minute and hour
    ///
    /// `last_news_hour` is the hour the digest was last sent in (`None` if never),
    /// so one hour value produces at most one digest.
    pub fn for_time(minute: u32, hour: u32, last_news_hour: Option<u32>) -> Self {
        let active = minute % ACTIVE_TICK_MINUTES == 0;
        if !active {
            return Self {
                minute,
                hour,
                active,
                extra_category: None,
                summary_due: false,
                news_due: false,
            };
        }

        // At minute 0 only 30m is added; 10m and 15m are skipped that tick
        let extra_category = if minute % 30 == 0 {
            Some(BucketCategory::ThirtyMinutes)
        } else if minute % 15 == 0 {
            Some(BucketCategory::FifteenMinutes)
        } else if minute % 10 == 0 {
            Some(BucketCategory::TenMinutes)
        } else {
            None
        };

        let summary_due = minute == 0;
        let news_due =
            summary_due && hour % NEWS_CADENCE_HOURS == 0 && last_news_hour != Some(hour);

        Self {
            minute,
            hour,
            active,
            extra_category,
            summary_due,
            news_due,
        }
    }

    /// Plan for a local wall-clock instant
    pub fn at<T: Timelike>(now: &T, last_news_hour: Option<u32>) -> Self {
        Self::for_time(now.minute(), now.hour(), last_news_hour)
    }

    /// Baseline categories to write this tick, 5m first
    pub fn categories(&self) -> Vec<BucketCategory> {
        if !self.active {
            return Vec::new();
        }
        let mut categories = vec![BucketCategory::FiveMinutes];
        categories.extend(self.extra_category);
        categories
    }
}

/// Seconds to sleep so the next wake lands on a minute boundary
pub fn seconds_until_next_minute(second: u32) -> u64 {
    // Leap seconds report 60
    60 - u64::from(second.min(59))
}

/// Current wall-clock time in the monitor timezone
pub fn local_now(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}
