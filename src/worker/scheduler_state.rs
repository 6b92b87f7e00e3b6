//! Process-lifetime scheduler state
//!
//! Lost on restart; the worst case after a restart is one repeated news
//! digest within the same hour.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerState {
    /// Hour of day the news digest was last sent in, `None` if never
    pub last_news_hour: Option<u32>,

    /// Active ticks handled since startup
    pub iteration_count: u64,

    /// Wall-clock start of the last active tick
    pub last_tick_at: Option<DateTime<Utc>>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_news_sent(&mut self, hour: u32) {
        self.last_news_hour = Some(hour);
    }

    pub fn begin_tick(&mut self, at: DateTime<Utc>) -> u64 {
        self.iteration_count += 1;
        self.last_tick_at = Some(at);
        self.iteration_count
    }
}
