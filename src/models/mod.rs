mod alert;
mod bucket;
mod coin;
mod monitor_config;
mod news;
mod snapshot;

pub use alert::AlertEvent;
pub use bucket::BucketCategory;
pub use coin::{CoinInfo, WatchlistQuotes};
pub use monitor_config::{parse_watchlist, MonitorConfig};
pub use news::{NewsArticle, NewsDigest};
pub use snapshot::PriceSnapshot;
