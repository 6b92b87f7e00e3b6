pub mod bucket_policy;
pub mod change_detector;
pub mod exchange_rate;
pub mod market_data;
pub mod message_format;
pub mod news;
pub mod notifier;
pub mod snapshot_store;

pub use bucket_policy::TickPlan;
pub use change_detector::{ChangeDetector, Detection};
pub use exchange_rate::{ExchangeRateClient, RateSource};
pub use market_data::{CoinMarketCapClient, MarketDataSource};
pub use news::{CmcNewsClient, CryptoPanicClient, NewsProvider, NewsSource};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use snapshot_store::{MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
