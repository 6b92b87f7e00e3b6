pub mod run;
pub mod status;
pub mod summary;
pub mod tick;

use crate::error::Result;
use crate::models::MonitorConfig;
use crate::services::{
    CmcNewsClient, CoinMarketCapClient, CryptoPanicClient, ExchangeRateClient, LogNotifier,
    MemorySnapshotStore, NewsSource, Notifier, SnapshotStore, SqliteSnapshotStore,
    TelegramNotifier,
};
use crate::worker::Collaborators;
use std::sync::Arc;

/// Load configuration or exit with a readable message
fn load_config() -> MonitorConfig {
    match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Wire the production clients for a config
///
/// A dry run keeps snapshots in memory and logs messages instead of
/// posting them.
async fn build_collaborators(config: &MonitorConfig, dry_run: bool) -> Result<Collaborators> {
    let market = CoinMarketCapClient::new(
        config.cmc_api.clone(),
        config.cmc_api_key.clone(),
        config.quote_currency.clone(),
        config.listing_limit,
        config.http_timeout,
    )?;

    let mut news: Vec<Arc<dyn NewsSource>> = vec![Arc::new(CryptoPanicClient::new(
        config.cp_api.clone(),
        config.cp_api_key.clone(),
        config.http_timeout,
    )?)];
    if config.news_include_cmc {
        news.push(Arc::new(CmcNewsClient::new(
            config.cmc_api.clone(),
            config.cmc_api_key.clone(),
            config.news_keywords.clone(),
            config.http_timeout,
        )?));
    }

    let rates = ExchangeRateClient::new(config.rate_api.clone(), config.http_timeout)?;

    let (store, notifier): (Arc<dyn SnapshotStore>, Arc<dyn Notifier>) = if dry_run {
        (Arc::new(MemorySnapshotStore::new()), Arc::new(LogNotifier))
    } else {
        (
            Arc::new(SqliteSnapshotStore::new(config.database_path.clone()).await?),
            Arc::new(TelegramNotifier::new(
                config.telegram_token.clone(),
                config.chat_id,
                config.http_timeout,
            )?),
        )
    };

    Ok(Collaborators {
        market: Arc::new(market),
        news,
        rates: Arc::new(rates),
        store,
        notifier,
    })
}
