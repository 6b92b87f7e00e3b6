use crate::constants::ACTIVE_TICK_SLEEP_SECS;
use crate::error::{AppError, Result};
use crate::models::{BucketCategory, MonitorConfig, NewsDigest, PriceSnapshot, WatchlistQuotes};
use crate::services::bucket_policy::{local_now, seconds_until_next_minute, TickPlan};
use crate::services::change_detector::{ChangeDetector, Detection};
use crate::services::exchange_rate::RateSource;
use crate::services::market_data::{extract_watchlist, MarketDataSource};
use crate::services::message_format::{self, PriceDisplay};
use crate::services::news::{NewsProvider, NewsSource};
use crate::services::notifier::Notifier;
use crate::services::snapshot_store::SnapshotStore;
use crate::worker::SchedulerState;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// External collaborators injected into the worker
#[derive(Clone)]
pub struct Collaborators {
    pub market: Arc<dyn MarketDataSource>,
    pub news: Vec<Arc<dyn NewsSource>>,
    pub rates: Arc<dyn RateSource>,
    pub store: Arc<dyn SnapshotStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// Why an invoked tick did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Minute is not a multiple of five
    Inactive,
    /// Market listing could not be fetched
    FetchFailed,
}

/// What one tick did, for logging and tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub skipped: Option<SkipReason>,
    pub categories_written: Vec<BucketCategory>,
    pub alerts_sent: usize,
    pub summary_sent: bool,
    pub news_sent: bool,
    /// Steps that failed and were skipped
    pub failed_steps: usize,
}

impl TickReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

/// Baseline the every-5-minutes detector compares against
pub const DETECTION_CATEGORY: BucketCategory = BucketCategory::FiveMinutes;

/// Lazily fetched conversion rate, at most one lookup per tick
enum RateCache {
    Unfetched,
    Fetched(Option<f64>),
}

/// Sampling and change-detection scheduler
#[derive(Clone)]
pub struct MonitorWorker {
    watchlist: Vec<String>,
    quote_currency: String,
    secondary_currency: String,
    timezone: Tz,
    detector: ChangeDetector,
    collaborators: Collaborators,
    state: SchedulerState,
}

impl MonitorWorker {
    pub fn new(config: &MonitorConfig, collaborators: Collaborators) -> Self {
        Self {
            watchlist: config.watchlist.clone(),
            quote_currency: config.quote_currency.clone(),
            secondary_currency: config.secondary_currency.clone(),
            timezone: config.timezone,
            detector: ChangeDetector::new(config.change_threshold),
            collaborators,
            state: SchedulerState::new(),
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn timezone(&self) -> &Tz {
        &self.timezone
    }

    /// Run until the process is stopped
    ///
    /// Idle minutes sleep to the next minute boundary; active ticks are
    /// followed by a fixed 60s pause.
    #[instrument(skip(self), name = "monitor")]
    pub async fn run(&mut self) {
        info!(
            worker = "Monitor",
            watchlist = %self.watchlist.join(","),
            threshold = self.detector.threshold(),
            detection_category = %DETECTION_CATEGORY,
            timezone = %self.timezone,
            "Starting price monitor"
        );

        loop {
            let now = local_now(&self.timezone);
            let plan = TickPlan::at(&now, self.state.last_news_hour);

            if plan.active {
                self.run_guarded_tick(now).await;
                sleep(Duration::from_secs(ACTIVE_TICK_SLEEP_SECS)).await;
            } else {
                sleep(Duration::from_secs(seconds_until_next_minute(now.second()))).await;
            }
        }
    }

    /// Run one tick on its own task so a panic inside it ends only that tick
    ///
    /// Returns `None` when the tick panicked; scheduler state is then left as
    /// it was before the tick.
    pub async fn run_guarded_tick(&mut self, now: DateTime<Tz>) -> Option<TickReport> {
        let mut tick_worker = self.clone();
        let handle = tokio::spawn(async move {
            let report = tick_worker.run_tick(now).await;
            (report, tick_worker.state)
        });

        match handle.await {
            Ok((report, state)) => {
                self.state = state;
                Some(report)
            }
            Err(e) => {
                error!(
                    worker = "Monitor",
                    time = %now.format("%H:%M"),
                    error = %e,
                    "Tick aborted"
                );
                None
            }
        }
    }

    /// Handle one wall-clock minute
    ///
    /// Never fails: every error is logged and converted into a skipped step or
    /// a no-op tick.
    pub async fn run_tick(&mut self, now: DateTime<Tz>) -> TickReport {
        let plan = TickPlan::at(&now, self.state.last_news_hour);
        if !plan.active {
            return TickReport::skipped(SkipReason::Inactive);
        }

        let observed_at = now.with_timezone(&Utc);
        let iteration = self.state.begin_tick(observed_at);
        let tick_start = Instant::now();

        info!(
            worker = "Monitor",
            iteration = iteration,
            time = %now.format("%H:%M"),
            categories = ?plan.categories().iter().map(|c| c.label()).collect::<Vec<_>>(),
            summary_due = plan.summary_due,
            news_due = plan.news_due,
            "Starting tick"
        );

        let report = match self.process_tick(&plan, observed_at, iteration).await {
            Ok(report) => report,
            Err(e) => {
                error!(
                    worker = "Monitor",
                    iteration = iteration,
                    error = %e,
                    "Market fetch failed, skipping tick"
                );
                TickReport::skipped(SkipReason::FetchFailed)
            }
        };

        info!(
            worker = "Monitor",
            iteration = iteration,
            duration_secs = tick_start.elapsed().as_secs_f64(),
            written = ?report.categories_written.iter().map(|c| c.label()).collect::<Vec<_>>(),
            alerts = report.alerts_sent,
            summary = report.summary_sent,
            news = report.news_sent,
            failed_steps = report.failed_steps,
            "Tick completed"
        );

        report
    }

    /// Fetch once, then run each step independently
    async fn process_tick(
        &mut self,
        plan: &TickPlan,
        observed_at: DateTime<Utc>,
        iteration: u64,
    ) -> Result<TickReport> {
        let quotes = self.fetch_quotes().await?;
        if quotes.present_count() < quotes.len() {
            warn!(
                worker = "Monitor",
                iteration = iteration,
                missing = ?quotes.missing_symbols(),
                "Watchlist coins missing from listing"
            );
        }

        let mut report = TickReport::default();
        let mut rate = RateCache::Unfetched;

        match self.detect_and_alert(&quotes, &mut rate).await {
            Ok((sent, failed)) => {
                report.alerts_sent = sent;
                report.failed_steps += failed;
            }
            Err(e) => {
                error!(
                    worker = "Monitor",
                    iteration = iteration,
                    category = %DETECTION_CATEGORY,
                    error = %e,
                    "Change detection failed"
                );
                report.failed_steps += 1;
            }
        }

        for category in plan.categories() {
            match self.write_category(category, &quotes, observed_at).await {
                Ok(()) => {
                    info!(worker = "Monitor", iteration = iteration, category = %category, "Snapshot saved");
                    report.categories_written.push(category);
                }
                Err(e) => {
                    error!(
                        worker = "Monitor",
                        iteration = iteration,
                        category = %category,
                        error = %e,
                        "Snapshot write failed"
                    );
                    report.failed_steps += 1;
                }
            }
        }

        if plan.summary_due {
            match self.send_summary(&quotes, &mut rate).await {
                Ok(()) => {
                    info!(worker = "Monitor", iteration = iteration, "Hourly summary sent");
                    report.summary_sent = true;
                }
                Err(e) => {
                    error!(worker = "Monitor", iteration = iteration, error = %e, "Hourly summary failed");
                    report.failed_steps += 1;
                }
            }
        }

        if plan.news_due {
            match self.send_news().await {
                Ok(()) => {
                    self.state.record_news_sent(plan.hour);
                    info!(worker = "Monitor", iteration = iteration, hour = plan.hour, "News digest sent");
                    report.news_sent = true;
                }
                Err(e) => {
                    error!(worker = "Monitor", iteration = iteration, error = %e, "News digest failed");
                    report.failed_steps += 1;
                }
            }
        }

        Ok(report)
    }

    /// Fetch the listing and align it to the watchlist
    pub async fn fetch_quotes(&self) -> Result<WatchlistQuotes> {
        let listings = self.collaborators.market.fetch_listings().await?;
        Ok(extract_watchlist(
            &listings,
            &self.watchlist,
            &self.quote_currency,
            &self.timezone,
        ))
    }

    /// Compare against the detection baseline and send one message per alert
    ///
    /// Returns the number of alerts sent and the number that failed to send.
    async fn detect_and_alert(
        &self,
        quotes: &WatchlistQuotes,
        rate: &mut RateCache,
    ) -> Result<(usize, usize)> {
        let baseline = self
            .collaborators
            .store
            .read_baseline(DETECTION_CATEGORY)
            .await?;

        let detection = self
            .detector
            .detect(DETECTION_CATEGORY, baseline.as_ref(), quotes)?;

        let alerts = match detection {
            Detection::NoBaseline => {
                info!(
                    worker = "Monitor",
                    category = %DETECTION_CATEGORY,
                    "No baseline stored yet, skipping comparison"
                );
                return Ok((0, 0));
            }
            Detection::Compared { alerts, compared, skipped } => {
                info!(
                    worker = "Monitor",
                    category = %DETECTION_CATEGORY,
                    compared = compared,
                    skipped = skipped,
                    alerts = alerts.len(),
                    "Compared against baseline"
                );
                alerts
            }
        };

        if alerts.is_empty() {
            return Ok((0, 0));
        }

        let display = self.price_display(rate).await;
        let mut sent = 0;
        let mut failed = 0;
        for mut alert in alerts {
            alert.secondary_price = display.to_secondary(alert.current_price);
            let message = message_format::format_alert(&alert, &display);

            match self.collaborators.notifier.send_markdown(&message).await {
                Ok(()) => {
                    info!(
                        worker = "Monitor",
                        symbol = %alert.symbol,
                        change = alert.interval_change,
                        "Alert sent"
                    );
                    sent += 1;
                }
                Err(e) => {
                    error!(worker = "Monitor", symbol = %alert.symbol, error = %e, "Alert send failed");
                    failed += 1;
                }
            }
        }
        Ok((sent, failed))
    }

    async fn write_category(
        &self,
        category: BucketCategory,
        quotes: &WatchlistQuotes,
        observed_at: DateTime<Utc>,
    ) -> Result<()> {
        let snapshot = PriceSnapshot::new(
            category,
            quotes.symbols.clone(),
            quotes.price_vector(),
            quotes.latest_update().map(|coin| coin.last_updated),
            observed_at,
        )?;
        self.collaborators.store.write_snapshot(&snapshot).await
    }

    async fn send_summary(&self, quotes: &WatchlistQuotes, rate: &mut RateCache) -> Result<()> {
        let display = self.price_display(rate).await;
        let message = message_format::format_summary(quotes.present(), &display);
        self.collaborators.notifier.send_markdown(&message).await
    }

    /// Fetch and send a summary outside the schedule
    pub async fn send_summary_now(&self) -> Result<()> {
        let quotes = self.fetch_quotes().await?;
        self.send_summary(&quotes, &mut RateCache::Unfetched).await
    }

    /// Collect every news source; fails only when no source answered
    async fn send_news(&self) -> Result<()> {
        let mut digest = NewsDigest::default();
        let mut answered = 0;
        let mut last_error = None;

        for source in &self.collaborators.news {
            match source.fetch_news(&self.watchlist).await {
                Ok(articles) => {
                    answered += 1;
                    match source.provider() {
                        NewsProvider::CryptoPanic => digest.cryptopanic.extend(articles),
                        NewsProvider::CoinMarketCap => digest.coinmarketcap.extend(articles),
                    }
                }
                Err(e) => {
                    warn!(
                        worker = "Monitor",
                        provider = source.provider().name(),
                        error = %e,
                        "News fetch failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        if answered == 0 {
            return Err(last_error
                .unwrap_or_else(|| AppError::Config("no news sources configured".to_string())));
        }

        info!(worker = "Monitor", articles = digest.article_count(), "Sending news digest");
        let message = message_format::format_news_digest(&digest);
        self.collaborators.notifier.send_markdown(&message).await
    }

    async fn price_display(&self, rate: &mut RateCache) -> PriceDisplay {
        if let RateCache::Unfetched = rate {
            let fetched = match self
                .collaborators
                .rates
                .fetch_rate(&self.secondary_currency, &self.quote_currency)
                .await
            {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(
                        worker = "Monitor",
                        error = %e,
                        "Exchange rate unavailable, sending without {} prices",
                        self.secondary_currency
                    );
                    None
                }
            };
            *rate = RateCache::Fetched(fetched);
        }

        let value = match rate {
            RateCache::Fetched(value) => *value,
            RateCache::Unfetched => None,
        };
        PriceDisplay::new(&self.quote_currency, &self.secondary_currency, value)
    }
}
