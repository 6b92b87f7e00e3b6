use crate::constants::DB_BUSY_TIMEOUT_SECS;
use crate::error::{AppError, Result};
use crate::models::{BucketCategory, PriceSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Baseline persistence consumed by the scheduler
///
/// One current snapshot per category. Writes replace the previous record and
/// must succeed whether or not one existed before.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Current baseline for `category`, `None` if nothing was written yet
    async fn read_baseline(&self, category: BucketCategory) -> Result<Option<PriceSnapshot>>;

    /// Upsert the snapshot for its category
    async fn write_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()>;

    /// Every stored snapshot, shortest category first
    async fn list_snapshots(&self) -> Result<Vec<PriceSnapshot>>;
}

/// SQLite-backed snapshot store
#[derive(Debug)]
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
    database_path: PathBuf,
}

impl SqliteSnapshotStore {
    /// Open (or create) the database and ensure the schema exists
    pub async fn new(database_path: PathBuf) -> Result<Self> {
        info!("Initializing snapshot database at: {:?}", database_path);

        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS));

        let pool = SqlitePool::connect_with(connect_options).await?;

        let store = Self { pool, database_path };
        store.initialize_database().await?;

        info!("Snapshot database initialized successfully");
        Ok(store)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    async fn initialize_database(&self) -> Result<()> {
        // Prices and symbols are JSON arrays so the watchlist size is not a schema constant
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_snapshots (
                category TEXT PRIMARY KEY,
                symbols TEXT NOT NULL,
                prices TEXT NOT NULL,
                last_data_at TEXT,
                observed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Snapshot database connection pool closed");
    }

    fn row_to_snapshot(row: sqlx::sqlite::SqliteRow) -> Result<PriceSnapshot> {
        let category: String = row.try_get("category")?;
        let symbols: String = row.try_get("symbols")?;
        let prices: String = row.try_get("prices")?;
        let last_data_at: Option<String> = row.try_get("last_data_at")?;
        let observed_at: String = row.try_get("observed_at")?;

        let snapshot = PriceSnapshot {
            category: BucketCategory::from_label(&category).map_err(AppError::Integrity)?,
            symbols: serde_json::from_str(&symbols)?,
            prices: serde_json::from_str(&prices)?,
            last_data_at: last_data_at.as_deref().map(parse_timestamp).transpose()?,
            observed_at: parse_timestamp(&observed_at)?,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn read_baseline(&self, category: BucketCategory) -> Result<Option<PriceSnapshot>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(
            "SELECT category, symbols, prices, last_data_at, observed_at FROM price_snapshots WHERE category = ?1",
        )
        .bind(category.label())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(Self::row_to_snapshot).transpose()
    }

    async fn write_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()> {
        snapshot.validate()?;

        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            r#"
            INSERT INTO price_snapshots (category, symbols, prices, last_data_at, observed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(category) DO UPDATE SET
                symbols = excluded.symbols,
                prices = excluded.prices,
                last_data_at = excluded.last_data_at,
                observed_at = excluded.observed_at
            "#,
        )
        .bind(snapshot.category.label())
        .bind(serde_json::to_string(&snapshot.symbols)?)
        .bind(serde_json::to_string(&snapshot.prices)?)
        .bind(snapshot.last_data_at.map(|t| t.to_rfc3339()))
        .bind(snapshot.observed_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        debug!(category = %snapshot.category, slots = snapshot.prices.len(), "Snapshot upserted");
        Ok(())
    }

    async fn list_snapshots(&self) -> Result<Vec<PriceSnapshot>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(
            "SELECT category, symbols, prices, last_data_at, observed_at FROM price_snapshots",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut snapshots = rows
            .into_iter()
            .map(Self::row_to_snapshot)
            .collect::<Result<Vec<_>>>()?;
        sort_by_category(&mut snapshots);
        Ok(snapshots)
    }
}

/// In-process snapshot store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<BucketCategory, PriceSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn read_baseline(&self, category: BucketCategory) -> Result<Option<PriceSnapshot>> {
        Ok(self.snapshots.read().await.get(&category).cloned())
    }

    async fn write_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.snapshots
            .write()
            .await
            .insert(snapshot.category, snapshot.clone());
        Ok(())
    }

    async fn list_snapshots(&self) -> Result<Vec<PriceSnapshot>> {
        let mut snapshots: Vec<_> = self.snapshots.read().await.values().cloned().collect();
        sort_by_category(&mut snapshots);
        Ok(snapshots)
    }
}

fn sort_by_category(snapshots: &mut [PriceSnapshot]) {
    snapshots.sort_by_key(|s| {
        BucketCategory::STORED
            .iter()
            .position(|c| *c == s.category)
            .unwrap_or(usize::MAX)
    });
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::Parse(format!("Invalid stored timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn snapshot(category: BucketCategory, prices: Vec<f64>) -> PriceSnapshot {
        let symbols = ["BTC", "ETH", "SOL", "XRP", "ADA", "DOGE"]
            .iter()
            .take(prices.len())
            .map(|s| s.to_string())
            .collect();
        PriceSnapshot::new(
            category,
            symbols,
            prices,
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 7, 29, 0).unwrap()),
            Utc.with_ymd_and_hms(2026, 10, 19, 7, 30, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_round_trip_and_upsert() {
        let temp_dir = tempdir().unwrap();
        let store = SqliteSnapshotStore::new(temp_dir.path().join("snapshots.db"))
            .await
            .unwrap();

        assert!(store
            .read_baseline(BucketCategory::FiveMinutes)
            .await
            .unwrap()
            .is_none());

        // First write has no prior row
        let first = snapshot(BucketCategory::FiveMinutes, vec![100.0, 0.0, 3.5]);
        store.write_snapshot(&first).await.unwrap();
        assert_eq!(
            store.read_baseline(BucketCategory::FiveMinutes).await.unwrap(),
            Some(first)
        );

        // Second write replaces, including a different vector length
        let second = snapshot(
            BucketCategory::FiveMinutes,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        );
        store.write_snapshot(&second).await.unwrap();
        assert_eq!(
            store.read_baseline(BucketCategory::FiveMinutes).await.unwrap(),
            Some(second)
        );

        store.close().await;
    }

    #[tokio::test]
    async fn test_sqlite_categories_are_independent() {
        let temp_dir = tempdir().unwrap();
        let store = SqliteSnapshotStore::new(temp_dir.path().join("nested/snapshots.db"))
            .await
            .unwrap();

        store
            .write_snapshot(&snapshot(BucketCategory::ThirtyMinutes, vec![30.0]))
            .await
            .unwrap();
        store
            .write_snapshot(&snapshot(BucketCategory::FiveMinutes, vec![5.0]))
            .await
            .unwrap();

        let listed = store.list_snapshots().await.unwrap();
        let categories: Vec<_> = listed.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![BucketCategory::FiveMinutes, BucketCategory::ThirtyMinutes]
        );
        assert!(store
            .read_baseline(BucketCategory::TenMinutes)
            .await
            .unwrap()
            .is_none());

        store.close().await;
    }

    #[tokio::test]
    async fn test_memory_store_rejects_invalid_snapshot() {
        let store = MemorySnapshotStore::new();
        let mut bad = snapshot(BucketCategory::FiveMinutes, vec![1.0, 2.0]);
        bad.prices.pop();

        assert!(matches!(
            store.write_snapshot(&bad).await,
            Err(AppError::Integrity(_))
        ));
        assert!(store.list_snapshots().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemorySnapshotStore::new();
        let written = snapshot(BucketCategory::FiveMinutes, vec![10.0, 20.0]);
        store.write_snapshot(&written).await.unwrap();
        assert_eq!(
            store.read_baseline(BucketCategory::FiveMinutes).await.unwrap(),
            Some(written)
        );
    }
}
