use super::load_config;
use crate::models::{BucketCategory, PriceSnapshot};
use crate::services::message_format::{format_grouped, format_local_time};
use crate::services::{SnapshotStore, SqliteSnapshotStore};
use chrono::Utc;
use chrono_tz::Tz;

pub async fn run() {
    println!("📊 Snapshot Status\n");

    let config = load_config();

    match show_status(&config.database_path, &config.watchlist, &config.timezone).await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn show_status(
    database_path: &std::path::Path,
    watchlist: &[String],
    tz: &Tz,
) -> crate::error::Result<()> {
    let store = SqliteSnapshotStore::new(database_path.to_path_buf()).await?;
    let snapshots = store.list_snapshots().await?;
    store.close().await;

    println!("💾 Database: {}", database_path.display());
    println!("👀 Watchlist: {}\n", watchlist.join(", "));

    if snapshots.is_empty() {
        println!("⚠️  No baselines stored yet. Run 'coinpulse run' and wait for the first tick.");
        return Ok(());
    }

    for category in BucketCategory::STORED {
        println!("═══════════════════════════════════════════════════════════\n");
        match snapshots.iter().find(|s| s.category == category) {
            Some(snapshot) => show_snapshot(snapshot, watchlist, tz),
            None => println!("🔹 {}: no baseline yet\n", category),
        }
    }

    Ok(())
}

fn show_snapshot(snapshot: &PriceSnapshot, watchlist: &[String], tz: &Tz) {
    let age_secs = (Utc::now() - snapshot.observed_at).num_seconds().max(0);
    println!(
        "🔹 {} baseline  (written {}, {} ago)",
        snapshot.category,
        format_local_time(&snapshot.observed_at, tz),
        format_age(age_secs)
    );
    if let Some(last_data_at) = &snapshot.last_data_at {
        println!("   Market data as of {}", format_local_time(last_data_at, tz));
    }
    if snapshot.ensure_matches(watchlist).is_err() {
        println!("   ⚠️  Stored symbols differ from the watchlist; replaced on the next write");
    }

    for (symbol, price) in snapshot.symbols.iter().zip(&snapshot.prices) {
        if *price > 0.0 {
            println!("   {:<8} {:>24}", symbol, format_grouped(*price, 4));
        } else {
            println!("   {:<8} {:>24}", symbol, "missing");
        }
    }
    println!();
}

fn format_age(secs: i64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(42), "42s");
        assert_eq!(format_age(300), "5m");
        assert_eq!(format_age(3_900), "1h 5m");
    }
}
