use super::{build_collaborators, load_config};
use crate::error::{AppError, Result};
use crate::services::bucket_policy::local_now;
use crate::worker::{MonitorWorker, SkipReason};
use chrono::Timelike;

pub async fn run(at: Option<String>, dry_run: bool) {
    let config = load_config();

    let now = local_now(&config.timezone);
    let now = match at.as_deref().map(parse_clock).transpose() {
        Ok(Some((hour, minute))) => match now
            .with_hour(hour)
            .and_then(|t| t.with_minute(minute))
            .and_then(|t| t.with_second(0))
        {
            Some(time) => time,
            None => {
                eprintln!("❌ {:02}:{:02} does not exist today in {}", hour, minute, config.timezone);
                std::process::exit(1);
            }
        },
        Ok(None) => now,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if dry_run {
        println!("🧪 Dry run: snapshots stay in memory, messages are only logged");
    }
    println!("⏱️  Running tick for {}", now.format("%Y-%m-%d %H:%M %Z"));

    let collaborators = match build_collaborators(&config, dry_run).await {
        Ok(collaborators) => collaborators,
        Err(e) => {
            eprintln!("❌ Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    let mut worker = MonitorWorker::new(&config, collaborators);
    let report = worker.run_tick(now).await;

    match report.skipped {
        Some(SkipReason::Inactive) => {
            println!("💤 {} is not a 5-minute boundary, nothing to do", now.format("%H:%M"));
            println!("💡 Tip: pass --at HH:MM to simulate a scheduled minute");
        }
        Some(SkipReason::FetchFailed) => {
            eprintln!("❌ Market data fetch failed, tick skipped");
            std::process::exit(1);
        }
        None => {
            let written: Vec<&str> = report.categories_written.iter().map(|c| c.label()).collect();
            println!("✅ Tick completed");
            println!("   💾 Snapshots written: {}", written.join(", "));
            println!("   🚨 Alerts sent:       {}", report.alerts_sent);
            println!("   🕒 Summary sent:      {}", report.summary_sent);
            println!("   📰 News sent:         {}", report.news_sent);
            if report.failed_steps > 0 {
                println!("   ⚠️  Failed steps:      {}", report.failed_steps);
            }
        }
    }
}

/// Parse a local wall-clock time like `14:30`
fn parse_clock(value: &str) -> Result<(u32, u32)> {
    let invalid = || AppError::Config(format!("Invalid --at '{}': expected HH:MM", value));

    let (hour, minute) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;

    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}
