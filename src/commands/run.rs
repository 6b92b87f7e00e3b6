use super::{build_collaborators, load_config};
use crate::worker::{MonitorWorker, DETECTION_CATEGORY};
use tracing::{error, info};

pub async fn run() {
    let config = load_config();

    println!("🚀 Starting coinpulse monitor");
    println!("👀 Watchlist: {}", config.watchlist.join(", "));
    println!(
        "🎯 Threshold: {}% against the {} baseline",
        config.change_threshold, DETECTION_CATEGORY
    );
    println!("🌏 Timezone: {}", config.timezone);
    println!("💾 Database: {}", config.database_path.display());

    let collaborators = match build_collaborators(&config, false).await {
        Ok(collaborators) => collaborators,
        Err(e) => {
            eprintln!("❌ Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    let mut worker = MonitorWorker::new(&config, collaborators);

    tokio::select! {
        _ = worker.run() => {}
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
            }
        }
    }

    println!(
        "👋 Monitor stopped after {} active ticks",
        worker.state().iteration_count
    );
}
