use super::{build_collaborators, load_config};
use crate::worker::MonitorWorker;

pub async fn run() {
    let config = load_config();

    let collaborators = match build_collaborators(&config, false).await {
        Ok(collaborators) => collaborators,
        Err(e) => {
            eprintln!("❌ Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    let worker = MonitorWorker::new(&config, collaborators);

    println!("📡 Fetching {} coins...", config.watchlist.len());
    match worker.send_summary_now().await {
        Ok(()) => println!("✅ Summary sent to chat {}", config.chat_id),
        Err(e) => {
            eprintln!("❌ Summary failed: {}", e);
            std::process::exit(1);
        }
    }
}
