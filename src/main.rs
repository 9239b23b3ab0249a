//! Headless runner: watch the clipboard and print new history entries.
//!
//! Useful for probing detection behavior without a UI. Stop with Ctrl+C.

use clipkeep::{
    AppSettings, ClipboardHistory, ClipboardMonitor, JsonFileStorage, SystemClipboard,
    DEFAULT_POLL_INTERVAL_MS,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = AppSettings::load().await.unwrap_or_else(|e| {
        eprintln!("Failed to load settings, using defaults: {}", e);
        AppSettings::default()
    });

    let storage: Arc<dyn clipkeep::Storage> = match JsonFileStorage::default_path() {
        Ok(path) => {
            println!("clipkeep: history at {}", path.display());
            Arc::new(JsonFileStorage::new(path))
        }
        Err(e) => {
            eprintln!("No data directory ({}), history will not persist", e);
            Arc::new(clipkeep::InMemoryStorage::new())
        }
    };

    let history = ClipboardHistory::new(storage, settings.max_history);
    let device = Arc::new(SystemClipboard::new()?);
    let monitor = ClipboardMonitor::new(device, history);

    let _subscription = monitor.subscribe(|entry| {
        println!(
            "[{}] {} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.kind().as_str(),
            entry.content
        );
    });

    monitor.start(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))?;
    println!(
        "clipkeep: watching clipboard every {}ms (max {} entries), stop with Ctrl+C",
        DEFAULT_POLL_INTERVAL_MS, settings.max_history
    );

    tokio::signal::ctrl_c().await?;
    monitor.stop();
    println!("clipkeep: stopped");
    Ok(())
}
