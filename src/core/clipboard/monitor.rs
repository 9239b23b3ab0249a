//! Clipboard monitor engine: poll loop, change detection, notification
//!
//! A single spawned task drives all detection work, so ticks never overlap.
//! Dedup state, the suppression gate and the history store are owned by the
//! engine instance; foreground calls and the poll task synchronize through
//! their internal mutexes.

use crate::core::clipboard::history::ClipboardHistory;
use crate::core::clipboard::snapshot::{read_snapshot, ClipboardDevice};
use crate::core::clipboard::state::{DedupState, SuppressionGate};
use crate::shared::errors::{EngineError, EngineResult};
use crate::shared::settings::AppSettings;
use crate::shared::types::{ClipboardEntry, EntryPayload};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Safety margin added to the poll interval for the suppression window.
/// Heuristic under system load, not a correctness guarantee.
const SUPPRESSION_MARGIN_MS: u64 = 100;

type Subscriber = Arc<dyn Fn(&ClipboardEntry) + Send + Sync>;
type SubscriberList = Mutex<Vec<(u64, Subscriber)>>;

/// Handle returned by [`ClipboardMonitor::subscribe`]
pub struct Subscription {
    id: u64,
    subscribers: Weak<SubscriberList>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            let mut subscribers = subscribers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Clipboard monitor that polls for changes
#[derive(Clone)]
pub struct ClipboardMonitor {
    device: Arc<dyn ClipboardDevice>,
    history: ClipboardHistory,
    dedup: DedupState,
    gate: SuppressionGate,
    enabled: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    interval_ms: Arc<AtomicU64>,
    subscribers: Arc<SubscriberList>,
    next_subscriber_id: Arc<AtomicU64>,
    poll_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ClipboardMonitor {
    pub fn new(device: Arc<dyn ClipboardDevice>, history: ClipboardHistory) -> Self {
        Self {
            device,
            history,
            dedup: DedupState::new(),
            gate: SuppressionGate::new(),
            enabled: Arc::new(AtomicBool::new(true)),
            running: Arc::new(AtomicBool::new(false)),
            interval_ms: Arc::new(AtomicU64::new(DEFAULT_POLL_INTERVAL_MS)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscriber_id: Arc::new(AtomicU64::new(1)),
            poll_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the recurring poll task.
    ///
    /// The current clipboard content is absorbed as the dedup baseline first,
    /// so a restart does not re-emit whatever is already on the clipboard.
    /// Starting an already-running monitor is rejected; two overlapping
    /// tickers must never run.
    pub fn start(&self, interval: Duration) -> EngineResult<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadyRunning);
        }

        self.interval_ms.store(interval.as_millis() as u64, Ordering::SeqCst);
        self.prime();

        let monitor = self.clone();
        let task = tokio::spawn(async move {
            log::info!(
                "[ClipboardMonitor] Started monitoring ({}ms interval)",
                interval.as_millis()
            );
            while monitor.running.load(Ordering::SeqCst) {
                if monitor.enabled.load(Ordering::SeqCst) {
                    monitor.tick();
                }
                tokio::time::sleep(interval).await;
            }
            log::info!("[ClipboardMonitor] Stopped");
        });

        let mut poll_task = self.lock_task();
        *poll_task = Some(task);
        Ok(())
    }

    /// Stop polling. Safe to call when already stopped; a tick in progress
    /// is never interrupted, only future ticks are prevented.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.lock_task().take() {
            // cancellation lands at the sleep point, never inside a tick
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One detection pass: read, classify, gate, dedup, emit.
    ///
    /// Exposed so tests (and embedders with their own scheduler) can drive
    /// the engine deterministically.
    pub fn tick(&self) {
        let snapshot = read_snapshot(self.device.as_ref());
        let (kind, fingerprint) = match (snapshot.kind(), snapshot.fingerprint()) {
            (Some(kind), Some(fingerprint)) => (kind, fingerprint),
            _ => return, // empty clipboard, nothing this tick
        };

        if !self.dedup.accept(kind, fingerprint) {
            return;
        }

        if self.gate.consume() {
            // self-inflicted write: baseline updated, nothing emitted
            log::debug!(
                "[ClipboardMonitor] Absorbed self-write into baseline ({})",
                kind.as_str()
            );
            return;
        }

        let Some(entry) = snapshot.into_entry() else {
            return;
        };
        log::info!("[ClipboardMonitor] Detected clipboard change ({})", kind.as_str());

        // in-memory history stays authoritative even if the save fails
        if let Err(e) = self.history.insert(entry.clone()) {
            log::error!("[ClipboardMonitor] Failed to persist new entry: {}", e);
        }
        self.notify(&entry);
    }

    /// Subscribe to new-entry notifications. A subscriber registered before
    /// a tick sees that tick's emission. Multiple subscribers may coexist.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ClipboardEntry) + Send + Sync + 'static,
    {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        {
            let mut subscribers = self.lock_subscribers();
            subscribers.push((id, Arc::new(callback)));
        }
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Write an entry's content back to the OS clipboard, arming the
    /// suppression gate immediately beforehand so the engine's own write is
    /// not re-detected as a user copy.
    pub fn copy_to_clipboard(&self, entry: &ClipboardEntry) -> EngineResult<()> {
        let window = Duration::from_millis(
            self.interval_ms.load(Ordering::SeqCst) + SUPPRESSION_MARGIN_MS,
        );
        self.gate.arm(window);

        match &entry.payload {
            EntryPayload::Text => self.device.write_text(&entry.content),
            EntryPayload::File { file_path } => self.device.write_files(&[file_path.clone()]),
            EntryPayload::Image { preview } => {
                let encoded = preview
                    .strip_prefix("data:image/png;base64,")
                    .ok_or_else(|| {
                        EngineError::InvalidInput("image preview is not a PNG data URL".to_string())
                    })?;
                let png = BASE64
                    .decode(encoded)
                    .map_err(|e| EngineError::InvalidInput(format!("Corrupt image preview: {}", e)))?;
                self.device.write_image(&png)
            }
        }
    }

    /// Current snapshot of the history store, newest first
    pub fn history(&self) -> Vec<ClipboardEntry> {
        self.history.items()
    }

    pub fn delete_item(&self, id: &str) -> EngineResult<bool> {
        self.history.remove(id)
    }

    pub fn clear_history(&self) -> EngineResult<()> {
        self.history.clear()
    }

    /// Refresh engine configuration after settings were saved. The new bound
    /// applies on the next insert.
    pub fn apply_settings(&self, settings: &AppSettings) {
        self.history.set_max_history(settings.max_history);
    }

    /// Enable or disable detection work without tearing down the timer
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        log::info!(
            "[ClipboardMonitor] {}",
            if enabled { "Enabled" } else { "Disabled" }
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        log::info!("[ClipboardMonitor] Toggled to {}", enabled);
        enabled
    }

    /// Absorb the current clipboard content as the dedup baseline
    fn prime(&self) {
        let snapshot = read_snapshot(self.device.as_ref());
        if let (Some(kind), Some(fingerprint)) = (snapshot.kind(), snapshot.fingerprint()) {
            self.dedup.accept(kind, fingerprint);
        }
    }

    fn notify(&self, entry: &ClipboardEntry) {
        // snapshot the list so callbacks run outside the lock
        let subscribers: Vec<Subscriber> = {
            let subscribers = self.lock_subscribers();
            subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for callback in subscribers {
            callback(entry);
        }
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Subscriber)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poll_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clipboard::history::InMemoryStorage;
    use crate::core::clipboard::snapshot::ImageData;
    use crate::shared::types::EntryKind;
    use twox_hash::xxh3::hash64;

    #[derive(Default)]
    struct FakeState {
        text: Option<String>,
        image: Option<ImageData>,
        files: Option<Vec<String>>,
        written_text: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct FakeClipboard {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeClipboard {
        fn set_text(&self, text: &str) {
            let mut state = self.state.lock().unwrap();
            state.text = Some(text.to_string());
            state.image = None;
            state.files = None;
        }

        fn set_file_with_text_path(&self, path: &str) {
            let mut state = self.state.lock().unwrap();
            state.files = Some(vec![path.to_string()]);
            state.text = Some(path.to_string());
            state.image = None;
        }

        fn clear(&self) {
            let mut state = self.state.lock().unwrap();
            *state = FakeState {
                written_text: std::mem::take(&mut state.written_text),
                ..FakeState::default()
            };
        }
    }

    impl ClipboardDevice for FakeClipboard {
        fn read_text(&self) -> EngineResult<Option<String>> {
            Ok(self.state.lock().unwrap().text.clone())
        }

        fn read_image(&self) -> EngineResult<Option<ImageData>> {
            Ok(self.state.lock().unwrap().image.clone())
        }

        fn read_files(&self) -> EngineResult<Option<Vec<String>>> {
            Ok(self.state.lock().unwrap().files.clone())
        }

        fn write_text(&self, text: &str) -> EngineResult<()> {
            let mut state = self.state.lock().unwrap();
            state.written_text.push(text.to_string());
            state.text = Some(text.to_string());
            state.image = None;
            state.files = None;
            Ok(())
        }

        fn write_image(&self, png: &[u8]) -> EngineResult<()> {
            let mut state = self.state.lock().unwrap();
            state.image = Some(ImageData {
                png: png.to_vec(),
                width: 0,
                height: 0,
            });
            state.text = None;
            state.files = None;
            Ok(())
        }

        fn write_files(&self, paths: &[String]) -> EngineResult<()> {
            let mut state = self.state.lock().unwrap();
            state.files = Some(paths.to_vec());
            state.text = None;
            state.image = None;
            Ok(())
        }
    }

    fn test_monitor() -> (ClipboardMonitor, FakeClipboard) {
        let device = FakeClipboard::default();
        let history = ClipboardHistory::new(Arc::new(InMemoryStorage::new()), 100);
        let monitor = ClipboardMonitor::new(Arc::new(device.clone()), history);
        (monitor, device)
    }

    #[test]
    fn identical_content_emits_once() {
        let (monitor, device) = test_monitor();
        device.set_text("hello");

        monitor.tick();
        monitor.tick();
        monitor.tick();

        let history = monitor.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hello");
    }

    #[test]
    fn revisited_content_is_reemitted() {
        let (monitor, device) = test_monitor();

        device.set_text("A");
        monitor.tick();
        device.set_text("B");
        monitor.tick();
        device.set_text("A");
        monitor.tick();

        let contents: Vec<_> = monitor.history().iter().map(|e| e.content.clone()).collect();
        assert_eq!(contents, vec!["A", "B", "A"]);
    }

    #[test]
    fn file_takes_precedence_over_text() {
        let (monitor, device) = test_monitor();
        device.set_file_with_text_path("/tmp/report.pdf");

        monitor.tick();

        let history = monitor.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind(), EntryKind::File);
        assert!(history[0].content.starts_with("📕"));
        assert_eq!(
            history[0].payload,
            EntryPayload::File {
                file_path: "/tmp/report.pdf".to_string()
            }
        );
    }

    #[test]
    fn empty_clipboard_produces_nothing() {
        let (monitor, device) = test_monitor();
        monitor.tick();
        assert!(monitor.history().is_empty());

        device.clear();
        monitor.tick();
        assert!(monitor.history().is_empty());
    }

    #[test]
    fn eviction_scenario_with_bound_of_two() {
        let device = FakeClipboard::default();
        let history = ClipboardHistory::new(Arc::new(InMemoryStorage::new()), 2);
        let monitor = ClipboardMonitor::new(Arc::new(device.clone()), history);

        device.set_text("alpha");
        monitor.tick();
        device.set_text("beta");
        monitor.tick();
        device.set_text("gamma");
        monitor.tick();

        let contents: Vec<_> = monitor.history().iter().map(|e| e.content.clone()).collect();
        assert_eq!(contents, vec!["gamma", "beta"]); // alpha evicted
    }

    #[test]
    fn self_copy_is_absorbed_but_updates_baseline() {
        let (monitor, device) = test_monitor();
        let entry = ClipboardEntry::new_text("self-copy".to_string());

        monitor.copy_to_clipboard(&entry).unwrap();
        assert_eq!(device.state.lock().unwrap().written_text, vec!["self-copy"]);

        monitor.tick();
        assert!(monitor.history().is_empty()); // absorbed, not re-emitted
        assert_eq!(
            monitor.dedup.slot(EntryKind::Text),
            Some(hash64("self-copy".as_bytes()))
        );

        // a later distinct copy is still detected normally
        device.set_text("genuinely new");
        monitor.tick();
        assert_eq!(monitor.history().len(), 1);
        assert_eq!(monitor.history()[0].content, "genuinely new");
    }

    #[test]
    fn suppression_covers_only_one_change() {
        let (monitor, device) = test_monitor();
        let entry = ClipboardEntry::new_text("first".to_string());

        monitor.copy_to_clipboard(&entry).unwrap();
        device.set_text("second"); // user copy races ahead of the next tick
        monitor.tick();

        // the gate absorbed the one detected change; the next one emits
        assert!(monitor.history().is_empty());
        device.set_text("third");
        monitor.tick();
        assert_eq!(monitor.history().len(), 1);
    }

    #[test]
    fn subscribers_see_emissions_until_unsubscribed() {
        let (monitor, device) = test_monitor();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let subscription = monitor.subscribe(move |entry| {
            sink.lock().unwrap().push(entry.content.clone());
        });

        device.set_text("one");
        monitor.tick();
        assert_eq!(*seen.lock().unwrap(), vec!["one"]);

        subscription.unsubscribe();
        device.set_text("two");
        monitor.tick();
        assert_eq!(*seen.lock().unwrap(), vec!["one"]); // no longer notified
        assert_eq!(monitor.history().len(), 2); // history still records it
    }

    #[test]
    fn multiple_subscribers_coexist() {
        let (monitor, device) = test_monitor();
        let first: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let second: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));

        let sink = Arc::clone(&first);
        let _sub_a = monitor.subscribe(move |_| *sink.lock().unwrap() += 1);
        let sink = Arc::clone(&second);
        let _sub_b = monitor.subscribe(move |_| *sink.lock().unwrap() += 1);

        device.set_text("shared");
        monitor.tick();

        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn start_rejects_duplicate_and_stop_is_idempotent() {
        let (monitor, _device) = test_monitor();

        monitor.start(Duration::from_secs(3600)).unwrap();
        assert!(monitor.is_running());
        assert!(matches!(
            monitor.start(Duration::from_secs(3600)),
            Err(EngineError::AlreadyRunning)
        ));

        monitor.stop();
        assert!(!monitor.is_running());
        monitor.stop(); // no-op, no panic

        // restartable after a clean stop
        monitor.start(Duration::from_secs(3600)).unwrap();
        monitor.stop();
    }

    #[tokio::test]
    async fn start_primes_baseline_instead_of_reemitting() {
        let (monitor, device) = test_monitor();
        device.set_text("already on clipboard");

        // long interval: the spawned task sleeps, we drive ticks by hand
        monitor.start(Duration::from_secs(3600)).unwrap();
        monitor.tick();
        assert!(monitor.history().is_empty());

        device.set_text("fresh copy");
        monitor.tick();
        assert_eq!(monitor.history().len(), 1);
        monitor.stop();
    }

    #[tokio::test]
    async fn disabled_monitor_skips_detection() {
        let (monitor, device) = test_monitor();
        monitor.set_enabled(false);
        assert!(!monitor.is_enabled());

        monitor.start(Duration::from_millis(10)).unwrap();
        device.set_text("while paused");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(monitor.history().is_empty());

        assert!(monitor.toggle());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(monitor.history().len(), 1);
        monitor.stop();
    }
}
