//! Clipboard module
//!
//! The change-detection and history-management engine:
//! - `snapshot`: typed clipboard reads with the File > Text > Image precedence
//! - `state`: per-kind dedup fingerprints and the self-write suppression gate
//! - `history`: bounded, ordered history with pluggable persistence
//! - `monitor`: the poll loop tying it all together
//! - `icons`: extension → glyph lookup for file entries

pub mod history;
pub mod icons;
pub mod monitor;
pub mod snapshot;
pub mod state;

pub use history::{ClipboardHistory, InMemoryStorage, JsonFileStorage, Storage};
pub use monitor::{ClipboardMonitor, Subscription, DEFAULT_POLL_INTERVAL_MS};
pub use snapshot::{read_snapshot, ClipboardDevice, ImageData, Snapshot, SystemClipboard};
pub use state::{DedupState, SuppressionGate};
