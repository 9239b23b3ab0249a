//! clipkeep - clipboard history engine
//!
//! Continuously observes the OS clipboard and turns its changes into a
//! deduplicated, bounded, ordered history of typed entries. The surrounding
//! application (window chrome, tray, shortcuts) is expected to live on top of
//! [`core::clipboard::ClipboardMonitor`].

pub mod core;
pub mod shared;

pub use crate::core::clipboard::{
    ClipboardDevice, ClipboardHistory, ClipboardMonitor, InMemoryStorage, JsonFileStorage,
    Snapshot, Storage, Subscription, SystemClipboard, DEFAULT_POLL_INTERVAL_MS,
};
pub use crate::shared::errors::{EngineError, EngineResult};
pub use crate::shared::settings::{AppSettings, SettingsPatch};
pub use crate::shared::types::{ClipboardEntry, EntryKind, EntryPayload};
