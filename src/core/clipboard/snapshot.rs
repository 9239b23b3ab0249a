//! Clipboard snapshots and the OS clipboard device
//!
//! One snapshot is read per poll tick. OS clipboards may expose several
//! representations at once (a copied file also exposes its path as text), so
//! reads apply a fixed precedence: File > Text > Image. A file copy is the
//! most specific user intent; its text representation must not shadow it.

use crate::core::clipboard::icons;
use crate::shared::errors::{EngineError, EngineResult};
use crate::shared::types::{ClipboardEntry, EntryKind};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clipboard_rs::common::RustImage;
use clipboard_rs::{Clipboard, ClipboardContext, ContentFormat, RustImageData};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use twox_hash::xxh3::hash64;

/// Raw image read from the clipboard, already re-encoded as PNG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// One poll's raw read of the clipboard, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Text(String),
    Image(ImageData),
    File(PathBuf),
    Empty,
}

impl Snapshot {
    pub fn kind(&self) -> Option<EntryKind> {
        match self {
            Snapshot::Text(_) => Some(EntryKind::Text),
            Snapshot::Image(_) => Some(EntryKind::Image),
            Snapshot::File(_) => Some(EntryKind::File),
            Snapshot::Empty => None,
        }
    }

    /// Fast content fingerprint, used only for change detection.
    ///
    /// Hashes the raw UTF-8 text bytes, the path string bytes, or the PNG
    /// bytes. Collisions are negligible-probability and not security-relevant.
    pub fn fingerprint(&self) -> Option<u64> {
        match self {
            Snapshot::Text(text) => Some(hash64(text.as_bytes())),
            Snapshot::Image(image) => Some(hash64(&image.png)),
            Snapshot::File(path) => Some(hash64(path.to_string_lossy().as_bytes())),
            Snapshot::Empty => None,
        }
    }

    /// Build the history entry for this snapshot; `Empty` yields nothing
    pub fn into_entry(self) -> Option<ClipboardEntry> {
        match self {
            Snapshot::Text(text) => Some(ClipboardEntry::new_text(text)),
            Snapshot::Image(image) => {
                let preview = format!("data:image/png;base64,{}", BASE64.encode(&image.png));
                Some(ClipboardEntry::new_image(image.width, image.height, preview))
            }
            Snapshot::File(path) => {
                let glyph = path
                    .extension()
                    .map(|ext| icons::icon_for(&ext.to_string_lossy()))
                    .unwrap_or(icons::DEFAULT_GLYPH);
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned());
                let file_path = path.to_string_lossy().into_owned();
                Some(ClipboardEntry::new_file(glyph, &file_name, file_path))
            }
            Snapshot::Empty => None,
        }
    }
}

/// OS clipboard collaborator contract.
///
/// Readers return `Ok(None)` when the representation is absent; errors are
/// tolerated by [`read_snapshot`] and degrade to the next representation.
pub trait ClipboardDevice: Send + Sync {
    fn read_text(&self) -> EngineResult<Option<String>>;
    fn read_image(&self) -> EngineResult<Option<ImageData>>;
    fn read_files(&self) -> EngineResult<Option<Vec<String>>>;

    fn write_text(&self, text: &str) -> EngineResult<()>;
    fn write_image(&self, png: &[u8]) -> EngineResult<()>;
    fn write_files(&self, paths: &[String]) -> EngineResult<()>;
}

/// Read one snapshot applying the File > Text > Image precedence.
///
/// Never fails outward: a device error or an empty representation simply
/// falls through to the next check, and `Empty` is the final fallback.
pub fn read_snapshot(device: &dyn ClipboardDevice) -> Snapshot {
    if let Ok(Some(files)) = device.read_files() {
        if let Some(path) = files.into_iter().find(|p| !p.is_empty()) {
            return Snapshot::File(PathBuf::from(path));
        }
    }

    if let Ok(Some(text)) = device.read_text() {
        if !text.is_empty() {
            return Snapshot::Text(text);
        }
    }

    if let Ok(Some(image)) = device.read_image() {
        if !image.png.is_empty() {
            return Snapshot::Image(image);
        }
    }

    Snapshot::Empty
}

/// System clipboard backed by `clipboard-rs`
pub struct SystemClipboard {
    inner: Arc<Mutex<ClipboardContext>>,
}

fn clipboard_err<T>(
    result: std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>,
) -> EngineResult<T> {
    result.map_err(|e| EngineError::Clipboard(e.to_string()))
}

impl SystemClipboard {
    pub fn new() -> EngineResult<Self> {
        let context = ClipboardContext::new()
            .map_err(|e| EngineError::Clipboard(format!("ClipboardContext::new failed: {}", e)))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(context)),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClipboardContext> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ClipboardDevice for SystemClipboard {
    fn read_text(&self) -> EngineResult<Option<String>> {
        let ctx = self.lock();
        if !ctx.has(ContentFormat::Text) {
            return Ok(None);
        }
        clipboard_err(ctx.get_text()).map(Some)
    }

    fn read_image(&self) -> EngineResult<Option<ImageData>> {
        let ctx = self.lock();
        if !ctx.has(ContentFormat::Image) {
            return Ok(None);
        }
        let image = clipboard_err(ctx.get_image())?;
        let (width, height) = image.get_size();
        let png = clipboard_err(image.to_png())?;
        Ok(Some(ImageData {
            png: png.get_bytes().to_vec(),
            width,
            height,
        }))
    }

    fn read_files(&self) -> EngineResult<Option<Vec<String>>> {
        let ctx = self.lock();
        if !ctx.has(ContentFormat::Files) {
            return Ok(None);
        }
        clipboard_err(ctx.get_files()).map(Some)
    }

    fn write_text(&self, text: &str) -> EngineResult<()> {
        clipboard_err(self.lock().set_text(text.to_string()))
    }

    fn write_image(&self, png: &[u8]) -> EngineResult<()> {
        let image = RustImageData::from_bytes(png)
            .map_err(|e| EngineError::Clipboard(e.to_string()))?;
        clipboard_err(self.lock().set_image(image))
    }

    fn write_files(&self, paths: &[String]) -> EngineResult<()> {
        clipboard_err(self.lock().set_files(paths.to_vec()))
    }
}
