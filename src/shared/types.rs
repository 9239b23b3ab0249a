use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of clipboard content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Text,
    Image,
    File,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Text => "text",
            EntryKind::Image => "image",
            EntryKind::File => "file",
        }
    }
}

/// Kind-specific payload of a history entry.
///
/// Modeled as a sum type so an image entry cannot exist without its preview
/// and a file entry cannot exist without its path. Flattened into
/// [`ClipboardEntry`] with an internal `kind` tag, which produces the flat
/// persisted shape `{id, kind, content, timestamp, preview?, filePath?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryPayload {
    Text,
    Image {
        /// Inline-renderable data URL (`data:image/png;base64,...`)
        preview: String,
    },
    File {
        /// Absolute path to the referenced file
        #[serde(rename = "filePath")]
        file_path: String,
    },
}

/// A single clipboard history entry, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClipboardEntry {
    pub id: String,
    /// Short display string: full text, `[Image WxH]`, or glyph + file name
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EntryPayload,
}

impl ClipboardEntry {
    /// Create a new text entry
    pub fn new_text(content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            timestamp: Utc::now(),
            payload: EntryPayload::Text,
        }
    }

    /// Create a new image entry with a synthesized `[Image WxH]` label
    pub fn new_image(width: u32, height: u32, preview: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: format!("[Image {}x{}]", width, height),
            timestamp: Utc::now(),
            payload: EntryPayload::Image { preview },
        }
    }

    /// Create a new file entry labeled with an icon glyph and the base name
    pub fn new_file(glyph: &str, file_name: &str, file_path: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: format!("{} {}", glyph, file_name),
            timestamp: Utc::now(),
            payload: EntryPayload::File { file_path },
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self.payload {
            EntryPayload::Text => EntryKind::Text,
            EntryPayload::Image { .. } => EntryKind::Image,
            EntryPayload::File { .. } => EntryKind::File,
        }
    }
}
