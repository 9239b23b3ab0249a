//! Extension → icon glyph registry
//!
//! Maps file extensions to display glyphs for file entries.

/// Fallback glyph for unknown extensions
pub const DEFAULT_GLYPH: &str = "📄";

/// Look up the display glyph for a file extension (case-insensitive)
pub fn icon_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "📕",
        "doc" | "docx" | "odt" | "rtf" => "📘",
        "xls" | "xlsx" | "csv" | "numbers" => "📗",
        "ppt" | "pptx" | "key" => "📙",
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "heic" | "svg" => "🖼️",
        "mp3" | "wav" | "flac" | "aac" | "m4a" => "🎵",
        "mp4" | "mov" | "avi" | "mkv" | "webm" => "🎬",
        "zip" | "tar" | "gz" | "rar" | "7z" => "🗜️",
        "rs" | "js" | "ts" | "py" | "go" | "swift" | "c" | "h" | "cpp" | "java" => "📜",
        "json" | "toml" | "yaml" | "yml" | "xml" | "plist" => "⚙️",
        "app" | "dmg" | "pkg" | "exe" => "📦",
        _ => DEFAULT_GLYPH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_resolve() {
        assert_eq!(icon_for("pdf"), "📕");
        assert_eq!(icon_for("PNG"), "🖼️");
        assert_eq!(icon_for("zip"), "🗜️");
    }

    #[test]
    fn unknown_extension_falls_back() {
        assert_eq!(icon_for("xyz"), DEFAULT_GLYPH);
        assert_eq!(icon_for(""), DEFAULT_GLYPH);
    }
}
