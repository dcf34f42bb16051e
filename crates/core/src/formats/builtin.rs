//! Built-in conversion tables used when the service catalog is unavailable.

use crate::task::Category;

use super::FormatTable;

const DOCUMENT: &[(&str, &[&str])] = &[
    ("pdf", &["doc", "docx", "ppt", "pptx", "xls", "xlsx", "txt", "rtf"]),
    ("doc", &["docx", "rtf", "txt", "odt", "html", "pdf"]),
    ("docx", &["doc", "rtf", "txt", "odt", "html", "pdf"]),
    ("xlsx", &["xls", "ods", "csv", "txt", "pdf", "doc"]),
    ("xls", &["xlsx", "ods", "csv", "txt", "pdf", "doc"]),
    ("pptx", &["ppt", "odp", "pdf"]),
    ("ppt", &["pptx", "odp", "pdf"]),
    ("txt", &["doc", "docx", "rtf", "odt", "pdf", "xls", "xlsx"]),
    ("rtf", &["doc", "docx", "txt", "odt"]),
    ("html", &["pdf", "doc", "docx"]),
];

const AUDIO: &[(&str, &[&str])] = &[
    ("mp3", &["mp3", "wav", "aac", "flac", "m4a", "ogg", "wma"]),
    ("wav", &["wav", "mp3", "aac", "flac", "m4a", "ogg", "wma"]),
    ("aac", &["aac", "mp3", "wav", "m4a", "flac"]),
    ("flac", &["flac", "wav", "mp3", "aac"]),
    ("ogg", &["ogg", "mp3", "wav", "flac"]),
    ("m4a", &["m4a", "mp3", "wav", "aac"]),
];

const IMAGE: &[(&str, &[&str])] = &[
    ("jpg", &["png", "webp", "bmp", "pdf"]),
    ("png", &["jpg", "webp", "bmp", "pdf"]),
    ("webp", &["jpg", "png", "pdf"]),
    ("bmp", &["jpg", "png", "pdf"]),
];

/// Extra file extensions accepted for a source format besides its own.
const EXTENSION_ALIASES: &[(&str, &[&str])] = &[("html", &[".htm"]), ("jpg", &[".jpeg"])];

/// The built-in source -> targets table for `category`.
pub fn builtin_table(category: Category) -> FormatTable {
    let rows = match category {
        Category::Document => DOCUMENT,
        Category::Audio => AUDIO,
        Category::Image => IMAGE,
    };

    rows.iter()
        .map(|(source, targets)| {
            (
                source.to_string(),
                targets.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

/// Dot-prefixed file extensions accepted for files of `source` format.
pub fn builtin_allowed_extensions(source: &str) -> Vec<String> {
    let source = source.trim_start_matches('.').to_ascii_lowercase();
    let mut extensions = vec![format!(".{source}")];
    if let Some((_, aliases)) = EXTENSION_ALIASES.iter().find(|(s, _)| *s == source) {
        extensions.extend(aliases.iter().map(|a| a.to_string()));
    }
    extensions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_table() {
        let table = builtin_table(Category::Document);
        assert!(table["pdf"].contains(&"docx".to_string()));
        assert!(table["doc"].contains(&"pdf".to_string()));
        assert!(table["txt"].contains(&"doc".to_string()));
        assert!(table.keys().all(|k| !k.starts_with('.')));
    }

    #[test]
    fn test_audio_table() {
        let table = builtin_table(Category::Audio);
        assert_eq!(table.len(), 6);
        assert!(table["flac"].contains(&"mp3".to_string()));
        assert!(!table.contains_key("wma"));
    }

    #[test]
    fn test_allowed_extensions_with_aliases() {
        assert_eq!(builtin_allowed_extensions("pdf"), vec![".pdf"]);
        assert_eq!(builtin_allowed_extensions("html"), vec![".html", ".htm"]);
        assert_eq!(builtin_allowed_extensions(".JPG"), vec![".jpg", ".jpeg"]);
    }
}
