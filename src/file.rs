use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

/// A scanned file paired with its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    /// Path relative to the scan root, `/`-separated
    pub relative_path: String,

    /// Decoded text or the reason it could not be read
    pub content: FileContent,
}

/// File content: decoded text, or a read failure kept as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// UTF-8 text; invalid byte sequences are replaced with U+FFFD
    Text(String),

    /// The file could not be read
    Unreadable {
        /// Error message from the failed read
        reason: String,
    },
}

impl fmt::Display for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Unreadable { reason } => write!(f, "[Error reading file: {reason}]"),
        }
    }
}

impl FileData {
    /// Reads a file from disk.
    ///
    /// Never fails: a read error becomes [`FileContent::Unreadable`].
    #[must_use]
    pub fn read(path: &Path, relative_path: String) -> Self {
        trace!("Reading file: {}", path.display());

        match fs::read(path) {
            Ok(bytes) => {
                let text = match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        trace!("Replacing invalid UTF-8 in {}", relative_path);
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                Self::new_text(relative_path, text)
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::new_unreadable(relative_path, e.to_string())
            }
        }
    }

    /// Creates a new text file data.
    #[must_use]
    pub fn new_text(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: FileContent::Text(content.into()),
        }
    }

    /// Creates a record for a file that could not be read.
    #[must_use]
    pub fn new_unreadable(relative_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: FileContent::Unreadable {
                reason: reason.into(),
            },
        }
    }

    /// Returns true if the file was read.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.content, FileContent::Text(_))
    }

    /// Returns true if reading the file failed.
    #[must_use]
    pub const fn is_unreadable(&self) -> bool {
        matches!(self.content, FileContent::Unreadable { .. })
    }

    /// The text to emit for this file: its content, or the error placeholder.
    #[must_use]
    pub fn display_content(&self) -> Cow<'_, str> {
        match &self.content {
            FileContent::Text(text) => Cow::Borrowed(text),
            unreadable @ FileContent::Unreadable { .. } => Cow::Owned(unreadable.to_string()),
        }
    }

    /// Returns the size in bytes of the decoded text.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        match &self.content {
            FileContent::Text(text) => text.len(),
            FileContent::Unreadable { .. } => 0,
        }
    }

    /// Returns the number of lines (for readable files only).
    #[must_use]
    pub fn line_count(&self) -> Option<usize> {
        match &self.content {
            FileContent::Text(text) => Some(text.lines().count()),
            FileContent::Unreadable { .. } => None,
        }
    }
}

/// Joins the components of a relative path with `/`.
pub(crate) fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_file_data_text() {
        let data = FileData::new_text("src/main.rs", "fn main() {}");

        assert!(data.is_text());
        assert!(!data.is_unreadable());
        assert_eq!(data.display_content(), "fn main() {}");
        assert_eq!(data.size_bytes(), 12);
    }

    #[test]
    fn test_file_data_unreadable() {
        let data = FileData::new_unreadable("locked.txt", "Permission denied (os error 13)");

        assert!(data.is_unreadable());
        assert_eq!(
            data.display_content(),
            "[Error reading file: Permission denied (os error 13)]"
        );
        assert_eq!(data.size_bytes(), 0);
        assert_eq!(data.line_count(), None);
    }

    #[test]
    fn test_read_text_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("notes.txt");
        file.write_str("line1\nline2\nline3").unwrap();

        let data = FileData::read(file.path(), "notes.txt".to_string());

        assert_eq!(data.content, FileContent::Text("line1\nline2\nline3".to_string()));
        assert_eq!(data.line_count(), Some(3));
    }

    #[test]
    fn test_read_replaces_invalid_utf8() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("mixed.bin");
        file.write_binary(b"ok \xff\xfe end").unwrap();

        let data = FileData::read(file.path(), "mixed.bin".to_string());

        assert!(data.is_text());
        assert_eq!(data.display_content(), "ok \u{FFFD}\u{FFFD} end");
    }

    #[test]
    fn test_read_missing_file_is_placeholder() {
        let temp = assert_fs::TempDir::new().unwrap();
        let missing = temp.path().join("gone.txt");

        let data = FileData::read(&missing, "gone.txt".to_string());

        assert!(data.is_unreadable());
        assert!(data.display_content().starts_with("[Error reading file: "));
    }

    #[test]
    fn test_slash_path() {
        let path: std::path::PathBuf = ["a", "b", "c.txt"].iter().collect();
        assert_eq!(slash_path(&path), "a/b/c.txt");
    }
}
