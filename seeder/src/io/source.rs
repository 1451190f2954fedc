//! Enumeration of raw step definition blobs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// One definition blob as read from its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDefinition {
    /// Identifier used as the error key for load failures (a file name).
    pub id: String,
    pub content: String,
}

impl RawDefinition {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// A place step definitions are discovered from.
///
/// Every blob is returned; decoding and error aggregation happen in the loader.
pub trait DefinitionSource {
    fn definitions(&self) -> Result<Vec<RawDefinition>>;
}

/// Definitions stored as files in one directory (not recursive).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    extension: String,
}

impl DirectorySource {
    /// Read every `*.json` file in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_extension(dir, "json")
    }

    pub fn with_extension(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

impl DefinitionSource for DirectorySource {
    /// Files are returned sorted by file name.
    fn definitions(&self) -> Result<Vec<RawDefinition>> {
        debug!(dir = %self.dir.display(), extension = %self.extension, "listing definitions");
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("read definitions dir {}", self.dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("read entry in {}", self.dir.display()))?;
            let path = entry.path();
            if self.matches(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let bytes = fs::read(&path)
                    .with_context(|| format!("read definition {}", path.display()))?;
                let content = decode_text(bytes);
                let id = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                debug!(id = %id, bytes = content.len(), "read definition");
                Ok(RawDefinition { id, content })
            })
            .collect()
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text of a definition file.
///
/// A leading UTF-8 byte order mark is dropped. Invalid UTF-8 is replaced
/// rather than rejected, so the blob reaches the loader and fails there as
/// `FailedToParse` alongside every other bad blob.
fn decode_text(bytes: Vec<u8>) -> String {
    let bytes = if bytes.starts_with(UTF8_BOM) {
        bytes[UTF8_BOM.len()..].to_vec()
    } else {
        bytes
    };
    String::from_utf8(bytes).unwrap_or_else(|err| {
        debug!(error = %err.utf8_error(), "definition is not valid UTF-8");
        String::from_utf8_lossy(err.as_bytes()).into_owned()
    })
}

/// Definitions held in memory, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    blobs: Vec<RawDefinition>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, content: impl Into<String>) -> Self {
        self.push(id, content);
        self
    }

    pub fn push(&mut self, id: impl Into<String>, content: impl Into<String>) {
        self.blobs.push(RawDefinition::new(id, content));
    }
}

impl FromIterator<RawDefinition> for MemorySource {
    fn from_iter<I: IntoIterator<Item = RawDefinition>>(iter: I) -> Self {
        Self {
            blobs: iter.into_iter().collect(),
        }
    }
}

impl DefinitionSource for MemorySource {
    fn definitions(&self) -> Result<Vec<RawDefinition>> {
        Ok(self.blobs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_source_reads_matching_files_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("b.json"), "{\"b\":1}").expect("write b");
        fs::write(temp.path().join("a.JSON"), "{\"a\":1}").expect("write a");
        fs::write(temp.path().join("notes.txt"), "skip").expect("write txt");
        fs::create_dir(temp.path().join("nested.json")).expect("mkdir");

        let blobs = DirectorySource::new(temp.path())
            .definitions()
            .expect("definitions");
        let ids: Vec<&str> = blobs.iter().map(|blob| blob.id.as_str()).collect();
        assert_eq!(ids, vec!["a.JSON", "b.json"]);
        assert_eq!(blobs[1].content, "{\"b\":1}");
    }

    #[test]
    fn directory_source_honors_extension() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("one.seed"), "x").expect("write");
        fs::write(temp.path().join("two.json"), "y").expect("write");
        let blobs = DirectorySource::with_extension(temp.path(), "seed")
            .definitions()
            .expect("definitions");
        assert_eq!(blobs, vec![RawDefinition::new("one.seed", "x")]);
    }

    #[test]
    fn byte_order_mark_is_dropped() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("bom.json"), b"\xEF\xBB\xBF{\"a\":1}").expect("write");
        let blobs = DirectorySource::new(temp.path())
            .definitions()
            .expect("definitions");
        assert_eq!(blobs, vec![RawDefinition::new("bom.json", "{\"a\":1}")]);
    }

    #[test]
    fn invalid_utf8_is_read_lossily() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("bin.json"), [0xFF, 0xFE, b'{']).expect("write");
        let blobs = DirectorySource::new(temp.path())
            .definitions()
            .expect("definitions");
        assert_eq!(blobs[0].content, "\u{fffd}\u{fffd}{");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = DirectorySource::new(temp.path().join("absent"))
            .definitions()
            .expect_err("missing dir");
        assert!(err.to_string().contains("read definitions dir"));
    }

    #[test]
    fn memory_source_keeps_insertion_order() {
        let source = MemorySource::new().with("2", "two").with("1", "one");
        let ids: Vec<String> = source
            .definitions()
            .expect("definitions")
            .into_iter()
            .map(|blob| blob.id)
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }
}
