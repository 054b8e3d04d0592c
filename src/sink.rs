//! Destinations for the generated document.
//!
//! The generator only talks to the [`Sink`] trait. Callers pick standard
//! output, a file, or an in-memory buffer.

use crate::error::{Error, Result};
use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, info};

/// A destination for rendered text.
pub trait Sink {
    /// Appends `text` to the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn write(&mut self, text: &str) -> Result<()>;

    /// Completes the output. Called once after the last write.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or persisting the output fails.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Human-readable name of the destination, for log messages.
    fn describe(&self) -> String;
}

/// Writes to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    /// Creates a new stdout sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Sink for StdoutSink {
    fn write(&mut self, text: &str) -> Result<()> {
        io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .map_err(|e| Error::io("<stdout>", e))
    }

    fn finish(&mut self) -> Result<()> {
        io::stdout().flush().map_err(|e| Error::io("<stdout>", e))
    }

    fn describe(&self) -> String {
        "stdout".to_string()
    }
}

/// Collects output in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: String,
}

impl MemorySink {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.buffer
    }

    /// Consumes the sink, returning the buffer.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.buffer
    }
}

impl Sink for MemorySink {
    fn write(&mut self, text: &str) -> Result<()> {
        self.buffer.push_str(text);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory buffer".to_string()
    }
}

/// Writes to a file atomically.
///
/// Output goes to a temporary sibling file, opened on the first write, and is
/// renamed over the target by [`Sink::finish`]. A sink dropped before
/// `finish` closes and removes the temporary file, leaving the target
/// untouched.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    backup_existing: bool,
    pending: Option<PendingFile>,
}

#[derive(Debug)]
struct PendingFile {
    path: PathBuf,
    writer: BufWriter<fs::File>,
}

impl FileSink {
    /// Creates a sink for `path`. Nothing touches the disk until the first
    /// write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_existing: false,
            pending: None,
        }
    }

    /// Keeps a timestamped copy of an existing target before replacing it.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = enabled;
        self
    }

    /// The target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn pending(&mut self) -> Result<&mut PendingFile> {
        if self.pending.is_none() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }

            let temp_path = self.temp_path();
            let file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
            debug!("Opened temporary output {}", temp_path.display());

            self.pending = Some(PendingFile {
                path: temp_path,
                writer: BufWriter::new(file),
            });
        }

        self.pending
            .as_mut()
            .ok_or_else(|| Error::config("Output file is not open"))
    }

    /// Creates a timestamped backup of an existing file.
    fn backup_file(path: &Path) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());

        let filename = path
            .file_name()
            .ok_or_else(|| Error::config("Invalid file path"))?
            .to_string_lossy();

        let backup_path = path.with_file_name(format!("{filename}.backup.{timestamp}"));

        fs::copy(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(())
    }

    /// Flushes the temporary file to disk and renames it over the target.
    fn persist(&self, temp_path: &Path, writer: BufWriter<fs::File>) -> Result<()> {
        let file = writer
            .into_inner()
            .map_err(|e| Error::io(temp_path, e.into_error()))?;

        // Ensure data is flushed to disk
        file.sync_all().map_err(|e| Error::io(temp_path, e))?;
        drop(file);

        if self.backup_existing && self.path.exists() {
            Self::backup_file(&self.path)?;
        }

        fs::rename(temp_path, &self.path).map_err(|e| Error::io(&self.path, e))
    }
}

impl Sink for FileSink {
    fn write(&mut self, text: &str) -> Result<()> {
        let pending = self.pending()?;
        pending
            .writer
            .write_all(text.as_bytes())
            .map_err(|e| Error::io(&pending.path, e))
    }

    fn finish(&mut self) -> Result<()> {
        self.pending()?;
        let Some(PendingFile { path: temp_path, writer }) = self.pending.take() else {
            return Ok(());
        };

        if let Err(e) = self.persist(&temp_path, writer) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        info!("Prompt written to {}", self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Some(PendingFile { path, writer }) = self.pending.take() {
            drop(writer);
            let _ = fs::remove_file(&path);
        }
    }
}
