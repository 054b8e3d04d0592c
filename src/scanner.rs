use crate::{
    config::Config,
    error::Result,
    file::{slash_path, FileData},
    filter::PathFilter,
};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Statistics collected during scanning.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    /// Directories listed
    pub directories: usize,

    /// Files listed
    pub files: usize,

    /// Listed files whose content could not be read
    pub unreadable_files: usize,

    /// Entries dropped by the filter (pruned directories count once)
    pub skipped_entries: usize,

    /// Errors reported by the directory walk
    pub walk_errors: usize,
}

/// Kind of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory (including a symlink to one, which is not descended)
    Directory,
    /// Anything else
    File,
}

/// One node of the surviving tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the scan root, `/`-separated
    pub relative_path: String,

    /// Directory or file
    pub kind: EntryKind,
}

impl TreeEntry {
    /// Returns true for directories.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntryKind::Directory => write!(f, "📁 {}/", self.relative_path),
            EntryKind::File => write!(f, "📄 {}", self.relative_path),
        }
    }
}

/// Ordered listing and file contents of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Every surviving directory and file, depth-first in name order
    pub listing: Vec<TreeEntry>,

    /// Content records for the files in `listing`, in the same order
    pub files: Vec<FileData>,

    /// Counters for the scan
    pub stats: ScanStats,
}

impl ScanResult {
    /// Display labels for the listing.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.listing.iter().map(ToString::to_string).collect()
    }
}

/// Walks the root directory and collects the files the filter keeps.
#[derive(Debug, Clone)]
pub struct Scanner {
    root_dir: PathBuf,
    filter: PathFilter,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the include or exclude globs do not compile.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_filter(&config.root_dir, PathFilter::new(config)?))
    }

    /// Creates a scanner with a prepared filter.
    #[must_use]
    pub fn with_filter(root_dir: impl Into<PathBuf>, filter: PathFilter) -> Self {
        Self {
            root_dir: root_dir.into(),
            filter,
        }
    }

    /// Scans the root directory.
    ///
    /// Excluded directories are pruned before their contents are read. A
    /// missing root or an unreadable directory is logged and yields whatever
    /// could be listed; per-file read failures end up in the content records.
    #[must_use]
    pub fn scan(&self) -> ScanResult {
        debug!("Starting scan of {}", self.root_dir.display());

        let mut result = ScanResult::default();
        let mut skipped = 0;

        let walker = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let keep = self.keep_entry(entry);
                if !keep {
                    skipped += 1;
                }
                keep
            });

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    result.stats.walk_errors += 1;
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let Some(relative_path) = self.relative_path(entry.path()) else {
                continue;
            };

            if is_directory(&entry) {
                result.stats.directories += 1;
                result.listing.push(TreeEntry {
                    relative_path,
                    kind: EntryKind::Directory,
                });
            } else {
                let data = FileData::read(entry.path(), relative_path.clone());
                if data.is_unreadable() {
                    result.stats.unreadable_files += 1;
                }
                result.stats.files += 1;
                result.listing.push(TreeEntry {
                    relative_path,
                    kind: EntryKind::File,
                });
                result.files.push(data);
            }
        }

        result.stats.skipped_entries = skipped;

        debug!(
            "Scan complete: {} directories, {} files, {} unreadable, {} skipped, {} errors",
            result.stats.directories,
            result.stats.files,
            result.stats.unreadable_files,
            result.stats.skipped_entries,
            result.stats.walk_errors
        );

        result
    }

    /// Pruning and selection decision for one walk entry.
    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        let Some(relative_path) = self.relative_path(entry.path()) else {
            return false;
        };

        if is_directory(entry) {
            self.filter.should_descend(&relative_path)
        } else {
            self.filter.should_process(&relative_path)
        }
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = pathdiff::diff_paths(path, &self.root_dir)?;
        let relative = slash_path(&relative);
        (!relative.is_empty()).then_some(relative)
    }
}

/// Directories and symlinks to directories.
fn is_directory(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir())
}
