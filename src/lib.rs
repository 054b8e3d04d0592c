//! # codebase-prompt
//!
//! Walks a repository, filters it with include/exclude globs and `.gitignore`
//! rules, and concatenates what remains into a single prompt for an AI model.
//!
//! ## Features
//!
//! - Caller-supplied include and exclude globs
//! - Root `.gitignore` and git's global `core.excludesfile`
//! - `.git` metadata is always excluded, whatever the patterns say
//! - Excluded directories are pruned, never read
//! - Deterministic, name-sorted output
//! - Unreadable files show up as placeholders instead of aborting the scan
//!
//! ## Quick Start
//!
//! ```no_run
//! use codebase_prompt::{Config, MemorySink};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .root_dir("./my-project")
//!     .include_patterns(vec!["*.rs".to_string(), "*.toml".to_string()])
//!     .build()?;
//!
//! let mut sink = MemorySink::new();
//! codebase_prompt::generate(&config, &mut sink)?;
//! println!("{}", sink.contents());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Filter**: combines the always-exclude set, caller globs and gitignore
//!    sources into one keep/drop decision
//! 2. **Scanner**: walks the tree in name order, pruning excluded directories
//! 3. **Template**: renders the listing and contents as Markdown or JSON
//! 4. **Sink**: receives the finished document

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod file;
mod filter;
mod gitignore;
mod pattern;
mod pipeline;
mod scanner;
mod sink;
mod template;

pub use config::{Config, ConfigBuilder, OutputFormat};
pub use error::{Error, Result};
pub use file::{FileContent, FileData};
pub use filter::{PathFilter, ALWAYS_EXCLUDE_PATTERNS, DEFAULT_EXCLUDE_PATTERNS};
pub use gitignore::{global_excludes_file, GitignoreMatcher, GITIGNORE_FILE};
pub use pattern::{Pattern, PatternSet};
pub use pipeline::{Pipeline, PipelineStats};
pub use scanner::{EntryKind, ScanResult, ScanStats, Scanner, TreeEntry};
pub use sink::{FileSink, MemorySink, Sink, StdoutSink};

/// Scans the configured root and returns the listing and file contents.
///
/// # Errors
///
/// Returns an error if the configuration is invalid. Problems inside the
/// tree (unreadable files, unreadable ignore files) do not fail the scan.
///
/// # Examples
///
/// ```no_run
/// use codebase_prompt::{Config, scan};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .root_dir(".")
///     .exclude_patterns(vec!["target".to_string()])
///     .build()?;
///
/// let result = scan(&config)?;
/// for label in result.labels() {
///     println!("{label}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn scan(config: &Config) -> Result<ScanResult> {
    config.validate()?;
    Ok(Scanner::new(config)?.scan())
}

/// Scans and renders the configured root, returning the document.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or rendering fails.
pub fn render(config: &Config) -> Result<String> {
    Pipeline::new(config.clone())?.render()
}

/// Scans, renders and writes the document to `sink`.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - Rendering fails
/// - Writing to or finishing the sink fails
pub fn generate(config: &Config, sink: &mut dyn Sink) -> Result<PipelineStats> {
    Pipeline::new(config.clone())?.run(sink)
}
