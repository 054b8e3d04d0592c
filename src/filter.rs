//! Path filtering: the single exclude/include decision used by the scanner.
//!
//! Three exclusion sources are ORed together: the always-exclude set that
//! protects version-control metadata, the caller's exclude globs, and the
//! gitignore matcher. Include globs only narrow what survives.

use crate::{
    config::Config,
    error::Result,
    gitignore::GitignoreMatcher,
    pattern::{Pattern, PatternSet},
};
use once_cell::sync::Lazy;
use std::path::Path;
use tracing::trace;

/// Patterns that are always excluded and cannot be re-included.
pub const ALWAYS_EXCLUDE_PATTERNS: [&str; 3] = [".git", ".git/", ".git/**"];

/// Exclude patterns used when the caller does not provide any.
pub const DEFAULT_EXCLUDE_PATTERNS: [&str; 4] = ["__pycache__", "*.pyc", "node_modules", ".DS_Store"];

static ALWAYS_EXCLUDE: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::lenient(
        ALWAYS_EXCLUDE_PATTERNS.into_iter().map(Pattern::literal),
        "always-exclude set",
    )
});

/// Decides which paths a scan keeps.
///
/// All paths are relative to the scan root and use `/` as separator.
#[derive(Debug, Clone)]
pub struct PathFilter {
    exclude: PatternSet,
    include: Option<PatternSet>,
    gitignore: Option<GitignoreMatcher>,
}

impl PathFilter {
    /// Builds the filter for a scan configuration, loading gitignore sources
    /// when `respect_gitignore` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if a caller-supplied glob does not compile.
    pub fn new(config: &Config) -> Result<Self> {
        let gitignore = config
            .respect_gitignore
            .then(|| GitignoreMatcher::load(&config.root_dir, &config.git_program));

        Self::from_parts(&config.exclude_patterns, &config.include_patterns, gitignore)
    }

    /// Builds a filter from explicit pattern lists and an optional gitignore
    /// matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob does not compile.
    pub fn from_parts<S: AsRef<str>>(
        exclude_patterns: &[S],
        include_patterns: &[S],
        gitignore: Option<GitignoreMatcher>,
    ) -> Result<Self> {
        let exclude = PatternSet::from_globs(exclude_patterns)?;

        let include = if include_patterns.is_empty() {
            None
        } else {
            Some(PatternSet::from_globs(include_patterns)?)
        };

        Ok(Self {
            exclude,
            include,
            gitignore,
        })
    }

    /// Returns true if the path must be left out of the scan.
    #[must_use]
    pub fn is_excluded(&self, relative_path: &str, is_dir: bool) -> bool {
        if ALWAYS_EXCLUDE.is_match(relative_path, is_dir) {
            trace!("'{}' is version-control metadata", relative_path);
            return true;
        }

        if self.exclude.is_match(relative_path, is_dir) {
            trace!("'{}' matched an exclude pattern", relative_path);
            return true;
        }

        if let Some(gitignore) = &self.gitignore {
            if gitignore.is_ignored(Path::new(relative_path), is_dir) {
                trace!("'{}' is ignored by gitignore", relative_path);
                return true;
            }
        }

        false
    }

    /// Returns true if the path passes the include filter.
    ///
    /// With no include patterns every path passes.
    #[must_use]
    pub fn is_included(&self, relative_path: &str) -> bool {
        self.include
            .as_ref()
            .is_none_or(|include| include.is_match(relative_path, false))
    }

    /// Whether the scanner may descend into a directory.
    ///
    /// Directories are structural, so include patterns are not consulted.
    #[must_use]
    pub fn should_descend(&self, relative_path: &str) -> bool {
        !self.is_excluded(relative_path, true)
    }

    /// Whether a file is kept: not excluded, then included.
    #[must_use]
    pub fn should_process(&self, relative_path: &str) -> bool {
        !self.is_excluded(relative_path, false) && self.is_included(relative_path)
    }

    /// Returns true if gitignore sources are consulted.
    #[must_use]
    pub const fn respects_gitignore(&self) -> bool {
        self.gitignore.is_some()
    }
}
