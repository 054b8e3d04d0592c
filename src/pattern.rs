//! Glob patterns and compiled pattern sets.
//!
//! A [`Pattern`] is one line of gitignore dialect or one caller-supplied glob.
//! A [`PatternSet`] compiles an ordered list of them into a single
//! [`GlobSet`] and answers whether a relative path matches any of them, trying
//! both the full `/`-separated path and its final component.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fmt;
use tracing::{trace, warn};

/// A single glob pattern with the gitignore markers already interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    glob: String,
    dir_only: bool,
    negated: bool,
    anchored: bool,
}

impl Pattern {
    /// Creates a pattern from a caller-supplied glob, used verbatim.
    #[must_use]
    pub fn literal(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            glob: raw.clone(),
            raw,
            dir_only: false,
            negated: false,
            anchored: false,
        }
    }

    /// Parses one line of a `.gitignore` file.
    ///
    /// Returns `None` for blank lines and `#` comments. A trailing `/` marks
    /// the pattern as directory-only, a leading `/` anchors it to the root.
    ///
    /// A leading `!` is stripped and the remainder is used as an ordinary
    /// exclude pattern. It does **not** re-include previously excluded paths
    /// the way git does; [`Pattern::is_negated`] records that it was present.
    #[must_use]
    pub fn from_gitignore_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let mut glob = trimmed;

        let negated = glob.starts_with('!');
        if negated {
            glob = &glob[1..];
        }

        let dir_only = glob.ends_with('/');
        glob = glob.trim_end_matches('/');

        let anchored = glob.starts_with('/');
        glob = glob.trim_start_matches('/');

        if glob.is_empty() {
            return None;
        }

        Some(Self {
            raw: trimmed.to_string(),
            glob: glob.to_string(),
            dir_only,
            negated,
            anchored,
        })
    }

    /// The text the pattern was created from.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The glob actually compiled for matching.
    #[must_use]
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Whether the pattern only applies to directories (trailing `/`).
    #[must_use]
    pub const fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    /// Whether the source line started with `!`.
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }

    /// Whether the pattern only matches the full relative path (leading `/`).
    #[must_use]
    pub const fn is_anchored(&self) -> bool {
        self.anchored
    }

    fn applies_to(&self, is_dir: bool) -> bool {
        !self.dir_only || is_dir
    }

    fn compile(&self) -> std::result::Result<Glob, globset::Error> {
        Glob::new(&self.glob)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// An ordered collection of patterns from one source, compiled for matching.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    globs: GlobSet,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl PatternSet {
    /// A set that matches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            globs: GlobSet::empty(),
        }
    }

    /// Compiles caller-supplied globs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first glob that fails to
    /// compile.
    pub fn from_globs<I, S>(globs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<Pattern> = globs
            .into_iter()
            .map(|g| Pattern::literal(g.as_ref()))
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = pattern
                .compile()
                .map_err(|e| Error::invalid_pattern(pattern.raw(), e.kind().to_string()))?;
            builder.add(glob);
        }

        let globs = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))?;

        Ok(Self { patterns, globs })
    }

    /// Parses gitignore text, skipping comments, blank lines and any line
    /// whose glob does not compile.
    ///
    /// `source` only labels the warnings.
    #[must_use]
    pub fn from_gitignore(contents: &str, source: &str) -> Self {
        let parsed = contents.lines().filter_map(Pattern::from_gitignore_line);
        Self::lenient(parsed, source)
    }

    /// Compiles already-parsed patterns, dropping the ones that fail with a
    /// warning instead of an error.
    #[must_use]
    pub fn lenient(patterns: impl IntoIterator<Item = Pattern>, source: &str) -> Self {
        let mut kept = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            match pattern.compile() {
                Ok(glob) => {
                    builder.add(glob);
                    kept.push(pattern);
                }
                Err(e) => {
                    warn!("Skipping invalid pattern '{}' in {}: {}", pattern.raw(), source, e);
                }
            }
        }

        match builder.build() {
            Ok(globs) => Self {
                patterns: kept,
                globs,
            },
            Err(e) => {
                warn!("Ignoring all patterns from {}: {}", source, e);
                Self::empty()
            }
        }
    }

    /// The patterns in source order.
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Number of patterns in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if the set holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Tests a `/`-separated relative path against the set.
    ///
    /// Succeeds if any pattern matches either the whole path or its basename.
    /// Anchored patterns only consider the whole path, directory-only
    /// patterns only match when `is_dir` is set.
    #[must_use]
    pub fn is_match(&self, relative_path: &str, is_dir: bool) -> bool {
        if self.is_empty() || relative_path.is_empty() {
            return false;
        }

        let full_hit = self
            .globs
            .matches(relative_path)
            .into_iter()
            .any(|i| self.patterns[i].applies_to(is_dir));

        if full_hit {
            trace!("'{}' matched on full path", relative_path);
            return true;
        }

        let name = basename(relative_path);
        if name == relative_path {
            return false;
        }

        self.globs.matches(name).into_iter().any(|i| {
            let pattern = &self.patterns[i];
            !pattern.anchored && pattern.applies_to(is_dir)
        })
    }
}

/// Final component of a `/`-separated path.
pub(crate) fn basename(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    path.rsplit('/').next().unwrap_or(path)
}
