use crate::error::{Error, Result};
use crate::filter::DEFAULT_EXCLUDE_PATTERNS;
use crate::pattern::PatternSet;
use std::path::PathBuf;

const DEFAULT_GIT_PROGRAM: &str = "git";

/// Output format for the generated prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Markdown document with a file tree and fenced file contents
    #[default]
    Markdown,
    /// JSON document with the tree and a list of files
    Json,
}

impl OutputFormat {
    /// Returns the template name for this format.
    #[must_use]
    pub const fn template_name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
        }
    }
}

/// Options for a single scan.
///
/// Every scan receives its own configuration; there are no process-wide
/// defaults to mutate. Use [`Config::builder()`] to construct one.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Root directory to scan
    pub root_dir: PathBuf,

    /// Exclude globs, already resolved against the defaults
    pub exclude_patterns: Vec<String>,

    /// Include globs; empty means every non-excluded file is kept
    pub include_patterns: Vec<String>,

    /// Whether to honour the root `.gitignore` and the global excludes file
    pub respect_gitignore: bool,

    /// Program queried for `core.excludesfile`
    pub git_program: String,

    /// Output format
    pub format: OutputFormat,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use codebase_prompt::Config;
    ///
    /// let config = Config::builder()
    ///     .root_dir(".")
    ///     .include_patterns(vec!["*.rs".to_string()])
    ///     .build()
    ///     .expect("valid configuration");
    /// assert!(config.respect_gitignore);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Root directory doesn't exist or is not a directory
    /// - An include or exclude glob does not compile
    /// - The git program name is empty
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                self.root_dir.display()
            )));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        PatternSet::from_globs(&self.exclude_patterns)?;
        PatternSet::from_globs(&self.include_patterns)?;

        if self.git_program.trim().is_empty() {
            return Err(Error::config("git_program must not be empty"));
        }

        Ok(())
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    root_dir: Option<PathBuf>,
    exclude_patterns: Option<Vec<String>>,
    include_patterns: Vec<String>,
    respect_gitignore: Option<bool>,
    git_program: Option<String>,
    format: Option<OutputFormat>,
}

impl ConfigBuilder {
    /// Sets the root directory to scan.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Replaces the default exclude patterns.
    ///
    /// The defaults are `__pycache__`, `*.pyc`, `node_modules` and
    /// `.DS_Store`. Passing an empty list disables them. `.git` stays excluded
    /// either way.
    #[must_use]
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = Some(patterns);
        self
    }

    /// Restricts files to those matching at least one of these globs.
    #[must_use]
    pub fn include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    /// Enables or disables `.gitignore` handling (enabled by default).
    #[must_use]
    pub fn respect_gitignore(mut self, enabled: bool) -> Self {
        self.respect_gitignore = Some(enabled);
        self
    }

    /// Sets the program used to look up the global excludes file.
    #[must_use]
    pub fn git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = Some(program.into());
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            root_dir: self.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            exclude_patterns: self.exclude_patterns.unwrap_or_else(|| {
                DEFAULT_EXCLUDE_PATTERNS
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            }),
            include_patterns: self.include_patterns,
            respect_gitignore: self.respect_gitignore.unwrap_or(true),
            git_program: self
                .git_program
                .unwrap_or_else(|| DEFAULT_GIT_PROGRAM.to_string()),
            format: self.format.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder().root_dir(temp.path()).build().unwrap();

        assert_eq!(
            config.exclude_patterns,
            vec!["__pycache__", "*.pyc", "node_modules", ".DS_Store"]
        );
        assert!(config.include_patterns.is_empty());
        assert!(config.respect_gitignore);
        assert_eq!(config.git_program, "git");
        assert_eq!(config.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_explicit_empty_excludes_replace_defaults() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .exclude_patterns(Vec::new())
            .build()
            .unwrap();

        assert!(config.exclude_patterns.is_empty());
    }

    #[test]
    fn test_invalid_root_dir() {
        let result = Config::builder()
            .root_dir("/nonexistent/path/that/should/not/exist")
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_root_must_be_directory() {
        use assert_fs::prelude::*;

        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("file.txt");
        file.write_str("content").unwrap();

        let result = Config::builder().root_dir(file.path()).build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_invalid_pattern() {
        let temp = assert_fs::TempDir::new().unwrap();

        let result = Config::builder()
            .root_dir(temp.path())
            .include_patterns(vec!["src/[".to_string()])
            .build();

        assert!(result.unwrap_err().is_invalid_pattern());
    }

    #[test]
    fn test_empty_git_program() {
        let temp = assert_fs::TempDir::new().unwrap();

        let result = Config::builder()
            .root_dir(temp.path())
            .git_program("  ")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_format_template_name() {
        assert_eq!(OutputFormat::Markdown.template_name(), "markdown");
        assert_eq!(OutputFormat::Json.template_name(), "json");
    }
}
