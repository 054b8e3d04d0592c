//! `.gitignore` loading for the scan root and the user's global excludes file.

use crate::pattern::PatternSet;
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
    process::Command,
};
use tracing::{debug, warn};

/// Name of the ignore file read from the scan root.
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Matches paths against the local `.gitignore` and the global excludes file.
///
/// Paths are interpreted relative to the scan root. Absolute paths are made
/// relative first; anything outside the root never matches.
#[derive(Debug, Clone)]
pub struct GitignoreMatcher {
    root: PathBuf,
    canonical_root: Option<PathBuf>,
    local: PatternSet,
    global: PatternSet,
}

impl GitignoreMatcher {
    /// Loads `<root>/.gitignore` and the file named by git's
    /// `core.excludesfile`, queried through `git_program`.
    ///
    /// Never fails: every missing or unreadable source contributes nothing.
    #[must_use]
    pub fn load(root: impl Into<PathBuf>, git_program: &str) -> Self {
        let root = root.into();
        let local_path = root.join(GITIGNORE_FILE);
        let global_path = global_excludes_file(git_program);

        Self::from_files(root, Some(&local_path), global_path.as_deref())
    }

    /// Builds a matcher from explicit ignore file locations.
    #[must_use]
    pub fn from_files(root: impl Into<PathBuf>, local: Option<&Path>, global: Option<&Path>) -> Self {
        let local = local.map(read_ignore_file).unwrap_or_default();
        let global = global.map(read_ignore_file).unwrap_or_default();

        Self::from_sets(root, local, global)
    }

    /// Builds a matcher from already-parsed pattern sets.
    #[must_use]
    pub fn from_sets(root: impl Into<PathBuf>, local: PatternSet, global: PatternSet) -> Self {
        let root = root.into();
        let canonical_root = fs::canonicalize(&root).ok().filter(|c| *c != root);

        debug!(
            "Gitignore matcher for {}: {} local, {} global patterns",
            root.display(),
            local.len(),
            global.len()
        );

        Self {
            root,
            canonical_root,
            local,
            global,
        }
    }

    /// Patterns read from the root `.gitignore`.
    #[must_use]
    pub const fn local(&self) -> &PatternSet {
        &self.local
    }

    /// Patterns read from the global excludes file.
    #[must_use]
    pub const fn global(&self) -> &PatternSet {
        &self.global
    }

    /// Returns true if either source ignores `path`.
    ///
    /// `path` itself and each of its ancestor directories are tested, so a
    /// file under an ignored directory is reported as ignored too.
    #[must_use]
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        if self.local.is_empty() && self.global.is_empty() {
            return false;
        }

        let Some(components) = self.relative_components(path) else {
            return false;
        };

        let last = components.len().saturating_sub(1);
        let mut prefix = String::new();

        for (depth, component) in components.iter().enumerate() {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(component);

            let component_is_dir = depth < last || is_dir;
            if self.local.is_match(&prefix, component_is_dir)
                || self.global.is_match(&prefix, component_is_dir)
            {
                return true;
            }
        }

        false
    }

    /// Splits `path` into normal components relative to the root.
    fn relative_components(&self, path: &Path) -> Option<Vec<String>> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root)
                .ok()
                .or_else(|| {
                    self.canonical_root
                        .as_deref()
                        .and_then(|root| path.strip_prefix(root).ok())
                })?
        } else {
            path
        };

        let mut components = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => components.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                // `..`, a root or a prefix would leave the root's jurisdiction
                _ => return None,
            }
        }

        if components.is_empty() {
            None
        } else {
            Some(components)
        }
    }
}

/// Reads an ignore file into a pattern set.
///
/// A missing file is silent, any other failure is logged. Both yield an empty
/// set. Undecodable bytes are replaced rather than rejected.
pub(crate) fn read_ignore_file(path: &Path) -> PatternSet {
    match fs::read(path) {
        Ok(bytes) => {
            let contents = String::from_utf8_lossy(&bytes);
            PatternSet::from_gitignore(&contents, &path.display().to_string())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No ignore file at {}", path.display());
            PatternSet::empty()
        }
        Err(e) => {
            warn!("Failed to read ignore file {}: {}", path.display(), e);
            PatternSet::empty()
        }
    }
}

/// Asks git for the user's global excludes file.
///
/// Runs `<git_program> config --global --get core.excludesfile`. Returns
/// `None` when the program is missing, exits non-zero, or prints nothing.
#[must_use]
pub fn global_excludes_file(git_program: &str) -> Option<PathBuf> {
    let output = match Command::new(git_program)
        .args(["config", "--global", "--get", "core.excludesfile"])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            warn!("Could not run '{}' to find global excludes: {}", git_program, e);
            return None;
        }
    };

    if !output.status.success() {
        debug!(
            "'{} config --global --get core.excludesfile' exited with {}",
            git_program, output.status
        );
        return None;
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let path = expand_home(raw);
    debug!("Global excludes file: {}", path.display());
    Some(path)
}

/// Expands a leading `~` to the home directory, as git does for this setting.
fn expand_home(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(raw),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn matcher_with(local: &str, global: &str) -> GitignoreMatcher {
        GitignoreMatcher::from_sets(
            "/fake/root",
            PatternSet::from_gitignore(local, "local"),
            PatternSet::from_gitignore(global, "global"),
        )
    }

    #[test]
    fn test_relative_paths() {
        let matcher = matcher_with("*.txt\ntest/\n", "");

        assert!(matcher.is_ignored(Path::new("file.txt"), false));
        assert!(!matcher.is_ignored(Path::new("file.py"), false));
        assert!(matcher.is_ignored(Path::new("test"), true));
        assert!(matcher.is_ignored(Path::new("test/file.py"), false));
        assert!(matcher.is_ignored(Path::new("./nested/file.txt"), false));
    }

    #[test]
    fn test_absolute_paths_inside_root() {
        let matcher = matcher_with("*.txt\ntest/\n", "");
        let root = Path::new("/fake/root");

        assert!(matcher.is_ignored(&root.join("file.txt"), false));
        assert!(!matcher.is_ignored(&root.join("file.py"), false));
        assert!(matcher.is_ignored(&root.join("test/file.py"), false));
    }

    #[test]
    fn test_paths_outside_root_never_match() {
        let matcher = matcher_with("*.txt\n", "");

        assert!(!matcher.is_ignored(Path::new("/other/path/file.txt"), false));
        assert!(!matcher.is_ignored(Path::new("../file.txt"), false));
        assert!(!matcher.is_ignored(Path::new("/fake/root"), true));
    }

    #[test]
    fn test_dir_only_pattern_does_not_match_file() {
        let matcher = matcher_with("logs/\n", "");

        assert!(!matcher.is_ignored(Path::new("logs"), false));
        assert!(matcher.is_ignored(Path::new("logs"), true));
        assert!(matcher.is_ignored(Path::new("logs/today.txt"), false));
    }

    #[test]
    fn test_global_patterns_are_ored() {
        let matcher = matcher_with("*.log\n", ".idea/\n*.swp\n");

        assert!(matcher.is_ignored(Path::new("app.log"), false));
        assert!(matcher.is_ignored(Path::new("src/main.rs.swp"), false));
        assert!(matcher.is_ignored(Path::new(".idea/workspace.xml"), false));
        assert!(!matcher.is_ignored(Path::new("src/main.rs"), false));
    }

    #[test]
    fn test_from_files_missing_sources_match_nothing() {
        let matcher = GitignoreMatcher::from_files(
            "/fake/root",
            Some(Path::new("/does/not/exist/.gitignore")),
            None,
        );

        assert!(matcher.local().is_empty());
        assert!(matcher.global().is_empty());
        assert!(!matcher.is_ignored(Path::new("file.txt"), false));
        assert!(!matcher.is_ignored(Path::new("file.py"), false));
    }

    #[test]
    fn test_from_files_reads_both_sources() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".gitignore").write_str("# build output\n*.o\n\n").unwrap();
        let global = temp.child("global_ignore");
        global.write_str("*.bak\n").unwrap();

        let matcher = GitignoreMatcher::from_files(
            temp.path(),
            Some(&temp.path().join(".gitignore")),
            Some(global.path()),
        );

        assert_eq!(matcher.local().len(), 1);
        assert_eq!(matcher.global().len(), 1);
        assert!(matcher.is_ignored(&temp.path().join("main.o"), false));
        assert!(matcher.is_ignored(Path::new("notes.bak"), false));
    }

    #[test]
    fn test_read_ignore_file_replaces_invalid_utf8() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child(".gitignore");
        file.write_binary(b"\xff\xfe\n*.tmp\n").unwrap();

        let set = read_ignore_file(file.path());
        assert!(set.is_match("scratch.tmp", false));
    }

    #[test]
    fn test_missing_git_binary_is_not_an_error() {
        assert_eq!(global_excludes_file("definitely-not-a-real-git-binary"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_git_binary_is_not_an_error() {
        assert_eq!(global_excludes_file("false"), None);
    }

    #[test]
    fn test_load_without_git_uses_local_only() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".gitignore").write_str("secret.env\n").unwrap();

        let matcher = GitignoreMatcher::load(temp.path(), "definitely-not-a-real-git-binary");

        assert!(matcher.global().is_empty());
        assert!(matcher.is_ignored(Path::new("secret.env"), false));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/etc/gitignore"), PathBuf::from("/etc/gitignore"));
        assert_eq!(expand_home("~user/ignore"), PathBuf::from("~user/ignore"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.gitignore_global"), home.join(".gitignore_global"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
