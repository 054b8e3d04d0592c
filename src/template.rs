use crate::{
    config::OutputFormat,
    error::{Error, Result},
    scanner::ScanResult,
};
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;
use tera::{Context, Tera};

/// The document handed to a template or serialized to JSON.
#[derive(Serialize)]
struct PromptDocument<'a> {
    repository: &'a str,
    tree: Vec<String>,
    files: Vec<FileView<'a>>,
}

#[derive(Serialize)]
struct FileView<'a> {
    path: &'a str,
    content: Cow<'a, str>,
    readable: bool,
    lines: Option<usize>,
}

impl<'a> PromptDocument<'a> {
    fn new(repository: &'a str, scan: &'a ScanResult) -> Self {
        Self {
            repository,
            tree: scan.labels(),
            files: scan
                .files
                .iter()
                .map(|f| FileView {
                    path: &f.relative_path,
                    content: f.display_content(),
                    readable: f.is_text(),
                    lines: f.line_count(),
                })
                .collect(),
        }
    }
}

/// Renders scan results into the final prompt text.
#[derive(Debug)]
pub(crate) struct TemplateEngine {
    tera: Tera,
    format: OutputFormat,
}

impl TemplateEngine {
    /// Creates a template engine for the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in template fails to parse.
    pub(crate) fn new(format: OutputFormat) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_template(
            OutputFormat::Markdown.template_name(),
            include_str!("../templates/markdown.tera"),
        )
        .map_err(|e| Error::template(OutputFormat::Markdown.template_name(), e))?;

        Ok(Self { tera, format })
    }

    /// Renders a scan of the repository called `repository`.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering or JSON encoding fails.
    pub(crate) fn render(&self, repository: &str, scan: &ScanResult) -> Result<String> {
        let document = PromptDocument::new(repository, scan);

        match self.format {
            OutputFormat::Markdown => {
                let template_name = self.format.template_name();
                let context = Context::from_serialize(&document)
                    .map_err(|e| Error::template(template_name, e))?;

                self.tera
                    .render(template_name, &context)
                    .map_err(|e| Error::template(template_name, e))
            }
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&document)?),
        }
    }
}

/// Name shown in the document header: the root's final component.
pub(crate) fn repository_name(root: &Path) -> String {
    let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    resolved
        .file_name()
        .map_or_else(|| resolved.display().to_string(), |name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileData;
    use crate::scanner::{EntryKind, TreeEntry};

    fn create_test_scan() -> ScanResult {
        ScanResult {
            listing: vec![
                TreeEntry {
                    relative_path: "src".to_string(),
                    kind: EntryKind::Directory,
                },
                TreeEntry {
                    relative_path: "src/main.rs".to_string(),
                    kind: EntryKind::File,
                },
                TreeEntry {
                    relative_path: "secret.key".to_string(),
                    kind: EntryKind::File,
                },
            ],
            files: vec![
                FileData::new_text("src/main.rs", "fn main() {\n    println!(\"<Hello>\");\n}"),
                FileData::new_unreadable("secret.key", "Permission denied (os error 13)"),
            ],
            ..ScanResult::default()
        }
    }

    #[test]
    fn test_render_markdown() {
        let engine = TemplateEngine::new(OutputFormat::Markdown).unwrap();

        let rendered = engine.render("demo", &create_test_scan()).unwrap();

        assert!(rendered.starts_with("# Repository: demo\n\n## File Tree Structure\n\n"));
        assert!(rendered.contains("📁 src/\n📄 src/main.rs\n📄 secret.key\n\n## File Contents\n\n"));
        assert!(rendered.contains(
            "### src/main.rs\n\n```\nfn main() {\n    println!(\"<Hello>\");\n}\n```\n\n"
        ));
        assert!(rendered.contains(
            "### secret.key\n\n```\n[Error reading file: Permission denied (os error 13)]\n```"
        ));
    }

    #[test]
    fn test_markdown_sections_are_ordered() {
        let engine = TemplateEngine::new(OutputFormat::Markdown).unwrap();
        let rendered = engine.render("demo", &create_test_scan()).unwrap();

        let tree_section = rendered
            .split("## File Tree Structure")
            .nth(1)
            .and_then(|rest| rest.split("## File Contents").next())
            .unwrap();

        assert!(tree_section.contains("src/main.rs"));
        assert!(!tree_section.contains("fn main()"));
    }

    #[test]
    fn test_render_json() {
        let engine = TemplateEngine::new(OutputFormat::Json).unwrap();

        let rendered = engine.render("demo", &create_test_scan()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed["repository"], "demo");
        assert_eq!(parsed["tree"][0], "📁 src/");
        assert_eq!(parsed["files"][0]["path"], "src/main.rs");
        assert_eq!(parsed["files"][0]["lines"], 3);
        assert_eq!(parsed["files"][1]["readable"], false);
    }

    #[test]
    fn test_render_empty_scan() {
        let engine = TemplateEngine::new(OutputFormat::Markdown).unwrap();

        let rendered = engine.render("empty", &ScanResult::default()).unwrap();

        assert!(rendered.contains("# Repository: empty"));
        assert!(rendered.contains("## File Contents"));
        assert!(!rendered.contains("###"));
    }

    #[test]
    fn test_repository_name() {
        let temp = assert_fs::TempDir::new().unwrap();
        let expected = temp
            .path()
            .canonicalize()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();

        assert_eq!(repository_name(temp.path()), expected);
        assert_eq!(repository_name(&temp.path().join(".")), expected);
    }
}
