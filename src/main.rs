use anyhow::Context;
use clap::Parser;
use codebase_prompt::{Config, FileSink, OutputFormat, Pipeline, Sink, StdoutSink};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CURSOR_RULES_FILE: &str = "entire-codebase.mdc";

#[derive(Parser, Debug)]
#[command(
    name = "codebase-prompt",
    version,
    author,
    about = "Generate AI prompts from Git repositories",
    long_about = "Generate AI prompts from Git repositories.\n\n\
    Walks a directory, filters it with include/exclude patterns and .gitignore \
    rules, and writes the file tree plus every file's contents as one document. \
    The .git directory is always left out.\n\n\
    USAGE EXAMPLES:\n  \
      # Print a prompt for the current directory\n  \
      codebase-prompt\n\n  \
      # Only Python sources, written to a file\n  \
      codebase-prompt ./my-project --include '*.py' --output prompt.md\n\n  \
      # Write Cursor rules for the repository\n  \
      codebase-prompt ./my-project --cursor"
)]
struct Cli {
    /// Path to the repository (default: current directory)
    #[arg(default_value = ".", value_name = "REPO_PATH")]
    repo_path: PathBuf,

    /// Patterns of files/directories to exclude (e.g. *.log); replaces the defaults
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    exclude: Option<Vec<String>>,

    /// Patterns of files to include (e.g. *.py)
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    include: Vec<String>,

    /// Output file to write the prompt to
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write to .cursor/rules/entire-codebase.mdc inside the repository
    #[arg(long)]
    cursor: bool,

    /// Ignore .gitignore files (both local and global)
    #[arg(long)]
    no_gitignore: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "markdown")]
    format: CliFormat,

    /// Keep a timestamped copy of an existing output file
    #[arg(long)]
    backup: bool,

    /// Git executable used to find the global excludes file
    #[arg(long, env = "CODEBASE_PROMPT_GIT", default_value = "git", value_name = "PROGRAM")]
    git: String,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFormat {
    Markdown,
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Markdown => Self::Markdown,
            CliFormat::Json => Self::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let mut builder = Config::builder()
        .root_dir(&cli.repo_path)
        .include_patterns(cli.include.clone())
        .respect_gitignore(!cli.no_gitignore)
        .git_program(cli.git.clone())
        .format(cli.format.into());

    if let Some(exclude) = cli.exclude.clone() {
        builder = builder.exclude_patterns(exclude);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let mut sink: Box<dyn Sink> = match output_path(&cli) {
        Some(path) => {
            info!("Writing prompt to file: {}", path.display());
            Box::new(FileSink::new(path).backup_existing(cli.backup))
        }
        None => Box::new(StdoutSink::new()),
    };

    Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run(sink.as_mut())
        .context("Error generating prompt")?;

    Ok(())
}

/// Resolves where the prompt goes; `None` means stdout.
fn output_path(cli: &Cli) -> Option<PathBuf> {
    if cli.cursor {
        if cli.output.is_some() {
            warn!("--cursor flag overrides --output flag");
        }
        return Some(cursor_rules_path(&cli.repo_path));
    }

    cli.output.clone()
}

fn cursor_rules_path(repo_path: &Path) -> PathBuf {
    repo_path.join(".cursor").join("rules").join(CURSOR_RULES_FILE)
}

fn setup_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::new("codebase_prompt=warn"),
        1 => EnvFilter::new("codebase_prompt=info"),
        2 => EnvFilter::new("codebase_prompt=debug"),
        _ => EnvFilter::new("codebase_prompt=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["codebase-prompt"]).unwrap();

        assert_eq!(cli.repo_path, PathBuf::from("."));
        assert!(cli.exclude.is_none());
        assert!(cli.include.is_empty());
        assert!(!cli.no_gitignore);
        assert_eq!(output_path(&cli), None);
    }

    #[test]
    fn test_cli_patterns() {
        let cli = Cli::try_parse_from([
            "codebase-prompt",
            "--include",
            "*.py",
            "*.md",
            "--exclude",
            "tests",
            "--no-gitignore",
            "./repo",
        ])
        .unwrap();

        assert_eq!(cli.include, vec!["*.py", "*.md"]);
        assert_eq!(cli.exclude, Some(vec!["tests".to_string()]));
        assert!(cli.no_gitignore);
        assert_eq!(cli.repo_path, PathBuf::from("./repo"));
    }

    #[test]
    fn test_output_file() {
        let cli = Cli::try_parse_from(["codebase-prompt", "repo", "--output", "out.md"]).unwrap();
        assert_eq!(output_path(&cli), Some(PathBuf::from("out.md")));
    }

    #[test]
    fn test_cursor_overrides_output() {
        let cli = Cli::try_parse_from([
            "codebase-prompt",
            "repo",
            "--cursor",
            "--output",
            "out.md",
        ])
        .unwrap();

        assert_eq!(
            output_path(&cli),
            Some(PathBuf::from("repo/.cursor/rules/entire-codebase.mdc"))
        );
    }
}
