use crate::{
    config::Config,
    error::Result,
    scanner::{ScanResult, Scanner},
    sink::Sink,
    template::{repository_name, TemplateEngine},
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Statistics collected during pipeline execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Directories in the listing
    pub directories: usize,

    /// Files in the listing
    pub files: usize,

    /// Files emitted with an error placeholder
    pub unreadable_files: usize,

    /// Bytes of decoded file content
    pub content_bytes: usize,

    /// Bytes of the rendered document
    pub document_bytes: usize,

    /// Total execution time
    pub duration: Duration,

    /// Time spent scanning
    pub scan_duration: Duration,

    /// Time spent rendering
    pub render_duration: Duration,

    /// Time spent writing to the sink
    pub write_duration: Duration,
}

impl PipelineStats {
    fn from_scan(scan: &ScanResult) -> Self {
        Self {
            directories: scan.stats.directories,
            files: scan.stats.files,
            unreadable_files: scan.stats.unreadable_files,
            content_bytes: scan.files.iter().map(crate::FileData::size_bytes).sum(),
            ..Self::default()
        }
    }
}

/// Scans a repository and renders it into a prompt.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    scanner: Scanner,
    engine: TemplateEngine,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The built-in template cannot be loaded
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let scanner = Scanner::new(&config)?;
        let engine = TemplateEngine::new(config.format)?;

        Ok(Self {
            config,
            scanner,
            engine,
        })
    }

    /// Scans the root directory without rendering.
    #[must_use]
    pub fn scan(&self) -> ScanResult {
        self.scanner.scan()
    }

    /// Scans and renders, returning the document.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render(&self) -> Result<String> {
        let scan = self.scan();
        self.render_scan(&scan)
    }

    fn render_scan(&self, scan: &ScanResult) -> Result<String> {
        let repository = repository_name(&self.config.root_dir);
        self.engine.render(&repository, scan)
    }

    /// Executes the complete pipeline and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Scan**: walks the root, pruning excluded directories
    /// 2. **Render**: formats listing and contents
    /// 3. **Write**: hands the document to `sink` and finishes it
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use codebase_prompt::{Config, Pipeline, StdoutSink};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder().root_dir(".").build()?;
    ///
    /// let stats = Pipeline::new(config)?.run(&mut StdoutSink::new())?;
    /// eprintln!("{} files", stats.files);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, sink), fields(root_dir = %self.config.root_dir.display()))]
    pub fn run(&self, sink: &mut dyn Sink) -> Result<PipelineStats> {
        let start_time = Instant::now();

        info!("Scanning repository...");
        let scan_start = Instant::now();
        let scan = self.scan();
        let scan_duration = scan_start.elapsed();

        info!(
            "✓ Scanned {} directories and {} files in {:.2}s",
            scan.stats.directories,
            scan.stats.files,
            scan_duration.as_secs_f64()
        );

        if scan.stats.unreadable_files > 0 {
            warn!(
                "{} file(s) could not be read and were replaced with a placeholder",
                scan.stats.unreadable_files
            );
        }

        let render_start = Instant::now();
        let document = self.render_scan(&scan)?;
        let render_duration = render_start.elapsed();

        info!("Writing prompt to {}", sink.describe());
        let write_start = Instant::now();
        sink.write(&document)?;
        sink.finish()?;
        let write_duration = write_start.elapsed();

        let stats = PipelineStats {
            document_bytes: document.len(),
            duration: start_time.elapsed(),
            scan_duration,
            render_duration,
            write_duration,
            ..PipelineStats::from_scan(&scan)
        };

        info!(
            "✓ Generated {} bytes in {:.2}s",
            stats.document_bytes,
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }
}
