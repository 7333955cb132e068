//! End-to-end `generate` pipeline: content store → Markdown files → HTML.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use groqspec_content::{ContentClient, Drafts};
use groqspec_shared::{AppConfig, Chapter, DocumentSet, GroqSpecError, Result};

use crate::assembler::{self, WriteReport};
use crate::html::{self, HtmlCompiler};
use crate::watch::{self, Debouncer};

/// Anything that can produce the ordered chapter list.
pub trait ChapterSource: Sync {
    fn fetch_chapters(&self, drafts: Drafts) -> impl Future<Output = Result<Vec<Chapter>>> + Send;
}

impl ChapterSource for ContentClient {
    fn fetch_chapters(&self, drafts: Drafts) -> impl Future<Output = Result<Vec<Chapter>>> + Send {
        ContentClient::fetch_chapters(self, drafts)
    }
}

/// Options for a single pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub drafts: Drafts,
    /// Compile the root file to HTML after writing.
    pub compile_html: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            drafts: Drafts::Include,
            compile_html: true,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub report: WriteReport,
    /// Path of the compiled HTML, when compilation ran.
    pub html: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each file lands on disk.
    fn file_written(&self, path: &Path, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_written(&self, _path: &Path, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Fetch the chapters and write the Markdown document set.
///
/// A fetch failure or an empty result aborts before anything is written.
#[instrument(skip_all, fields(drafts = ?drafts))]
pub async fn generate_markdown<S: ChapterSource>(
    source: &S,
    config: &AppConfig,
    drafts: Drafts,
    progress: &dyn ProgressReporter,
) -> Result<WriteReport> {
    progress.phase("Fetching chapters");
    let chapters = source.fetch_chapters(drafts).await?;

    let set = DocumentSet::from_ordered(chapters)
        .ok_or_else(|| GroqSpecError::validation("the content store returned no chapters"))?;

    progress.phase("Writing Markdown");
    assembler::write_document_set(&set, &config.output, progress).await
}

/// Compile the root Markdown file into the configured HTML artifact.
pub async fn compile_html(compiler: &HtmlCompiler, config: &AppConfig) -> Result<PathBuf> {
    html::compile_to_file(
        compiler,
        &config.output.root_path(),
        &config.output.html_path(),
    )
    .await
}

/// Run the full pipeline once.
///
/// 1. Fetch the ordered chapters
/// 2. Write the root document and every chapter
/// 3. Compile HTML (if enabled and the root document was written)
#[instrument(skip_all)]
pub async fn generate_docs<S: ChapterSource>(
    source: &S,
    config: &AppConfig,
    compiler: &HtmlCompiler,
    options: GenerateOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();

    let report = generate_markdown(source, config, options.drafts, progress).await?;

    let html = if options.compile_html && report.root_written() {
        progress.phase("Compiling HTML");
        Some(compile_html(compiler, config).await?)
    } else {
        None
    };

    let summary = RunSummary {
        report,
        html,
        elapsed: start.elapsed(),
    };
    progress.done(&summary);

    info!(
        written = summary.report.written.len(),
        failed = summary.report.failures.len(),
        elapsed_ms = summary.elapsed.as_millis(),
        "Generated docs"
    );

    Ok(summary)
}

/// Regenerate after every settled burst until the subscription ends.
///
/// Open the subscription before the initial run so edits made while it
/// runs are not missed. Failed runs are logged and the next change retries.
pub async fn regenerate_on_change<S: ChapterSource>(
    source: &S,
    debouncer: Debouncer,
    config: &AppConfig,
    compiler: &HtmlCompiler,
    options: GenerateOptions,
) {
    watch::run(debouncer, move |collapsed| async move {
        info!(changes = collapsed, "change detected");
        match generate_docs(source, config, compiler, options, &SilentProgress).await {
            Ok(summary) if summary.report.is_complete() => info!("Regenerated docs"),
            Ok(summary) => warn!(
                failed = summary.report.failures.len(),
                "regenerated docs with write failures"
            ),
            Err(e) => error!(error = %e, "regeneration failed"),
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use groqspec_content::{ChangeEvent, Subscription};
    use groqspec_shared::{Block, Inline, Node, OutputConfig, Span};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    struct FakeSource {
        chapters: Result<Vec<Chapter>>,
        seen: Mutex<Vec<Drafts>>,
        /// Receives one change during the first fetch, then is dropped.
        editor: Mutex<Option<mpsc::Sender<ChangeEvent>>>,
    }

    impl FakeSource {
        fn ok(chapters: Vec<Chapter>) -> Self {
            Self {
                chapters: Ok(chapters),
                seen: Mutex::new(vec![]),
                editor: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                chapters: Err(GroqSpecError::Network("connection refused".into())),
                seen: Mutex::new(vec![]),
                editor: Mutex::new(None),
            }
        }
    }

    impl ChapterSource for FakeSource {
        async fn fetch_chapters(&self, drafts: Drafts) -> Result<Vec<Chapter>> {
            self.seen.lock().unwrap().push(drafts);
            if let Some(editor) = self.editor.lock().unwrap().take() {
                editor
                    .try_send(ChangeEvent {
                        document_id: "drafts.overview".into(),
                        transition: "update".into(),
                        timestamp: None,
                    })
                    .unwrap();
            }
            match &self.chapters {
                Ok(chapters) => Ok(chapters.clone()),
                Err(e) => Err(GroqSpecError::Network(e.to_string())),
            }
        }
    }

    fn text(s: &str) -> Vec<Node> {
        vec![Node::Block(Block {
            children: vec![Inline::Span(Span::new(s, &["em"]))],
            ..Block::default()
        })]
    }

    fn config_in(dir: &Path) -> AppConfig {
        AppConfig {
            output: OutputConfig {
                spec_dir: dir.join("spec"),
                docs_dir: dir.join("docs"),
                ..OutputConfig::default()
            },
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn full_run_writes_markdown_and_html() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());
        let source = FakeSource::ok(vec![
            Chapter::new("GROQ", text("Graph queries")),
            Chapter::new("Overview", text("Start here")),
        ]);

        let summary = generate_docs(
            &source,
            &config,
            &HtmlCompiler::Builtin,
            GenerateOptions::default(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert!(summary.report.is_complete());
        assert_eq!(summary.report.written.len(), 2);
        assert_eq!(source.seen.lock().unwrap().as_slice(), &[Drafts::Include]);

        let html_path = summary.html.expect("html compiled");
        let html = std::fs::read_to_string(html_path).unwrap();
        assert!(html.contains("<em>Graph queries</em>"));
        assert!(html.contains("<em>Start here</em>"));
    }

    #[tokio::test]
    async fn fetch_failure_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());

        let err = generate_docs(
            &FakeSource::failing(),
            &config,
            &HtmlCompiler::Builtin,
            GenerateOptions::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GroqSpecError::Network(_)));
        assert!(!config.output.spec_dir.exists());
        assert!(!config.output.html_path().exists());
    }

    #[tokio::test]
    async fn empty_document_set_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());

        let err = generate_markdown(&FakeSource::ok(vec![]), &config, Drafts::Exclude, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, GroqSpecError::Validation { .. }));
        assert!(!config.output.root_path().exists());
    }

    #[tokio::test]
    async fn markdown_only_run_skips_html() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());
        let source = FakeSource::ok(vec![Chapter::new("GROQ", vec![])]);
        let options = GenerateOptions {
            drafts: Drafts::Exclude,
            compile_html: false,
        };

        let summary = generate_docs(&source, &config, &HtmlCompiler::Builtin, options, &SilentProgress)
            .await
            .unwrap();

        assert!(summary.html.is_none());
        assert!(config.output.root_path().exists());
        assert!(!config.output.docs_dir.exists());
        assert_eq!(source.seen.lock().unwrap().as_slice(), &[Drafts::Exclude]);
    }

    #[tokio::test]
    async fn edit_during_initial_run_triggers_regeneration() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());
        let (tx, rx) = mpsc::channel(16);
        let debouncer = Debouncer::new(Subscription::from_receiver(rx));

        let source = FakeSource::ok(vec![Chapter::new("GROQ", text("Graph queries"))]);
        *source.editor.lock().unwrap() = Some(tx);
        let options = GenerateOptions {
            drafts: Drafts::Include,
            compile_html: false,
        };

        generate_docs(&source, &config, &HtmlCompiler::Builtin, options, &SilentProgress)
            .await
            .unwrap();
        regenerate_on_change(&source, debouncer, &config, &HtmlCompiler::Builtin, options).await;

        assert_eq!(
            source.seen.lock().unwrap().as_slice(),
            &[Drafts::Include, Drafts::Include]
        );
        assert!(config.output.root_path().exists());
    }
}
