//! Document set writer.
//!
//! Turns an ordered [`DocumentSet`] into spec-md source files on disk:
//!
//! ```text
//! <spec_dir>/
//! ├── GROQ.md                        (root chapter + TOC)
//! ├── Section 1 -- Overview.md
//! ├── Section 2 -- Syntax.md
//! └── ...
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

use groqspec_markdown::render_body;
use groqspec_shared::{Chapter, DocumentSet, GroqSpecError, OutputConfig, Result};

use crate::pipeline::ProgressReporter;
use crate::toc;

/// Underline placed below every chapter title.
const TITLE_RULE: &str = "-------";

/// Outcome of writing a document set.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    /// Path of the root document.
    pub root_path: PathBuf,
    /// Files written successfully, sorted.
    pub written: Vec<PathBuf>,
    /// Files that could not be written, with the reason.
    pub failures: Vec<WriteFailure>,
}

/// A single failed file write.
#[derive(Debug, Clone)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub message: String,
}

impl WriteReport {
    /// `true` when every file in the set was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the root document made it to disk.
    pub fn root_written(&self) -> bool {
        self.written.iter().any(|p| p == &self.root_path)
    }
}

/// Render a chapter as `{title}\n-------\n\n{body}\n\n`.
pub fn chapter_template(chapter: &Chapter) -> String {
    format!(
        "{}\n{TITLE_RULE}\n\n{}\n\n",
        chapter.title,
        render_body(&chapter.body)
    )
}

/// Root document: the root chapter followed by the TOC of the content chapters.
pub fn root_document(set: &DocumentSet) -> String {
    let mut doc = chapter_template(&set.root);
    doc.push_str(&toc::build_toc(&set.chapters));
    doc
}

/// Path of the file written for the content chapter at `index`.
pub fn chapter_path(spec_dir: &Path, chapter: &Chapter, index: usize) -> PathBuf {
    spec_dir.join(format!("{}.md", toc::section_file_stem(&chapter.title, index)))
}

/// Write the root document, then every content chapter concurrently.
///
/// Only a failure to create the output directory aborts. Individual file
/// failures are logged and collected in the returned [`WriteReport`].
#[instrument(skip_all, fields(dir = %output.spec_dir.display(), chapters = set.chapters.len()))]
pub async fn write_document_set(
    set: &DocumentSet,
    output: &OutputConfig,
    progress: &dyn ProgressReporter,
) -> Result<WriteReport> {
    let spec_dir = output.spec_dir.clone();
    tokio::fs::create_dir_all(&spec_dir)
        .await
        .map_err(|e| GroqSpecError::io(&spec_dir, e))?;

    let total = set.chapters.len() + 1;
    let mut report = WriteReport {
        root_path: output.root_path(),
        ..WriteReport::default()
    };

    let root_path = report.root_path.clone();
    match tokio::fs::write(&root_path, root_document(set)).await {
        Ok(()) => {
            debug!(path = %root_path.display(), "root document written");
            progress.file_written(&root_path, 1, total);
            report.written.push(root_path);
        }
        Err(e) => record_failure(&mut report, root_path, &e),
    }

    let mut tasks = JoinSet::new();
    let mut pending = BTreeSet::new();
    for (index, chapter) in set.chapters.iter().enumerate() {
        let path = chapter_path(&spec_dir, chapter, index);
        let markdown = chapter_template(chapter);
        pending.insert(path.clone());
        tasks.spawn(async move {
            let outcome = tokio::fs::write(&path, markdown).await;
            (path, outcome)
        });
    }

    join_writes(tasks, pending, &mut report, progress, total).await;

    report.written.sort();
    report.failures.sort_by(|a, b| a.path.cmp(&b.path));

    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        "document set written"
    );

    Ok(report)
}

/// Drain the chapter writes into `report`.
///
/// `pending` holds every spawned path. A task that dies before returning its
/// path is charged to a path that never reported back.
async fn join_writes(
    mut tasks: JoinSet<(PathBuf, std::io::Result<()>)>,
    mut pending: BTreeSet<PathBuf>,
    report: &mut WriteReport,
    progress: &dyn ProgressReporter,
    total: usize,
) {
    let mut task_errors = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((path, Ok(()))) => {
                pending.remove(&path);
                report.written.push(path.clone());
                progress.file_written(&path, report.written.len(), total);
            }
            Ok((path, Err(e))) => {
                pending.remove(&path);
                record_failure(report, path, &e);
            }
            Err(e) => {
                error!(error = %e, "chapter write task failed");
                task_errors.push(e.to_string());
            }
        }
    }

    for (path, message) in pending.into_iter().zip(task_errors) {
        report.failures.push(WriteFailure { path, message });
    }
}

fn record_failure(report: &mut WriteReport, path: PathBuf, err: &std::io::Error) {
    error!(path = %path.display(), error = %err, "failed to write file");
    report.failures.push(WriteFailure {
        path,
        message: err.to_string(),
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use groqspec_shared::{Block, Inline, Node, Span};

    fn paragraph(text: &str) -> Node {
        Node::Block(Block {
            children: vec![Inline::Span(Span::new(text, &[]))],
            ..Block::default()
        })
    }

    fn make_set() -> DocumentSet {
        DocumentSet::from_ordered(vec![
            Chapter::new("GROQ", vec![paragraph("Root intro.")]),
            Chapter::new("Overview", vec![paragraph("First.")]),
            Chapter::new("Syntax & Grammar", vec![paragraph("Second.")]),
        ])
        .expect("non-empty set")
    }

    fn output_in(dir: &Path) -> OutputConfig {
        OutputConfig {
            spec_dir: dir.join("spec"),
            ..OutputConfig::default()
        }
    }

    #[test]
    fn template_wraps_title_and_body() {
        let chapter = Chapter::new("Overview", vec![paragraph("Body text.")]);
        assert_eq!(
            chapter_template(&chapter),
            "Overview\n-------\n\nBody text.\n\n"
        );
    }

    #[test]
    fn template_with_empty_body() {
        let chapter = Chapter::new("Empty", vec![]);
        assert_eq!(chapter_template(&chapter), "Empty\n-------\n\n\n\n");
    }

    #[test]
    fn root_document_appends_toc() {
        let doc = root_document(&make_set());
        assert!(doc.starts_with("GROQ\n-------\n\nRoot intro.\n\n"));
        assert!(doc.ends_with(
            "# [Overview](Section%201%20--%20Overview.md)\n\n\
             # [Syntax & Grammar](Section%202%20--%20Syntax%20%26%20Grammar.md)\n\n"
        ));
        assert!(!doc.contains("[GROQ]"));
    }

    #[tokio::test]
    async fn writes_root_and_every_chapter() {
        let tmp = tempfile::tempdir().unwrap();
        let output = output_in(tmp.path());

        let report = write_document_set(&make_set(), &output, &SilentProgress)
            .await
            .unwrap();

        assert!(report.is_complete());
        assert!(report.root_written());
        assert_eq!(report.written.len(), 3);

        let spec = tmp.path().join("spec");
        let first = std::fs::read_to_string(spec.join("Section 1 -- Overview.md")).unwrap();
        assert_eq!(first, "Overview\n-------\n\nFirst.\n\n");
        let second =
            std::fs::read_to_string(spec.join("Section 2 -- Syntax & Grammar.md")).unwrap();
        assert_eq!(second, "Syntax & Grammar\n-------\n\nSecond.\n\n");
        let root = std::fs::read_to_string(spec.join("GROQ.md")).unwrap();
        assert!(root.contains("Section%202%20--%20Syntax%20%26%20Grammar.md"));
    }

    #[tokio::test]
    async fn root_only_set_writes_single_file() {
        let tmp = tempfile::tempdir().unwrap();
        let output = output_in(tmp.path());
        let set = DocumentSet::from_ordered(vec![Chapter::new("GROQ", vec![])]).unwrap();

        let report = write_document_set(&set, &output, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.written, vec![output.root_path()]);
        let root = std::fs::read_to_string(output.root_path()).unwrap();
        assert_eq!(root, "GROQ\n-------\n\n\n\n");
    }

    #[tokio::test]
    async fn failing_chapter_does_not_stop_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let output = output_in(tmp.path());
        // A title containing a path separator points into a missing directory.
        let set = DocumentSet::from_ordered(vec![
            Chapter::new("GROQ", vec![]),
            Chapter::new("Good", vec![]),
            Chapter::new("Bad/Title", vec![]),
            Chapter::new("Also Good", vec![]),
        ])
        .unwrap();

        let report = write_document_set(&set, &output, &SilentProgress)
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("Section 2 -- Bad/Title.md"));
        assert_eq!(report.written.len(), 3);
        assert!(output.spec_dir.join("Section 3 -- Also Good.md").exists());
    }

    #[tokio::test]
    async fn unusable_output_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let output = OutputConfig {
            spec_dir: blocker.join("spec"),
            ..OutputConfig::default()
        };

        let err = write_document_set(&make_set(), &output, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, GroqSpecError::Io { .. }));
    }

    #[tokio::test]
    async fn failed_write_task_keeps_its_path() {
        let ok = PathBuf::from("spec/Section 1 -- Overview.md");
        let lost = PathBuf::from("spec/Section 2 -- Syntax.md");

        let mut tasks: JoinSet<(PathBuf, std::io::Result<()>)> = JoinSet::new();
        let written = ok.clone();
        tasks.spawn(async move { (written, Ok(())) });
        let doomed = lost.clone();
        tasks.spawn(async move {
            assert!(doomed.as_os_str().is_empty(), "disk vanished");
            (doomed, Ok(()))
        });

        let mut report = WriteReport::default();
        let pending = BTreeSet::from([ok.clone(), lost.clone()]);
        join_writes(tasks, pending, &mut report, &SilentProgress, 3).await;

        assert_eq!(report.written, vec![ok]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, lost);
        assert!(report.failures[0].message.contains("panicked"));
    }
}
