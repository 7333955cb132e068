//! HTML compiler adapter.
//!
//! Compiles the root Markdown file (with its chapter imports) into a single
//! HTML document, either by shelling out to `spec-md` or with the in-process
//! CommonMark renderer.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use pulldown_cmark::{Options, Parser};
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use groqspec_shared::{CompilerKind, GroqSpecError, HtmlConfig, Result};

/// Nested imports deeper than this are rejected.
const MAX_IMPORT_DEPTH: usize = 8;

/// A line that is exactly `# [Title](file.md)`.
static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s+\[[^\]]*\]\(([^)\s]+\.md)\)\s*$").expect("valid regex"));

/// The compiler used to turn the spec Markdown into HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlCompiler {
    /// Run `program args… <root.md>` and take its stdout.
    Command { program: String, args: Vec<String> },
    /// Render in-process with pulldown-cmark.
    Builtin,
}

impl HtmlCompiler {
    /// Pick the compiler from the `[html]` config section.
    pub fn from_config(config: &HtmlConfig) -> Result<Self> {
        match config.compiler {
            CompilerKind::Builtin => Ok(Self::Builtin),
            CompilerKind::Command => {
                let (program, args) = config
                    .command
                    .split_first()
                    .ok_or_else(|| GroqSpecError::config("html.command must not be empty"))?;
                Ok(Self::Command {
                    program: program.clone(),
                    args: args.to_vec(),
                })
            }
        }
    }

    /// Compile `root` and return the HTML.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub async fn compile(&self, root: &Path) -> Result<String> {
        match self {
            Self::Command { program, args } => run_command(program, args, root).await,
            Self::Builtin => {
                let root = root.to_path_buf();
                tokio::task::spawn_blocking(move || compile_builtin(&root))
                    .await
                    .map_err(|e| GroqSpecError::Compile(format!("compiler task failed: {e}")))?
            }
        }
    }
}

/// Compile `root` and write the result to `out`. Nothing is written on failure.
pub async fn compile_to_file(compiler: &HtmlCompiler, root: &Path, out: &Path) -> Result<PathBuf> {
    let html = compiler.compile(root).await?;

    if let Some(parent) = out.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| GroqSpecError::io(parent, e))?;
    }
    tokio::fs::write(out, html)
        .await
        .map_err(|e| GroqSpecError::io(out, e))?;

    info!(path = %out.display(), "Generated docs");
    Ok(out.to_path_buf())
}

// ---------------------------------------------------------------------------
// External compiler
// ---------------------------------------------------------------------------

async fn run_command(program: &str, args: &[String], root: &Path) -> Result<String> {
    debug!(program, ?args, "running compiler");

    let output = Command::new(program)
        .args(args)
        .arg(root)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| GroqSpecError::Compile(format!("failed to run `{program}`: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GroqSpecError::Compile(format!(
            "`{program}` exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| GroqSpecError::Compile(format!("`{program}` produced non-UTF-8 output: {e}")))
}

// ---------------------------------------------------------------------------
// Builtin compiler
// ---------------------------------------------------------------------------

fn compile_builtin(root: &Path) -> Result<String> {
    let markdown = resolve_imports(root, 0)?;
    let title = markdown
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string();

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut body = String::new();
    pulldown_cmark::html::push_html(&mut body, Parser::new_ext(&markdown, options));

    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
        html_escape::encode_text(&title)
    ))
}

/// Read `path`, replacing every import line with the imported file's content.
fn resolve_imports(path: &Path, depth: usize) -> Result<String> {
    if depth > MAX_IMPORT_DEPTH {
        return Err(GroqSpecError::Compile(format!(
            "imports nested too deeply at {}",
            path.display()
        )));
    }

    let source = std::fs::read_to_string(path).map_err(|e| GroqSpecError::io(path, e))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        match IMPORT_RE.captures(line) {
            Some(caps) => {
                let target = percent_decode_str(&caps[1]).decode_utf8_lossy();
                let imported = base.join(target.as_ref());
                debug!(file = %imported.display(), "inlining import");
                out.push_str(&resolve_imports(&imported, depth + 1)?);
                out.push('\n');
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    Ok(out)
}
