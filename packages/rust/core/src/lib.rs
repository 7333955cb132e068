//! Core pipeline orchestration for groqspec.
//!
//! Ties the content client, the Portable Text renderer and the HTML compiler
//! together: write the spec-md document set, compile it, rebuild on change,
//! and render the version index.

pub mod assembler;
pub mod html;
pub mod pipeline;
pub mod toc;
pub mod versions;
pub mod watch;

pub use assembler::{WriteFailure, WriteReport, chapter_template};
pub use html::HtmlCompiler;
pub use pipeline::{
    ChapterSource, GenerateOptions, ProgressReporter, RunSummary, SilentProgress, compile_html,
    generate_docs, generate_markdown, regenerate_on_change,
};
pub use watch::Debouncer;
