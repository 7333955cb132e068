//! TOC (Table of Contents) builder.
//!
//! Emits one spec-md import line per content chapter, pointing at the file
//! the assembler writes for it. The root chapter is never passed in.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, instrument};

use groqspec_shared::Chapter;

/// Characters escaped in link paths: everything except RFC 3986 unreserved.
const FILE_STEM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// File stem for the content chapter at `index` (0-based): `Section 3 -- Syntax`.
pub fn section_file_stem(title: &str, index: usize) -> String {
    format!("Section {} -- {title}", index + 1)
}

/// Percent-encoded link target for the content chapter at `index`.
pub fn section_link_target(title: &str, index: usize) -> String {
    let stem = section_file_stem(title, index);
    format!("{}.md", utf8_percent_encode(&stem, FILE_STEM_ENCODE_SET))
}

/// Build the Markdown TOC for the given content chapters.
///
/// Lines are numbered 1..n in input order. The title is used verbatim as
/// link text and encoded only in the link path.
#[instrument(skip_all, fields(chapters = chapters.len()))]
pub fn build_toc(chapters: &[Chapter]) -> String {
    let toc: String = chapters
        .iter()
        .enumerate()
        .map(|(index, chapter)| {
            format!(
                "# [{}]({})\n\n",
                chapter.title,
                section_link_target(&chapter.title, index)
            )
        })
        .collect();

    debug!(len = toc.len(), "TOC built");
    toc
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
