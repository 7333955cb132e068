//! Core domain types: chapters, Portable Text nodes, version records.
//!
//! Field names follow the JSON the content store returns (`_type`,
//! `markDefs`, `sortOrder`), renamed to snake_case on the Rust side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Chapter
// ---------------------------------------------------------------------------

/// One named section of the specification, as stored in the content store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Document ID (`_id`); draft documents are prefixed with `drafts.`.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Chapter title, used for the heading and the section file name.
    #[serde(default)]
    pub title: String,
    /// Rich-text body.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: Vec<Node>,
    /// Position of the chapter in the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<f64>,
}

impl Chapter {
    /// Convenience constructor used by tests and fixtures.
    pub fn new(title: impl Into<String>, body: Vec<Node>) -> Self {
        Self {
            title: title.into(),
            body,
            ..Self::default()
        }
    }
}

/// The fetched document set, split into its root chapter and the rest.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    /// The first chapter in sort order (overview); never listed in the TOC.
    pub root: Chapter,
    /// Every other chapter, in fetch order.
    pub chapters: Vec<Chapter>,
}

impl DocumentSet {
    /// Split an ordered chapter list into root + content chapters.
    ///
    /// Returns `None` when the list is empty.
    pub fn from_ordered(mut chapters: Vec<Chapter>) -> Option<Self> {
        if chapters.is_empty() {
            return None;
        }
        let root = chapters.remove(0);
        Some(Self { root, chapters })
    }
}

// ---------------------------------------------------------------------------
// Portable Text nodes
// ---------------------------------------------------------------------------

/// A top-level rich-text node, tagged by `_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Node {
    #[serde(rename = "block")]
    Block(Block),
    #[serde(rename = "codeExample")]
    CodeExample(CodeExample),
    /// Any node type we have no serializer for.
    #[serde(other)]
    Unknown,
}

/// A paragraph-level block of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Block style; `None` means `normal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub children: Vec<Inline>,
    /// Annotation definitions referenced by span marks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mark_defs: Vec<MarkDef>,
    /// `bullet` or `number` when the block is a list item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<String>,
    /// List nesting level, 1-based.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl Block {
    /// The effective style, defaulting to `normal`.
    pub fn style(&self) -> &str {
        self.style.as_deref().unwrap_or("normal")
    }
}

/// An inline child of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Inline {
    #[serde(rename = "span")]
    Span(Span),
    /// Inline objects we do not render.
    #[serde(other)]
    Unknown,
}

/// A run of text with a set of marks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub text: String,
    /// Decorator names (`em`, `literal`, …) or `markDefs` keys.
    #[serde(default)]
    pub marks: Vec<String>,
}

impl Span {
    pub fn new(text: impl Into<String>, marks: &[&str]) -> Self {
        Self {
            text: text.into(),
            marks: marks.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

/// An annotation definition (e.g. a link) referenced from span marks by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// An embedded code sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeExample {
    /// Set for GROQ query examples; forces the `groq` fence tag.
    #[serde(default)]
    pub groq: bool,
    #[serde(default)]
    pub example: CodePayload,
    /// Editorial title; not rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// The code payload of a [`CodeExample`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub code: String,
}

// ---------------------------------------------------------------------------
// VersionRecord
// ---------------------------------------------------------------------------

/// One row of the version index page.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    /// Link target (relative directory of the published version).
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Release date; `None` when the input date was not a valid number.
    pub date: Option<DateTime<Utc>>,
    /// `Prerelease`, `Latest release`, or nothing.
    pub variant: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
