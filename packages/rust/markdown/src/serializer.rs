//! Per-node Markdown serializers.
//!
//! Block styles are dispatched through [`STYLE_RULES`], an ordered table of
//! `(predicate, renderer)` pairs. The first matching rule wins; a style no
//! rule claims renders its children unchanged. Note that `note` and `todo`
//! match by prefix while `blockquote` must match exactly.

use std::sync::LazyLock;

use regex::Regex;

use groqspec_shared::{CodeExample, MarkDef};

/// Join already-rendered children with `divider`.
pub fn render_children(children: &[String], divider: &str) -> String {
    children.join(divider)
}

// ---------------------------------------------------------------------------
// Block styles
// ---------------------------------------------------------------------------

/// One entry of the style dispatch table.
pub struct StyleRule {
    /// Short name, for logs and tests.
    pub name: &'static str,
    matches: fn(&str) -> bool,
    render: fn(&str, &str) -> String,
}

impl StyleRule {
    /// Whether this rule claims `style`.
    pub fn matches(&self, style: &str) -> bool {
        (self.matches)(style)
    }
}

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^h\d").expect("valid regex"));

/// Block style rules in priority order.
pub static STYLE_RULES: &[StyleRule] = &[
    StyleRule {
        name: "heading",
        matches: |style| HEADING_RE.is_match(style),
        render: render_heading,
    },
    StyleRule {
        name: "note",
        matches: |style| style.starts_with("note"),
        render: |_, text| format!("Note: {text}"),
    },
    StyleRule {
        name: "todo",
        matches: |style| style.starts_with("todo"),
        render: |_, text| format!("TODO: {text}"),
    },
    StyleRule {
        name: "blockquote",
        matches: |style| style == "blockquote",
        render: |_, text| format!("> {text}"),
    },
];

/// `h<d>…` → d hashes. Only the first digit counts, so `h10` is a level-1 heading.
fn render_heading(style: &str, text: &str) -> String {
    let level = style
        .chars()
        .nth(1)
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0) as usize;
    format!("{} {text}", "#".repeat(level))
}

/// Serialize a block given its style and rendered children.
pub fn serialize_block(style: &str, children: &[String]) -> String {
    let text = render_children(children, "");
    match STYLE_RULES.iter().find(|rule| rule.matches(style)) {
        Some(rule) => (rule.render)(style, &text),
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Code examples
// ---------------------------------------------------------------------------

/// Serialize a code example as a fenced block.
///
/// The code is emitted verbatim; a fence inside the code ends the block early.
pub fn serialize_code_example(node: &CodeExample) -> String {
    let language = if node.groq {
        "groq"
    } else {
        node.example.language.as_deref().unwrap_or("")
    };
    format!("```{language}\n{}\n```", node.example.code)
}

// ---------------------------------------------------------------------------
// Marks
// ---------------------------------------------------------------------------

/// Serialize an inline mark around its rendered children.
///
/// `def` is the block's `markDefs` entry when `mark` is an annotation key.
pub fn serialize_mark(mark: &str, def: Option<&MarkDef>, children: &[String]) -> String {
    let text = render_children(children, "");

    if let Some(def) = def {
        return match (def.kind.as_str(), def.href.as_deref()) {
            ("link", Some(href)) => format!("[{text}]({href})"),
            _ => text,
        };
    }

    match mark {
        "literal" => format!("{{{text}}}"),
        "em" => format!("*{text}*"),
        "strong" => format!("**{text}**"),
        "code" => format!("`{text}`"),
        "underline" => format!("__{text}__"),
        "strike-through" => format!("~~{text}~~"),
        _ => text,
    }
}
