//! Portable Text to Markdown conversion.
//!
//! Walks a chapter body depth-first: spans are grouped into mark trees,
//! marks are rendered inner-first, and each block's style rule wraps the
//! joined result. Top-level units are separated by a blank line.

mod marks;
pub mod serializer;

use tracing::{debug, instrument};

use groqspec_shared::{Block, Inline, Node, Span};

use crate::marks::MarkTree;
pub use crate::serializer::{
    STYLE_RULES, StyleRule, render_children, serialize_block, serialize_code_example,
    serialize_mark,
};

/// Separator between top-level blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

/// Render a chapter body to Markdown.
#[instrument(skip_all, fields(nodes = nodes.len()))]
pub fn render_body(nodes: &[Node]) -> String {
    let mut units: Vec<String> = Vec::with_capacity(nodes.len());
    let mut index = 0;

    while index < nodes.len() {
        match &nodes[index] {
            Node::Block(block) if block.list_item.is_some() => {
                let items: Vec<&Block> = nodes[index..]
                    .iter()
                    .map_while(|node| match node {
                        Node::Block(b) if b.list_item.is_some() => Some(b),
                        _ => None,
                    })
                    .collect();
                index += items.len();
                units.push(render_list(&items));
                continue;
            }
            Node::Block(block) => units.push(render_block(block)),
            Node::CodeExample(example) => units.push(serialize_code_example(example)),
            Node::Unknown => debug!(index, "skipping node with no serializer"),
        }
        index += 1;
    }

    units.join(BLOCK_SEPARATOR)
}

/// Render a single block: mark tree first, then the style rule.
pub fn render_block(block: &Block) -> String {
    let spans: Vec<&Span> = block
        .children
        .iter()
        .filter_map(|child| match child {
            Inline::Span(span) => Some(span),
            Inline::Unknown => None,
        })
        .collect();

    let tree = MarkTree::build(&spans);
    let children = tree.render(&|mark: &str, inner: &[String]| {
        let def = block.mark_defs.iter().find(|def| def.key == mark);
        serialize_mark(mark, def, inner)
    });

    serialize_block(block.style(), &children)
}

/// Render a run of list-item blocks, one line per item.
fn render_list(items: &[&Block]) -> String {
    items
        .iter()
        .map(|item| {
            let level = item.level.unwrap_or(1).max(1) as usize;
            let indent = "  ".repeat(level - 1);
            let bullet = match item.list_item.as_deref() {
                Some("number") => "1. ",
                _ => "- ",
            };
            format!("{indent}{bullet}{}", render_block(item))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
