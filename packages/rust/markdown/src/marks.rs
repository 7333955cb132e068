//! Span → mark tree grouping.
//!
//! Consecutive spans that share a mark are rendered inside a single mark
//! node, so `[a (em), b (em, literal)]` becomes `em(a, literal(b))` and
//! serializes to `*a{b}*` rather than `*a**{b}*`.

use groqspec_shared::Span;

enum Child<'a> {
    Text(&'a str),
    Mark(usize),
}

struct MarkNode<'a> {
    /// `None` only for the root.
    mark: Option<&'a str>,
    children: Vec<Child<'a>>,
}

/// Arena-backed mark tree for one block. Node 0 is the unmarked root.
pub(crate) struct MarkTree<'a> {
    nodes: Vec<MarkNode<'a>>,
}

impl<'a> MarkTree<'a> {
    /// Group `spans` into nested mark nodes.
    ///
    /// Open marks stay open for as long as the following spans carry them;
    /// a mark missing from a span closes it and every mark opened after it.
    pub(crate) fn build(spans: &[&'a Span]) -> Self {
        let mut nodes = vec![MarkNode {
            mark: None,
            children: Vec::new(),
        }];
        let mut stack: Vec<usize> = vec![0];

        for index in 0..spans.len() {
            let mut needed = sorted_marks(spans, index);

            let mut keep = 1;
            while keep < stack.len() {
                let open = nodes[stack[keep]].mark;
                match needed.iter().position(|m| Some(*m) == open) {
                    Some(pos) => {
                        needed.remove(pos);
                        keep += 1;
                    }
                    None => break,
                }
            }
            stack.truncate(keep);

            for mark in needed {
                let id = nodes.len();
                nodes.push(MarkNode {
                    mark: Some(mark),
                    children: Vec::new(),
                });
                let parent = stack[stack.len() - 1];
                nodes[parent].children.push(Child::Mark(id));
                stack.push(id);
            }

            let span: &'a Span = spans[index];
            let top = stack[stack.len() - 1];
            nodes[top].children.push(Child::Text(span.text.as_str()));
        }

        Self { nodes }
    }

    /// Render the root's children, inner marks first.
    pub(crate) fn render<F>(&self, render_mark: &F) -> Vec<String>
    where
        F: Fn(&str, &[String]) -> String,
    {
        self.render_node(0, render_mark)
    }

    fn render_node<F>(&self, id: usize, render_mark: &F) -> Vec<String>
    where
        F: Fn(&str, &[String]) -> String,
    {
        self.nodes[id]
            .children
            .iter()
            .map(|child| match child {
                Child::Text(text) => (*text).to_string(),
                Child::Mark(child_id) => {
                    let inner = self.render_node(*child_id, render_mark);
                    let mark = self.nodes[*child_id].mark.unwrap_or_default();
                    render_mark(mark, &inner)
                }
            })
            .collect()
    }
}

/// Decorators that nest innermost when run lengths tie, outermost first.
const DEFAULT_MARKS: &[&str] = &["strong", "em", "code", "underline", "strike-through"];

/// Marks of `spans[index]`, longest-running first.
///
/// A mark's run length is the number of consecutive spans, starting at
/// `index`, that carry it. Ties put non-default marks outside default
/// decorators, then order by key.
fn sorted_marks<'a>(spans: &[&'a Span], index: usize) -> Vec<&'a str> {
    let span: &'a Span = spans[index];
    let mut marks: Vec<&'a str> = Vec::new();
    for mark in &span.marks {
        if !marks.contains(&mark.as_str()) {
            marks.push(mark.as_str());
        }
    }

    let run_length = |mark: &str| {
        spans[index..]
            .iter()
            .take_while(|span| span.marks.iter().any(|m| m == mark))
            .count()
    };

    marks.sort_by_key(|mark| {
        (
            std::cmp::Reverse(run_length(*mark)),
            default_position(*mark),
            *mark,
        )
    });
    marks
}

/// Position in [`DEFAULT_MARKS`]; other marks sort before all of them.
fn default_position(mark: &str) -> Option<usize> {
    DEFAULT_MARKS.iter().position(|m| *m == mark)
}
