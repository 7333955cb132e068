//! GROQ query builders for specification chapters.

use groqspec_shared::ContentConfig;

/// Which chapters a fetch should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drafts {
    /// Every document of the type, drafts included.
    Include,
    /// Skip documents under the reserved `drafts.` ID prefix.
    Exclude,
}

/// Ordered chapter query, e.g. `*[_type == "specification"]|order(sortOrder)`.
pub fn chapters_query(config: &ContentConfig, drafts: Drafts) -> String {
    format!(
        "{}|order({})",
        type_filter(config, drafts),
        config.sort_field
    )
}

/// Filter used for change notifications; no ordering.
pub fn listen_filter(config: &ContentConfig) -> String {
    type_filter(config, Drafts::Include)
}

fn type_filter(config: &ContentConfig, drafts: Drafts) -> String {
    match drafts {
        Drafts::Include => format!("*[_type == \"{}\"]", config.document_type),
        Drafts::Exclude => format!(
            "*[_type == \"{}\" && !(_id in path('drafts.**'))]",
            config.document_type
        ),
    }
}
