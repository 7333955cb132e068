//! Shared types, error model, and configuration for groqspec.
//!
//! This crate is the foundation depended on by all other groqspec crates.
//! It provides:
//! - [`GroqSpecError`]: the unified error type
//! - Domain types ([`Chapter`], [`Node`], [`Block`], [`VersionRecord`])
//! - Configuration ([`AppConfig`], config loading, token resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, CompilerKind, ContentConfig, HtmlConfig, OutputConfig,
    init_config, load_config, load_config_from, resolve_token,
};
pub use error::{GroqSpecError, Result};
pub use types::{
    Block, Chapter, CodeExample, CodePayload, DocumentSet, Inline, MarkDef, Node, Span,
    VersionRecord,
};
