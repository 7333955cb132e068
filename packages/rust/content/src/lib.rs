//! Content store access: GROQ queries and change notifications.
//!
//! [`ContentClient`] wraps the store's HTTP API. Queries return typed
//! results; [`ContentClient::listen`] returns a [`Subscription`] that yields
//! [`ChangeEvent`]s until it is cancelled or the server closes the stream.

mod client;
mod listen;
pub mod query;

pub use client::ContentClient;
pub use listen::{ChangeEvent, Subscription};
pub use query::{Drafts, chapters_query, listen_filter};
