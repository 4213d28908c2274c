//! Markdown note-taking library
//!
//! This library keeps notes organized into notebooks, with favorites, a
//! recoverable trash, fuzzy search and sanitized markdown previews. What is
//! visible at any time is derived from two query parameters, `page` and
//! `note`, so every state of the application can be linked to directly.

mod cli;
mod config;
mod controller;
mod errors;
mod helper;
mod ids;
mod kv;
mod markdown;
mod note;
mod render;
mod router;
mod storage;
mod store;
mod transfer;
mod types;
mod writer;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use controller::*;
pub use errors::*;
pub use helper::*;
pub use ids::*;
pub use kv::*;
pub use markdown::*;
pub use note::*;
pub use render::*;
pub use router::*;
pub use storage::*;
pub use store::*;
pub use transfer::*;
pub use types::*;
pub use writer::*;
