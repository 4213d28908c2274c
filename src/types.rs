//! Shared value types for the mdnotes application.
//!
//! The persisted records themselves live in `note.rs`; this module holds the
//! crate `Result` alias and the small types passed between the store, the
//! router and the renderers.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Note, Notebook, NotesError};

/// A specialized Result type for mdnotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Page sentinel naming every active note.
pub const PAGE_ALL: &str = "all";
/// Page sentinel naming favorite notes.
pub const PAGE_FAVORITES: &str = "favorites";
/// Page sentinel naming trashed notes.
pub const PAGE_TRASH: &str = "trash";

/// The collection of notes a page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Page {
    All,
    Favorites,
    Trash,
    Notebook(String),
}

impl Page {
    /// Interprets a `page` parameter. Anything that is not a sentinel is
    /// taken as a notebook id; whether that notebook exists is the caller's
    /// concern.
    pub fn parse(value: &str) -> Self {
        match value {
            PAGE_ALL => Page::All,
            PAGE_FAVORITES => Page::Favorites,
            PAGE_TRASH => Page::Trash,
            id => Page::Notebook(id.to_string()),
        }
    }

    /// The value used for this page in a query string.
    pub fn as_param(&self) -> &str {
        match self {
            Page::All => PAGE_ALL,
            Page::Favorites => PAGE_FAVORITES,
            Page::Trash => PAGE_TRASH,
            Page::Notebook(id) => id,
        }
    }
}

/// Both persisted collections, moved as one unit between the store and the
/// storage adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub notes: Vec<Note>,
    pub notebooks: Vec<Notebook>,
}

/// How the initial load went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Both collections were read from the key-value store.
    Stored,
    /// The bundled dataset was used instead.
    Defaults { reason: String },
}

/// A note as the views show it: derived title and joined notebook name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub notebook_id: Option<String>,
    /// Name of the referenced notebook, looked up at read time
    pub notebook: Option<String>,
    pub favorite: bool,
    pub in_trash: bool,
    pub created_date: DateTime<Utc>,
}
