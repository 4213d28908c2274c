//! Core data structures for the mdnotes application.
//!
//! These are the records persisted under the `notes` and `notebooks` keys.
//! Titles and notebook names are derived on read and never stored.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note body in Markdown format; the first line doubles as the title
    pub text: String,
    /// Notebook the note is filed under, `None` when uncategorized
    #[serde(default)]
    pub notebook_id: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    /// Soft-deletion flag
    #[serde(default)]
    pub in_trash: bool,
    /// When the note was created
    pub created_date: DateTime<Utc>,
}

impl Note {
    /// Creates an empty, uncategorized note
    pub fn new(id: String) -> Self {
        Note {
            id,
            text: String::new(),
            notebook_id: None,
            favorite: false,
            in_trash: false,
            created_date: Utc::now(),
        }
    }

    /// Title derived from the first line of the text
    pub fn title(&self) -> String {
        title_of(&self.text)
    }

    /// Whether the note shows up in the all/favorites/notebook views
    pub fn is_active(&self) -> bool {
        !self.in_trash
    }
}

/// A named group of notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: String,
    pub name: String,
}

impl Notebook {
    pub fn new(id: String, name: String) -> Self {
        Notebook { id, name }
    }
}

/// Length of the marker (`"# "`) in front of the title on the first line
const TITLE_MARKER_LEN: usize = 2;

/// Extracts a title from markdown: the first line minus its two-character
/// marker. Whatever follows the marker is kept as written.
pub fn title_of(markdown: &str) -> String {
    let first_line = markdown.lines().next().unwrap_or("");
    first_line.chars().skip(TITLE_MARKER_LEN).collect()
}
