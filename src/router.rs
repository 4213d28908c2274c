//! Derives the visible view from the `page` and `note` query parameters.
//!
//! The view is recomputed from scratch for every route; stale or unknown ids
//! never produce an error, they produce a redirect to a route that is valid.
use std::fmt;

use log::{debug, warn};
use serde::Serialize;
use url::form_urlencoded;

use crate::{NoteStore, NoteSummary, Page};

/// Query parameter selecting the page
pub const PAGE_PARAM: &str = "page";
/// Query parameter selecting the open note
pub const NOTE_PARAM: &str = "note";

/// The navigable state: which page is listed and which note is open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Route {
    pub page: Option<String>,
    pub note: Option<String>,
}

impl Route {
    /// No page and no note.
    pub fn home() -> Self {
        Self::default()
    }

    pub fn for_page(page: impl Into<String>) -> Self {
        Self {
            page: Some(page.into()),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn without_note(mut self) -> Self {
        self.note = None;
        self
    }

    pub fn is_home(&self) -> bool {
        self.page.is_none() && self.note.is_none()
    }

    /// Parses a query string such as `?page=favorites&note=abc`.
    ///
    /// A full URL is accepted too; everything up to `?` and from `#` on is
    /// ignored. Empty values count as absent, unknown parameters are skipped
    /// and the last occurrence of a repeated parameter wins.
    pub fn parse(input: &str) -> Self {
        let query = match input.split_once('?') {
            Some((_, query)) => query,
            None => input,
        };
        let query = query.split('#').next().unwrap_or("");

        let mut route = Route::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = (!value.is_empty()).then(|| value.into_owned());
            match key.as_ref() {
                PAGE_PARAM => route.page = value,
                NOTE_PARAM => route.note = value,
                other => debug!("Ignoring unknown query parameter '{}'", other),
            }
        }
        route
    }

    /// Formats the route back into a query string, `?` included. Home is
    /// the empty string.
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(page) = &self.page {
            serializer.append_pair(PAGE_PARAM, page);
        }
        if let Some(note) = &self.note {
            serializer.append_pair(NOTE_PARAM, note);
        }
        let query = serializer.finish();
        if query.is_empty() {
            query
        } else {
            format!("?{}", query)
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = self.to_query();
        if query.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", query)
        }
    }
}

/// What the screen shows for a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    /// The listed page; home lists every active note
    pub page: Page,
    /// Listed notes in insertion order
    pub notes: Vec<NoteSummary>,
    /// Id of the note in the detail pane, if any
    pub open_note: Option<String>,
}

/// A resolved route, plus the route the address should be replaced with when
/// the requested one was not valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub view: View,
    pub redirect: Option<Route>,
}

/// Computes the view for `route`.
///
/// An unknown notebook sends the user home. A note that is not listed on the
/// requested page (unknown, or trashed outside the trash page) drops the
/// `note` parameter and keeps the page.
pub fn resolve(store: &NoteStore, route: &Route) -> Resolution {
    let page = match route.page.as_deref() {
        None => Page::All,
        Some(value) => match Page::parse(value) {
            Page::Notebook(id) if !store.notebook_id_exists(&id) => {
                warn!("Route names unknown notebook '{}', redirecting home", id);
                return Resolution {
                    view: list_view(store, Page::All, None),
                    redirect: Some(Route::home()),
                };
            }
            page => page,
        },
    };

    let Some(note_id) = route.note.as_deref() else {
        return Resolution {
            view: list_view(store, page, None),
            redirect: None,
        };
    };

    let listed = store
        .notes_for_page(&page)
        .iter()
        .any(|note| note.id == note_id);

    if listed {
        Resolution {
            view: list_view(store, page, Some(note_id.to_string())),
            redirect: None,
        }
    } else {
        warn!(
            "Note '{}' is not listed on page {:?}, dropping it from the route",
            note_id, page
        );
        Resolution {
            view: list_view(store, page, None),
            redirect: Some(route.clone().without_note()),
        }
    }
}

fn list_view(store: &NoteStore, page: Page, open_note: Option<String>) -> View {
    let notes = store
        .notes_for_page(&page)
        .into_iter()
        .map(|note| store.summary(note))
        .collect();
    View {
        page,
        notes,
        open_note,
    }
}
