//! Orchestrates the store, the router and the detail pane.
//!
//! The controller owns the [`NoteStore`] and the current [`Route`]. Every
//! navigation and every mutation ends in a full recompute of the view through
//! [`resolve`]; nothing is patched incrementally.
use log::{debug, info};
use serde::Serialize;

use crate::{resolve, NoteStore, NoteSummary, Notebook, NotesError, Page, Result, Route, View};

/// What the detail pane is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneMode {
    Empty,
    Preview,
    Editor,
}

/// Content of the detail pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Detail {
    Empty,
    Preview { note: NoteSummary, html: String },
    Editor { note: NoteSummary, markdown: String },
}

/// Everything a front end needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Screen {
    pub route: Route,
    pub notebooks: Vec<Notebook>,
    pub view: View,
    pub detail: Detail,
}

pub struct Controller {
    store: NoteStore,
    route: Route,
    /// Routes behind the current one
    back: Vec<Route>,
    /// Routes undone by `back`
    forward: Vec<Route>,
    mode: PaneMode,
    view: View,
}

impl Controller {
    /// Starts at the home route.
    pub fn new(store: NoteStore) -> Self {
        Self::with_route(store, Route::home())
    }

    /// Starts at `route`, as when the application is opened from a link.
    pub fn with_route(store: NoteStore, route: Route) -> Self {
        let view = resolve(&store, &Route::home()).view;
        let mut controller = Self {
            store,
            route,
            back: Vec::new(),
            forward: Vec::new(),
            mode: PaneMode::Empty,
            view,
        };
        controller.settle(None);
        controller
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn into_store(self) -> NoteStore {
        self.store
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn mode(&self) -> PaneMode {
        self.mode
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Id of the note in the detail pane.
    pub fn open_note_id(&self) -> Option<&str> {
        self.view.open_note.as_deref()
    }

    /// Resolves the current route and applies any redirect in place.
    ///
    /// The pane stays in its mode when `previous_note` is still open, drops
    /// to Preview when another note opened and to Empty when none is.
    fn settle(&mut self, previous_note: Option<String>) {
        let resolution = resolve(&self.store, &self.route);
        if let Some(redirect) = resolution.redirect {
            info!("Redirecting from {} to {}", self.route, redirect);
            self.route = redirect;
        }
        self.view = resolution.view;

        self.mode = match (&self.view.open_note, previous_note) {
            (None, _) => PaneMode::Empty,
            (Some(open), Some(previous)) if *open == previous && self.mode != PaneMode::Empty => {
                self.mode
            }
            (Some(_), _) => PaneMode::Preview,
        };
        debug!(
            "Route {} -> page {:?}, {} notes, pane {:?}",
            self.route,
            self.view.page,
            self.view.notes.len(),
            self.mode
        );
    }

    /// Recomputes the view for the current route after a mutation.
    fn refresh(&mut self) {
        let open = self.view.open_note.clone();
        self.settle(open);
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Moves to `route`, recording the current route for `back`.
    pub fn navigate(&mut self, route: Route) {
        if route == self.route {
            self.refresh();
            return;
        }
        let open = self.view.open_note.clone();
        self.back.push(std::mem::replace(&mut self.route, route));
        self.forward.clear();
        self.settle(open);
    }

    /// Returns to the previous route. `false` when there is none.
    pub fn back(&mut self) -> bool {
        let Some(previous) = self.back.pop() else {
            return false;
        };
        let open = self.view.open_note.clone();
        self.forward.push(std::mem::replace(&mut self.route, previous));
        self.settle(open);
        true
    }

    /// Re-applies a route undone by `back`. `false` when there is none.
    pub fn forward(&mut self) -> bool {
        let Some(next) = self.forward.pop() else {
            return false;
        };
        let open = self.view.open_note.clone();
        self.back.push(std::mem::replace(&mut self.route, next));
        self.settle(open);
        true
    }

    /// Lists a page (`all`, `favorites`, `trash` or a notebook id).
    pub fn show_page(&mut self, page: &str) {
        self.navigate(Route::for_page(page));
    }

    /// Opens a note on the current page.
    pub fn open_note(&mut self, id: &str) {
        let route = self.route.clone().with_note(id);
        self.navigate(route);
    }

    /// Flips the open note between Preview and Editor.
    pub fn toggle_editor(&mut self) -> PaneMode {
        self.mode = match self.mode {
            PaneMode::Preview => PaneMode::Editor,
            PaneMode::Editor => PaneMode::Preview,
            PaneMode::Empty => PaneMode::Empty,
        };
        self.mode
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Creates an empty note for the current page and opens it in the
    /// editor. From the trash page the note opens on the home route.
    pub fn new_note(&mut self) -> String {
        self.create_note("")
    }

    /// Like [`Controller::new_note`], with the note holding `text` from the
    /// start.
    pub fn create_note(&mut self, text: &str) -> String {
        let page = self.view.page.clone();
        let id = self.store.add_note(Some(page.as_param()), text);

        let route = match page {
            Page::Trash => Route::home().with_note(id.as_str()),
            _ => self.route.clone().with_note(id.as_str()),
        };
        self.navigate(route);
        if self.open_note_id() == Some(id.as_str()) {
            self.mode = PaneMode::Editor;
        }
        id
    }

    /// Saves the text of the open note. The pane keeps its mode.
    pub fn save(&mut self, text: &str) -> Result<()> {
        let id = self
            .open_note_id()
            .map(str::to_string)
            .ok_or_else(|| NotesError::InvalidInput {
                message: "no note is open".to_string(),
            })?;
        self.store.save_note(&id, text)?;
        self.refresh();
        Ok(())
    }

    /// Saves the text of any note.
    pub fn save_note(&mut self, id: &str, text: &str) -> Result<()> {
        self.store.save_note(id, text)?;
        self.refresh();
        Ok(())
    }

    pub fn star(&mut self, id: &str) -> Result<bool> {
        let favorite = self.store.star_note(id)?;
        self.refresh();
        Ok(favorite)
    }

    pub fn trash(&mut self, id: &str) -> Result<()> {
        self.store.delete_note(id)?;
        self.refresh();
        Ok(())
    }

    pub fn recover(&mut self, id: &str) -> Result<()> {
        self.store.recover_note(id)?;
        self.refresh();
        Ok(())
    }

    pub fn move_to_notebook(&mut self, note_id: &str, notebook_id: &str) -> Result<()> {
        self.store.change_notebook_of_note(note_id, notebook_id)?;
        self.refresh();
        Ok(())
    }

    pub fn uncategorize(&mut self, note_id: &str) -> Result<()> {
        self.store.clear_notebook_of_note(note_id)?;
        self.refresh();
        Ok(())
    }

    pub fn add_notebook(&mut self, name: &str) -> Result<String> {
        let id = self.store.add_notebook(name)?;
        self.refresh();
        Ok(id)
    }

    pub fn rename_notebook(&mut self, id: &str, name: &str) -> Result<()> {
        self.store.rename_notebook(id, name)?;
        self.refresh();
        Ok(())
    }

    pub fn delete_notebook(&mut self, id: &str) -> Result<usize> {
        let cleared = self.store.delete_notebook(id)?;
        self.refresh();
        Ok(cleared)
    }

    /// Runs several store mutations, then recomputes the view once.
    pub fn batch<T>(&mut self, apply: impl FnOnce(&mut NoteStore) -> Result<T>) -> Result<T> {
        let outcome = apply(&mut self.store);
        self.refresh();
        outcome
    }

    /// Searches the notes listed on the current page.
    pub fn search(&self, query: &str) -> Vec<NoteSummary> {
        self.store
            .search_notes(query, &self.view.page)
            .into_iter()
            .map(|note| self.store.summary(note))
            .collect()
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn detail(&self) -> Detail {
        let note = self.open_note_id().and_then(|id| self.store.note(id));
        match (self.mode, note) {
            (PaneMode::Preview, Some(note)) => Detail::Preview {
                note: self.store.summary(note),
                html: self.store.preview_html(&note.id).unwrap_or_default(),
            },
            (PaneMode::Editor, Some(note)) => Detail::Editor {
                note: self.store.summary(note),
                markdown: note.text.clone(),
            },
            _ => Detail::Empty,
        }
    }

    pub fn screen(&self) -> Screen {
        Screen {
            route: self.route.clone(),
            notebooks: self.store.notebooks().to_vec(),
            view: self.view.clone(),
            detail: self.detail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Note, Snapshot};
    use chrono::Utc;

    fn controller() -> Controller {
        let note = |id: &str, notebook: Option<&str>| Note {
            id: id.to_string(),
            text: format!("# Title {}\nbody", id),
            notebook_id: notebook.map(str::to_string),
            favorite: false,
            in_trash: false,
            created_date: Utc::now(),
        };
        let store = NoteStore::in_memory(Snapshot {
            notes: vec![note("a", None), note("b", Some("work")), note("c", Some("work"))],
            notebooks: vec![Notebook::new("work".to_string(), "Work".to_string())],
        });
        Controller::new(store)
    }

    #[test]
    fn starts_home_with_empty_pane() {
        let c = controller();
        assert!(c.route().is_home());
        assert_eq!(c.mode(), PaneMode::Empty);
        assert_eq!(c.detail(), Detail::Empty);
        assert_eq!(c.view().notes.len(), 3);
    }

    #[test]
    fn deep_link_opens_note_in_preview() {
        let store = controller().into_store();
        let c = Controller::with_route(store, Route::parse("?page=work&note=c"));
        assert_eq!(c.open_note_id(), Some("c"));
        assert_eq!(c.mode(), PaneMode::Preview);
        match c.detail() {
            Detail::Preview { note, html } => {
                assert_eq!(note.title, "Title c");
                assert_eq!(note.notebook.as_deref(), Some("Work"));
                assert!(html.contains("<h1>Title c</h1>"));
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn deep_link_to_stale_note_lands_home() {
        let store = controller().into_store();
        let c = Controller::with_route(store, Route::home().with_note("zzz"));
        assert!(c.route().is_home());
        assert_eq!(c.mode(), PaneMode::Empty);
    }

    #[test]
    fn toggle_and_save_keep_editor_open_note_resets() {
        let mut c = controller();
        c.open_note("a");
        assert_eq!(c.mode(), PaneMode::Preview);
        assert_eq!(c.toggle_editor(), PaneMode::Editor);

        c.save("# Edited\ntext").unwrap();
        assert_eq!(c.mode(), PaneMode::Editor);
        match c.detail() {
            Detail::Editor { markdown, note } => {
                assert_eq!(markdown, "# Edited\ntext");
                assert_eq!(note.title, "Edited");
            }
            other => panic!("unexpected detail {:?}", other),
        }

        c.open_note("b");
        assert_eq!(c.mode(), PaneMode::Preview);
        assert_eq!(c.toggle_editor(), PaneMode::Editor);
        assert_eq!(c.toggle_editor(), PaneMode::Preview);
    }

    #[test]
    fn toggle_without_note_stays_empty() {
        let mut c = controller();
        assert_eq!(c.toggle_editor(), PaneMode::Empty);
        assert!(c.save("text").is_err());
    }

    #[test]
    fn new_note_opens_in_editor_on_current_page() {
        let mut c = controller();
        c.show_page("work");
        let id = c.new_note();
        assert_eq!(c.open_note_id(), Some(id.as_str()));
        assert_eq!(c.mode(), PaneMode::Editor);
        assert_eq!(c.route(), &Route::for_page("work").with_note(id.as_str()));
        assert_eq!(
            c.store().note(&id).unwrap().notebook_id.as_deref(),
            Some("work")
        );
    }

    #[test]
    fn new_note_from_trash_opens_home() {
        let mut c = controller();
        c.show_page("trash");
        let id = c.new_note();
        assert_eq!(c.route(), &Route::home().with_note(id.as_str()));
        assert_eq!(c.mode(), PaneMode::Editor);
    }

    #[test]
    fn create_note_starts_with_text() {
        let mut c = controller();
        c.show_page("favorites");
        let id = c.create_note("# Drafted\nbody");
        let note = c.store().note(&id).unwrap();
        assert!(note.favorite);
        assert_eq!(note.title(), "Drafted");
        assert_eq!(c.open_note_id(), Some(id.as_str()));
        assert_eq!(c.mode(), PaneMode::Editor);
    }

    #[test]
    fn trashing_open_note_empties_the_pane() {
        let mut c = controller();
        c.show_page("work");
        c.open_note("b");
        c.trash("b").unwrap();
        assert_eq!(c.route(), &Route::for_page("work"));
        assert_eq!(c.mode(), PaneMode::Empty);
        assert_eq!(c.view().notes.len(), 1);

        c.show_page("trash");
        c.open_note("b");
        assert_eq!(c.mode(), PaneMode::Preview);
        c.recover("b").unwrap();
        assert_eq!(c.route(), &Route::for_page("trash"));
        assert!(c.view().notes.is_empty());
    }

    #[test]
    fn deleting_the_listed_notebook_redirects_home() {
        let mut c = controller();
        c.show_page("work");
        c.open_note("c");
        assert_eq!(c.delete_notebook("work").unwrap(), 2);
        assert!(c.route().is_home());
        assert_eq!(c.mode(), PaneMode::Empty);
        assert!(c.screen().notebooks.is_empty());
    }

    #[test]
    fn renaming_refreshes_open_note_in_place() {
        let mut c = controller();
        c.open_note("b");
        c.toggle_editor();
        c.rename_notebook("work", "Projects").unwrap();
        assert_eq!(c.mode(), PaneMode::Editor);
        match c.detail() {
            Detail::Editor { note, .. } => assert_eq!(note.notebook.as_deref(), Some("Projects")),
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn back_and_forward_walk_history() {
        let mut c = controller();
        c.show_page("favorites");
        c.show_page("work");
        c.open_note("b");

        assert!(c.back());
        assert_eq!(c.route(), &Route::for_page("work"));
        assert!(c.back());
        assert_eq!(c.route(), &Route::for_page("favorites"));
        assert!(c.forward());
        assert!(c.forward());
        assert_eq!(c.open_note_id(), Some("b"));
        assert_eq!(c.mode(), PaneMode::Preview);
        assert!(!c.forward());

        c.back();
        c.show_page("trash");
        assert!(!c.forward());
    }

    #[test]
    fn back_to_a_deleted_notebook_redirects() {
        let mut c = controller();
        c.show_page("work");
        c.show_page("all");
        c.delete_notebook("work").unwrap();
        assert!(c.back());
        assert!(c.route().is_home());
    }

    #[test]
    fn search_is_scoped_to_the_page() {
        let mut c = controller();
        c.show_page("work");
        let hits = c.search("title");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|n| n.notebook_id.as_deref() == Some("work")));
    }

    #[test]
    fn moving_a_note_out_of_the_page_closes_it() {
        let mut c = controller();
        c.show_page("work");
        c.open_note("b");
        c.uncategorize("b").unwrap();
        assert_eq!(c.open_note_id(), None);
        assert_eq!(c.view().notes.len(), 1);

        c.show_page("all");
        c.move_to_notebook("a", "work").unwrap();
        assert!(c.move_to_notebook("a", "missing").is_err());
        assert_eq!(c.store().notes_in_notebook("work").len(), 2);
    }
}
