//! The canonical in-memory state of notes and notebooks.
//!
//! `NoteStore` owns both collections, answers every query the views need and
//! applies mutations. After each successful mutation the whole state is handed
//! to a [`SnapshotSink`]; the in-memory change stands whether or not the write
//! succeeds.
use log::{debug, info, trace, warn};

use crate::{
    IdGenerator, KeyValueStore, LoadOutcome, MarkdownRenderer, MemoryStore, Note, NoteSummary,
    Notebook, NotesError, Page, Result, SanitizedMarkdown, Snapshot, SnapshotSink,
    StorageAdapter, UuidIds,
};

pub struct NoteStore {
    /// Notes in insertion order, trashed ones included
    notes: Vec<Note>,

    /// Notebooks in insertion order
    notebooks: Vec<Notebook>,

    /// Where snapshots go after each mutation
    sink: Box<dyn SnapshotSink>,

    ids: Box<dyn IdGenerator>,

    renderer: Box<dyn MarkdownRenderer>,

    /// How the collections were obtained at startup
    load_outcome: LoadOutcome,
}

impl NoteStore {
    /// Loads from `adapter` (falling back to the bundled dataset) and keeps
    /// the adapter as an inline sink for subsequent writes.
    pub fn load<S: KeyValueStore + 'static>(adapter: StorageAdapter<S>) -> Self {
        let (snapshot, outcome) = adapter.load();
        Self::from_loaded(snapshot, outcome, Box::new(adapter))
    }

    /// Builds a store from an already loaded snapshot.
    ///
    /// Notes that reference a notebook missing from the snapshot are moved
    /// back to uncategorized.
    pub fn from_loaded(
        mut snapshot: Snapshot,
        load_outcome: LoadOutcome,
        sink: Box<dyn SnapshotSink>,
    ) -> Self {
        let Snapshot { notes, notebooks } = &mut snapshot;
        for note in notes.iter_mut() {
            if let Some(notebook_id) = &note.notebook_id {
                if !notebooks.iter().any(|nb| &nb.id == notebook_id) {
                    warn!(
                        "Note {} references missing notebook {}, clearing it",
                        note.id, notebook_id
                    );
                    note.notebook_id = None;
                }
            }
        }

        debug!(
            "Store ready with {} notes and {} notebooks",
            snapshot.notes.len(),
            snapshot.notebooks.len()
        );

        Self {
            notes: snapshot.notes,
            notebooks: snapshot.notebooks,
            sink,
            ids: Box::new(UuidIds),
            renderer: Box::new(SanitizedMarkdown),
            load_outcome,
        }
    }

    /// A store backed by a fresh [`MemoryStore`].
    pub fn in_memory(snapshot: Snapshot) -> Self {
        Self::from_loaded(
            snapshot,
            LoadOutcome::Stored,
            Box::new(StorageAdapter::new(MemoryStore::new())),
        )
    }

    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn MarkdownRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    /// The last persistence failure reported by the sink, if any.
    pub fn persistence_error(&self) -> Option<String> {
        self.sink.last_error()
    }

    /// A copy of both collections.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            notes: self.notes.clone(),
            notebooks: self.notebooks.clone(),
        }
    }

    fn persist(&mut self) {
        trace!("Submitting snapshot to sink");
        self.sink.submit(&self.notes, &self.notebooks);
    }

    /// Draws ids until one is not in use by any note or notebook.
    fn fresh_id(&mut self) -> String {
        loop {
            let id = self.ids.next_id();
            let taken = self.notes.iter().any(|n| n.id == id)
                || self.notebooks.iter().any(|nb| nb.id == id);
            if !taken {
                return id;
            }
            warn!("Generated id {} is already in use, drawing another", id);
        }
    }

    fn note_index(&self, id: &str) -> Result<usize> {
        self.notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })
    }

    fn notebook_index(&self, id: &str) -> Result<usize> {
        self.notebooks
            .iter()
            .position(|nb| nb.id == id)
            .ok_or_else(|| NotesError::NotebookNotFound { id: id.to_string() })
    }

    // ------------------------------------------------------------------
    // Note mutations
    // ------------------------------------------------------------------

    /// Creates an empty note and returns its id.
    ///
    /// `target` is a page parameter: a notebook id files the note into that
    /// notebook, `"favorites"` stars it, and anything else (including `None`
    /// and `"all"`) leaves it uncategorized.
    pub fn add_default_note(&mut self, target: Option<&str>) -> String {
        self.add_note(target, "")
    }

    /// Creates a note already holding `text`, in a single mutation.
    pub fn add_note(&mut self, target: Option<&str>, text: &str) -> String {
        let note = self.prepared_note(target, text.to_string());
        let id = note.id.clone();
        info!("Created note {} (target: {:?})", id, target);
        self.notes.push(note);
        self.persist();
        id
    }

    /// Creates one note per text and persists once at the end. Returns the
    /// new ids in order.
    pub fn add_notes<I>(&mut self, target: Option<&str>, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut ids = Vec::new();
        for text in texts {
            let note = self.prepared_note(target, text);
            ids.push(note.id.clone());
            self.notes.push(note);
        }
        if !ids.is_empty() {
            info!("Created {} notes (target: {:?})", ids.len(), target);
            self.persist();
        }
        ids
    }

    fn prepared_note(&mut self, target: Option<&str>, text: String) -> Note {
        let mut note = Note::new(self.fresh_id());
        note.text = text;

        match target.map(Page::parse) {
            Some(Page::Favorites) => note.favorite = true,
            Some(Page::Notebook(notebook_id)) if self.notebook_id_exists(&notebook_id) => {
                note.notebook_id = Some(notebook_id);
            }
            _ => {}
        }
        note
    }

    /// Replaces the text of a note. The title follows the new first line.
    pub fn save_note(&mut self, id: &str, text: &str) -> Result<()> {
        let index = self.note_index(id)?;
        self.notes[index].text = text.to_string();
        debug!("Saved note {} ({} bytes)", id, text.len());
        self.persist();
        Ok(())
    }

    /// Toggles the favorite flag and returns its new value.
    pub fn star_note(&mut self, id: &str) -> Result<bool> {
        let index = self.note_index(id)?;
        let note = &mut self.notes[index];
        note.favorite = !note.favorite;
        let favorite = note.favorite;
        debug!("Note {} favorite = {}", id, favorite);
        self.persist();
        Ok(favorite)
    }

    /// Moves a note to the trash.
    pub fn delete_note(&mut self, id: &str) -> Result<()> {
        let index = self.note_index(id)?;
        self.notes[index].in_trash = true;
        info!("Moved note {} to trash", id);
        self.persist();
        Ok(())
    }

    /// Takes a note out of the trash.
    pub fn recover_note(&mut self, id: &str) -> Result<()> {
        let index = self.note_index(id)?;
        self.notes[index].in_trash = false;
        info!("Recovered note {} from trash", id);
        self.persist();
        Ok(())
    }

    /// Files a note into an existing notebook.
    pub fn change_notebook_of_note(&mut self, note_id: &str, notebook_id: &str) -> Result<()> {
        self.notebook_index(notebook_id)?;
        let index = self.note_index(note_id)?;
        self.notes[index].notebook_id = Some(notebook_id.to_string());
        info!("Moved note {} to notebook {}", note_id, notebook_id);
        self.persist();
        Ok(())
    }

    /// Moves a note back to uncategorized.
    pub fn clear_notebook_of_note(&mut self, note_id: &str) -> Result<()> {
        let index = self.note_index(note_id)?;
        self.notes[index].notebook_id = None;
        info!("Note {} is now uncategorized", note_id);
        self.persist();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notebook mutations
    // ------------------------------------------------------------------

    fn validated_name(name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NotesError::InvalidInput {
                message: "notebook name cannot be empty".to_string(),
            });
        }
        Ok(name.to_string())
    }

    /// Appends a notebook and returns its id.
    pub fn add_notebook(&mut self, name: &str) -> Result<String> {
        let name = Self::validated_name(name)?;
        let id = self.fresh_id();
        info!("Created notebook {} ({})", name, id);
        self.notebooks.push(Notebook::new(id.clone(), name));
        self.persist();
        Ok(id)
    }

    /// Renames a notebook. Notes pick the new name up on their next read.
    pub fn rename_notebook(&mut self, id: &str, name: &str) -> Result<()> {
        let name = Self::validated_name(name)?;
        let index = self.notebook_index(id)?;
        info!(
            "Renamed notebook {} from {} to {}",
            id, self.notebooks[index].name, name
        );
        self.notebooks[index].name = name;
        self.persist();
        Ok(())
    }

    /// Removes a notebook after uncategorizing every note filed under it.
    /// Returns how many notes were affected.
    pub fn delete_notebook(&mut self, id: &str) -> Result<usize> {
        let index = self.notebook_index(id)?;

        let mut cleared = 0;
        for note in self
            .notes
            .iter_mut()
            .filter(|n| n.notebook_id.as_deref() == Some(id))
        {
            note.notebook_id = None;
            cleared += 1;
        }

        let removed = self.notebooks.remove(index);
        info!(
            "Deleted notebook {} ({}), {} notes uncategorized",
            removed.name, id, cleared
        );
        self.persist();
        Ok(cleared)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Every note that is not in the trash.
    pub fn all_notes(&self) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.is_active()).collect()
    }

    pub fn favorite_notes(&self) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| n.is_active() && n.favorite)
            .collect()
    }

    pub fn trashed_notes(&self) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.in_trash).collect()
    }

    pub fn notes_in_notebook(&self, notebook_id: &str) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| n.is_active() && n.notebook_id.as_deref() == Some(notebook_id))
            .collect()
    }

    /// The notes a page lists.
    pub fn notes_for_page(&self, page: &Page) -> Vec<&Note> {
        match page {
            Page::All => self.all_notes(),
            Page::Favorites => self.favorite_notes(),
            Page::Trash => self.trashed_notes(),
            Page::Notebook(id) => self.notes_in_notebook(id),
        }
    }

    /// Looks a note up by id, trashed notes included.
    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    pub fn notebook(&self, id: &str) -> Option<&Notebook> {
        self.notebooks.iter().find(|nb| nb.id == id)
    }

    pub fn notebook_id_exists(&self, id: &str) -> bool {
        self.notebook(id).is_some()
    }

    /// Whether `id` names a note outside the trash.
    pub fn note_id_exists(&self, id: &str) -> bool {
        self.note(id).is_some_and(Note::is_active)
    }

    /// Name of the notebook a note is filed under.
    pub fn notebook_name(&self, note: &Note) -> Option<&str> {
        note.notebook_id
            .as_deref()
            .and_then(|id| self.notebook(id))
            .map(|nb| nb.name.as_str())
    }

    pub fn summary(&self, note: &Note) -> NoteSummary {
        NoteSummary {
            id: note.id.clone(),
            title: note.title(),
            notebook_id: note.notebook_id.clone(),
            notebook: self.notebook_name(note).map(str::to_string),
            favorite: note.favorite,
            in_trash: note.in_trash,
            created_date: note.created_date,
        }
    }

    /// Rendered, sanitized HTML of a note.
    pub fn preview_html(&self, id: &str) -> Option<String> {
        self.note(id).map(|note| self.renderer.render(&note.text))
    }

    /// Searches notes by title and text using fuzzy matching, within the
    /// notes `page` lists. Results are ordered by relevance; an empty query
    /// returns the page unchanged.
    pub fn search_notes(&self, query: &str, page: &Page) -> Vec<&Note> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let candidates = self.notes_for_page(page);
        let query = query.trim();
        if query.is_empty() {
            return candidates;
        }

        info!("Searching {} notes with query: '{}'", candidates.len(), query);
        let matcher = SkimMatcherV2::default();

        let mut scored: Vec<(i64, &Note)> = candidates
            .into_iter()
            .filter_map(|note| {
                let title_score = matcher.fuzzy_match(&note.title(), query).unwrap_or(0);
                let text_score = matcher.fuzzy_match(&note.text, query).unwrap_or(0);
                // Title matches are weighted more heavily
                let score = title_score * 2 + text_score;
                (score > 0).then_some((score, note))
            })
            .collect();

        // Stable sort keeps insertion order between equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        debug!("Search matched {} notes", scored.len());
        scored.into_iter().map(|(_, note)| note).collect()
    }
}
