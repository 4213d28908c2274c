//! Snapshot persistence on top of a key-value store.
//!
//! Notes and notebooks are stored as two independent JSON arrays under the
//! `notes` and `notebooks` keys. A store missing either key, or holding data
//! that does not parse, is treated as a first run and the bundled dataset is
//! used for both collections.
use log::{debug, error, info, warn};

use crate::{KeyValueStore, LoadOutcome, Note, Notebook, NotesError, Result, Snapshot};

/// Key holding the JSON array of notes
pub const NOTES_KEY: &str = "notes";
/// Key holding the JSON array of notebooks
pub const NOTEBOOKS_KEY: &str = "notebooks";

const DEFAULT_NOTES: &str = include_str!("../data/notes.json");
const DEFAULT_NOTEBOOKS: &str = include_str!("../data/notebooks.json");

/// Receives the full state after every mutation.
///
/// Implementations decide when the write actually happens; the caller never
/// learns about failures except through `last_error`.
pub trait SnapshotSink: Send {
    fn submit(&mut self, notes: &[Note], notebooks: &[Notebook]);

    /// The most recent write failure, cleared by the next successful write.
    fn last_error(&self) -> Option<String>;
}

/// Both collections serialized and ready to be written.
#[derive(Debug, Clone)]
pub struct EncodedSnapshot {
    pub notes: String,
    pub notebooks: String,
}

impl EncodedSnapshot {
    pub fn encode(notes: &[Note], notebooks: &[Notebook]) -> Result<Self> {
        Ok(Self {
            notes: serde_json::to_string(notes)?,
            notebooks: serde_json::to_string(notebooks)?,
        })
    }
}

/// The bundled dataset used on first run.
pub fn default_snapshot() -> Snapshot {
    let notes = serde_json::from_str::<Vec<Note>>(DEFAULT_NOTES);
    let notebooks = serde_json::from_str::<Vec<Notebook>>(DEFAULT_NOTEBOOKS);
    match (notes, notebooks) {
        (Ok(notes), Ok(notebooks)) => Snapshot { notes, notebooks },
        (Err(e), _) | (_, Err(e)) => {
            error!("Bundled default dataset is invalid: {}", e);
            Snapshot::default()
        }
    }
}

/// Reads and writes snapshots through a [`KeyValueStore`].
pub struct StorageAdapter<S> {
    store: S,
    last_error: Option<String>,
}

impl<S: KeyValueStore> StorageAdapter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            last_error: None,
        }
    }

    /// Loads both collections, falling back to the bundled dataset.
    ///
    /// Never fails and never returns a partially loaded snapshot.
    pub fn load(&self) -> (Snapshot, LoadOutcome) {
        match self.read_stored() {
            Ok(Some(snapshot)) => {
                info!(
                    "Loaded {} notes and {} notebooks from storage",
                    snapshot.notes.len(),
                    snapshot.notebooks.len()
                );
                (snapshot, LoadOutcome::Stored)
            }
            Ok(None) => {
                info!("No stored notes found, using the default dataset");
                (
                    default_snapshot(),
                    LoadOutcome::Defaults {
                        reason: "no stored data".to_string(),
                    },
                )
            }
            Err(e) => {
                warn!("Failed to load stored notes, using the default dataset: {}", e);
                (
                    default_snapshot(),
                    LoadOutcome::Defaults {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    fn read_stored(&self) -> Result<Option<Snapshot>> {
        let notes = self.store.get(NOTES_KEY)?;
        let notebooks = self.store.get(NOTEBOOKS_KEY)?;

        let (Some(notes), Some(notebooks)) = (notes, notebooks) else {
            return Ok(None);
        };

        let notes: Vec<Note> = serde_json::from_str(&notes).map_err(|e| {
            error!("Stored notes are corrupt: {}", e);
            NotesError::Serialization(e)
        })?;
        let notebooks: Vec<Notebook> = serde_json::from_str(&notebooks).map_err(|e| {
            error!("Stored notebooks are corrupt: {}", e);
            NotesError::Serialization(e)
        })?;

        Ok(Some(Snapshot { notes, notebooks }))
    }

    /// Serializes and writes both collections.
    pub fn save(&mut self, notes: &[Note], notebooks: &[Notebook]) -> Result<()> {
        let encoded = EncodedSnapshot::encode(notes, notebooks)?;
        self.write_encoded(&encoded)
    }

    /// Writes an already serialized snapshot.
    pub fn write_encoded(&mut self, encoded: &EncodedSnapshot) -> Result<()> {
        debug!(
            "Writing snapshot ({} + {} bytes)",
            encoded.notes.len(),
            encoded.notebooks.len()
        );
        self.store.set(NOTES_KEY, &encoded.notes)?;
        self.store.set(NOTEBOOKS_KEY, &encoded.notebooks)?;
        Ok(())
    }
}

/// Inline persistence: the write happens before `submit` returns.
impl<S: KeyValueStore> SnapshotSink for StorageAdapter<S> {
    fn submit(&mut self, notes: &[Note], notebooks: &[Notebook]) {
        match self.save(notes, notebooks) {
            Ok(()) => self.last_error = None,
            Err(e) => {
                error!("Failed to persist notes: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Err(NotesError::StorageError {
                key: key.to_string(),
                message: "unavailable".to_string(),
            })
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<()> {
            Err(NotesError::StorageError {
                key: key.to_string(),
                message: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn bundled_dataset_parses() {
        let snapshot = default_snapshot();
        assert!(!snapshot.notes.is_empty());
        assert!(!snapshot.notebooks.is_empty());
        for note in &snapshot.notes {
            if let Some(id) = &note.notebook_id {
                assert!(snapshot.notebooks.iter().any(|nb| &nb.id == id));
            }
        }
    }

    #[test]
    fn empty_store_falls_back_to_defaults() {
        let adapter = StorageAdapter::new(MemoryStore::new());
        let (snapshot, outcome) = adapter.load();
        assert_eq!(snapshot, default_snapshot());
        assert!(matches!(outcome, LoadOutcome::Defaults { .. }));
    }

    #[test]
    fn missing_one_key_falls_back_for_both() {
        let store = MemoryStore::with_entries([(NOTES_KEY, "[]")]);
        let (snapshot, outcome) = StorageAdapter::new(store).load();
        assert_eq!(snapshot, default_snapshot());
        assert!(matches!(outcome, LoadOutcome::Defaults { .. }));
    }

    #[test]
    fn corrupt_data_falls_back_to_defaults() {
        let store = MemoryStore::with_entries([(NOTES_KEY, "{not json"), (NOTEBOOKS_KEY, "[]")]);
        let (snapshot, outcome) = StorageAdapter::new(store).load();
        assert_eq!(snapshot, default_snapshot());
        match outcome {
            LoadOutcome::Defaults { reason } => assert!(reason.contains("Serialization")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn unreadable_store_falls_back_to_defaults() {
        let (snapshot, outcome) = StorageAdapter::new(FailingStore).load();
        assert_eq!(snapshot, default_snapshot());
        assert!(matches!(outcome, LoadOutcome::Defaults { .. }));
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let store = MemoryStore::new();
        let mut adapter = StorageAdapter::new(store.clone());
        let defaults = default_snapshot();
        adapter.save(&defaults.notes[..1], &defaults.notebooks).unwrap();

        let (snapshot, outcome) = StorageAdapter::new(store).load();
        assert_eq!(outcome, LoadOutcome::Stored);
        assert_eq!(snapshot.notes, defaults.notes[..1].to_vec());
        assert_eq!(snapshot.notebooks, defaults.notebooks);
    }

    #[test]
    fn sink_records_and_clears_write_failures() {
        let mut failing = StorageAdapter::new(FailingStore);
        failing.submit(&[], &[]);
        assert!(failing.last_error().unwrap().contains("read-only"));

        let mut working = StorageAdapter::new(MemoryStore::new());
        working.last_error = Some("earlier".to_string());
        working.submit(&[], &[]);
        assert_eq!(working.last_error(), None);
    }
}
