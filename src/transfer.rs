//! Moving notes in and out of the store: markdown imports and zip exports.
use std::{
    collections::HashSet,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use globset::{GlobBuilder, GlobMatcher};
use log::{debug, info, warn};
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{EncodedSnapshot, NoteStore, NotesError, Result};

/// Folder used in exports for notes outside any notebook
pub const UNCATEGORIZED_FOLDER: &str = "Uncategorized";

/// Name of the JSON snapshot stored next to the markdown files in exports
pub const SNAPSHOT_ENTRY: &str = "snapshot.json";

/// Result of an import run
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Files that matched the pattern
    pub files_matched: usize,
    /// Ids of the notes created, in import order
    pub imported: Vec<String>,
    /// Files that could not be read, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Result of an export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub archive: PathBuf,
    pub notes_exported: usize,
}

fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(false)
        .build()?;
    Ok(glob.compile_matcher())
}

/// Files under `source` whose name matches `pattern`. A file given directly
/// is taken regardless of the pattern.
fn collect_files(source: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }
    if !source.is_dir() {
        return Err(NotesError::InvalidInput {
            message: format!("Path not found: {}", source.display()),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                if matcher.is_match(entry.file_name()) {
                    files.push(entry.into_path());
                }
            }
            Ok(_) => {} // Skip directories
            Err(e) => warn!("Error accessing path during import: {}", e),
        }
    }
    Ok(files)
}

/// Text to store for an imported file. Files that do not open with a `# `
/// heading get one made from the file stem.
fn imported_text(path: &Path, content: &str) -> String {
    if content.starts_with("# ") {
        return content.to_string();
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Imported note");
    format!("# {}\n\n{}", stem, content.trim_start())
}

/// Imports every markdown file under `source` matching `pattern` as a new
/// note, optionally filed into `notebook_id`.
pub fn import_markdown(
    store: &mut NoteStore,
    source: &Path,
    pattern: &str,
    notebook_id: Option<&str>,
) -> Result<ImportSummary> {
    if let Some(id) = notebook_id {
        if !store.notebook_id_exists(id) {
            return Err(NotesError::NotebookNotFound { id: id.to_string() });
        }
    }

    let matcher = compile_pattern(pattern)?;
    let files = collect_files(source, &matcher)?;
    info!(
        "Importing {} files from {} (pattern {})",
        files.len(),
        source.display(),
        pattern
    );

    let mut summary = ImportSummary {
        files_matched: files.len(),
        ..ImportSummary::default()
    };

    let mut texts = Vec::new();
    for path in files {
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("Read {} for import", path.display());
                texts.push(imported_text(&path, &content));
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                summary.failed.push((path, e.to_string()));
            }
        }
    }

    // One write for the whole import
    summary.imported = store.add_notes(notebook_id, texts);

    info!(
        "Import finished: {} imported, {} failed",
        summary.imported.len(),
        summary.failed.len()
    );
    Ok(summary)
}

/// Turns a title into something usable as a file name.
fn file_stem_for(title: &str, id: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        id.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Writes every active note as `<notebook>/<title>.md` into a zip archive,
/// plus a JSON snapshot of both collections (trash included).
pub fn export_zip(store: &NoteStore, archive: &Path) -> Result<ExportSummary> {
    if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|_| NotesError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
    }

    let file = File::create(archive)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut used_paths = HashSet::new();
    let notes = store.all_notes();
    for note in &notes {
        let folder = store.notebook_name(note).unwrap_or(UNCATEGORIZED_FOLDER);
        let folder = file_stem_for(folder, UNCATEGORIZED_FOLDER);
        let stem = file_stem_for(&note.title(), &note.id);

        let mut entry = format!("{}/{}.md", folder, stem);
        if !used_paths.insert(entry.clone()) {
            entry = format!("{}/{}-{}.md", folder, stem, note.id);
            used_paths.insert(entry.clone());
        }

        zip.start_file(entry.as_str(), options)?;
        zip.write_all(note.text.as_bytes())?;
        debug!("Exported note {} as {}", note.id, entry);
    }

    let snapshot = store.snapshot();
    let encoded = EncodedSnapshot::encode(&snapshot.notes, &snapshot.notebooks)?;
    zip.start_file(SNAPSHOT_ENTRY, options)?;
    write!(
        zip,
        "{{\"notes\":{},\"notebooks\":{}}}",
        encoded.notes, encoded.notebooks
    )?;

    zip.finish()?;
    info!(
        "Exported {} notes to {}",
        notes.len(),
        archive.display()
    );

    Ok(ExportSummary {
        archive: archive.to_path_buf(),
        notes_exported: notes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Note, Notebook, Snapshot};
    use chrono::Utc;
    use std::io::Read;
    use tempfile::tempdir;

    fn store() -> NoteStore {
        let note = |id: &str, text: &str, notebook: Option<&str>, in_trash: bool| Note {
            id: id.to_string(),
            text: text.to_string(),
            notebook_id: notebook.map(str::to_string),
            favorite: false,
            in_trash,
            created_date: Utc::now(),
        };
        NoteStore::in_memory(Snapshot {
            notes: vec![
                note("a", "# Ideas\nmany", Some("work"), false),
                note("b", "# Ideas\nmore", Some("work"), false),
                note("c", "", None, false),
                note("d", "# Old", None, true),
            ],
            notebooks: vec![Notebook::new("work".to_string(), "Work".to_string())],
        })
    }

    #[test]
    fn imports_matching_files_into_a_notebook() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.md"), "# One\nbody").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("Two.MD"), "\nno heading").unwrap();
        fs::write(dir.path().join("skip.txt"), "ignored").unwrap();

        let mut s = store();
        let summary = import_markdown(&mut s, dir.path(), "*.md", Some("work")).unwrap();
        assert_eq!(summary.files_matched, 2);
        assert_eq!(summary.imported.len(), 2);
        assert!(summary.failed.is_empty());

        let titles: Vec<String> = summary
            .imported
            .iter()
            .map(|id| s.note(id).unwrap().title())
            .collect();
        assert!(titles.contains(&"One".to_string()));
        assert!(titles.contains(&"Two".to_string()));
        assert_eq!(s.notes_in_notebook("work").len(), 4);
    }

    #[test]
    fn import_adds_a_heading_when_the_file_has_none() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("reading list.md");
        fs::write(&file, "Plain opening line\nmore").unwrap();

        let mut s = store();
        let summary = import_markdown(&mut s, &file, "*.md", None).unwrap();
        let note = s.note(&summary.imported[0]).unwrap();
        assert_eq!(note.title(), "reading list");
        assert_eq!(note.text, "# reading list\n\nPlain opening line\nmore");
    }

    #[test]
    fn import_rejects_unknown_notebook_and_missing_path() {
        let dir = tempdir().unwrap();
        let mut s = store();
        assert!(matches!(
            import_markdown(&mut s, dir.path(), "*.md", Some("nope")),
            Err(NotesError::NotebookNotFound { .. })
        ));
        assert!(matches!(
            import_markdown(&mut s, &dir.path().join("absent"), "*.md", None),
            Err(NotesError::InvalidInput { .. })
        ));
        assert!(matches!(
            import_markdown(&mut s, dir.path(), "[", None),
            Err(NotesError::InvalidPattern(_))
        ));
    }

    #[test]
    fn exports_active_notes_and_snapshot() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("out").join("notes.zip");
        let summary = export_zip(&store(), &archive).unwrap();
        assert_eq!(summary.notes_exported, 3);

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let names: Vec<String> = zip.file_names().map(str::to_string).collect();
        assert!(names.contains(&"Work/Ideas.md".to_string()));
        assert!(names.contains(&"Work/Ideas-b.md".to_string()));
        assert!(names.contains(&"Uncategorized/c.md".to_string()));
        assert!(!names.iter().any(|n| n.contains("Old")));

        let mut snapshot = String::new();
        zip.by_name(SNAPSHOT_ENTRY)
            .unwrap()
            .read_to_string(&mut snapshot)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(value["notes"].as_array().unwrap().len(), 4);
        assert_eq!(value["notebooks"][0]["name"], "Work");
    }
}
