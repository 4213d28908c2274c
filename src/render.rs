//! Terminal presentation of the notebook list, the note list and the detail
//! pane.
//!
//! Renderers are pure functions from data to text. Drawing goes through a
//! [`Pane`], and [`paint`] is the only place that knows a pane is cleared
//! before new markup goes in.
use std::io::Write;

use console::style;

use crate::{Detail, NoteStore, NoteSummary, Page, Result, Screen, View};

/// A drawing target.
pub trait Pane {
    fn clear(&mut self);
    fn insert(&mut self, markup: &str) -> Result<()>;
}

/// Replaces whatever `pane` shows with `markup`.
pub fn paint(pane: &mut dyn Pane, markup: &str) -> Result<()> {
    pane.clear();
    pane.insert(markup)
}

/// Keeps the last painted markup in memory.
#[derive(Debug, Default)]
pub struct BufferPane {
    pub contents: String,
}

impl Pane for BufferPane {
    fn clear(&mut self) {
        self.contents.clear();
    }

    fn insert(&mut self, markup: &str) -> Result<()> {
        self.contents.push_str(markup);
        Ok(())
    }
}

/// Writes to any output stream. Clearing is a no-op: terminal output scrolls.
pub struct StreamPane<W: Write> {
    out: W,
}

impl<W: Write> StreamPane<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Pane for StreamPane<W> {
    fn clear(&mut self) {}

    fn insert(&mut self, markup: &str) -> Result<()> {
        writeln!(self.out, "{}", markup)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Current terminal width, 80 columns when unknown.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

fn separator(width: usize) -> String {
    "-".repeat(width.clamp(10, 50))
}

fn display_title(title: &str) -> &str {
    if title.is_empty() {
        "Untitled"
    } else {
        title
    }
}

/// The sidebar: the three categories with their counts, then every notebook.
pub fn render_sidebar(store: &NoteStore, current: &Page) -> String {
    let mut lines = Vec::new();
    let mut entry = |page: Page, label: &str, count: usize| {
        let marker = if &page == current { ">" } else { " " };
        let text = format!("{} {} ({})", marker, label, count);
        if &page == current {
            lines.push(style(text).bold().to_string());
        } else {
            lines.push(text);
        }
    };

    entry(Page::All, "Notes", store.all_notes().len());
    entry(Page::Favorites, "Favorites", store.favorite_notes().len());
    entry(Page::Trash, "Trash", store.trashed_notes().len());
    for notebook in store.notebooks() {
        entry(
            Page::Notebook(notebook.id.clone()),
            &format!("{} [{}]", notebook.name, notebook.id),
            store.notes_in_notebook(&notebook.id).len(),
        );
    }

    lines.join("\n")
}

fn render_note_line(note: &NoteSummary, active: bool) -> String {
    let marker = if active { ">" } else { " " };
    let star = if note.favorite { "*" } else { " " };
    let title = if active {
        style(display_title(&note.title)).bold().to_string()
    } else {
        display_title(&note.title).to_string()
    };
    let notebook = note
        .notebook
        .as_deref()
        .map(|name| format!("  {}", style(format!("[{}]", name)).cyan()))
        .unwrap_or_default();

    format!(
        "{}{} {}{}  {}  {}",
        marker,
        star,
        title,
        notebook,
        style(note.created_date.format("%Y-%m-%d %H:%M")).dim(),
        style(&note.id).dim()
    )
}

/// The note list of a view.
pub fn render_note_list(view: &View) -> String {
    if view.notes.is_empty() {
        return match view.page {
            Page::Trash => "Trash is empty.".to_string(),
            _ => "No notes here yet.".to_string(),
        };
    }

    let active = view.open_note.as_deref();
    let mut lines: Vec<String> = view
        .notes
        .iter()
        .map(|note| render_note_line(note, Some(note.id.as_str()) == active))
        .collect();
    lines.push(format!(
        "\n{} note{}",
        view.notes.len(),
        if view.notes.len() == 1 { "" } else { "s" }
    ));
    lines.join("\n")
}

fn note_header(note: &NoteSummary) -> String {
    let mut header = style(display_title(&note.title)).bold().to_string();
    if let Some(notebook) = &note.notebook {
        header.push_str(&format!("  {}", style(format!("[{}]", notebook)).cyan()));
    }
    if note.favorite {
        header.push_str("  *");
    }
    if note.in_trash {
        header.push_str(&format!("  {}", style("(in trash)").red()));
    }
    header
}

/// Terminal rendition of markdown: headings in bold, everything else as is.
fn styled_markdown(markdown: &str) -> String {
    markdown
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                style(line).bold().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The detail pane. Previews show the styled markdown of the note; the
/// HTML they carry is for front ends that can display it.
pub fn render_detail(store: &NoteStore, detail: &Detail) -> String {
    match detail {
        Detail::Empty => style("Select a note to view").dim().to_string(),
        Detail::Preview { note, .. } => {
            let body = store.note(&note.id).map(|n| n.text.as_str()).unwrap_or("");
            format!("{}\n\n{}", note_header(note), styled_markdown(body))
        }
        Detail::Editor { note, markdown } => {
            let numbered = if markdown.is_empty() {
                "   1 | ".to_string()
            } else {
                markdown
                    .lines()
                    .enumerate()
                    .map(|(i, line)| format!("{:>4} | {}", i + 1, line))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            format!(
                "{}  {}\n\n{}",
                note_header(note),
                style("(editing)").yellow(),
                numbered
            )
        }
    }
}

/// The whole screen: route, sidebar, note list and detail pane.
pub fn render_screen(store: &NoteStore, screen: &Screen, width: usize) -> String {
    let rule = separator(width);
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n{}",
        style(screen.route.to_string()).dim(),
        render_sidebar(store, &screen.view.page),
        rule,
        render_note_list(&screen.view),
        rule,
        render_detail(store, &screen.detail),
        rule
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Controller, Note, Notebook, Route, Snapshot};
    use chrono::Utc;

    fn controller() -> Controller {
        let store = NoteStore::in_memory(Snapshot {
            notes: vec![
                Note {
                    id: "a".to_string(),
                    text: "# Groceries\n- milk".to_string(),
                    notebook_id: Some("home".to_string()),
                    favorite: true,
                    in_trash: false,
                    created_date: Utc::now(),
                },
                Note::new("b".to_string()),
            ],
            notebooks: vec![Notebook::new("home".to_string(), "Home".to_string())],
        });
        Controller::new(store)
    }

    #[test]
    fn paint_replaces_previous_markup() {
        let mut pane = BufferPane::default();
        paint(&mut pane, "first").unwrap();
        paint(&mut pane, "second").unwrap();
        assert_eq!(pane.contents, "second");
    }

    #[test]
    fn stream_pane_writes_lines() {
        let mut out = Vec::new();
        {
            let mut pane = StreamPane::new(&mut out);
            paint(&mut pane, "hello").unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
    }

    #[test]
    fn note_list_shows_titles_and_notebooks() {
        let c = controller();
        let list = render_note_list(c.view());
        assert!(list.contains("Groceries"));
        assert!(list.contains("Home"));
        assert!(list.contains("Untitled"));
        assert!(list.contains("2 notes"));
    }

    #[test]
    fn empty_pages_have_messages() {
        let mut c = controller();
        c.navigate(Route::for_page("trash"));
        assert_eq!(render_note_list(c.view()), "Trash is empty.");
    }

    #[test]
    fn sidebar_counts_pages() {
        let c = controller();
        let sidebar = render_sidebar(c.store(), &Page::All);
        assert!(sidebar.contains("Notes (2)"));
        assert!(sidebar.contains("Favorites (1)"));
        assert!(sidebar.contains("Trash (0)"));
        assert!(sidebar.contains("Home [home] (1)"));
    }

    #[test]
    fn detail_follows_pane_mode() {
        let mut c = controller();
        assert!(render_detail(c.store(), &c.detail()).contains("Select a note to view"));

        c.open_note("a");
        let preview = render_detail(c.store(), &c.detail());
        assert!(preview.contains("Groceries"));
        assert!(preview.contains("- milk"));

        c.toggle_editor();
        let editor = render_detail(c.store(), &c.detail());
        assert!(editor.contains("(editing)"));
        assert!(editor.contains("   2 | - milk"));
    }

    #[test]
    fn screen_includes_route() {
        let mut c = controller();
        c.open_note("a");
        let text = render_screen(c.store(), &c.screen(), 80);
        assert!(text.contains("?note=a"));
        assert!(text.contains("Groceries"));
    }
}
