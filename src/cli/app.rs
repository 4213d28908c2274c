//! CLI module for the mdnotes application
//!
//! This module maps parsed commands onto controller operations and paints the
//! outcome into a pane.
use std::{
    fs,
    io::{stdin, stdout, Write},
    path::PathBuf,
};

use chrono::Utc;
use log::info;

use crate::{
    edit_in_editor, export_zip, import_markdown, paint, read_content_from_file, render_note_list,
    render_screen, render_sidebar, Commands, Config, ContentArgs, Controller, NoteStore,
    NoteSummary, NotebookCommands, NotesError, Pane, Result, Route, RouteArgs, View,
};

/// CLI Application handler - processes CLI commands against a controller
pub struct App<P: Pane> {
    controller: Controller,

    /// Application configuration
    config: Config,

    /// Where `config --set/--reset` writes to
    config_path: PathBuf,

    /// Output target
    pane: P,

    /// Width used for separators
    width: usize,
}

impl<P: Pane> App<P> {
    pub fn new(controller: Controller, config: Config, config_path: PathBuf, pane: P) -> Self {
        Self {
            controller,
            config,
            config_path,
            pane,
            width: crate::terminal_width(),
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn pane(&self) -> &P {
        &self.pane
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_store(self) -> NoteStore {
        self.controller.into_store()
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Show {
                route,
                editor,
                json,
            } => self.handle_show(route, editor, json),
            Commands::New { page, content } => self.handle_new(page, content),
            Commands::Edit { id, content } => self.handle_edit(id, content),
            Commands::Star { id } => {
                let favorite = self.controller.star(&id)?;
                let message = if favorite {
                    format!("Note {} added to favorites", id)
                } else {
                    format!("Note {} removed from favorites", id)
                };
                self.print(&message)
            }
            Commands::Trash { id } => {
                self.controller.trash(&id)?;
                self.print(&format!("Note {} moved to trash", id))
            }
            Commands::Recover { id } => {
                self.controller.recover(&id)?;
                self.print(&format!("Note {} recovered", id))
            }
            Commands::Move { id, notebook, none } => match (notebook, none) {
                (Some(notebook), false) => {
                    self.controller.move_to_notebook(&id, &notebook)?;
                    self.print(&format!("Note {} moved to notebook {}", id, notebook))
                }
                _ => {
                    self.controller.uncategorize(&id)?;
                    self.print(&format!("Note {} is now uncategorized", id))
                }
            },
            Commands::Notebook(command) => self.handle_notebook(command),
            Commands::Search {
                query,
                page,
                limit,
                json,
            } => self.handle_search(query, page, limit, json),
            Commands::Render { id, output } => self.handle_render(id, output),
            Commands::Import {
                source,
                pattern,
                notebook,
            } => self.handle_import(source, pattern, notebook),
            Commands::Export { output } => self.handle_export(output),
            Commands::Config { show, set, reset } => self.handle_config(show, set, reset),
        }
    }

    fn print(&mut self, markup: &str) -> Result<()> {
        paint(&mut self.pane, markup)
    }

    fn route_from(args: RouteArgs) -> Route {
        match args.route {
            Some(query) => Route::parse(&query),
            None => Route {
                page: args.page,
                note: args.note,
            },
        }
    }

    fn handle_show(&mut self, route: RouteArgs, editor: bool, json: bool) -> Result<()> {
        let requested = Self::route_from(route);
        self.controller.navigate(requested.clone());
        if self.controller.route() != &requested {
            info!("Showing {} instead of {}", self.controller.route(), requested);
        }
        if editor {
            self.controller.toggle_editor();
        }

        let screen = self.controller.screen();
        let output = if json {
            serde_json::to_string_pretty(&screen)?
        } else {
            render_screen(self.controller.store(), &screen, self.width)
        };
        self.print(&output)
    }

    /// Text for a note from the content options. `None` when no option was
    /// given.
    fn content_from(&self, content: ContentArgs, initial: &str) -> Result<Option<String>> {
        match (content.text, content.file, content.edit) {
            (Some(text), _, _) => Ok(Some(text)),
            (_, Some(path), _) => read_content_from_file(&path).map(Some),
            (_, _, true) => {
                edit_in_editor(&self.config.get_editor_command(), initial).map(Some)
            }
            (None, None, false) => Ok(None),
        }
    }

    fn handle_new(&mut self, page: Option<String>, content: ContentArgs) -> Result<()> {
        if let Some(page) = &page {
            self.controller.show_page(page);
        }
        // Nothing is created when the content cannot be read
        let id = match self.content_from(content, "# ")? {
            Some(text) => self.controller.create_note(&text),
            None => self.controller.new_note(),
        };
        self.print(&format!("Note created with ID: {}", id))
    }

    fn handle_edit(&mut self, id: String, content: ContentArgs) -> Result<()> {
        let current = self
            .controller
            .store()
            .note(&id)
            .map(|note| note.text.clone())
            .ok_or_else(|| NotesError::NoteNotFound { id: id.clone() })?;

        // With no option given the editor opens on the current text
        let content = if content.text.is_none() && content.file.is_none() {
            ContentArgs {
                edit: true,
                ..content
            }
        } else {
            content
        };

        let text = self.content_from(content, &current)?.unwrap_or(current);
        self.controller.save_note(&id, &text)?;
        self.print(&format!("Note {} updated", id))
    }

    fn handle_notebook(&mut self, command: NotebookCommands) -> Result<()> {
        match command {
            NotebookCommands::List => {
                let sidebar = render_sidebar(self.controller.store(), &self.controller.view().page);
                self.print(&sidebar)
            }
            NotebookCommands::Add { name } => {
                let id = self.controller.add_notebook(&name)?;
                self.print(&format!("Notebook created with ID: {}", id))
            }
            NotebookCommands::Rename { id, name } => {
                self.controller.rename_notebook(&id, &name)?;
                self.print(&format!("Notebook {} renamed to {}", id, name.trim()))
            }
            NotebookCommands::Delete { id, force } => {
                let notebook = self
                    .controller
                    .store()
                    .notebook(&id)
                    .cloned()
                    .ok_or_else(|| NotesError::NotebookNotFound { id: id.clone() })?;

                if !force && !Self::confirm(&format!(
                    "Delete notebook '{}'? Its {} notes become uncategorized. [y/N]: ",
                    notebook.name,
                    self.controller.store().notes_in_notebook(&id).len()
                ))? {
                    return self.print("Deletion cancelled.");
                }

                let cleared = self.controller.delete_notebook(&id)?;
                self.print(&format!(
                    "Notebook '{}' deleted, {} note{} uncategorized",
                    notebook.name,
                    cleared,
                    if cleared == 1 { "" } else { "s" }
                ))
            }
        }
    }

    fn confirm(prompt: &str) -> Result<bool> {
        print!("{}", prompt);
        stdout().flush()?;
        let mut input = String::new();
        stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();
        Ok(input == "y" || input == "yes")
    }

    fn handle_search(
        &mut self,
        query: String,
        page: Option<String>,
        limit: usize,
        json: bool,
    ) -> Result<()> {
        if let Some(page) = page {
            self.controller.show_page(&page);
        }

        let mut results: Vec<NoteSummary> = self.controller.search(&query);
        if limit > 0 && results.len() > limit {
            results.truncate(limit);
        }

        let output = if json {
            serde_json::to_string_pretty(&results)?
        } else if results.is_empty() {
            format!("No notes found matching query: \"{}\"", query)
        } else {
            render_note_list(&View {
                page: self.controller.view().page.clone(),
                notes: results,
                open_note: None,
            })
        };
        self.print(&output)
    }

    fn handle_render(&mut self, id: String, output: Option<PathBuf>) -> Result<()> {
        let html = self
            .controller
            .store()
            .preview_html(&id)
            .ok_or(NotesError::NoteNotFound { id })?;
        match output {
            Some(path) => {
                fs::write(&path, &html)?;
                self.print(&format!("HTML written to {}", path.display()))
            }
            None => self.print(&html),
        }
    }

    fn handle_import(
        &mut self,
        source: PathBuf,
        pattern: String,
        notebook: Option<String>,
    ) -> Result<()> {
        let summary = self.controller.batch(|store| {
            import_markdown(store, &source, &pattern, notebook.as_deref())
        })?;

        let mut report = vec![
            "Import summary:".to_string(),
            format!("  Files matched:         {}", summary.files_matched),
            format!("  Successfully imported: {}", summary.imported.len()),
            format!("  Failed imports:        {}", summary.failed.len()),
        ];
        for (path, reason) in &summary.failed {
            report.push(format!("  {}: {}", path.display(), reason));
        }
        self.print(&report.join("\n"))
    }

    fn handle_export(&mut self, output: Option<PathBuf>) -> Result<()> {
        let archive = output.unwrap_or_else(|| {
            let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
            self.config
                .export_dir
                .join(format!("mdnotes_export_{}.zip", timestamp))
        });
        let summary = export_zip(self.controller.store(), &archive)?;
        self.print(&format!(
            "Exported {} notes to {}",
            summary.notes_exported,
            summary.archive.display()
        ))
    }

    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        // Without other flags the configuration is shown
        let show = show || (!reset && set.is_none());
        if reset {
            self.config = Config::default();
            self.config.save(&self.config_path)?;
            self.print("Configuration reset to defaults")?;
        }
        if let Some(assignment) = set {
            self.config.set(&assignment)?;
            self.config.save(&self.config_path)?;
            self.print(&format!("Configuration updated: {}", assignment))?;
        }
        if show {
            let json = serde_json::to_string_pretty(&self.config)?;
            self.print(&json)?;
        }
        Ok(())
    }
}
