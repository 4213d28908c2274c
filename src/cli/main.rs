use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Main CLI application arguments and command structure
#[derive(Parser, Debug)]
#[clap(
    name = "mdnotes",
    version,
    about = "Markdown notes organized into notebooks"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Directory holding the notes data (overrides the configuration)
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Where to navigate before running a command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RouteArgs {
    /// Query string such as '?page=favorites&note=<id>'
    #[clap(long, conflicts_with_all = ["page", "note"])]
    pub route: Option<String>,

    /// Page to list: all, favorites, trash or a notebook id
    #[clap(short, long)]
    pub page: Option<String>,

    /// Note to open
    #[clap(short, long)]
    pub note: Option<String>,
}

/// Ways to supply note text
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ContentArgs {
    /// Markdown text of the note
    #[clap(short, long, conflicts_with_all = ["file", "edit"])]
    pub text: Option<String>,

    /// Read the text from a file
    #[clap(short, long, conflicts_with = "edit")]
    pub file: Option<PathBuf>,

    /// Write the text in the configured editor
    #[clap(short, long)]
    pub edit: bool,
}

/// Available subcommands for the mdnotes application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the sidebar, note list and open note for a route
    Show {
        #[clap(flatten)]
        route: RouteArgs,

        /// Open the note in the editor pane instead of the preview
        #[clap(long)]
        editor: bool,

        /// Output the screen as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Create a note on a page (a notebook id, 'favorites' or 'all')
    New {
        /// Page the note is created from
        #[clap(short, long)]
        page: Option<String>,

        #[clap(flatten)]
        content: ContentArgs,
    },

    /// Replace the text of a note
    Edit {
        /// ID of the note to edit
        id: String,

        #[clap(flatten)]
        content: ContentArgs,
    },

    /// Toggle the favorite flag of a note
    Star { id: String },

    /// Move a note to the trash
    Trash { id: String },

    /// Take a note out of the trash
    Recover { id: String },

    /// File a note into a notebook
    Move {
        /// ID of the note
        id: String,

        /// Target notebook id
        #[clap(required_unless_present = "none")]
        notebook: Option<String>,

        /// Make the note uncategorized
        #[clap(long, conflicts_with = "notebook")]
        none: bool,
    },

    /// Notebook operations
    #[clap(subcommand)]
    Notebook(NotebookCommands),

    /// Search notes by title and text
    Search {
        /// Search query text
        query: String,

        /// Limit the search to a page
        #[clap(short, long)]
        page: Option<String>,

        /// Limit the number of search results (0 for no limit)
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Render a note to sanitized HTML
    Render {
        id: String,

        /// Write the HTML to a file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Import markdown files as new notes
    Import {
        /// File or directory to import from
        source: PathBuf,

        /// File name pattern for directory imports
        #[clap(short = 'P', long, default_value = "*.md")]
        pattern: String,

        /// Notebook to file the imported notes into
        #[clap(short, long)]
        notebook: Option<String>,
    },

    /// Export active notes to a zip archive
    Export {
        /// Archive path (default: a timestamped file in the export directory)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotebookCommands {
    /// List notebooks with their note counts
    List,

    /// Create a notebook
    Add { name: String },

    /// Rename a notebook
    Rename { id: String, name: String },

    /// Delete a notebook; its notes become uncategorized
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_route() {
        let cli = Cli::try_parse_from(["mdnotes", "show", "--route", "?page=trash"]).unwrap();
        match cli.command {
            Commands::Show { route, json, editor } => {
                assert_eq!(route.route.as_deref(), Some("?page=trash"));
                assert!(!json && !editor);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn route_conflicts_with_page() {
        assert!(Cli::try_parse_from(["mdnotes", "show", "--route", "?", "--page", "all"]).is_err());
    }

    #[test]
    fn move_needs_a_target() {
        assert!(Cli::try_parse_from(["mdnotes", "move", "n1"]).is_err());
        assert!(Cli::try_parse_from(["mdnotes", "move", "n1", "--none"]).is_ok());
        assert!(Cli::try_parse_from(["mdnotes", "move", "n1", "nb", "--none"]).is_err());
    }

    #[test]
    fn parses_notebook_subcommands() {
        let cli =
            Cli::try_parse_from(["mdnotes", "notebook", "rename", "nb1", "Projects"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Notebook(NotebookCommands::Rename { ref id, ref name })
                if id == "nb1" && name == "Projects"
        ));
    }
}
