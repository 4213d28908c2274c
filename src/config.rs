use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{NotesError, Result};

const CONFIG_FILE: &str = "config.json";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the `notes.json` and `notebooks.json` stores
    pub data_dir: PathBuf,

    /// Default directory for zip exports
    pub export_dir: PathBuf,

    /// Default editor command
    pub editor_command: Option<String>,

    /// Persist on a background task instead of inline after each change
    pub write_behind: bool,

    /// Log filter used when RUST_LOG is not set
    pub default_filter: String,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "mdnotes")
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".mdnotes"));
        Self {
            export_dir: data_dir.join("exports"),
            data_dir,
            editor_command: None,
            write_behind: true,
            default_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Where the configuration is read from when no path is given.
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(".mdnotes").join(CONFIG_FILE))
    }

    /// Reads the configuration at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| NotesError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|_| NotesError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Configuration written to {}", path.display());
        Ok(())
    }

    /// Applies a `key=value` assignment.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| NotesError::ConfigError {
                message: format!("expected key=value, got '{}'", assignment),
            })?;

        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "export_dir" => self.export_dir = PathBuf::from(value),
            "editor_command" => {
                self.editor_command = (!value.is_empty()).then(|| value.to_string())
            }
            "write_behind" => {
                self.write_behind = value.parse().map_err(|_| NotesError::ConfigError {
                    message: format!("write_behind must be true or false, got '{}'", value),
                })?
            }
            "default_filter" => self.default_filter = value.to_string(),
            other => {
                return Err(NotesError::ConfigError {
                    message: format!("unknown setting '{}'", other),
                })
            }
        }
        Ok(())
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -W -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn saved_config_loads_back_with_partial_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set("data_dir=/tmp/notes").unwrap();
        config.set("write_behind = false").unwrap();
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);

        fs::write(&path, r#"{"editor_command": "code -w"}"#).unwrap();
        let partial = Config::load(&path).unwrap();
        assert_eq!(partial.editor_command.as_deref(), Some("code -w"));
        assert_eq!(partial.get_editor_command(), "code -w");
        assert!(partial.write_behind);
    }

    #[test]
    fn rejects_bad_settings() {
        let mut config = Config::default();
        assert!(config.set("no_equals").is_err());
        assert!(config.set("colour=blue").is_err());
        assert!(config.set("write_behind=maybe").is_err());
    }

    #[test]
    fn corrupt_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(NotesError::ConfigError { .. })
        ));
    }
}
