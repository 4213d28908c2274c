use std::{
    fs::read_to_string,
    io::Write,
    path::Path,
    process::Command,
};

use log::{debug, error, info};
use shell_words::split;
use tempfile::Builder;

use crate::{NotesError, Result};

/// Reads note content from a file, rejecting directories and missing paths.
pub fn read_content_from_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(NotesError::InvalidInput {
            message: format!("Not a readable file: {}", path.display()),
        });
    }
    debug!("Reading note content from {}", path.display());
    read_to_string(path).map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        NotesError::Io(e)
    })
}

/// Runs `editor_cmd` on a temporary markdown file holding `initial` and
/// returns what the file contains once the editor exits.
pub fn edit_in_editor(editor_cmd: &str, initial: &str) -> Result<String> {
    let mut temp_file = Builder::new().prefix("mdnotes-").suffix(".md").tempfile()?;
    temp_file.write_all(initial.as_bytes())?;
    temp_file.flush()?;
    let temp_path = temp_file.path().to_path_buf();

    info!("Opening editor to write note content. Save and exit when done...");
    launch_editor(editor_cmd, &temp_path)?;

    let content = read_to_string(&temp_path)?;
    Ok(content)
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    // Handle shell-like command parsing
    let args = split(editor_cmd).map_err(|e| NotesError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    let Some((program, rest)) = args.split_first() else {
        return Err(NotesError::EditorError {
            message: "Empty editor command".to_string(),
        });
    };

    let status = Command::new(program)
        .args(rest)
        .arg(file_path)
        .status()
        .map_err(|e| NotesError::EditorError {
            message: format!("Failed to execute editor command '{}': {}", program, e),
        })?;

    if !status.success() {
        return Err(NotesError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }

    Ok(())
}
