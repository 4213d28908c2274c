//! Error types for the mdnotes application.
//!
//! This module defines the error type shared by the store, the storage layer
//! and the command-line front end.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the mdnotes application.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to zip operations.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Notebook was not found when performing an operation.
    #[error("Notebook not found: {id}")]
    NotebookNotFound { id: String },

    /// Input rejected before touching the store.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The key-value store could not be read or written.
    #[error("Storage error for key '{key}': {message}")]
    StorageError { key: String, message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Invalid glob pattern for imports.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    #[error("{message}")]
    EditorError { message: String },
}
