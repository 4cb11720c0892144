//! Error type shared by the note store and the config loader.
//!
//! The HTTP server maps each variant onto a status code, so callers that
//! need to distinguish "missing" from "malformed" can match on it instead of
//! inspecting message text. The CLI simply wraps it in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("note already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid note name: {0}")]
    InvalidName(String),

    #[error("invalid note directory: {0}")]
    InvalidPath(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, NoteError>;
