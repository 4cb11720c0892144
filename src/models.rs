//! Wire types shared by the CLI, the note store, and the HTTP server.

use serde::{Deserialize, Serialize};

/// A note as exchanged over HTTP: its directory (relative to the notes
/// root), its file name, and its text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub text: String,
}

/// A directory listing request or response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Directory {
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub files: Vec<String>,
}
