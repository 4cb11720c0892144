//! Note file lifecycle: create, list, read, update, delete.
//!
//! Every operation is addressed by a note location `(dir, file_name)`. `dir`
//! is relative to the notes root and may be empty; it can never climb out of
//! the root. A `file_name` without a `.` gets the configured extension
//! appended, so `todo` and `todo.txt` name the same note under the default
//! config.

use chrono::{Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{NoteError, Result};
use crate::models::Note;

/// Formats the header written at the top of new notes, e.g.
/// `"Mon January  2, 2006, \n\n"`.
pub fn date_stamp(date: NaiveDate) -> String {
    format!("{}, \n\n", date.format("%a %B %e, %Y"))
}

/// Filesystem-backed note storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct NoteStore {
    root: PathBuf,
    extension: String,
    date_stamp: bool,
}

impl NoteStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>, date_stamp: bool) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            date_stamp,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.notes_dir(),
            config.options.file_extension.clone(),
            config.options.date_stamp,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Applies the extension rule to a bare note name.
    pub fn file_name_for(&self, name: &str) -> Result<String> {
        validate_file_name(name)?;
        if name.contains('.') {
            Ok(name.to_string())
        } else {
            Ok(format!("{}{}", name, self.extension))
        }
    }

    /// Full on-disk path for a note location.
    pub fn resolve(&self, dir: &str, name: &str) -> Result<PathBuf> {
        let file_name = self.file_name_for(name)?;
        Ok(self.resolve_dir(dir)?.join(file_name))
    }

    fn resolve_dir(&self, dir: &str) -> Result<PathBuf> {
        let rel = Path::new(dir);
        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(NoteError::InvalidPath(dir.to_string())),
            }
        }
        Ok(self.root.join(rel))
    }

    fn header(&self) -> String {
        if self.date_stamp {
            date_stamp(Local::now().date_naive())
        } else {
            String::new()
        }
    }

    /// Creates a new note. Fails if a note already exists at the location.
    pub fn create(&self, dir: &str, name: &str, text: &str) -> Result<Note> {
        let file_name = self.file_name_for(name)?;
        let path = self.resolve_dir(dir)?.join(&file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = format!("{}{}", self.header(), text);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(NoteError::AlreadyExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(contents.as_bytes())?;

        tracing::debug!(path = %path.display(), "note created");

        Ok(Note {
            path: dir.to_string(),
            file_name,
            text: contents,
        })
    }

    /// A blank, unsaved note carrying only the date stamp. Makes sure the
    /// notes root exists so the client can save into it.
    pub fn template(&self) -> Result<Note> {
        fs::create_dir_all(&self.root)?;
        Ok(Note {
            path: String::new(),
            file_name: String::new(),
            text: self.header(),
        })
    }

    /// Entry names directly inside `dir`, sorted. Directories end in `/`.
    pub fn list(&self, dir: &str) -> Result<Vec<String>> {
        let path = self.resolve_dir(dir)?;
        if !path.is_dir() {
            return Err(NoteError::NotFound(path));
        }

        let mut names = Vec::new();
        let walker = WalkDir::new(&path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            let mut name = entry.file_name().to_string_lossy().to_string();
            // Follows symlinks, unlike `file_type()`.
            if entry.path().is_dir() {
                name.push('/');
            }
            names.push(name);
        }

        Ok(names)
    }

    pub fn read(&self, dir: &str, name: &str) -> Result<Note> {
        let file_name = self.file_name_for(name)?;
        let path = self.resolve_dir(dir)?.join(&file_name);
        let text = fs::read_to_string(&path).map_err(|e| not_found_or(e, &path))?;
        Ok(Note {
            path: dir.to_string(),
            file_name,
            text,
        })
    }

    /// Writes `text` to the note, creating it (and its directory) if needed.
    pub fn update(&self, dir: &str, name: &str, text: &str) -> Result<Note> {
        let file_name = self.file_name_for(name)?;
        let path = self.resolve_dir(dir)?.join(&file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text)?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "note saved");

        Ok(Note {
            path: dir.to_string(),
            file_name,
            text: text.to_string(),
        })
    }

    /// Removes the note and returns the path that was deleted.
    pub fn delete(&self, dir: &str, name: &str) -> Result<PathBuf> {
        let path = self.resolve(dir, name)?;
        fs::remove_file(&path).map_err(|e| not_found_or(e, &path))?;
        tracing::debug!(path = %path.display(), "note deleted");
        Ok(path)
    }
}

fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(NoteError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn not_found_or(err: std::io::Error, path: &Path) -> NoteError {
    if err.kind() == ErrorKind::NotFound {
        NoteError::NotFound(path.to_path_buf())
    } else {
        err.into()
    }
}
