//! JSON configuration bootstrap.
//!
//! The config lives in a single JSON file (`./config.json` by default). When
//! the file is missing it is created with default values, so a fresh install
//! works without any setup step.
//!
//! ```json
//! {
//!     "paths": { "notes": "./" },
//!     "options": { "dateStamp": true, "fileExtension": ".txt" },
//!     "server": { "bind": "127.0.0.1:6060" }
//! }
//! ```
//!
//! Relative paths (`paths.notes`, `server.logDir`) are resolved against the
//! directory that contains the config file, not the process working
//! directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::NoteError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub paths: PathsConfig,
    pub options: OptionsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// File this config was read from; never serialized.
    #[serde(skip)]
    source: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PathsConfig {
    pub notes: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionsConfig {
    #[serde(default = "default_date_stamp")]
    pub date_stamp: bool,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

fn default_date_stamp() -> bool {
    true
}
fn default_file_extension() -> String {
    ".txt".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<RegistrarConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_dir: None,
            registrar: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:6060".to_string()
}

/// Where the server announces itself on startup.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarConfig {
    pub url: String,
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_registrar_timeout")]
    pub timeout_secs: u64,
}

fn default_service() -> String {
    "noteserver".to_string()
}
fn default_registrar_timeout() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                notes: PathBuf::from("./"),
            },
            options: OptionsConfig {
                date_stamp: default_date_stamp(),
                file_extension: default_file_extension(),
            },
            server: ServerConfig::default(),
            source: PathBuf::new(),
        }
    }
}

impl Config {
    /// Path of the file this config was loaded from.
    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Directory holding the config file; the anchor for relative paths.
    fn base_dir(&self) -> PathBuf {
        match self.source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// The notes root directory.
    pub fn notes_dir(&self) -> PathBuf {
        self.resolve(&self.paths.notes)
    }

    /// Directory for the server's rolling log file, if configured.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.server.log_dir.as_ref().map(|d| self.resolve(d))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), NoteError> {
        let ext = &self.options.file_extension;
        if !ext.is_empty() && !ext.starts_with('.') {
            return Err(NoteError::InvalidConfig(format!(
                "options.fileExtension must start with '.', got '{}'",
                ext
            )));
        }
        if ext.contains('/') || ext.contains('\\') {
            return Err(NoteError::InvalidConfig(
                "options.fileExtension must not contain a path separator".to_string(),
            ));
        }
        if self.server.bind.trim().is_empty() {
            return Err(NoteError::InvalidConfig(
                "server.bind must not be empty".to_string(),
            ));
        }
        if let Some(reg) = &self.server.registrar {
            if reg.url.trim().is_empty() {
                return Err(NoteError::InvalidConfig(
                    "server.registrar.url must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Serializes with four-space indentation, the layout used for freshly
    /// created config files.
    pub fn to_pretty_json(&self) -> std::result::Result<String, NoteError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Parses config JSON without touching the filesystem.
pub fn parse_config(text: &str, source: &Path) -> std::result::Result<Config, NoteError> {
    let mut config: Config = serde_json::from_str(text)?;
    config.validate()?;
    config.source = source.to_path_buf();
    Ok(config)
}

/// Loads the config at `path`, creating it with defaults when it does not
/// exist yet.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return create_default_config(path);
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read config file: {}", path.display()));
        }
    };

    parse_config(&content, path)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn create_default_config(path: &Path) -> Result<Config> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
    }

    let mut config = Config::default();
    let json = config.to_pretty_json()?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    config.source = path.to_path_buf();
    Ok(config)
}

/// Replaces the config file with `text`, but only when `text` is a valid
/// config. Returns the parsed config so callers can swap it in.
pub fn save_raw(path: &Path, text: &str) -> std::result::Result<Config, NoteError> {
    let config = parse_config(text, path)?;
    std::fs::write(path, text)?;
    tracing::info!(path = %path.display(), "config file updated");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_created_with_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");

        let cfg = load_config(&path).unwrap();
        assert!(path.exists());
        assert!(cfg.options.date_stamp);
        assert_eq!(cfg.options.file_extension, ".txt");
        assert_eq!(cfg.paths.notes, PathBuf::from("./"));
        assert_eq!(cfg.source_path(), path.as_path());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n    \"paths\""), "four-space indent: {}", written);
        assert!(written.contains("\"dateStamp\": true"));
        assert!(written.contains("\"fileExtension\": \".txt\""));
    }

    #[test]
    fn test_created_config_reloads_identically() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let first = load_config(&path).unwrap();
        let second = load_config(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_legacy_config_without_server_section() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"paths":{"notes":"./notes/"},"options":{"dateStamp":false,"fileExtension":".md"}}"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert!(!cfg.options.date_stamp);
        assert_eq!(cfg.options.file_extension, ".md");
        assert_eq!(cfg.server.bind, "127.0.0.1:6060");
        assert!(cfg.server.registrar.is_none());
        assert_eq!(cfg.notes_dir(), tmp.path().join("./notes/"));
    }

    #[test]
    fn test_malformed_config_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_extension_without_dot_rejected() {
        let text = r#"{"paths":{"notes":"./"},"options":{"dateStamp":true,"fileExtension":"txt"}}"#;
        let err = parse_config(text, Path::new("config.json")).unwrap_err();
        assert!(matches!(err, NoteError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_extension_allowed() {
        let text = r#"{"paths":{"notes":"./"},"options":{"dateStamp":true,"fileExtension":""}}"#;
        let cfg = parse_config(text, Path::new("config.json")).unwrap();
        assert_eq!(cfg.options.file_extension, "");
    }

    #[test]
    fn test_absolute_notes_dir_kept() {
        let tmp = TempDir::new().unwrap();
        let abs = tmp.path().join("elsewhere");
        let text = format!(
            r#"{{"paths":{{"notes":"{}"}},"options":{{"dateStamp":true,"fileExtension":".txt"}}}}"#,
            abs.display()
        );
        let cfg = parse_config(&text, &tmp.path().join("config.json")).unwrap();
        assert_eq!(cfg.notes_dir(), abs);
    }

    #[test]
    fn test_save_raw_rejects_invalid_and_keeps_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        load_config(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(save_raw(&path, "[]").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_save_raw_writes_verbatim() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let text = r#"{"paths":{"notes":"./n"},"options":{"dateStamp":false,"fileExtension":".md"}}"#;

        let cfg = save_raw(&path, text).unwrap();
        assert_eq!(cfg.options.file_extension, ".md");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn test_registrar_defaults() {
        let text = r#"{
            "paths": {"notes": "./"},
            "options": {"dateStamp": true, "fileExtension": ".txt"},
            "server": {"bind": "0.0.0.0:6060", "registrar": {"url": "http://dns:6060"}}
        }"#;
        let cfg = parse_config(text, Path::new("config.json")).unwrap();
        let reg = cfg.server.registrar.unwrap();
        assert_eq!(reg.service, "noteserver");
        assert_eq!(reg.timeout_secs, 5);
    }

    fn assert_invalid(text: &str, needle: &str) {
        match parse_config(text, Path::new("config.json")) {
            Err(NoteError::InvalidConfig(msg)) => {
                assert!(msg.contains(needle), "unexpected message: {}", msg)
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_bind_rejected() {
        assert_invalid(
            r#"{"paths":{"notes":"./"},"options":{"dateStamp":true,"fileExtension":".txt"},"server":{"bind":"  "}}"#,
            "server.bind",
        );
    }

    #[test]
    fn test_empty_registrar_url_rejected() {
        assert_invalid(
            r#"{"paths":{"notes":"./"},"options":{"dateStamp":true,"fileExtension":".txt"},"server":{"registrar":{"url":""}}}"#,
            "server.registrar.url",
        );
    }

    #[test]
    fn test_extension_with_separator_rejected() {
        assert_invalid(
            r#"{"paths":{"notes":"./"},"options":{"dateStamp":true,"fileExtension":".d/txt"}}"#,
            "path separator",
        );
    }
}
