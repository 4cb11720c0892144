//! Hands a note to the user's text editor.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// The editor to launch: `$VISUAL`, then `$EDITOR`, then `vi`.
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Runs `editor` on `path` and waits for it to exit.
///
/// `editor` may carry arguments (`"code --wait"`); it is split on
/// whitespace.
pub fn open_in_editor(editor: &str, path: &Path) -> Result<()> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("editor command is empty"))?;

    tracing::debug!(editor = %editor, path = %path.display(), "launching editor");

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to launch editor '{}'", program))?;

    if !status.success() {
        bail!("editor '{}' exited with {}", program, status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_editor_errors() {
        let err = open_in_editor("   ", Path::new("note.txt")).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_editor() {
        open_in_editor("true", Path::new("note.txt")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_editor_reports_status() {
        let err = open_in_editor("false", Path::new("note.txt")).unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn test_missing_editor_binary() {
        let err = open_in_editor("definitely-not-an-editor-xyz", Path::new("n.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to launch editor"));
    }
}
