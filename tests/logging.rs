//! Logging setup writes a rolling file when a log directory is configured.
//!
//! Kept in its own test binary because it installs the global subscriber.

use notekeeper::logging::{setup_logging, LOG_FILE};
use tempfile::TempDir;

#[test]
fn test_log_dir_gets_rolling_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("logs");

    let guard = setup_logging(false, Some(&dir)).unwrap();
    assert!(guard.is_some());
    tracing::info!(note = "todo.txt", "rolling file check");
    drop(guard);

    let files: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_FILE))
        })
        .collect();
    assert_eq!(files.len(), 1, "log files: {:?}", files);

    let contents = std::fs::read_to_string(&files[0]).unwrap();
    assert!(contents.contains("rolling file check"));
    assert!(contents.contains("note=\"todo.txt\""));
}
