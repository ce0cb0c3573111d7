//! Watched source document.
//!
//! Watches the document for modifications with debounced filesystem events
//! and reloads the full text on change. Unlike a log tailer, a document
//! under edit changes anywhere, so there is no incremental read path.

use crate::model::error::SourceError;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Debounce window for filesystem events.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// A source document watched for live edits.
pub struct WatchedFile {
    path: PathBuf,
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    event_rx: Receiver<notify_debouncer_mini::DebounceEventResult>,
}

impl WatchedFile {
    /// Start watching the given document.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::FileNotFound`] if the document does not exist,
    /// [`SourceError::Watch`] if the watcher cannot be installed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SourceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer =
            new_debouncer(DEBOUNCE, tx).map_err(|e| SourceError::Watch(e.to_string()))?;
        debouncer
            .watcher()
            .watch(path, notify::RecursiveMode::NonRecursive)
            .map_err(|e| SourceError::Watch(e.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            _debouncer: debouncer,
            event_rx: rx,
        })
    }

    /// The watched path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document's current text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::FileDeleted`] if the document is gone,
    /// [`SourceError::Io`] for other read failures.
    pub fn read_text(&self) -> Result<String, SourceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SourceError::FileDeleted),
            Err(e) => Err(SourceError::Io(e)),
        }
    }

    /// Poll for change events. Non-blocking; returns true if the document
    /// was modified since the last poll.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::FileDeleted`] when deletion is detected.
    pub fn poll_changes(&mut self) -> Result<bool, SourceError> {
        let mut has_changes = false;

        // Drain all pending events
        while let Ok(result) = self.event_rx.try_recv() {
            match result {
                Ok(events) => {
                    for event in events {
                        if event.kind == DebouncedEventKind::Any && !self.path.exists() {
                            return Err(SourceError::FileDeleted);
                        }
                        has_changes = true;
                    }
                }
                Err(error) => {
                    if let notify::ErrorKind::PathNotFound = error.kind {
                        return Err(SourceError::FileDeleted);
                    }
                    // Other watcher errors are transient; keep polling.
                }
            }
        }

        Ok(has_changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::thread;

    #[test]
    fn new_requires_an_existing_document() {
        let missing = std::env::temp_dir().join("pvsync_missing_12345.md");
        let result = WatchedFile::new(&missing);
        assert!(matches!(result, Err(SourceError::FileNotFound { .. })));
    }

    #[test]
    fn read_text_returns_current_contents() {
        let path = std::env::temp_dir().join("pvsync_test_read_text.md");
        fs::write(&path, "# Hello\n").unwrap();

        let watched = WatchedFile::new(&path).unwrap();
        let text = watched.read_text().unwrap();

        let _ = fs::remove_file(&path);
        assert_eq!(text, "# Hello\n");
    }

    #[test]
    fn poll_detects_modification() {
        let path = std::env::temp_dir().join("pvsync_test_poll_changes.md");
        fs::write(&path, "one\n").unwrap();

        let mut watched = WatchedFile::new(&path).unwrap();
        thread::sleep(Duration::from_millis(50));
        let before = watched.poll_changes().unwrap();

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "two").unwrap();
        drop(file);

        // Wait out the debounce window plus margin.
        thread::sleep(Duration::from_millis(300));
        let after = watched.poll_changes().unwrap();

        let _ = fs::remove_file(&path);
        assert!(!before, "no change before the write");
        assert!(after, "change after the write");
    }

    #[test]
    fn deletion_is_detected() {
        let path = std::env::temp_dir().join("pvsync_test_deletion.md");
        fs::write(&path, "text\n").unwrap();

        let mut watched = WatchedFile::new(&path).unwrap();
        thread::sleep(Duration::from_millis(50));
        let _ = watched.poll_changes();

        fs::remove_file(&path).unwrap();
        thread::sleep(Duration::from_millis(300));

        let result = watched.poll_changes();
        assert!(
            matches!(result, Err(SourceError::FileDeleted)),
            "expected FileDeleted, got {result:?}"
        );
    }

    #[test]
    fn read_after_deletion_reports_file_deleted() {
        let path = std::env::temp_dir().join("pvsync_test_read_deleted.md");
        fs::write(&path, "text\n").unwrap();
        let watched = WatchedFile::new(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(matches!(watched.read_text(), Err(SourceError::FileDeleted)));
    }
}
