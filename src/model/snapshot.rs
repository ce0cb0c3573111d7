//! The single current document snapshot.

use std::sync::Arc;

/// The one source-text snapshot the orchestrator renders from.
///
/// Singly owned by the controller and replaced atomically when the watched
/// document changes. The text is reference-counted so producer jobs (which may
/// hand it to a worker thread) never copy the document.
///
/// `doc_name` is the primary document; `edit_name` tracks which file the editor
/// currently has open. When they differ, the edited file's name qualifies
/// anchor lookups so multi-file documents scroll against the right anchors.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    doc_name: String,
    edit_name: String,
    text: Arc<str>,
}

impl DocumentSnapshot {
    /// Create a snapshot for a document; the edited file starts as the
    /// document itself.
    pub fn new(doc_name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        let doc_name = doc_name.into();
        Self {
            edit_name: doc_name.clone(),
            doc_name,
            text: text.into(),
        }
    }

    /// The primary document name.
    pub fn doc_name(&self) -> &str {
        &self.doc_name
    }

    /// The file currently being edited.
    pub fn edit_name(&self) -> &str {
        &self.edit_name
    }

    /// Switch which file the editor has open.
    pub fn set_edit_name(&mut self, name: impl Into<String>) {
        self.edit_name = name.into();
    }

    /// Replace the source text.
    pub fn set_text(&mut self, text: impl Into<Arc<str>>) {
        self.text = text.into();
    }

    /// A cheap handle to the current text.
    pub fn text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Borrow the current text.
    pub fn text_ref(&self) -> &str {
        &self.text
    }

    /// True when the edited file is the primary document.
    pub fn editing_primary(&self) -> bool {
        self.edit_name == self.doc_name
    }

    /// Anchor file qualifier for the mapper: the edited file's name when it is
    /// not the primary document, `None` otherwise.
    pub fn file_qualifier(&self) -> Option<&str> {
        if self.editing_primary() {
            None
        } else {
            Some(&self.edit_name)
        }
    }
}
