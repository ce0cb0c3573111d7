//! Soft-wrap line translation.
//!
//! When the editor soft-wraps, its viewport speaks in view (wrapped) lines
//! while anchors speak in logical source lines. This map translates between
//! the two spaces given the wrap column, so interpolation can run in view
//! space where distances match what the user sees.

use unicode_width::UnicodeWidthStr;

/// Bidirectional logical ↔ view line translation for one text snapshot.
///
/// All lines are 1-based. Out-of-range inputs clamp to the nearest valid
/// line rather than failing: the editor and the snapshot can briefly
/// disagree about the document length mid-edit.
#[derive(Debug, Clone)]
pub struct WrapMap {
    /// `first_view[i]` is the view line where logical line `i + 1` starts.
    first_view: Vec<u32>,
    total_view_lines: u32,
}

impl WrapMap {
    /// Build a map for `text` wrapped at `column` display columns.
    pub fn build(text: &str, column: u16) -> Self {
        let column = column.max(1) as u64;
        let mut first_view = Vec::new();
        let mut next = 1u32;
        for line in text.split('\n') {
            first_view.push(next);
            let cols = UnicodeWidthStr::width(line) as u64;
            let rows = cols.div_ceil(column).max(1);
            next += rows as u32;
        }
        Self {
            first_view,
            total_view_lines: next - 1,
        }
    }

    /// Number of logical lines.
    pub fn logical_lines(&self) -> u32 {
        self.first_view.len() as u32
    }

    /// Number of view lines.
    pub fn view_lines(&self) -> u32 {
        self.total_view_lines
    }

    /// First view line of a logical line.
    pub fn view_of_logical(&self, line: u32) -> u32 {
        if self.first_view.is_empty() {
            return 1;
        }
        let index = (line.max(1) as usize - 1).min(self.first_view.len() - 1);
        self.first_view[index]
    }

    /// Logical line containing a view line.
    pub fn logical_of_view(&self, view_line: u32) -> u32 {
        if self.first_view.is_empty() {
            return 1;
        }
        let view_line = view_line.max(1);
        let after = self.first_view.partition_point(|&first| first <= view_line);
        (after.max(1)) as u32
    }
}
