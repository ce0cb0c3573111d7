//! Editor viewport state and scroll commands.

use std::time::Duration;

/// The editor's visible line range and cursor, in view (wrapped) lines, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorViewport {
    /// First visible line.
    pub start_line: u32,
    /// Last visible line.
    pub end_line: u32,
    /// Cursor line (may be outside the visible range).
    pub cursor_line: u32,
}

impl EditorViewport {
    /// Create a viewport; `end_line` is clamped to at least `start_line`.
    pub fn new(start_line: u32, end_line: u32, cursor_line: u32) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
            cursor_line,
        }
    }

    /// The line the preview should align to: the cursor when visible, else the
    /// midpoint of the visible range (keeps context centered when the cursor
    /// is off-screen).
    pub fn target_line(&self) -> u32 {
        if self.cursor_line >= self.start_line && self.cursor_line <= self.end_line {
            self.cursor_line
        } else {
            self.start_line + (self.end_line - self.start_line + 1) / 2
        }
    }

    /// Number of visible lines.
    pub fn height(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

impl Default for EditorViewport {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Viewport tracking owned by the orchestrator.
///
/// Holds the latest viewport reported by the editor plus the mapper's memo:
/// the last target line it resolved and the last scroll offset it issued.
/// Mutated only on scroll/patch events.
#[derive(Debug, Clone, Default)]
pub struct ViewportState {
    /// Latest viewport reported by the editor.
    pub viewport: EditorViewport,
    /// Last target line a scroll command was issued for.
    pub last_target_line: Option<u32>,
    /// Last scroll offset issued.
    pub last_scroll_top: Option<u64>,
}

impl ViewportState {
    /// Record a new viewport from the editor.
    pub fn set_viewport(&mut self, viewport: EditorViewport) {
        self.viewport = viewport;
    }

    /// Record a resolved sync result.
    pub fn remember(&mut self, target_line: u32, scroll_top: u64) {
        self.last_target_line = Some(target_line);
        self.last_scroll_top = Some(scroll_top);
    }
}

/// A scroll instruction for the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    /// Target scroll offset from the top of the preview, in layout lines.
    pub offset: u64,
    /// Animation duration; zero means jump immediately.
    pub duration: Duration,
}
