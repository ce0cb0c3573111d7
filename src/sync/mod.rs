//! LineMapper: editor viewport → preview scroll offset.
//!
//! Locates source-position anchors bracketing the edited line, interpolates
//! between their layout offsets and converts the result into a viewport
//! scroll position. Misses (no anchors, unchanged target) are not errors;
//! they simply produce no scroll.

pub mod height_index;
pub mod layout;
pub mod locate;
pub mod wrap;

pub use height_index::HeightIndex;
pub use layout::PreviewLayout;
pub use locate::{find_anchor_at_line, locate_source, AnchorBracket};
pub use wrap::WrapMap;

use crate::markup::{NodeId, PresentationTree};
use crate::model::{ScrollCommand, ViewportState};
use std::time::Duration;

/// Per-call context for [`compute_scroll_target`]: exactly the fields the
/// mapper needs, passed in rather than read off a long-lived session object.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncRequest<'a> {
    /// Restrict anchors to this file's entries (editing a non-primary file).
    pub file_qualifier: Option<&'a str>,
    /// Soft-wrap translation, when the editor wraps lines.
    pub wrap: Option<&'a WrapMap>,
    /// Preview viewport height in layout lines.
    pub viewport_height: u64,
    /// Emit a scroll command even if the offset is unchanged.
    pub force: bool,
    /// Animation duration for the resulting scroll.
    pub duration: Duration,
}

/// Map the editor viewport in `state` to a preview scroll offset.
///
/// `outer_top` resolves a tree node to its content-top layout offset
/// (normally [`PreviewLayout::outer_top`]; tests inject their own).
///
/// Returns `None` ("no scroll") when the target line is unchanged, no anchor
/// exists, the bracketing anchor has no layout position, or the computed
/// offset equals the last one issued and the request is not forced. On
/// success the target line and offset are cached in `state`.
pub fn compute_scroll_target<F>(
    tree: &PresentationTree,
    outer_top: F,
    request: &SyncRequest<'_>,
    state: &mut ViewportState,
) -> Option<ScrollCommand>
where
    F: Fn(NodeId) -> Option<u64>,
{
    let viewport = state.viewport;
    let target = viewport.target_line();
    if state.last_target_line == Some(target) {
        return None;
    }

    // Anchors live in logical source lines; the viewport speaks view lines.
    let text_line = match request.wrap {
        Some(map) => map.logical_of_view(target),
        None => target,
    };

    let bracket = find_anchor_at_line(tree, tree.root(), text_line, request.file_qualifier)?;
    let mut offset = outer_top(bracket.node)? as f64;

    // The anchor marks its element's first source line; distribute the lines
    // up to the next anchor evenly across the space between them.
    if bracket.line < text_line && bracket.line < bracket.next_line {
        if let Some(next_top) = outer_top(bracket.next) {
            let next_top = next_top as f64;
            if next_top > offset {
                let fraction = match request.wrap {
                    Some(map) => {
                        let elem_view = map.view_of_logical(bracket.line) as f64;
                        let next_view = map.view_of_logical(bracket.next_line) as f64;
                        (target as f64 - elem_view) / (next_view - elem_view + 1.0)
                    }
                    None => {
                        (text_line - bracket.line) as f64
                            / (bracket.next_line - bracket.line + 1) as f64
                    }
                };
                offset += (next_top - offset) * fraction.clamp(0.0, 1.0);
            }
        }
    }

    // Keep the target at the same relative position in the preview viewport
    // as the edited line has in the editor viewport.
    let relative = (target - viewport.start_line) as f64 / viewport.height() as f64;
    let scroll_top = (offset - request.viewport_height as f64 * relative).max(0.0) as u64;

    if state.last_scroll_top == Some(scroll_top) && !request.force {
        return None;
    }
    state.remember(target, scroll_top);
    Some(ScrollCommand {
        offset: scroll_top,
        duration: request.duration,
    })
}

// ===== Tests =====
