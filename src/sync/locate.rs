//! Anchor search over the presentation tree.

use crate::markup::{anchor_line, last_anchor, NodeId, PresentationTree, SourceAnchor};

/// The anchors bracketing a target source line: the deepest anchor at or
/// before the line ("current") and the next anchor after it.
///
/// `next_line` defaults to the target line itself when no later anchor
/// exists, which disables interpolation past the last anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorBracket {
    /// Deepest element whose anchor line is `<=` the target.
    pub node: NodeId,
    /// That element's anchor line (0 when only a later anchor was found).
    pub line: u32,
    /// The following bracket element.
    pub next: NodeId,
    /// The following element's anchor line.
    pub next_line: u32,
}

/// Find the anchors bracketing `line` under `elem`.
///
/// Scans element children for `data-line` anchors (inline-flow elements are
/// excluded; with a `qualifier`, only entries for that file count), then
/// narrows: once a bracketing pair is found at this depth, recursion
/// descends only into that bracket looking for a tighter pair. Returns
/// `None` when the subtree carries no anchor at all.
pub fn find_anchor_at_line(
    tree: &PresentationTree,
    elem: NodeId,
    line: u32,
    qualifier: Option<&str>,
) -> Option<AnchorBracket> {
    if line == 0 {
        return None;
    }
    let children: Vec<NodeId> = tree
        .children(elem)
        .iter()
        .copied()
        .filter(|&c| tree.element(c).is_some())
        .collect();
    if children.is_empty() {
        return None;
    }

    let mut current = 0usize;
    let mut current_line = 0u32;
    let mut next = children.len() - 1;
    let mut next_line = line;
    let mut found = false;

    for (i, &child) in children.iter().enumerate() {
        let Some(element) = tree.element(child) else {
            continue;
        };
        if element.is_inline_flow() {
            continue;
        }
        let Some(attr) = element.attr("data-line") else {
            continue;
        };
        let Some(child_line) = anchor_line(attr, qualifier) else {
            continue;
        };
        if child_line <= line {
            found = true;
            current_line = child_line;
            current = i;
        }
        if child_line > line {
            found = true;
            next_line = child_line;
            next = i;
            break;
        }
    }

    // Narrow into the bracket: the first child in range with a tighter pair
    // wins, and its "next" is adopted only if it really lies past the line.
    let mut result = AnchorBracket {
        node: children[current],
        line: current_line,
        next: children[next],
        next_line,
    };
    for &child in &children[current..=next] {
        let has_element_children = tree
            .children(child)
            .iter()
            .any(|&c| tree.element(c).is_some());
        if !has_element_children {
            continue;
        }
        if let Some(inner) = find_anchor_at_line(tree, child, line, qualifier) {
            found = true;
            result.node = inner.node;
            result.line = inner.line;
            if inner.next_line > line {
                result.next = inner.next;
                result.next_line = inner.next_line;
            }
            break;
        }
    }

    if !found {
        return None;
    }
    Some(result)
}

/// Reverse lookup: the nearest source position at or above a node.
///
/// Walks ancestors from `node` to the root and returns the final
/// `[file:]line` entry of the first `data-line` attribute found. This is the
/// preview-to-editor direction.
pub fn locate_source(tree: &PresentationTree, node: NodeId) -> Option<SourceAnchor> {
    let mut cursor = Some(node);
    while let Some(id) = cursor {
        if let Some(element) = tree.element(id) {
            if let Some(attr) = element.attr("data-line") {
                if let Some(anchor) = last_anchor(attr) {
                    return Some(anchor);
                }
            }
        }
        cursor = tree.node(id).parent;
    }
    None
}

// ===== Tests =====
