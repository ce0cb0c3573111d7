//! Headless block layout for the presentation tree.
//!
//! Assigns every block-level element a vertical position in layout lines, the
//! unit the scroll protocol speaks. The model is deliberately simple -- text
//! wraps at the preview width, block elements stack, a small per-tag style
//! table supplies margins -- because the mapper only needs offsets that are
//! *consistent* with the preview consumer, not pixel-exact.
//!
//! Top-level blocks are indexed in a [`HeightIndex`], so re-measuring the one
//! block an incremental patch touched shifts all later blocks in O(log n).

use crate::markup::{NodeId, NodeKind, PresentationTree};
use crate::sync::height_index::HeightIndex;
use std::collections::HashMap;
use unicode_width::UnicodeWidthStr;

/// Vertical spacing for a block element, in layout lines.
///
/// `padding` and `border` apply to both the top and bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStyle {
    /// Space above the border box.
    pub margin_top: u64,
    /// Space below the border box.
    pub margin_bottom: u64,
    /// Inner spacing on each vertical edge.
    pub padding: u64,
    /// Border width on each vertical edge.
    pub border: u64,
}

const FLUSH: BlockStyle = BlockStyle {
    margin_top: 0,
    margin_bottom: 0,
    padding: 0,
    border: 0,
};

/// Default vertical style per tag.
fn block_style(tag: &str) -> BlockStyle {
    match tag {
        "h1" => BlockStyle {
            margin_top: 2,
            margin_bottom: 1,
            padding: 0,
            border: 0,
        },
        "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "ul" | "ol" => BlockStyle {
            margin_top: 1,
            margin_bottom: 1,
            padding: 0,
            border: 0,
        },
        "pre" => BlockStyle {
            margin_top: 1,
            margin_bottom: 1,
            padding: 1,
            border: 0,
        },
        "blockquote" => BlockStyle {
            margin_top: 1,
            margin_bottom: 1,
            padding: 0,
            border: 1,
        },
        "hr" => BlockStyle {
            margin_top: 1,
            margin_bottom: 1,
            padding: 0,
            border: 1,
        },
        _ => FLUSH,
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeMetrics {
    /// Border-box top relative to the containing top-level block's outer start.
    rel_top: u64,
    /// Style components, kept for the content-top adjustment.
    margin_top: u64,
    padding_top: u64,
    border_top: u64,
    /// Index of the containing top-level block.
    block: usize,
}

/// Computed layout for one mounted presentation tree.
#[derive(Debug, Clone)]
pub struct PreviewLayout {
    width: u16,
    blocks: Vec<NodeId>,
    metrics: HashMap<NodeId, NodeMetrics>,
    index: HeightIndex,
}

impl PreviewLayout {
    /// Lay out a tree at the given preview width (columns).
    ///
    /// Only element children of the root become top-level blocks; bare text
    /// at the root (inter-block whitespace in practice) occupies no space.
    pub fn compute(tree: &PresentationTree, width: u16) -> Self {
        let width = width.max(1);
        let root_children: Vec<NodeId> = tree
            .children(tree.root())
            .iter()
            .copied()
            .filter(|&c| tree.element(c).is_some())
            .collect();

        let mut layout = Self {
            width,
            blocks: Vec::with_capacity(root_children.len()),
            metrics: HashMap::new(),
            index: HeightIndex::new(root_children.len()),
        };
        for child in root_children {
            let block = layout.blocks.len();
            layout.blocks.push(child);
            let outer = layout.measure_element(tree, child, 0, block);
            layout.index.push(outer);
        }
        layout
    }

    /// The preview width this layout was computed at.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Total document height in layout lines.
    pub fn total_height(&self) -> u64 {
        self.index.total()
    }

    /// The content-top offset of a block element: its border-box top adjusted
    /// upward by its own margin/padding/border, approximating the true start
    /// of its content region. `None` for text nodes, inline elements and
    /// anything else the layout did not place.
    pub fn outer_top(&self, node: NodeId) -> Option<u64> {
        let m = self.metrics.get(&node)?;
        let abs_top = self.index.offset_of(m.block) + m.rel_top;
        Some(abs_top.saturating_sub(m.margin_top + m.padding_top + m.border_top))
    }

    /// Re-measure the top-level block containing `node` after a leaf patch,
    /// shifting every later block through the height index.
    pub fn refresh_block_of(&mut self, tree: &PresentationTree, node: NodeId) {
        let Some(block_node) = self.top_level_ancestor(tree, node) else {
            return;
        };
        let Some(block) = self.blocks.iter().position(|&b| b == block_node) else {
            return;
        };
        let outer = self.measure_element(tree, block_node, 0, block);
        self.index.set(block, outer);
    }

    fn top_level_ancestor(&self, tree: &PresentationTree, mut node: NodeId) -> Option<NodeId> {
        let root = tree.root();
        loop {
            let parent = tree.node(node).parent?;
            if parent == root {
                return Some(node);
            }
            node = parent;
        }
    }

    /// Measure one block element starting at `y` (relative to its top-level
    /// block's outer start) and record metrics for it and its block
    /// descendants. Returns the outer height (margins included).
    fn measure_element(
        &mut self,
        tree: &PresentationTree,
        id: NodeId,
        y: u64,
        block: usize,
    ) -> u64 {
        let style = tree
            .element(id)
            .map(|e| block_style(&e.tag))
            .unwrap_or(FLUSH);
        let top = y + style.margin_top;
        let content_start = top + style.border + style.padding;
        let content_end = self.measure_children(tree, id, content_start, block);
        let height = ((content_end - content_start) + 2 * (style.border + style.padding)).max(1);
        self.metrics.insert(
            id,
            NodeMetrics {
                rel_top: top,
                margin_top: style.margin_top,
                padding_top: style.padding,
                border_top: style.border,
                block,
            },
        );
        top + height + style.margin_bottom
    }

    /// Lay out a block's children: inline runs accumulate and wrap, nested
    /// blocks recurse. Returns the y cursor after the last child.
    fn measure_children(
        &mut self,
        tree: &PresentationTree,
        id: NodeId,
        start: u64,
        block: usize,
    ) -> u64 {
        let mut y = start;
        let mut run = String::new();
        for &child in tree.children(id) {
            match &tree.node(child).kind {
                NodeKind::Text(t) => run.push_str(t),
                NodeKind::Element(e) if e.is_inline_flow() => {
                    run.push_str(&tree.text_content(child));
                }
                NodeKind::Element(_) => {
                    y += self.wrapped_lines(&run);
                    run.clear();
                    y = self.measure_element(tree, child, y, block);
                }
            }
        }
        y + self.wrapped_lines(&run)
    }

    /// Lines occupied by an inline run at the preview width. Whitespace-only
    /// segments (inter-tag newlines) occupy nothing.
    fn wrapped_lines(&self, run: &str) -> u64 {
        let width = self.width as u64;
        run.split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let cols = UnicodeWidthStr::width(line) as u64;
                cols.div_ceil(width).max(1)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_markup;

    #[test]
    fn paragraphs_stack_with_margins() {
        let tree = parse_markup("<p data-line=\"1\">one</p><p data-line=\"2\">two</p>");
        let layout = PreviewLayout::compute(&tree, 80);
        let kids: Vec<NodeId> = tree
            .children(tree.root())
            .iter()
            .copied()
            .filter(|&c| tree.element(c).is_some())
            .collect();
        // First <p>: margin 1 above, so border top at 1; outer_top backs the
        // margin out again.
        assert_eq!(layout.outer_top(kids[0]), Some(0));
        // Block 0 outer height: 1 (margin) + 1 (line) + 1 (margin) = 3.
        assert_eq!(layout.outer_top(kids[1]), Some(3));
        assert_eq!(layout.total_height(), 6);
    }

    #[test]
    fn long_lines_wrap_at_preview_width() {
        let long = "x".repeat(170);
        let tree = parse_markup(&format!("<p>{long}</p>"));
        let layout = PreviewLayout::compute(&tree, 80);
        // ceil(170 / 80) = 3 lines + 2 margins
        assert_eq!(layout.total_height(), 5);
    }

    #[test]
    fn nested_blocks_are_measured() {
        let tree = parse_markup("<ul data-line=\"1\"><li data-line=\"1\">a</li><li data-line=\"2\">b</li></ul>");
        let layout = PreviewLayout::compute(&tree, 80);
        let ul = tree.children(tree.root())[0];
        let items: Vec<NodeId> = tree.children(ul).to_vec();
        assert_eq!(layout.outer_top(ul), Some(0));
        // ul margin 1, li are flush: first li at 1, second at 2.
        assert_eq!(layout.outer_top(items[0]), Some(1));
        assert_eq!(layout.outer_top(items[1]), Some(2));
    }

    #[test]
    fn inline_elements_do_not_get_offsets() {
        let tree = parse_markup("<p>a <em>b</em> c</p>");
        let layout = PreviewLayout::compute(&tree, 80);
        let p = tree.children(tree.root())[0];
        let em = tree.children(p)[1];
        assert!(layout.outer_top(p).is_some());
        assert_eq!(layout.outer_top(em), None);
    }

    #[test]
    fn refresh_block_shifts_later_blocks() {
        let tree_markup = "<p data-line=\"1\">short</p><p data-line=\"5\">tail</p>";
        let mut tree = parse_markup(tree_markup);
        let mut layout = PreviewLayout::compute(&tree, 10);
        let kids: Vec<NodeId> = tree.children(tree.root()).to_vec();
        let before = layout.outer_top(kids[1]).unwrap();

        // Grow the first paragraph's text (as a leaf patch would) and refresh.
        let text = tree.find_text_nodes("short")[0];
        tree.set_text(text, "now much longer paragraph text".to_string());
        layout.refresh_block_of(&tree, text);

        let after = layout.outer_top(kids[1]).unwrap();
        assert!(after > before, "second block must shift down ({before} -> {after})");
    }

    #[test]
    fn whitespace_between_blocks_occupies_nothing() {
        let tree = parse_markup("<p>a</p>\n\n<p>b</p>");
        let layout = PreviewLayout::compute(&tree, 80);
        assert_eq!(layout.total_height(), 6);
    }
}
