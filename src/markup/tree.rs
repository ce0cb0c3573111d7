//! Arena-backed presentation tree.

use std::fmt::Write as _;

/// Index of a node within its [`PresentationTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw arena index.
    pub fn get(&self) -> usize {
        self.0
    }
}

/// Element data: tag name and attributes in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name.
    pub tag: String,
    /// Attributes in document order; values are stored verbatim.
    pub attrs: Vec<(String, String)>,
}

/// Tags that participate in inline flow and are therefore never anchors.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "cite", "code", "em", "i", "kbd", "mark", "q", "s", "small", "span",
    "strong", "sub", "sup", "u",
];

impl Element {
    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The `display` property of an inline `style` attribute, if any.
    fn style_display(&self) -> Option<&str> {
        let style = self.attr("style")?;
        for decl in style.split(';') {
            let mut parts = decl.splitn(2, ':');
            let prop = parts.next()?.trim();
            if prop.eq_ignore_ascii_case("display") {
                return parts.next().map(str::trim);
            }
        }
        None
    }

    /// Whether this element participates in inline flow.
    ///
    /// Inline-flow nodes are excluded as scroll anchors: their vertical
    /// position is meaningless on its own. Either the tag is inherently
    /// inline or an inline `style` forces an inline display mode.
    pub fn is_inline_flow(&self) -> bool {
        INLINE_TAGS.contains(&self.tag.as_str())
            || self
                .style_display()
                .is_some_and(|d| d.contains("inline"))
    }
}

/// Node payload: an element or a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with tag and attributes.
    Element(Element),
    /// A text run; numeric character references are already decoded.
    Text(String),
}

/// One node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Children in document order.
    pub children: Vec<NodeId>,
    /// Element or text payload.
    pub kind: NodeKind,
}

/// The mounted presentation tree.
///
/// Node 0 is always a synthetic `body` element wrapping the parsed markup, so
/// outputs with multiple top-level elements have a single root to search from.
#[derive(Debug, Clone)]
pub struct PresentationTree {
    nodes: Vec<Node>,
}

impl PresentationTree {
    /// An empty tree: just the synthetic root.
    pub fn empty() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element(Element {
                    tag: "body".to_string(),
                    attrs: Vec::new(),
                }),
            }],
        }
    }

    /// The synthetic root element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Children of a node, in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The element payload of a node, if it is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    /// The text payload of a node, if it is a text run.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(t.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    /// Number of nodes in the arena (including the root).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds nothing but the synthetic root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub(crate) fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Concatenated text content of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element(_) => {
                for &child in &self.nodes[id.0].children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// All text nodes whose content equals `needle`, in document order.
    ///
    /// The patcher requires exactly one match before mutating; returning the
    /// full list lets it reject ambiguity.
    pub fn find_text_nodes(&self, needle: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match &node.kind {
                NodeKind::Text(t) if t == needle => Some(NodeId(i)),
                _ => None,
            })
            .collect()
    }

    /// Replace a text node's content. Returns false if the node is an element.
    pub fn set_text(&mut self, id: NodeId, text: String) -> bool {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(t) => {
                *t = text;
                true
            }
            NodeKind::Element(_) => false,
        }
    }

    /// Resolve a child-index path from the root to a node.
    ///
    /// Used by the reverse-lookup control command, which addresses nodes the
    /// only way an external process can: by position.
    pub fn node_at_path(&self, path: &[usize]) -> Option<NodeId> {
        let mut id = self.root();
        for &index in path {
            id = *self.nodes[id.0].children.get(index)?;
        }
        Some(id)
    }

    /// Indented structural outline, for diagnostics and snapshot tests.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.outline_node(self.root(), 0, &mut out);
        out
    }

    fn outline_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let pad = "  ".repeat(depth);
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => {
                let _ = writeln!(out, "{pad}#text {t:?}");
            }
            NodeKind::Element(e) => {
                let _ = write!(out, "{pad}<{}", e.tag);
                for (name, value) in &e.attrs {
                    let _ = write!(out, " {name}={value:?}");
                }
                let _ = writeln!(out, ">");
                for &child in &self.nodes[id.0].children {
                    self.outline_node(child, depth + 1, out);
                }
            }
        }
    }
}
