//! Presentation tree: the in-memory form of a serialized render output.
//!
//! The tree is what the engine searches (anchors, leaf fragments) and mutates
//! (single-fragment patches). It is built by a small forgiving parser over the
//! producer's serialized markup and never round-trips back to markup: the
//! serialized snapshot string stays authoritative, the tree mirrors it.

pub mod anchor;
pub mod entity;
pub mod parse;
pub mod tree;

pub use anchor::{anchor_line, last_anchor, SourceAnchor};
pub use entity::decode_numeric_refs;
pub use parse::parse_markup;
pub use tree::{Element, Node, NodeId, NodeKind, PresentationTree};
