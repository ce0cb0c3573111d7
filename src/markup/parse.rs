//! Forgiving single-pass markup parser.
//!
//! Builds a [`PresentationTree`] from a producer's serialized output. The
//! parser is deliberately tolerant -- unknown constructs are skipped, stray
//! closing tags are ignored, unterminated elements are closed at end of
//! input -- because the output string is producer-controlled and the tree
//! only needs to mirror it well enough for anchor search and leaf patching.
//!
//! Text runs are stored with numeric character references decoded (the
//! engine's canonical comparison form) and are preserved verbatim otherwise,
//! whitespace-only runs included: fragment expansion in the patcher spans
//! everything between delimiters, so the tree must keep the same bytes.

use crate::markup::entity::decode_numeric_refs;
use crate::markup::tree::{Element, NodeId, NodeKind, PresentationTree};

/// Elements that never have content and never go on the open-element stack.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Parse serialized markup into a presentation tree.
pub fn parse_markup(markup: &str) -> PresentationTree {
    Parser {
        bytes: markup.as_bytes(),
        markup,
        pos: 0,
    }
    .run()
}

struct Parser<'a> {
    bytes: &'a [u8],
    markup: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> PresentationTree {
        let mut tree = PresentationTree::empty();
        let mut stack: Vec<NodeId> = vec![tree.root()];
        let mut text_start = 0;

        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] != b'<' {
                self.pos += 1;
                continue;
            }
            // A real construct starts here? Peek before flushing text.
            if !self.at_markup_construct() {
                self.pos += 1;
                continue;
            }
            flush_text(&mut tree, &stack, &self.markup[text_start..self.pos]);

            if self.eat("<!--") {
                self.skip_past("-->");
            } else if self.eat("</") {
                let name = self.read_name();
                self.skip_past(">");
                close_element(&tree, &mut stack, &name);
            } else if self.eat("<!") {
                self.skip_past(">");
            } else {
                self.pos += 1; // consume '<'
                let name = self.read_name();
                let (attrs, self_closed) = self.read_attrs();
                let element = Element { tag: name, attrs };
                let is_void = VOID_TAGS.contains(&element.tag.as_str());
                let parent = *stack.last().unwrap_or(&tree.root());
                let id = tree.push_node(parent, NodeKind::Element(element));
                if !self_closed && !is_void {
                    stack.push(id);
                }
            }
            text_start = self.pos;
        }
        flush_text(&mut tree, &stack, &self.markup[text_start..]);
        tree
    }

    /// True when the `<` at the cursor opens a tag, comment or declaration,
    /// as opposed to being a literal character in a text run.
    fn at_markup_construct(&self) -> bool {
        match self.bytes.get(self.pos + 1) {
            Some(b) => b.is_ascii_alphabetic() || *b == b'/' || *b == b'!',
            None => false,
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.markup[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_past(&mut self, token: &str) {
        match self.markup[self.pos..].find(token) {
            Some(offset) => self.pos += offset + token.len(),
            None => self.pos = self.bytes.len(),
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-')
        {
            self.pos += 1;
        }
        self.markup[start..self.pos].to_ascii_lowercase()
    }

    fn skip_whitespace(&mut self) {
        while self.bytes.get(self.pos).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Read attributes up to and including the closing `>`.
    fn read_attrs(&mut self) -> (Vec<(String, String)>, bool) {
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            match self.bytes.get(self.pos).copied() {
                None => return (attrs, false),
                Some(b'>') => {
                    self.pos += 1;
                    return (attrs, false);
                }
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'>') => {
                    self.pos += 2;
                    return (attrs, true);
                }
                Some(_) => {
                    let name = self.read_attr_name();
                    if name.is_empty() {
                        // Unparseable byte inside a tag; step over it.
                        self.pos += 1;
                        continue;
                    }
                    self.skip_whitespace();
                    let value = if self.bytes.get(self.pos) == Some(&b'=') {
                        self.pos += 1;
                        self.skip_whitespace();
                        self.read_attr_value()
                    } else {
                        String::new()
                    };
                    attrs.push((name, value));
                }
            }
        }
    }

    fn read_attr_name(&mut self) -> String {
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|&b| {
            !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/')
        }) {
            self.pos += 1;
        }
        self.markup[start..self.pos].to_ascii_lowercase()
    }

    fn read_attr_value(&mut self) -> String {
        match self.bytes.get(self.pos).copied() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.bytes.get(self.pos).is_some_and(|b| *b != quote) {
                    self.pos += 1;
                }
                let value = self.markup[start..self.pos].to_string();
                if self.pos < self.bytes.len() {
                    self.pos += 1; // closing quote
                }
                value
            }
            _ => {
                let start = self.pos;
                while self
                    .bytes
                    .get(self.pos)
                    .is_some_and(|b| !b.is_ascii_whitespace() && *b != b'>')
                {
                    self.pos += 1;
                }
                self.markup[start..self.pos].to_string()
            }
        }
    }
}

/// Append a text run (with numeric references decoded) under the open element.
fn flush_text(tree: &mut PresentationTree, stack: &[NodeId], raw: &str) {
    if raw.is_empty() {
        return;
    }
    let parent = *stack.last().unwrap_or(&tree.root());
    let decoded = decode_numeric_refs(raw).into_owned();
    tree.push_node(parent, NodeKind::Text(decoded));
}

/// Pop the open-element stack down to (and including) the named element.
///
/// A closing tag with no matching open element is ignored; the root is never
/// popped.
fn close_element(tree: &PresentationTree, stack: &mut Vec<NodeId>, name: &str) {
    let matching = stack
        .iter()
        .rposition(|&id| tree.element(id).is_some_and(|e| e.tag == name));
    if let Some(index) = matching {
        if index > 0 {
            stack.truncate(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_paragraphs() {
        let tree = parse_markup("<p>A</p><p>B</p>");
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 2);
        let first = tree.children(root)[0];
        assert_eq!(tree.element(first).unwrap().tag, "p");
        assert_eq!(tree.text_content(first), "A");
        assert_eq!(tree.text_content(root), "AB");
    }

    #[test]
    fn parses_attributes_with_double_quotes() {
        let tree = parse_markup(r#"<h1 data-line="12" class="title">Intro</h1>"#);
        let h1 = tree.children(tree.root())[0];
        let element = tree.element(h1).unwrap();
        assert_eq!(element.attr("data-line"), Some("12"));
        assert_eq!(element.attr("class"), Some("title"));
    }

    #[test]
    fn parses_unquoted_and_single_quoted_attributes() {
        let tree = parse_markup("<div data-line=7 id='x'>t</div>");
        let div = tree.children(tree.root())[0];
        let element = tree.element(div).unwrap();
        assert_eq!(element.attr("data-line"), Some("7"));
        assert_eq!(element.attr("id"), Some("x"));
    }

    #[test]
    fn void_and_self_closing_elements_take_no_children() {
        let tree = parse_markup(r#"<hr data-line="4"><p>after</p><br/>tail"#);
        let root = tree.root();
        let kids = tree.children(root);
        assert_eq!(kids.len(), 4);
        assert_eq!(tree.element(kids[0]).unwrap().tag, "hr");
        assert!(tree.children(kids[0]).is_empty());
        assert_eq!(tree.text_content(kids[1]), "after");
        assert_eq!(tree.text(kids[3]), Some("tail"));
    }

    #[test]
    fn whitespace_between_blocks_is_preserved_as_text() {
        let tree = parse_markup("<p>A</p>\n<p>B</p>");
        let kids = tree.children(tree.root());
        assert_eq!(kids.len(), 3);
        assert_eq!(tree.text(kids[1]), Some("\n"));
    }

    #[test]
    fn numeric_refs_are_decoded_in_text() {
        let tree = parse_markup("<p>caf&#233;</p>");
        let p = tree.children(tree.root())[0];
        assert_eq!(tree.text_content(p), "café");
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let tree = parse_markup("<!DOCTYPE html><!-- note --><p>x</p>");
        let kids = tree.children(tree.root());
        assert_eq!(kids.len(), 1);
        assert_eq!(tree.text_content(kids[0]), "x");
    }

    #[test]
    fn stray_close_tag_is_ignored() {
        let tree = parse_markup("</div><p>x</p>");
        assert_eq!(tree.text_content(tree.root()), "x");
    }

    #[test]
    fn unterminated_element_closes_at_end_of_input() {
        let tree = parse_markup("<div><p>open");
        let div = tree.children(tree.root())[0];
        assert_eq!(tree.text_content(div), "open");
    }

    #[test]
    fn literal_less_than_stays_in_text() {
        let tree = parse_markup("<p>1 < 2</p>");
        let p = tree.children(tree.root())[0];
        assert_eq!(tree.text_content(p), "1 < 2");
    }

    #[test]
    fn nested_structure_outline() {
        let tree = parse_markup(r#"<ul data-line="2"><li data-line="2">a</li><li data-line="3">b</li></ul>"#);
        insta::assert_snapshot!(tree.outline(), @r###"
        <body>
          <ul data-line="2">
            <li data-line="2">
              #text "a"
            <li data-line="3">
              #text "b"
        "###);
    }
}
