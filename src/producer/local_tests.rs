//! Block renderer tests.

use super::*;
use crate::model::{Round, RoundContext};
use std::sync::Arc;

fn render(source: &str) -> String {
    render_blocks(source).html
}

fn request(source: &str) -> RenderRequest {
    RenderRequest {
        source: Arc::from(source),
        ctx: RoundContext::new("doc.md", Round::new(1)),
    }
}

#[test]
fn renders_document_outline() {
    let source = "# Title\n\nFirst paragraph\nstill first\n\n- one\n- two\n\n## Sub\n\n```\ncode here\n```\n";
    insta::assert_snapshot!(render(source), @r###"
    <h1 data-line="1">Title</h1>
    <p data-line="3">First paragraph
    still first</p>
    <ul data-line="6">
    <li data-line="6">one</li>
    <li data-line="7">two</li>
    </ul>
    <h2 data-line="9">Sub</h2>
    <pre data-line="11"><code>code here</code></pre>
    "###);
}

#[test]
fn paragraphs_carry_their_first_source_line() {
    let html = render("one\n\n\ntwo\nmore two\n\nthree");
    assert!(html.contains("<p data-line=\"1\">one</p>"));
    assert!(html.contains("<p data-line=\"4\">two\nmore two</p>"));
    assert!(html.contains("<p data-line=\"7\">three</p>"));
}

#[test]
fn heading_levels_cap_at_six() {
    assert!(render("### deep").contains("<h3 data-line=\"1\">deep</h3>"));
    assert!(render("####### too deep").contains("<p data-line=\"1\">"));
    assert!(render("#nospace").contains("<p data-line=\"1\">"));
}

#[test]
fn ordered_and_unordered_lists() {
    let html = render("1. first\n2. second");
    assert!(html.contains("<ol data-line=\"1\">"));
    assert!(html.contains("<li data-line=\"2\">second</li>"));

    let html = render("* a\n* b");
    assert!(html.contains("<ul data-line=\"1\">"));
}

#[test]
fn switching_list_kind_starts_a_new_list() {
    let html = render("- a\n1. b");
    assert!(html.contains("<ul data-line=\"1\">"));
    assert!(html.contains("<ol data-line=\"2\">"));
}

#[test]
fn block_quote_wraps_a_paragraph() {
    let html = render("> quoted\n> more");
    assert!(html.contains("<blockquote data-line=\"1\"><p data-line=\"1\">quoted\nmore</p></blockquote>"));
}

#[test]
fn thematic_break_is_anchored() {
    assert!(render("a\n\n---\n\nb").contains("<hr data-line=\"3\">"));
}

#[test]
fn text_is_escaped() {
    let html = render("a < b & c \"quoted\"");
    assert!(html.contains("a &lt; b &amp; c &quot;quoted&quot;"));
}

#[test]
fn inline_spans_render() {
    let html = render("mix `code` with **bold** and *em*");
    assert!(html.contains("<code>code</code>"));
    assert!(html.contains("<strong>bold</strong>"));
    assert!(html.contains("<em>em</em>"));
}

#[test]
fn unterminated_spans_fall_back_to_text() {
    let html = render("a `dangling and *also");
    assert!(!html.contains("<code>"));
    assert!(!html.contains("<em>"));
    assert!(html.contains("`dangling"));
}

#[test]
fn code_spans_emit_numeric_refs_for_non_ascii() {
    let html = render("see `café`");
    assert!(html.contains("<code>caf&#233;</code>"), "{html}");
}

#[test]
fn fence_contents_are_verbatim() {
    let html = render("```\n# not a heading\n- not a list\n```");
    assert!(html.contains("# not a heading\n- not a list"));
    assert!(!html.contains("<h1"));
    assert!(!html.contains("<ul"));
}

#[test]
fn math_block_renders_placeholder_and_flags_secondary() {
    let rendered = render_blocks("before\n\n$$\ne = mc^2\n$$\n\nafter");
    assert!(rendered.has_math);
    assert!(rendered
        .html
        .contains("<p class=\"math\" data-line=\"3\">[math]</p>"));
    // The math body itself never reaches the output.
    assert!(!rendered.html.contains("mc^2"));
}

#[test]
fn plain_document_does_not_flag_secondary() {
    assert!(!render_blocks("just text").has_math);
}

#[test]
fn producer_reports_outcome_through_poll() {
    let mut producer = BlockRenderer::new();
    assert!(producer.poll().is_none());
    producer.begin(request("# Hi")).unwrap();
    let outcome = producer.poll().unwrap().unwrap();
    assert!(outcome.content.unwrap().as_str().contains("<h1"));
    assert!(!outcome.run_on_server);
    // Completion is delivered exactly once.
    assert!(producer.poll().is_none());
}

#[test]
fn producer_flags_math_rounds_for_the_secondary() {
    let mut producer = BlockRenderer::new();
    producer.begin(request("$$\nx\n$$")).unwrap();
    let outcome = producer.poll().unwrap().unwrap();
    assert!(outcome.run_on_server);
}

#[test]
fn begin_while_pending_is_a_busy_error() {
    let mut producer = BlockRenderer::new();
    producer.begin(request("a")).unwrap();
    assert!(matches!(
        producer.begin(request("b")),
        Err(crate::model::JobError::Busy)
    ));
}

#[test]
fn rendered_output_parses_into_anchored_tree() {
    let html = render("# Title\n\nbody");
    let tree = crate::markup::parse_markup(&html);
    let anchored = crate::sync::find_anchor_at_line(&tree, tree.root(), 3, None).unwrap();
    assert_eq!(anchored.line, 3);
}
