//! Built-in fast renderer: Markdown-flavored source to block HTML.
//!
//! Every block element carries a `data-line` anchor pointing at its first
//! source line, which is what the mapper aligns scroll positions against.
//! The dialect is small on purpose: headings, paragraphs, fenced code,
//! block quotes, lists, thematic breaks and display math. Math renders as a
//! placeholder and flags the round for the secondary producer.

use crate::model::{JobError, RenderOutcome, RenderOutput, RenderRequest};
use crate::producer::{ewma, RenderProducer};
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// The fast local producer. Rendering is synchronous and cheap; completion
/// is still delivered through `poll` so the shell observes one seam.
#[derive(Debug, Default)]
pub struct BlockRenderer {
    avg: Option<Duration>,
    pending: Option<Result<RenderOutcome, JobError>>,
}

impl BlockRenderer {
    /// Create a renderer with no timing history.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderProducer for BlockRenderer {
    fn begin(&mut self, request: RenderRequest) -> Result<(), JobError> {
        if self.pending.is_some() {
            return Err(JobError::Busy);
        }
        let started = Instant::now();
        let rendered = render_blocks(&request.source);
        self.avg = Some(ewma(self.avg, started.elapsed()));
        self.pending = Some(Ok(RenderOutcome {
            content: Some(RenderOutput::new(rendered.html)),
            run_again: false,
            run_on_server: rendered.has_math,
            avg_duration: self.avg.unwrap_or_default(),
            ctx: request.ctx,
        }));
        Ok(())
    }

    fn poll(&mut self) -> Option<Result<RenderOutcome, JobError>> {
        self.pending.take()
    }
}

struct Rendered {
    html: String,
    has_math: bool,
}

enum OpenBlock {
    Paragraph { start: u32, lines: Vec<String> },
    Fence { start: u32, lines: Vec<String> },
    Quote { start: u32, lines: Vec<String> },
    List { start: u32, ordered: bool, items: Vec<(u32, String)> },
    Math { start: u32 },
}

fn render_blocks(source: &str) -> Rendered {
    let mut html = String::new();
    let mut has_math = false;
    let mut open: Option<OpenBlock> = None;

    for (index, raw) in source.lines().enumerate() {
        let line_no = (index + 1) as u32;
        let trimmed = raw.trim_end();

        // Verbatim blocks consume everything up to their terminator.
        match &mut open {
            Some(OpenBlock::Fence { lines, .. }) => {
                if trimmed.trim_start() == "```" {
                    flush(&mut html, open.take());
                } else {
                    lines.push(raw.to_string());
                }
                continue;
            }
            Some(OpenBlock::Math { .. }) => {
                if trimmed.trim_start() == "$$" {
                    flush(&mut html, open.take());
                }
                continue;
            }
            _ => {}
        }

        if trimmed.trim_start().is_empty() {
            flush(&mut html, open.take());
        } else if trimmed.starts_with("```") {
            flush(&mut html, open.take());
            open = Some(OpenBlock::Fence {
                start: line_no,
                lines: Vec::new(),
            });
        } else if trimmed == "$$" {
            flush(&mut html, open.take());
            has_math = true;
            open = Some(OpenBlock::Math { start: line_no });
        } else if let Some((level, text)) = heading(trimmed) {
            flush(&mut html, open.take());
            let _ = writeln!(
                html,
                "<h{level} data-line=\"{line_no}\">{}</h{level}>",
                inline(text)
            );
        } else if thematic_break(trimmed) {
            flush(&mut html, open.take());
            let _ = writeln!(html, "<hr data-line=\"{line_no}\">");
        } else if let Some(text) = quote_line(trimmed) {
            match &mut open {
                Some(OpenBlock::Quote { lines, .. }) => lines.push(text.to_string()),
                _ => {
                    flush(&mut html, open.take());
                    open = Some(OpenBlock::Quote {
                        start: line_no,
                        lines: vec![text.to_string()],
                    });
                }
            }
        } else if let Some((ordered, text)) = list_item(trimmed) {
            match &mut open {
                Some(OpenBlock::List {
                    ordered: open_ordered,
                    items,
                    ..
                }) if *open_ordered == ordered => items.push((line_no, text.to_string())),
                _ => {
                    flush(&mut html, open.take());
                    open = Some(OpenBlock::List {
                        start: line_no,
                        ordered,
                        items: vec![(line_no, text.to_string())],
                    });
                }
            }
        } else {
            match &mut open {
                Some(OpenBlock::Paragraph { lines, .. }) => lines.push(trimmed.to_string()),
                _ => {
                    flush(&mut html, open.take());
                    open = Some(OpenBlock::Paragraph {
                        start: line_no,
                        lines: vec![trimmed.to_string()],
                    });
                }
            }
        }
    }
    flush(&mut html, open.take());

    Rendered { html, has_math }
}

fn flush(html: &mut String, block: Option<OpenBlock>) {
    let Some(block) = block else {
        return;
    };
    match block {
        OpenBlock::Paragraph { start, lines } => {
            let _ = writeln!(
                html,
                "<p data-line=\"{start}\">{}</p>",
                inline(&lines.join("\n"))
            );
        }
        OpenBlock::Fence { start, lines } => {
            let _ = writeln!(
                html,
                "<pre data-line=\"{start}\"><code>{}</code></pre>",
                code_text(&lines.join("\n"))
            );
        }
        OpenBlock::Quote { start, lines } => {
            let _ = writeln!(
                html,
                "<blockquote data-line=\"{start}\"><p data-line=\"{start}\">{}</p></blockquote>",
                inline(&lines.join("\n"))
            );
        }
        OpenBlock::List {
            start,
            ordered,
            items,
        } => {
            let tag = if ordered { "ol" } else { "ul" };
            let _ = writeln!(html, "<{tag} data-line=\"{start}\">");
            for (line_no, text) in items {
                let _ = writeln!(html, "<li data-line=\"{line_no}\">{}</li>", inline(&text));
            }
            let _ = writeln!(html, "</{tag}>");
        }
        OpenBlock::Math { start } => {
            let _ = writeln!(html, "<p class=\"math\" data-line=\"{start}\">[math]</p>");
        }
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=6).contains(&hashes) {
        let rest = &line[hashes..];
        if let Some(text) = rest.strip_prefix(' ') {
            return Some((hashes, text.trim_start()));
        }
    }
    None
}

fn thematic_break(line: &str) -> bool {
    let line = line.trim_start();
    line.len() >= 3
        && (line.bytes().all(|b| b == b'-')
            || line.bytes().all(|b| b == b'*')
            || line.bytes().all(|b| b == b'_'))
}

fn quote_line(line: &str) -> Option<&str> {
    let line = line.trim_start();
    line.strip_prefix("> ").or_else(|| line.strip_prefix('>'))
}

fn list_item(line: &str) -> Option<(bool, &str)> {
    let line = line.trim_start();
    for marker in ["- ", "* ", "+ "] {
        if let Some(text) = line.strip_prefix(marker) {
            return Some((false, text));
        }
    }
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(text) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some((true, text));
        }
    }
    None
}

/// Render inline content: escaping plus `code`, `**strong**` and `*em*`
/// spans. No nesting; code spans bind tightest.
fn inline(text: &str) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if let Some(inner) = rest.strip_prefix('`') {
            if let Some(close) = inner.find('`') {
                out.push_str("<code>");
                out.push_str(&code_text(&inner[..close]));
                out.push_str("</code>");
                i += close + 2;
                continue;
            }
        }
        if let Some(inner) = rest.strip_prefix("**") {
            if let Some(close) = inner.find("**") {
                if close > 0 {
                    out.push_str("<strong>");
                    push_escaped(&mut out, &inner[..close]);
                    out.push_str("</strong>");
                    i += close + 4;
                    continue;
                }
            }
        }
        if let Some(inner) = rest.strip_prefix('*') {
            if let Some(close) = inner.find('*') {
                if close > 0 {
                    out.push_str("<em>");
                    push_escaped(&mut out, &inner[..close]);
                    out.push_str("</em>");
                    i += close + 2;
                    continue;
                }
            }
        }
        let c = rest.chars().next().unwrap_or('\0');
        push_escaped_char(&mut out, c);
        i += c.len_utf8().max(1);
    }
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        push_escaped_char(out, c);
    }
}

fn push_escaped_char(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(c),
    }
}

/// Code-span text: escaped, with non-ASCII emitted as decimal character
/// references so code content survives any downstream transport encoding.
fn code_text(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c.is_ascii() {
            push_escaped_char(&mut out, c);
        } else {
            let _ = write!(out, "&#{};", c as u32);
        }
    }
    out
}

// ===== Tests =====

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
