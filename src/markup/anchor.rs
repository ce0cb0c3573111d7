//! Source-position anchor attributes.
//!
//! Renderers annotate block elements with `data-line` attributes encoding
//! where in the source the block came from. The value is a `;`-separated list
//! of `[file:]line` entries (nested includes append their own entry); the
//! final entry is the innermost position.

/// A parsed `[file:]line` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAnchor {
    /// Source file, when the entry is qualified.
    pub file: Option<String>,
    /// 1-based source line.
    pub line: u32,
}

/// Parse leading decimal digits, mirroring lenient integer parsing: `"12;x"`
/// yields 12, a non-digit first byte yields nothing.
fn leading_u32(s: &str) -> Option<u32> {
    let digits: &str = {
        let end = s
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(s.len());
        &s[..end]
    };
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Resolve a `data-line` attribute to a source line for the mapper.
///
/// With a file qualifier, entries are scanned for one qualified with that
/// file name. Without one, only a leading unqualified entry counts: an
/// attribute that opens with `file:` carries no position for the primary
/// document.
pub fn anchor_line(attr: &str, qualifier: Option<&str>) -> Option<u32> {
    match qualifier {
        None => leading_u32(attr),
        Some(file) => attr.split(';').find_map(|entry| {
            let rest = entry.strip_prefix(file)?.strip_prefix(':')?;
            leading_u32(rest)
        }),
    }
}

/// Parse the final `[file:]line` entry of a `data-line` attribute.
///
/// This is the reverse-lookup direction (preview position back to source):
/// the last entry is the innermost include, which is where the user lands.
/// The entry must be fully well-formed; a trailing entry with garbage after
/// the digits carries no position.
pub fn last_anchor(attr: &str) -> Option<SourceAnchor> {
    let entry = attr.rsplit(';').next()?;
    let (file, digits) = match entry.rsplit_once(':') {
        Some((file, digits)) => (Some(file), digits),
        None => (None, entry),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let line = digits.parse().ok()?;
    let file = file.filter(|f| !f.is_empty() && !f.contains(':'));
    // A malformed qualifier invalidates the entry, not just the qualifier.
    if file.is_none() && entry.contains(':') {
        return None;
    }
    Some(SourceAnchor {
        file: file.map(str::to_string),
        line,
    })
}
