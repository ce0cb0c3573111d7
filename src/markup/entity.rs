//! Numeric character reference decoding.

use std::borrow::Cow;

/// Decode decimal numeric character references (`&#8217;` and friends).
///
/// This is the canonical form the engine compares text in: parsed tree text
/// and patch-span text are both passed through here, so a fragment that a
/// renderer escaped numerically still matches its decoded tree counterpart.
/// Named entities (`&amp;`) and hex references are left untouched on purpose --
/// both sides keep them verbatim, so comparisons stay consistent without this
/// module growing an entity table. References that do not denote a valid
/// scalar value are also left verbatim.
pub fn decode_numeric_refs(text: &str) -> Cow<'_, str> {
    if !text.contains("&#") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("&#") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let digits: &str = after
            .split(';')
            .next()
            .unwrap_or("");
        let is_ref = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && after.len() > digits.len(); // the ';' is present
        let decoded = if is_ref {
            digits
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
        } else {
            None
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &after[digits.len() + 1..];
            }
            None => {
                out.push_str("&#");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
