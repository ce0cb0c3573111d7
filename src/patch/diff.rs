//! Minimal byte-level diff between two serialized outputs.

use memchr::memmem;

/// Bytes of forward context probed past the divergence point when locating
/// the reconvergence suffix.
const PROBE_LEN: usize = 100;

/// The minimal byte range where two outputs diverge and reconverge.
///
/// The changed regions are `old[start..end_old]` and `new[start..end_new]`;
/// both may be empty when the edit is confined to bytes the backward walk
/// stepped over. Offsets are byte offsets and need not fall on character
/// boundaries -- the patcher only slices after expanding to ASCII delimiter
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSpan {
    /// First byte where the outputs differ.
    pub start: usize,
    /// End (exclusive) of the changed region in the old output.
    pub end_old: usize,
    /// End (exclusive) of the changed region in the new output.
    pub end_new: usize,
}

impl DiffSpan {
    /// The changed bytes of the old output.
    pub fn changed_old<'a>(&self, old: &'a str) -> &'a [u8] {
        &old.as_bytes()[self.start..self.end_old]
    }

    /// The changed bytes of the new output.
    pub fn changed_new<'a>(&self, new: &'a str) -> &'a [u8] {
        &new.as_bytes()[self.start..self.end_new]
    }
}

/// Locate the minimal changed span between two outputs.
///
/// Returns `None` when no patchable span exists, which the patcher resolves
/// as a full remount:
///
/// - the outputs share no prefix (divergence at byte 0);
/// - the old output is a prefix of the new (or they are equal);
/// - the new output is shorter than the old;
/// - the reconvergence probe (the new output's suffix from `start +
///   PROBE_LEN`) does not occur in the old output at or after the divergence
///   point.
///
/// Otherwise the probe match is tightened by walking backward while trailing
/// bytes agree, leaving the smallest `[start, end)` pair that covers the
/// edit.
pub fn simple_diff(old: &str, new: &str) -> Option<DiffSpan> {
    let o = old.as_bytes();
    let n = new.as_bytes();

    let mut start = 0;
    while start < o.len() && start < n.len() && o[start] == n[start] {
        start += 1;
    }
    if start >= o.len() {
        return None;
    }
    if start == 0 {
        return None;
    }
    if n.len() < o.len() {
        return None;
    }

    let (mut end_old, mut end_new);
    if start + PROBE_LEN >= n.len() {
        end_new = n.len() - 1;
        end_old = o.len() - 1;
    } else {
        end_new = start + PROBE_LEN;
        let probe = &n[end_new..];
        end_old = memmem::find(&o[start..], probe)? + start;
    }
    while end_old > start && o[end_old] == n[end_new] {
        end_old -= 1;
        end_new -= 1;
    }

    Some(DiffSpan {
        start,
        end_old,
        end_new,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_outputs_have_no_span() {
        assert_eq!(simple_diff("<p>A</p>", "<p>A</p>"), None);
    }

    #[test]
    fn no_shared_prefix_has_no_span() {
        assert_eq!(simple_diff("Apple", "Banana"), None);
    }

    #[test]
    fn shrinking_edit_has_no_span() {
        assert_eq!(simple_diff("<p>ABC</p>", "<p>AB</p>"), None);
    }

    #[test]
    fn old_prefix_of_new_has_no_span() {
        assert_eq!(simple_diff("<p>A", "<p>A</p>"), None);
    }

    #[test]
    fn single_character_replacement() {
        let old = "<p>A</p><p>B</p>";
        let new = "<p>A</p><p>C</p>";
        let span = simple_diff(old, new).unwrap();
        // The backward walk stops one short of the changed byte; expansion
        // recovers the full fragment.
        assert_eq!(span.start, 11);
        assert_eq!(span.end_old, 11);
        assert_eq!(span.end_new, 11);
    }

    #[test]
    fn insertion_in_the_middle() {
        let old = "<p>hello</p>";
        let new = "<p>hello world</p>";
        let span = simple_diff(old, new).unwrap();
        assert!(span.start > 0);
        assert!(span.end_new >= span.end_old);
        // Old and new agree outside the span.
        assert_eq!(&old[..span.start], &new[..span.start]);
        assert_eq!(span.end_old.abs_diff(old.len()), span.end_new.abs_diff(new.len()));
    }

    #[test]
    fn long_outputs_use_the_probe_window() {
        let filler = "<p>x</p>".repeat(40);
        let old = format!("<p>head</p>{filler}<p>tail one</p>");
        let new = format!("<p>heads</p>{filler}<p>tail one</p>");
        let span = simple_diff(&old, &new).unwrap();
        assert_eq!(span.start, 7); // diverges inside "head"/"heads"
        assert_eq!(span.end_new, span.end_old + 1);
    }

    #[test]
    fn probe_not_found_in_old_has_no_span() {
        // Diverges early and the new suffix never reappears in old.
        let old = format!("<p>a</p>{}", "<q>y</q>".repeat(40));
        let new = format!("<p>ab</p>{}", "<r>z</r>".repeat(40));
        assert_eq!(simple_diff(&old, &new), None);
    }

    #[test]
    fn changed_slices_are_consistent_with_offsets() {
        let old = "<p>one two</p>";
        let new = "<p>one three two</p>";
        let span = simple_diff(old, new).unwrap();
        assert_eq!(span.changed_old(old).len(), span.end_old - span.start);
        assert_eq!(span.changed_new(new).len(), span.end_new - span.start);
    }
}
