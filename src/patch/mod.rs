//! Minimal-diff presentation patcher.
//!
//! Attempts to carry an edit from one serialized render output to the next by
//! mutating exactly one text fragment of the live presentation tree. Anything
//! that is not provably a single safe leaf-text substitution falls back to a
//! full remount -- structural differences are never patched incrementally.

pub mod diff;
pub mod span;

pub use diff::{simple_diff, DiffSpan};
pub use span::expand_to_fragment;

use crate::markup::{decode_numeric_refs, PresentationTree};
use crate::model::RenderOutput;
use memchr::memmem;
use tracing::debug;

/// Why a patch fell back to a full remount. Diagnostic only: every reason is
/// resolved the same way, by rebuilding the tree from the new output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemountReason {
    /// No previous output to diff against.
    NoPrevious,
    /// No minimal span: no shared prefix, a shrinking edit, or an
    /// unlocatable reconvergence suffix.
    DiffUnresolved,
    /// The changed span contains a markup delimiter.
    StructuralChange,
    /// The span could not be expanded to an enclosing fragment.
    SpanExpansion,
    /// The expanded old fragment does not uniquely occur at its offset.
    AmbiguousFragment,
    /// The live tree holds zero or several matching leaves.
    LeafNotUnique,
}

/// Result of a patch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Exactly one leaf fragment was mutated in place.
    Applied {
        /// The mutated text node.
        node: crate::markup::NodeId,
    },
    /// Old and new outputs are byte-identical; nothing was touched.
    Identical,
    /// The caller must rebuild the tree from the new output.
    Remount(RemountReason),
}

impl PatchOutcome {
    /// Whether an incremental patch was applied.
    pub fn applied(&self) -> bool {
        matches!(self, PatchOutcome::Applied { .. })
    }

    /// Whether the caller must perform a full remount.
    pub fn needs_remount(&self) -> bool {
        matches!(self, PatchOutcome::Remount(_))
    }
}

/// Attempt an incremental single-fragment patch of `tree` from `old` to `new`.
///
/// `tree` must be the mounted form of `old`; on `Applied` it becomes the
/// mounted form of `new`. On `Remount` the tree is untouched and the caller
/// rebuilds it. The serialized-snapshot bookkeeping (recording `new` as
/// current) is the caller's job either way.
pub fn patch(
    old: Option<&RenderOutput>,
    new: &RenderOutput,
    tree: &mut PresentationTree,
) -> PatchOutcome {
    let Some(old) = old else {
        return PatchOutcome::Remount(RemountReason::NoPrevious);
    };
    let (old, new) = (old.as_str(), new.as_str());
    if old == new {
        return PatchOutcome::Identical;
    }

    let Some(span) = simple_diff(old, new) else {
        return remount(RemountReason::DiffUnresolved);
    };

    let structural = |bytes: &[u8]| bytes.iter().any(|&b| matches!(b, b'<' | b'>' | b'"'));
    if structural(span.changed_old(old)) || structural(span.changed_new(new)) {
        return remount(RemountReason::StructuralChange);
    }

    let Some(new_range) = expand_to_fragment(new, span.start, span.end_new) else {
        return remount(RemountReason::SpanExpansion);
    };
    let Some(old_range) = expand_to_fragment(old, span.start, span.end_old) else {
        return remount(RemountReason::SpanExpansion);
    };

    let old_fragment = &old[old_range.clone()];
    let new_fragment = &new[new_range];

    // The old fragment must pin down a unique location in the old output:
    // at the expected offset and nowhere else.
    match memmem::find(old.as_bytes(), old_fragment.as_bytes()) {
        Some(at) if at == old_range.start => {}
        _ => return remount(RemountReason::AmbiguousFragment),
    }
    if memmem::find(&old.as_bytes()[old_range.start + 1..], old_fragment.as_bytes()).is_some() {
        return remount(RemountReason::AmbiguousFragment);
    }

    let old_text = decode_numeric_refs(old_fragment);
    let new_text = decode_numeric_refs(new_fragment);

    let matches = tree.find_text_nodes(&old_text);
    let &[node] = matches.as_slice() else {
        return remount(RemountReason::LeafNotUnique);
    };

    tree.set_text(node, new_text.into_owned());
    debug!(fragment = %old_text, "applied incremental leaf patch");
    PatchOutcome::Applied { node }
}

fn remount(reason: RemountReason) -> PatchOutcome {
    debug!(?reason, "incremental patch rejected, falling back to remount");
    PatchOutcome::Remount(reason)
}

// ===== Tests =====

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
