//! Render producer request/outcome types.

use crate::model::round::RoundContext;
use std::sync::Arc;
use std::time::Duration;

/// Opaque serialized markup produced by a renderer.
///
/// Diffed at the byte level by the patcher; the delimiters `<`, `>` and `"`
/// are the only bytes with structural meaning to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput(String);

impl RenderOutput {
    /// Wrap a serialized markup string.
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// Borrow the raw markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the output is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RenderOutput {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}

/// One render job handed to a producer.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Source text snapshot at the time the round started.
    pub source: Arc<str>,
    /// Round identity (document name, round number, start time).
    pub ctx: RoundContext,
}

/// Resolved result of one render round.
///
/// The local producer fills `content`; the secondary producer completes with
/// context only (its artifacts land on disk) and leaves `content` empty.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Serialized markup, when the producer renders in-process.
    pub content: Option<RenderOutput>,
    /// The producer wants another pass over the same source (e.g. forward
    /// references resolved on the second run).
    pub run_again: bool,
    /// The source contains constructs only the secondary producer can render.
    pub run_on_server: bool,
    /// Producer-reported moving average render duration, used by the
    /// orchestrator's adaptive refresh policy.
    pub avg_duration: Duration,
    /// The context the round was started with, returned unchanged.
    pub ctx: RoundContext,
}

impl RenderOutcome {
    /// An outcome carrying context only (secondary producer completion).
    pub fn context_only(ctx: RoundContext, avg_duration: Duration) -> Self {
        Self {
            content: None,
            run_again: false,
            run_on_server: false,
            avg_duration,
            ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Round;

    #[test]
    fn render_output_reports_byte_length() {
        let out = RenderOutput::new("<p>é</p>");
        assert_eq!(out.len(), "<p>é</p>".len());
        assert!(!out.is_empty());
    }

    #[test]
    fn context_only_outcome_has_no_content() {
        let ctx = RoundContext::new("doc.md", Round::new(1));
        let outcome = RenderOutcome::context_only(ctx.clone(), Duration::from_millis(10));
        assert!(outcome.content.is_none());
        assert!(!outcome.run_again);
        assert!(!outcome.run_on_server);
        assert_eq!(outcome.ctx, ctx);
    }
}
