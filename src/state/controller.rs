//! The orchestrator: wires producer completions into the patcher and
//! viewport events into the mapper.
//!
//! Owns the single document snapshot, the current serialized output, the
//! mounted surfaces and the viewport memo. Every mutation happens in a
//! method called by the host loop strictly after a job, patch or control
//! event completes; there are no concurrent writers.

use crate::markup::{parse_markup, SourceAnchor};
use crate::model::{
    DocumentSnapshot, EditorViewport, JobError, RenderOutcome, RenderOutput, RenderRequest,
    RoundContext, ScrollCommand, ViewportState,
};
use crate::patch::{patch, PatchOutcome};
use crate::sched::TaskScheduler;
use crate::state::surfaces::ViewSurfaces;
use crate::sync::{compute_scroll_target, locate_source, PreviewLayout, SyncRequest, WrapMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Moving-average threshold above which rendering is considered slow enough
/// to stop refreshing mid-typing.
const SLOW_RENDER: Duration = Duration::from_millis(300);
/// Threshold below which continuous refresh is restored.
const FAST_RENDER: Duration = Duration::from_millis(200);

/// When to re-render relative to typing activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Render whenever the output is stale.
    Continuous,
    /// Skip ticks while the document changed since the previous tick (the
    /// user is still typing); render on the first quiet tick.
    Delayed,
}

/// Message for the externally owned status/error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Human-oriented progress note.
    Status(String),
    /// Non-fatal failure report.
    Error(String),
}

/// Controller tunables, resolved by the shell from config.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Preview layout width in columns.
    pub preview_width: u16,
    /// Preview viewport height in layout lines.
    pub viewport_height: u64,
    /// Scroll animation duration.
    pub scroll_duration: Duration,
    /// Whether the secondary producer may be scheduled at all.
    pub allow_secondary: bool,
    /// Editor soft-wrap column, when wrapping is on.
    pub wrap_column: Option<u16>,
    /// Pin the refresh mode instead of adapting it from render durations.
    pub pinned_mode: Option<RefreshMode>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            preview_width: 80,
            viewport_height: 40,
            scroll_duration: Duration::from_millis(500),
            allow_secondary: true,
            wrap_column: None,
            pinned_mode: None,
        }
    }
}

/// Result of applying a local render outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderApplied {
    /// True when the cycle was an incremental patch (or a no-op).
    pub patched: bool,
    /// Scroll command from the post-remount re-sync, if any.
    pub scroll: Option<ScrollCommand>,
}

/// Live-preview orchestrator.
#[derive(Debug)]
pub struct PreviewController {
    snapshot: DocumentSnapshot,
    html: Option<RenderOutput>,
    surfaces: ViewSurfaces,
    layout: Option<PreviewLayout>,
    viewport_state: ViewportState,
    wrap: Option<WrapMap>,
    wrap_column: Option<u16>,
    preview_width: u16,
    viewport_height: u64,
    scroll_duration: Duration,
    refresh_mode: RefreshMode,
    mode_pinned: bool,
    allow_secondary: bool,
    changed: bool,
    stale: bool,
    last_secondary_source: Option<Arc<str>>,
    messages: Vec<StatusEvent>,
}

impl PreviewController {
    /// Create a controller for a document. The initial text counts as a
    /// pending change so the first tick renders.
    pub fn new(doc_name: impl Into<String>, text: impl Into<Arc<str>>, config: ControllerConfig) -> Self {
        let snapshot = DocumentSnapshot::new(doc_name, text);
        let wrap = config
            .wrap_column
            .map(|column| WrapMap::build(snapshot.text_ref(), column));
        Self {
            snapshot,
            html: None,
            surfaces: ViewSurfaces::new(),
            layout: None,
            viewport_state: ViewportState::default(),
            wrap,
            wrap_column: config.wrap_column,
            preview_width: config.preview_width,
            viewport_height: config.viewport_height,
            scroll_duration: config.scroll_duration,
            refresh_mode: config.pinned_mode.unwrap_or(RefreshMode::Continuous),
            mode_pinned: config.pinned_mode.is_some(),
            allow_secondary: config.allow_secondary,
            changed: true,
            stale: true,
            last_secondary_source: None,
            messages: Vec::new(),
        }
    }

    /// The currently mounted tree.
    pub fn tree(&self) -> &crate::markup::PresentationTree {
        self.surfaces.active()
    }

    /// The current serialized output snapshot.
    pub fn html(&self) -> Option<&RenderOutput> {
        self.html.as_ref()
    }

    /// The document snapshot.
    pub fn snapshot(&self) -> &DocumentSnapshot {
        &self.snapshot
    }

    /// Current refresh mode.
    pub fn refresh_mode(&self) -> RefreshMode {
        self.refresh_mode
    }

    /// Last scroll offset applied to the preview.
    pub fn scroll_top(&self) -> u64 {
        self.surfaces.scroll_top()
    }

    /// Drain pending status/error messages.
    pub fn take_messages(&mut self) -> Vec<StatusEvent> {
        std::mem::take(&mut self.messages)
    }

    /// The document was edited: replace the snapshot text.
    pub fn on_edit(&mut self, text: impl Into<Arc<str>>) {
        self.snapshot.set_text(text);
        self.changed = true;
        if let Some(column) = self.wrap_column {
            self.wrap = Some(WrapMap::build(self.snapshot.text_ref(), column));
        }
    }

    /// The editor switched files within the document.
    pub fn set_edit_file(&mut self, path: impl Into<String>) {
        self.snapshot.set_edit_name(path);
        // Anchors resolve differently now; let the next viewport event
        // re-sync from scratch.
        self.viewport_state.last_target_line = None;
    }

    /// Change the soft-wrap column (None turns wrapping off).
    pub fn set_wrap_column(&mut self, column: Option<u16>) {
        self.wrap_column = column;
        self.wrap = column.map(|c| WrapMap::build(self.snapshot.text_ref(), c));
        self.viewport_state.last_target_line = None;
    }

    /// Staleness predicate for the local scheduler's tick.
    ///
    /// Folds the changed flag into staleness; in delayed mode a tick that
    /// saw fresh typing declines to render, leaving staleness pending for
    /// the first quiet tick.
    pub fn local_is_stale(&mut self) -> bool {
        let changed = std::mem::take(&mut self.changed);
        self.stale = self.stale || changed;
        if changed && self.refresh_mode == RefreshMode::Delayed {
            return false;
        }
        self.stale
    }

    /// Build the request for a local round.
    pub fn begin_local_round(&mut self, ctx: RoundContext) -> RenderRequest {
        self.stale = false;
        RenderRequest {
            source: self.snapshot.text(),
            ctx,
        }
    }

    /// Build the request for a secondary round, recording the submitted text
    /// for the re-trigger guard.
    pub fn begin_secondary_round(&mut self, ctx: RoundContext) -> RenderRequest {
        let source = self.snapshot.text();
        self.last_secondary_source = Some(Arc::clone(&source));
        RenderRequest { source, ctx }
    }

    /// Apply a completed local round: patch or remount, propagate staleness,
    /// schedule the secondary, adapt the refresh mode.
    pub fn apply_local_outcome(
        &mut self,
        outcome: RenderOutcome,
        secondary: &mut TaskScheduler,
    ) -> RenderApplied {
        let round = outcome.ctx.round;
        let Some(content) = outcome.content else {
            // A local producer always renders; treat a bare completion as a
            // no-op round.
            return RenderApplied {
                patched: false,
                scroll: None,
            };
        };

        let patch_outcome = patch(self.html.as_ref(), &content, self.surfaces.active_mut());
        let (patched, scroll) = match patch_outcome {
            PatchOutcome::Applied { node } => {
                if let Some(layout) = &mut self.layout {
                    layout.refresh_block_of(self.surfaces.active(), node);
                }
                (true, None)
            }
            PatchOutcome::Identical => (true, None),
            PatchOutcome::Remount(_) => {
                let scroll = self.remount(&content);
                (false, scroll)
            }
        };
        self.html = Some(content);

        if outcome.run_again {
            self.stale = true;
        }
        // The guard suppresses re-triggering when the secondary has already
        // seen exactly this text (otherwise a failing secondary run would
        // re-schedule itself forever).
        if outcome.run_on_server
            && self.allow_secondary
            && self.last_secondary_source.as_deref() != Some(self.snapshot.text_ref())
        {
            secondary.set_stale();
        }

        let quick = patch_outcome.applied();
        self.messages.push(StatusEvent::Status(format!(
            "update: {round}{}",
            if quick { " (quick view update)" } else { "" }
        )));
        if !outcome.run_again && !outcome.run_on_server && !self.stale {
            self.messages.push(StatusEvent::Status("ready".to_string()));
        }

        self.adapt_refresh(outcome.avg_duration);
        info!(
            round = round.get(),
            patched,
            avg_ms = outcome.avg_duration.as_millis() as u64,
            "local round applied"
        );
        RenderApplied { patched, scroll }
    }

    /// Apply a completed secondary round: clear its routine staleness and
    /// force a dependent local re-render.
    pub fn apply_secondary_outcome(
        &mut self,
        outcome: RenderOutcome,
        local: &mut TaskScheduler,
        secondary: &mut TaskScheduler,
    ) {
        // Staleness is routinely set by intermediate local runs; this
        // completion supersedes them.
        secondary.clear_stale();
        local.request_run(true);
        debug!(round = outcome.ctx.round.get(), "secondary round applied");
    }

    /// Forward a job failure to the status channel. The schedulers keep
    /// ticking.
    pub fn report_job_error(&mut self, error: &JobError) {
        self.messages.push(StatusEvent::Error(error.to_string()));
    }

    /// The editor viewport moved.
    pub fn on_viewport(&mut self, viewport: EditorViewport) -> Option<ScrollCommand> {
        self.viewport_state.set_viewport(viewport);
        self.sync_view(false, self.scroll_duration)
    }

    /// The cursor moved without the viewport changing.
    pub fn on_cursor(&mut self, line: u32) -> Option<ScrollCommand> {
        let mut viewport = self.viewport_state.viewport;
        viewport.cursor_line = line;
        self.on_viewport(viewport)
    }

    /// Resolve a preview node path back to a source position.
    pub fn locate(&self, path: &[usize]) -> Option<SourceAnchor> {
        let tree = self.surfaces.active();
        let node = tree.node_at_path(path)?;
        locate_source(tree, node)
    }

    /// Recompute the preview scroll position for the current viewport.
    pub fn sync_view(&mut self, force: bool, duration: Duration) -> Option<ScrollCommand> {
        let layout = self.layout.as_ref()?;
        let tree = self.surfaces.active();
        let request = SyncRequest {
            file_qualifier: self.snapshot.file_qualifier(),
            wrap: self.wrap.as_ref(),
            viewport_height: self.viewport_height,
            force,
            duration,
        };
        let command = compute_scroll_target(
            tree,
            |node| layout.outer_top(node),
            &request,
            &mut self.viewport_state,
        );
        if let Some(command) = command {
            self.surfaces.set_scroll(command.offset);
        }
        command
    }

    /// Full remount: build the replacement tree on the back surface, cut
    /// over, recompute layout and re-sync at zero duration.
    fn remount(&mut self, content: &RenderOutput) -> Option<ScrollCommand> {
        let tree = parse_markup(content.as_str());
        self.surfaces.mount(tree);
        self.layout = Some(PreviewLayout::compute(self.surfaces.active(), self.preview_width));
        debug!(nodes = self.surfaces.active().len(), "remounted presentation tree");
        self.sync_view(true, Duration::ZERO)
    }

    /// Adapt the refresh mode from the producer-reported moving average.
    fn adapt_refresh(&mut self, avg: Duration) {
        if self.mode_pinned {
            return;
        }
        match self.refresh_mode {
            RefreshMode::Continuous if avg > SLOW_RENDER => {
                debug!(avg_ms = avg.as_millis() as u64, "rendering is slow, delaying refresh");
                self.refresh_mode = RefreshMode::Delayed;
            }
            RefreshMode::Delayed if avg < FAST_RENDER => {
                debug!(avg_ms = avg.as_millis() as u64, "rendering is fast again, refreshing continuously");
                self.refresh_mode = RefreshMode::Continuous;
            }
            _ => {}
        }
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
