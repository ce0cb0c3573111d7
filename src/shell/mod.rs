//! Driver shell (impure): the timer-driven loop hosting the core.
//!
//! Single-threaded and cooperative: each iteration drains the control
//! stream, polls the watched document, ticks both schedulers, polls both
//! producers, applies outcomes through the controller and emits events.
//! Nothing blocks; the loop sleeps a short tick between iterations.

use crate::config::ResolvedConfig;
use crate::model::{AppError, ControlError, EditorViewport, RoundContext, ScrollCommand, SourceError};
use crate::producer::{BlockRenderer, CommandProducer, RenderProducer};
use crate::sched::{SpinnerGate, TaskScheduler, TickOutcome};
use crate::source::{ControlCommand, ControlStream, EditorEvent, WatchedFile};
use crate::state::{ControllerConfig, PreviewController, StatusEvent};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Loop granularity; every poll source is checked at least this often.
const TICK: Duration = Duration::from_millis(50);

/// Everything the driver needs to run a session.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    /// The source document to watch.
    pub source: PathBuf,
    /// Resolved configuration.
    pub config: ResolvedConfig,
}

/// Should the session keep running after a control command?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run a preview session until `quit`, stdin EOF or source deletion.
pub fn run(options: ShellOptions) -> Result<(), AppError> {
    let config = &options.config;
    let doc_name = options
        .source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let preview_path = config
        .preview_path
        .clone()
        .unwrap_or_else(|| options.source.with_extension("html"));

    let mut watched = WatchedFile::new(&options.source)?;
    let initial_text = watched.read_text()?;

    let mut controller = PreviewController::new(
        doc_name.clone(),
        initial_text,
        ControllerConfig {
            preview_width: config.preview_width,
            viewport_height: config.preview_height,
            scroll_duration: Duration::from_millis(config.scroll_duration_ms),
            allow_secondary: config.secondary_command.is_some(),
            wrap_column: config.wrap_column,
            pinned_mode: config.pinned_mode,
        },
    );

    let start = Instant::now();
    let mut local_sched = TaskScheduler::new(
        "local",
        Duration::from_millis(config.refresh_interval_ms),
        start,
    );
    let mut secondary_sched = TaskScheduler::new(
        "secondary",
        Duration::from_millis(config.secondary_interval_ms),
        start,
    );
    let mut local_producer = BlockRenderer::new();
    let mut secondary_producer = config.secondary_command.clone().map(CommandProducer::new);
    let mut gate = SpinnerGate::new(Duration::from_millis(config.spinner_delay_ms));
    let mut gate_visible = false;
    let mut control = ControlStream::stdin();
    let mut out = std::io::stdout();

    info!(source = %options.source.display(), preview = %preview_path.display(), "session started");

    'session: loop {
        let now = Instant::now();

        // 1. Editor control commands.
        for parsed in control.poll() {
            match parsed {
                Ok(command) => {
                    let flow = handle_command(
                        command,
                        &mut controller,
                        &mut local_sched,
                        &mut secondary_sched,
                        now,
                        &mut out,
                    )?;
                    if flow == Flow::Quit {
                        info!("quit requested");
                        break 'session;
                    }
                }
                Err(ControlError::Disconnected) => {
                    info!("control stream closed, ending session");
                    break 'session;
                }
                Err(error) => {
                    emit(&mut out, &EditorEvent::Error {
                        message: error.to_string(),
                    })?;
                }
            }
        }

        // 2. Source document changes.
        match watched.poll_changes() {
            Ok(false) => {}
            Ok(true) => match watched.read_text() {
                Ok(text) => controller.on_edit(text),
                Err(SourceError::FileDeleted) => {
                    emit(&mut out, &EditorEvent::Error {
                        message: SourceError::FileDeleted.to_string(),
                    })?;
                    break 'session;
                }
                Err(error) => return Err(error.into()),
            },
            Err(SourceError::FileDeleted) => {
                emit(&mut out, &EditorEvent::Error {
                    message: SourceError::FileDeleted.to_string(),
                })?;
                break 'session;
            }
            Err(error) => return Err(error.into()),
        }

        // 3. Local scheduler tick and completion.
        if let TickOutcome::Start(round) = local_sched.poll(now, || controller.local_is_stale()) {
            let ctx = RoundContext::new(doc_name.as_str(), round);
            let request = controller.begin_local_round(ctx);
            gate.begin(now);
            if let Err(error) = local_producer.begin(request) {
                warn!(%error, "local producer failed to start");
                controller.report_job_error(&error);
                gate.end();
                local_sched.finish(now);
            }
        }
        if let Some(result) = local_producer.poll() {
            gate.end();
            local_sched.finish(now);
            match result {
                Ok(outcome) => {
                    let round = outcome.ctx.round.get();
                    let applied = controller.apply_local_outcome(outcome, &mut secondary_sched);
                    if let Some(html) = controller.html() {
                        write_preview(&preview_path, html.as_str())?;
                    }
                    emit(&mut out, &EditorEvent::Rendered {
                        round,
                        patched: applied.patched,
                    })?;
                    if let Some(scroll) = applied.scroll {
                        emit(&mut out, &scroll_event(scroll))?;
                    }
                }
                Err(error) => {
                    warn!(%error, "local render round failed");
                    controller.report_job_error(&error);
                }
            }
        }

        // 4. Secondary scheduler tick and completion.
        if let Some(producer) = secondary_producer.as_mut() {
            if let TickOutcome::Start(round) = secondary_sched.poll(now, || false) {
                let ctx = RoundContext::new(doc_name.as_str(), round);
                let request = controller.begin_secondary_round(ctx);
                gate.begin(now);
                if let Err(error) = producer.begin(request) {
                    warn!(%error, "secondary producer failed to start");
                    controller.report_job_error(&error);
                    gate.end();
                    secondary_sched.finish(now);
                }
            }
            if let Some(result) = producer.poll() {
                gate.end();
                secondary_sched.finish(now);
                match result {
                    Ok(outcome) => controller.apply_secondary_outcome(
                        outcome,
                        &mut local_sched,
                        &mut secondary_sched,
                    ),
                    Err(error) => {
                        warn!(%error, "secondary render round failed");
                        controller.report_job_error(&error);
                    }
                }
            }
        }

        // 5. Busy-indicator transitions.
        let visible = gate.visible(Instant::now());
        if visible != gate_visible {
            gate_visible = visible;
            let event = if visible {
                EditorEvent::Busy
            } else {
                EditorEvent::Ready
            };
            emit(&mut out, &event)?;
        }

        // 6. Status channel.
        for message in controller.take_messages() {
            let event = match message {
                StatusEvent::Status(message) => EditorEvent::Status { message },
                StatusEvent::Error(message) => EditorEvent::Error { message },
            };
            emit(&mut out, &event)?;
        }

        std::thread::sleep(TICK);
    }

    info!("session ended");
    Ok(())
}

fn handle_command(
    command: ControlCommand,
    controller: &mut PreviewController,
    local: &mut TaskScheduler,
    secondary: &mut TaskScheduler,
    now: Instant,
    out: &mut dyn Write,
) -> Result<Flow, AppError> {
    match command {
        ControlCommand::Viewport { start, end, cursor } => {
            if let Some(scroll) = controller.on_viewport(EditorViewport::new(start, end, cursor)) {
                emit(out, &scroll_event(scroll))?;
            }
        }
        ControlCommand::Cursor { line } => {
            if let Some(scroll) = controller.on_cursor(line) {
                emit(out, &scroll_event(scroll))?;
            }
        }
        ControlCommand::EditFile { path } => controller.set_edit_file(path),
        ControlCommand::Wrap { column } => controller.set_wrap_column(column),
        ControlCommand::Pause => {
            local.pause();
            secondary.pause();
        }
        ControlCommand::Resume { interval_ms } => {
            local.resume(interval_ms.map(Duration::from_millis), now);
            secondary.resume(None, now);
        }
        ControlCommand::Refresh => local.request_run(true),
        ControlCommand::Locate { node } => match controller.locate(&node) {
            Some(anchor) => emit(out, &EditorEvent::Source {
                path: anchor.file,
                line: anchor.line,
            })?,
            None => emit(out, &EditorEvent::Error {
                message: "no source position for node".to_string(),
            })?,
        },
        ControlCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn scroll_event(scroll: ScrollCommand) -> EditorEvent {
    EditorEvent::Scroll {
        offset: scroll.offset,
        duration_ms: scroll.duration.as_millis() as u64,
    }
}

/// Serialize one event as a JSON line on the protocol stream.
fn emit(out: &mut dyn Write, event: &EditorEvent) -> Result<(), AppError> {
    let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

/// Write the preview atomically: temp file in place, then rename.
fn write_preview(path: &Path, html: &str) -> Result<(), AppError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, html)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
