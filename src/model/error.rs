//! Error types for the pvsync engine.
//!
//! A hierarchical taxonomy built on `thiserror`, composing via `?` and `From`
//! conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level application error wrapping all domain-specific failures
//!   - [`SourceError`] - Watched-document failures (file not found, deleted, IO)
//!   - [`ControlError`] - Control-protocol failures (malformed command lines)
//!   - [`ConfigError`](crate::config::ConfigError) / [`LoggingError`](crate::logging::LoggingError) - startup failures
//! - [`JobError`] - Render-producer failures, forwarded to the status channel
//!
//! # Recovery Strategy
//!
//! Nothing inside the synchronization core is fatal. Job failures are reported and
//! the scheduler keeps ticking; malformed control lines are reported and skipped;
//! patch ambiguity is not an error at all (it resolves to a full remount) and a
//! mapping miss silently produces no scroll. Only shell-level conditions -- the
//! watched document disappearing, the terminal pipes breaking -- end the session,
//! and they do so through [`AppError`] after a clean shutdown.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error encompassing all failure modes.
///
/// Returned from the driver shell and the entry point. Domain errors convert via
/// `From`, so `?` composes across module boundaries.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to read or watch the source document.
    ///
    /// Fatal to the session: without a source document there is nothing to
    /// preview. The shell reports the error on the event stream and exits.
    #[error("Failed to read source document: {0}")]
    Source(#[from] SourceError),

    /// The control stream itself failed (not an individual command).
    ///
    /// Individual malformed commands are non-fatal and reported as events; this
    /// variant covers the stream disconnecting unexpectedly.
    #[error("Control stream error: {0}")]
    Control(#[from] ControlError),

    /// Configuration file was present but unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Tracing subscriber could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// I/O error writing the preview or the event stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors encountered reading or watching the source document.
///
/// Distinguishes specific failure modes (missing at startup vs deleted while
/// watched) rather than collapsing them into generic I/O errors, so the shell
/// can report precisely and decide whether the session can continue.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source document does not exist at the given path.
    ///
    /// Occurs at startup when the user passes a bad path. The session cannot
    /// start; the full path is preserved for the error message.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The filesystem path that was not found.
        path: PathBuf,
    },

    /// The source document was deleted while being watched.
    ///
    /// Distinct from [`SourceError::FileNotFound`]: deletion mid-session is a
    /// different user experience than a bad initial path. The shell reports it
    /// and ends the session cleanly.
    #[error("File deleted while watched")]
    FileDeleted,

    /// Setting up or running the filesystem watcher failed.
    #[error("Watch error: {0}")]
    Watch(String),

    /// Generic I/O error reading the source document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors encountered on the editor control stream.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A control line was not a valid command.
    ///
    /// Non-fatal: the line is reported as an `error` event and skipped, the
    /// stream keeps draining. The raw line is preserved for diagnostics.
    #[error("Invalid control command: {message} (line: {line})")]
    InvalidCommand {
        /// Parser error detail.
        message: String,
        /// The raw line that failed to parse.
        line: String,
    },

    /// The control stream reader disconnected without a `quit` command.
    #[error("Control stream disconnected")]
    Disconnected,
}

/// Render-producer job failures.
///
/// Forwarded to the externally owned status channel; never stops the scheduler
/// loop. The in-flight round is abandoned and the next tick proceeds normally.
#[derive(Debug, Error)]
pub enum JobError {
    /// The secondary command could not be launched.
    #[error("failed to launch `{command}`: {message}")]
    Spawn {
        /// The configured command line.
        command: String,
        /// The underlying spawn failure.
        message: String,
    },

    /// The secondary command ran but exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        /// The configured command line.
        command: String,
        /// Exit status description (code or signal).
        status: String,
        /// Trailing stderr output, trimmed for the status channel.
        stderr: String,
    },

    /// The producer's worker thread went away without reporting a result.
    #[error("producer worker disconnected")]
    WorkerGone,

    /// A job was started while a previous one was still unresolved.
    ///
    /// The scheduler serializes rounds, so this indicates a wiring bug in the
    /// host loop rather than a runtime condition.
    #[error("producer is already running a job")]
    Busy,
}
