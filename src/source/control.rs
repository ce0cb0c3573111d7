//! Editor control protocol.
//!
//! JSON-lines in both directions: the editor plugin writes commands to the
//! driver's stdin, the driver writes events to stdout. One JSON object per
//! line, tagged with `cmd` / `event`. Malformed command lines are reported
//! and skipped; they never end the session.

use crate::model::error::ControlError;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// A command from the editor plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case", deny_unknown_fields)]
pub enum ControlCommand {
    /// Visible range and cursor changed (view lines, 1-based).
    Viewport {
        /// First visible line.
        start: u32,
        /// Last visible line.
        end: u32,
        /// Cursor line.
        cursor: u32,
    },
    /// Cursor moved without the viewport changing.
    Cursor {
        /// Cursor line.
        line: u32,
    },
    /// The editor switched to another file of the document.
    EditFile {
        /// File path relative to the document root.
        path: String,
    },
    /// Soft-wrap configuration changed.
    Wrap {
        /// Wrap column; absent turns wrapping off.
        #[serde(default)]
        column: Option<u16>,
    },
    /// Suspend automatic re-rendering.
    Pause,
    /// Resume automatic re-rendering.
    Resume {
        /// Optional new refresh interval.
        #[serde(default)]
        interval_ms: Option<u64>,
    },
    /// Force an out-of-band render round.
    Refresh,
    /// Resolve a preview node (child-index path from the root) back to its
    /// source position.
    Locate {
        /// Child-index path from the tree root.
        node: Vec<usize>,
    },
    /// End the session.
    Quit,
}

/// An event for the editor plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EditorEvent {
    /// Scroll the preview surface.
    Scroll {
        /// Target offset in layout lines.
        offset: u64,
        /// Animation duration in milliseconds.
        duration_ms: u64,
    },
    /// A render round was applied.
    Rendered {
        /// Round number.
        round: u64,
        /// True when the cycle was an incremental patch.
        patched: bool,
    },
    /// Human-oriented status line.
    Status {
        /// Status text.
        message: String,
    },
    /// Non-fatal error report.
    Error {
        /// Error text.
        message: String,
    },
    /// A render round has been running long enough to show a busy indicator.
    Busy,
    /// All render rounds finished.
    Ready,
    /// Reply to a `locate` command.
    Source {
        /// Source file, absent for the primary document.
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        /// 1-based source line.
        line: u32,
    },
}

/// Parse one control line.
pub fn parse_command(line: &str) -> Result<ControlCommand, ControlError> {
    serde_json::from_str(line).map_err(|e| ControlError::InvalidCommand {
        message: e.to_string(),
        line: line.to_string(),
    })
}

/// Non-blocking command stream over a reader (stdin in production).
///
/// A reader thread forwards complete lines over a channel; `poll` drains
/// whatever has arrived. Blank lines are ignored.
pub struct ControlStream {
    line_rx: Receiver<String>,
    disconnected: bool,
}

impl ControlStream {
    /// Spawn a stream over the process stdin.
    pub fn stdin() -> Self {
        Self::from_reader(std::io::stdin())
    }

    /// Spawn a stream over any reader.
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut lines = BufReader::new(reader).lines();
            while let Some(Ok(line)) = lines.next() {
                if tx.send(line).is_err() {
                    break;
                }
            }
            // EOF or read error: dropping tx disconnects the channel.
        });
        Self {
            line_rx: rx,
            disconnected: false,
        }
    }

    /// Drain all commands that arrived since the last poll. Parse failures
    /// are returned in-line so the caller can report and continue.
    pub fn poll(&mut self) -> Vec<Result<ControlCommand, ControlError>> {
        let mut out = Vec::new();
        loop {
            match self.line_rx.try_recv() {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    out.push(parse_command(&line));
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        self.disconnected = true;
                        out.push(Err(ControlError::Disconnected));
                    }
                    break;
                }
            }
        }
        out
    }

    /// True once the writer side has gone away.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}
