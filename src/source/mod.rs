//! Shell input sources.
//!
//! Two streams feed the driver loop:
//! - the watched source document (filesystem events, full-text reloads)
//! - the editor control stream (JSON-lines commands on stdin)
//!
//! Both expose non-blocking `poll` methods so the single-threaded loop never
//! waits on either.

pub mod control;
pub mod file;

pub use control::{ControlCommand, ControlStream, EditorEvent};
pub use file::WatchedFile;
