//! pvsync - live preview synchronization engine
//!
//! The core of a document editor's live preview: as the source changes, a
//! rendered representation is regenerated by cooperating producers, carried
//! to the presentation tree with minimal-diff patches where possible, and
//! kept scroll-aligned with the edited region through source-position
//! anchors.
//!
//! Pure core (scheduling decisions, patching, mapping, orchestration) under
//! `sched` / `patch` / `sync` / `state`; impure shell (file watching, the
//! stdin/stdout control protocol, the driver loop) under `source` / `shell`.

pub mod config;
pub mod logging;
pub mod markup;
pub mod model;
pub mod patch;
pub mod producer;
pub mod sched;
pub mod shell;
pub mod source;
pub mod state;
pub mod sync;
