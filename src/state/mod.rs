//! Orchestration state (pure).
//!
//! The controller owns the document snapshot, the mounted surfaces and the
//! viewport memo, and transforms them in response to producer completions
//! and editor events. All transitions are plain method calls testable
//! without a shell.

pub mod controller;
pub mod surfaces;

// Re-export for convenience
pub use controller::{ControllerConfig, PreviewController, RefreshMode, RenderApplied, StatusEvent};
pub use surfaces::ViewSurfaces;
