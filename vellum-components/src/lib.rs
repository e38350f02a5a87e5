//! # Vellum components
//!
//! Interaction components for the vellum editing engine: focus handling,
//! cursor blink scheduling, floating-cursor tracking, selection overlay
//! lifecycle, and the [`TextEditor`] session that wires them to the
//! synchronization core in `vellum-core`.
//!
//! Everything here is renderer-agnostic. Presentation crosses two traits
//! the host implements: `CaretGeometry` for caret rectangles and hit
//! resolution, and `SelectionOverlay` for the handles-and-toolbar object.
//! Time enters only through `Instant` arguments on `tick`/`poll`, so hosts
//! and tests drive animation deterministically.

pub mod blink;
pub mod floating_cursor;
pub mod focus;
pub mod selection_overlay;
pub mod text_editor;

pub use blink::{BlinkPhase, CursorBlinkConfig, CursorBlinkScheduler};
pub use floating_cursor::{
    CaretGeometry, FloatingCursorConfig, FloatingCursorPhase, FloatingCursorTracker,
};
pub use focus::{Focus, FocusScope};
pub use selection_overlay::{OverlayProvider, SelectionOverlay, SelectionOverlayCoordinator};
pub use text_editor::{TextEditor, TextEditorOptions};
