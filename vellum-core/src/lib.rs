//! # Vellum core
//!
//! The value model and synchronization machinery of an editable-text
//! engine. The buffer lives locally as an immutable [`EditingValue`]
//! snapshot (styled span tree, selection, IME composing range) while a
//! platform input source holds its own copy of the text and reports
//! whole-value updates; the [`Reconciler`] keeps the two sides agreeing
//! without echo loops, running every edit through a pluggable
//! [`Highlighter`] that re-derives styling and may itself rewrite the
//! buffer.
//!
//! This crate is deliberately renderer-free. Geometry appears only as the
//! small [`px`] types used where a host reports caret rectangles and
//! pointer offsets; everything else addresses text by character offset.
//!
//! ## Structure
//!
//! - [`span`], [`selection`], [`value`]: the immutable data model
//! - [`classify`]: keystroke classification over value transitions
//! - [`highlight`]: the highlighter extension point and the toy
//!   alternating highlighter
//! - [`controller`]: the observable owner of the current value
//! - [`reconciler`]: the input-channel synchronization state machine
//!
//! Interaction components (cursor blinking, floating cursor, selection
//! overlay) build on this crate from `vellum-components`.

pub mod classify;
pub mod controller;
pub mod error;
pub mod highlight;
pub mod px;
pub mod reconciler;
pub mod selection;
pub mod shared;
pub mod span;
pub mod value;

pub use classify::{KeyPress, classify};
pub use controller::{EditingController, ListenerId, ValueListener};
pub use error::EditError;
pub use highlight::{AlternatingHighlighter, HighlightError, Highlighter, validate_value};
pub use px::{Px, PxPosition, PxRect};
pub use reconciler::{
    InputAction, InputConnection, Reconciler, ReconcilerCallbacks, RemoteEditPhase,
};
pub use selection::{SelectionChangeCause, TextAffinity, TextRange, TextSelection};
pub use shared::Shared;
pub use span::{SpanHit, SpanStyle, StyledSpan, skip_decoration};
pub use value::EditingValue;
