//! Synchronization between the local value and the external input channel.
//!
//! The input channel (a platform keyboard or IME) holds its own copy of the
//! text and reports whole-value updates. Edits can also originate locally
//! (paste, auto-indent) or from the highlighter rewriting the buffer. The
//! [`Reconciler`] mediates: it classifies each inbound update, runs the
//! highlighter, adopts the product, and echoes a corrected value back to the
//! channel only when the product differs from what the channel believes.
//! `last_known_remote` is what bounds the round-trip chatter; without it
//! every echo would re-trigger a parse and loop.
//!
//! Programmatic insertion is a two-phase protocol. The first phase splices
//! the text and pushes it out; the second is a synthetic update pass that
//! re-derives styling while [`RemoteEditPhase::AwaitingRefresh`] is set, so
//! an expensive restyle is never conflated with a live keystroke. The phase
//! is guaranteed to return to `Idle` even when the highlighter fails.
//!
//! Everything runs on the caller's thread. Events are queued and drained in
//! arrival order; an event that arrives while another is being handled waits
//! until the current one has fully completed, push-back included.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::classify::classify;
use crate::controller::EditingController;
use crate::error::EditError;
use crate::highlight::{Highlighter, validate_value};
use crate::selection::{TextRange, TextSelection};
use crate::shared::Shared;
use crate::span::{SpanStyle, char_len};
use crate::value::EditingValue;

/// Editing action reported by the input channel's action key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Newline,
    Done,
    Go,
    Send,
    Search,
    Unspecified,
}

impl InputAction {
    /// Whether this action ends the editing session.
    ///
    /// Newline on a multiline buffer does not: the newline itself already
    /// arrived through the value channel.
    pub fn finalizes_editing(self, multiline: bool) -> bool {
        !(self == Self::Newline && multiline)
    }
}

/// Outbound half of the input channel.
pub trait InputConnection: Send {
    /// Pushes a corrected value to the platform input source.
    fn set_editing_state(&mut self, value: &EditingValue);
    /// Opens the channel (attach the platform keyboard).
    fn show(&mut self);
    /// Closes the channel.
    fn close(&mut self);
}

/// Observer callbacks, all optional.
#[derive(Clone, Default)]
pub struct ReconcilerCallbacks {
    on_changed: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    on_error: Option<Arc<dyn Fn(&EditError) + Send + Sync>>,
    hide_overlay: Option<Arc<dyn Fn() + Send + Sync>>,
    ensure_caret_visible: Option<Arc<dyn Fn() + Send + Sync>>,
    on_editing_complete: Option<Arc<dyn Fn(InputAction) + Send + Sync>>,
}

impl ReconcilerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the new plain text after an adopted edit changed it.
    pub fn on_changed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_changed = Some(Arc::new(f));
        self
    }

    /// Called when an event was rejected and the value retained.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&EditError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Called when inbound text differs from the local text, before it is
    /// processed; the selection overlay should get out of the way.
    pub fn hide_overlay<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hide_overlay = Some(Arc::new(f));
        self
    }

    /// Called alongside `hide_overlay`; the viewport should bring the caret
    /// into view.
    pub fn ensure_caret_visible<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.ensure_caret_visible = Some(Arc::new(f));
        self
    }

    /// Called when an action key finalizes editing.
    pub fn on_editing_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(InputAction) + Send + Sync + 'static,
    {
        self.on_editing_complete = Some(Arc::new(f));
        self
    }
}

/// Phase of the two-phase programmatic-edit protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEditPhase {
    Idle,
    /// A structural edit was applied and pushed; the next update pass is a
    /// style refresh, not a keystroke.
    AwaitingRefresh,
}

enum PendingEvent {
    RemoteUpdate(EditingValue),
    RemoteInsert(String),
    Action(InputAction),
}

pub struct Reconciler {
    controller: Shared<EditingController>,
    highlighter: Arc<dyn Highlighter>,
    connection: Box<dyn InputConnection>,
    callbacks: ReconcilerCallbacks,
    last_known_remote: Option<EditingValue>,
    phase: RemoteEditPhase,
    base_style: SpanStyle,
    read_only: bool,
    multiline: bool,
    queue: VecDeque<PendingEvent>,
    draining: bool,
}

impl Reconciler {
    pub fn new(
        controller: Shared<EditingController>,
        highlighter: Arc<dyn Highlighter>,
        connection: Box<dyn InputConnection>,
    ) -> Self {
        Self {
            controller,
            highlighter,
            connection,
            callbacks: ReconcilerCallbacks::default(),
            last_known_remote: None,
            phase: RemoteEditPhase::Idle,
            base_style: SpanStyle::PLAIN,
            read_only: false,
            multiline: true,
            queue: VecDeque::new(),
            draining: false,
        }
    }

    pub fn set_callbacks(&mut self, callbacks: ReconcilerCallbacks) {
        self.callbacks = callbacks;
    }

    pub fn set_base_style(&mut self, style: SpanStyle) {
        self.base_style = style;
    }

    pub fn set_multiline(&mut self, multiline: bool) {
        self.multiline = multiline;
    }

    pub fn multiline(&self) -> bool {
        self.multiline
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        if read_only {
            self.connection.close();
        }
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn phase(&self) -> RemoteEditPhase {
        self.phase
    }

    pub fn last_known_remote(&self) -> Option<&EditingValue> {
        self.last_known_remote.as_ref()
    }

    /// Opens the channel; ignored while read-only.
    pub fn open_connection(&mut self) {
        if !self.read_only {
            self.connection.show();
        }
    }

    pub fn close_connection(&mut self) {
        self.connection.close();
    }

    /// Inbound update from the input channel.
    ///
    /// Out-of-bounds selections are clamped to the reported text rather than
    /// rejected; the channel and the engine can briefly disagree on length
    /// mid-transition.
    pub fn update_editing_value(
        &mut self,
        text: &str,
        selection: TextSelection,
        composing: TextRange,
    ) {
        let candidate = remote_candidate(text, selection, composing);
        self.dispatch(PendingEvent::RemoteUpdate(candidate));
    }

    /// Inbound action key from the input channel.
    pub fn perform_action(&mut self, action: InputAction) {
        self.dispatch(PendingEvent::Action(action));
    }

    /// Programmatic insertion at the current selection (paste path).
    pub fn insert_remotely(&mut self, text: &str) {
        self.dispatch(PendingEvent::RemoteInsert(text.to_string()));
    }

    fn dispatch(&mut self, event: PendingEvent) {
        self.queue.push_back(event);
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(event) = self.queue.pop_front() {
            match event {
                PendingEvent::RemoteUpdate(candidate) => self.handle_remote_update(candidate),
                PendingEvent::RemoteInsert(text) => self.handle_remote_insert(&text),
                PendingEvent::Action(action) => self.handle_action(action),
            }
        }
        self.draining = false;
    }

    fn handle_remote_update(&mut self, candidate: EditingValue) {
        if self.read_only {
            return;
        }

        let current = self.controller.with(|c| c.value().clone());
        if candidate.text() != current.text() {
            if let Some(hide) = &self.callbacks.hide_overlay {
                hide();
            }
            if let Some(reveal) = &self.callbacks.ensure_caret_visible {
                reveal();
            }
        }

        if self.phase == RemoteEditPhase::AwaitingRefresh {
            // Synthetic cycle after a structural edit: restyle only, no
            // classification, no change notification.
            let refreshed = self
                .highlighter
                .refresh_style(&candidate)
                .and_then(|value| validate_value(&value).map(|_| value));
            self.phase = RemoteEditPhase::Idle;
            match refreshed {
                Ok(refreshed) => {
                    self.push_to_remote(&refreshed);
                    if let Err(err) = self.controller.with_mut(|c| c.set_value(refreshed)) {
                        self.fail(err);
                    }
                }
                Err(err) => self.fail(err.into()),
            }
            return;
        }

        if let Some(last) = &self.last_known_remote
            && last.text() == candidate.text()
        {
            // Selection-only echo from the channel. Ignored outright, even
            // when the local value has since diverged.
            tracing::trace!("ignoring input-channel echo with unchanged text");
            return;
        }

        let key = classify(&current, &candidate);
        tracing::debug!(?key, len = candidate.len(), "inbound edit");

        let parsed = self
            .highlighter
            .parse(&current, &candidate, self.base_style)
            .and_then(|value| validate_value(&value).map(|_| value));
        match parsed {
            Ok(parsed) => {
                self.last_known_remote = Some(candidate);
                if parsed.remotely_edited() {
                    // The highlighter rewrote the buffer; the channel has to
                    // be told or the two copies drift apart.
                    self.push_to_remote(&parsed);
                }
                let text_changed = parsed.text() != current.text();
                let new_text = parsed.text().to_string();
                match self.controller.with_mut(|c| c.set_value(parsed)) {
                    Ok(()) => {
                        if text_changed
                            && let Some(changed) = &self.callbacks.on_changed
                        {
                            changed(&new_text);
                        }
                    }
                    Err(err) => self.fail(err),
                }
            }
            Err(err) => self.fail(err.into()),
        }
    }

    fn handle_remote_insert(&mut self, text: &str) {
        if self.read_only {
            return;
        }

        self.phase = RemoteEditPhase::AwaitingRefresh;
        let current = self.controller.with(|c| c.value().clone());
        let inserted = self
            .highlighter
            .insert_text_remotely(&current, text)
            .and_then(|value| validate_value(&value).map(|_| value));
        match inserted {
            Ok(inserted) => {
                match self.controller.with_mut(|c| c.set_value(inserted.clone())) {
                    Ok(()) => {
                        self.push_to_remote(&inserted);
                        // Second phase: a synthetic update pass finalizes
                        // styling once this event has fully completed.
                        self.queue.push_back(PendingEvent::RemoteUpdate(inserted));
                    }
                    Err(err) => {
                        self.phase = RemoteEditPhase::Idle;
                        self.fail(err);
                    }
                }
            }
            Err(err) => {
                self.phase = RemoteEditPhase::Idle;
                self.fail(err.into());
            }
        }
    }

    fn handle_action(&mut self, action: InputAction) {
        if !action.finalizes_editing(self.multiline) {
            return;
        }
        if let Some(complete) = &self.callbacks.on_editing_complete {
            complete(action);
        }
    }

    fn push_to_remote(&mut self, value: &EditingValue) {
        self.connection.set_editing_state(value);
        self.last_known_remote = Some(value.clone());
    }

    fn fail(&mut self, err: EditError) {
        tracing::warn!(error = %err, "edit rejected, retaining current value");
        if let Some(on_error) = &self.callbacks.on_error {
            on_error(&err);
        }
    }
}

fn remote_candidate(
    text: &str,
    selection: TextSelection,
    composing: TextRange,
) -> EditingValue {
    let len = char_len(text);
    let selection = if selection.is_valid()
        && (selection.start as usize > len || selection.end as usize > len)
    {
        tracing::warn!(
            start = selection.start,
            end = selection.end,
            len,
            "input channel selection out of bounds, clamping"
        );
        selection.clamped(len)
    } else {
        selection
    };
    let composing = if composing.is_valid() && composing.end as usize > len {
        tracing::warn!(
            start = composing.start,
            end = composing.end,
            len,
            "input channel composing range out of bounds, dropping"
        );
        TextRange::EMPTY
    } else {
        composing
    };
    EditingValue::from_text(text)
        .with_selection(selection)
        .with_composing(composing)
}
