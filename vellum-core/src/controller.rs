//! The editing controller: single owner of the current value.
//!
//! All mutation funnels through [`EditingController::set_value`], which
//! validates the selection against the text and notifies subscribers
//! synchronously when the value changed. Subscribers are plain callbacks in
//! an explicit list; there is no framework notifier underneath.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::EditError;
use crate::selection::{SelectionChangeCause, TextSelection};
use crate::span::char_len;
use crate::value::EditingValue;

/// Callback invoked with the new value after a mutation.
pub type ValueListener = Arc<dyn Fn(&EditingValue) + Send + Sync>;

/// Handle returned by [`EditingController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct EditingController {
    value: EditingValue,
    listeners: SmallVec<[(ListenerId, ValueListener); 2]>,
    next_listener: u64,
}

impl EditingController {
    pub fn new(initial: EditingValue) -> Self {
        Self {
            value: initial,
            listeners: SmallVec::new(),
            next_listener: 0,
        }
    }

    pub fn value(&self) -> &EditingValue {
        &self.value
    }

    pub fn text(&self) -> &str {
        self.value.text()
    }

    /// Registers a listener invoked synchronously after each value change.
    ///
    /// Listeners run while the controller is borrowed: read state from the
    /// value passed in, never back through a shared handle.
    pub fn subscribe(&mut self, listener: ValueListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    /// The single mutation entry point.
    ///
    /// Rejects selections outside the new text and keeps the previous value
    /// in that case. Listeners fire only when the new value differs from the
    /// old one (by value equality, which ignores styling); a style-only
    /// rewrite is adopted silently.
    pub fn set_value(&mut self, value: EditingValue) -> Result<(), EditError> {
        let selection = value.selection();
        if selection.is_valid()
            && (selection.start as usize > value.len() || selection.end as usize > value.len())
        {
            return Err(EditError::InvalidSelection {
                start: selection.start,
                end: selection.end,
                len: value.len(),
            });
        }

        let changed = value != self.value;
        self.value = value;
        if changed {
            self.notify();
        }
        Ok(())
    }

    /// Replaces the text, clamping the current selection into the new
    /// bounds.
    pub fn set_text(&mut self, text: &str) -> Result<(), EditError> {
        let selection = self.value.selection().clamped(char_len(text));
        self.set_value(EditingValue::from_text(text).with_selection(selection))
    }

    pub fn set_selection(
        &mut self,
        selection: TextSelection,
        cause: SelectionChangeCause,
    ) -> Result<(), EditError> {
        tracing::trace!(
            ?cause,
            start = selection.start,
            end = selection.end,
            "selection change"
        );
        self.set_value(self.value.clone().with_selection(selection))
    }

    fn notify(&self) {
        // Snapshot so a listener mutating the subscription list through a
        // shared handle cannot invalidate the iteration.
        let listeners: SmallVec<[ValueListener; 2]> = self
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&self.value);
        }
    }
}
