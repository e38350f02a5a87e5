//! The editing value: one immutable snapshot of the buffer.
//!
//! An [`EditingValue`] bundles the styled span tree, the selection, the IME
//! composing region and a flag recording whether the value was produced by a
//! programmatic rewrite rather than a keystroke. The plain text is flattened
//! once at construction and cached, so equality checks and slicing never
//! re-walk the tree.
//!
//! Equality and hashing cover text, selection and composing range only.
//! Two values that differ just in span styling compare equal; this is what
//! lets the synchronization layer tell format-only refreshes apart from
//! substantive edits and avoid echo loops.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::selection::{TextRange, TextSelection};
use crate::span::{StyledSpan, char_len};

#[derive(Debug, Clone)]
pub struct EditingValue {
    spans: Arc<StyledSpan>,
    text: Arc<str>,
    len: usize,
    selection: TextSelection,
    composing: TextRange,
    remotely_edited: bool,
}

impl EditingValue {
    /// Builds a value from a span tree, flattening it once.
    pub fn new(spans: StyledSpan, selection: TextSelection, composing: TextRange) -> Self {
        let text: Arc<str> = spans.to_plain_text().into();
        let len = char_len(&text);
        Self {
            spans: Arc::new(spans),
            text,
            len,
            selection,
            composing,
            remotely_edited: false,
        }
    }

    /// A single unstyled leaf with no selection.
    pub fn from_text(text: &str) -> Self {
        Self::new(
            StyledSpan::leaf(text, crate::span::SpanStyle::PLAIN),
            TextSelection::INVALID,
            TextRange::EMPTY,
        )
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &StyledSpan {
        &self.spans
    }

    pub fn selection(&self) -> TextSelection {
        self.selection
    }

    pub fn composing(&self) -> TextRange {
        self.composing
    }

    pub fn remotely_edited(&self) -> bool {
        self.remotely_edited
    }

    /// Length of the plain text in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn with_selection(mut self, selection: TextSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_composing(mut self, composing: TextRange) -> Self {
        self.composing = composing;
        self
    }

    pub fn with_remotely_edited(mut self, remotely_edited: bool) -> Self {
        self.remotely_edited = remotely_edited;
        self
    }

    /// Swaps in a re-styled span tree that flattens to the same text.
    ///
    /// The cached text is kept; the caller guarantees the flattening is
    /// unchanged (checked in debug builds).
    pub fn with_spans(mut self, spans: StyledSpan) -> Self {
        debug_assert_eq!(spans.to_plain_text(), &*self.text);
        self.spans = Arc::new(spans);
        self
    }
}

impl Default for EditingValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for EditingValue {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.selection == other.selection
            && self.composing == other.composing
    }
}

impl Eq for EditingValue {}

impl Hash for EditingValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.selection.hash(state);
        self.composing.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanStyle;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &EditingValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_flattened_text_is_cached() {
        let value = EditingValue::new(
            StyledSpan::interior(vec![
                StyledSpan::leaf("ab", SpanStyle(1)),
                StyledSpan::leaf("cd", SpanStyle(2)),
            ]),
            TextSelection::collapsed(4),
            TextRange::EMPTY,
        );
        assert_eq!(value.text(), "abcd");
        assert_eq!(value.len(), 4);
    }

    #[test]
    fn test_equality_ignores_style() {
        let plain = EditingValue::from_text("abcd").with_selection(TextSelection::collapsed(2));
        let styled = EditingValue::new(
            StyledSpan::interior(vec![
                StyledSpan::leaf("ab", SpanStyle(7)),
                StyledSpan::leaf("cd", SpanStyle(9)),
            ]),
            TextSelection::collapsed(2),
            TextRange::EMPTY,
        );
        assert_eq!(plain, styled);
        assert_eq!(hash_of(&plain), hash_of(&styled));
    }

    #[test]
    fn test_equality_ignores_remote_flag() {
        let value = EditingValue::from_text("x");
        assert_eq!(value.clone(), value.clone().with_remotely_edited(true));
    }

    #[test]
    fn test_selection_and_composing_distinguish() {
        let base = EditingValue::from_text("abcd");
        assert_ne!(
            base.clone().with_selection(TextSelection::collapsed(1)),
            base.clone().with_selection(TextSelection::collapsed(2))
        );
        assert_ne!(
            base.clone().with_composing(TextRange::new(0, 2)),
            base.clone()
        );
    }

    #[test]
    fn test_with_spans_keeps_text() {
        let value = EditingValue::from_text("  foo");
        let restyled = value.clone().with_spans(StyledSpan::interior(vec![
            StyledSpan::leaf("  ", SpanStyle::DECORATION),
            StyledSpan::leaf("foo", SpanStyle(1)),
        ]));
        assert_eq!(restyled.text(), "  foo");
        assert_eq!(value, restyled);
    }

    #[test]
    fn test_multibyte_len() {
        assert_eq!(EditingValue::from_text("héllo").len(), 5);
    }
}
