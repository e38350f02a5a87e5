//! Keystroke classification.
//!
//! Given the value before and after an input-channel update, decide whether
//! the user pressed Enter, Backspace, or something else. The channel only
//! reports whole values, so this is a heuristic over cursor movement and the
//! slice between the old and new caret; it is only reliable for
//! single-character edits at the cursor. Multi-character programmatic edits
//! take the remote-insertion path instead and never reach this function.

use crate::span::slice_chars;
use crate::value::EditingValue;

/// The three keystroke shapes the synchronization layer tells apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Enter,
    Backspace,
    Regular,
}

/// Classifies the transition from `old` to `new`.
///
/// In order:
/// 1. a new value that is exactly one newline is Enter, covering the
///    newline-into-empty-buffer case;
/// 2. a caret that moved left is Backspace, the only reliable backspace
///    signal short of a full diff;
/// 3. otherwise the slice of new text between the old and new caret decides:
///    a lone newline is Enter, anything else Regular.
///
/// An old value that never had a selection counts as a caret at 0.
pub fn classify(old: &EditingValue, new: &EditingValue) -> KeyPress {
    if new.len() == 1 && new.text() == "\n" {
        return KeyPress::Enter;
    }

    let old_start = old.selection().start.max(0) as usize;
    let new_start = new.selection().start.max(0) as usize;
    if old_start > new_start {
        return KeyPress::Backspace;
    }

    let inserted = slice_chars(
        new.text(),
        old_start.min(new.len()),
        new_start.min(new.len()),
    );
    if inserted == "\n" {
        KeyPress::Enter
    } else {
        KeyPress::Regular
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::TextSelection;

    fn value(text: &str, caret: usize) -> EditingValue {
        EditingValue::from_text(text).with_selection(TextSelection::collapsed(caret))
    }

    #[test]
    fn test_backspace() {
        assert_eq!(
            classify(&value("ab", 2), &value("a", 1)),
            KeyPress::Backspace
        );
    }

    #[test]
    fn test_enter_mid_buffer() {
        assert_eq!(classify(&value("a", 1), &value("a\n", 2)), KeyPress::Enter);
    }

    #[test]
    fn test_enter_into_empty_buffer() {
        assert_eq!(classify(&value("", 0), &value("\n", 1)), KeyPress::Enter);
    }

    #[test]
    fn test_regular_insertion() {
        assert_eq!(
            classify(&value("a", 1), &value("ab", 2)),
            KeyPress::Regular
        );
    }

    #[test]
    fn test_identical_values_are_regular() {
        let v = value("abc", 2);
        assert_eq!(classify(&v, &v), KeyPress::Regular);
    }

    #[test]
    fn test_missing_old_selection_counts_as_zero() {
        let old = EditingValue::from_text("");
        assert_eq!(classify(&old, &value("\n", 1)), KeyPress::Enter);
        assert_eq!(classify(&old, &value("x", 1)), KeyPress::Regular);
    }

    #[test]
    fn test_multibyte_slice() {
        assert_eq!(
            classify(&value("é", 1), &value("é\n", 2)),
            KeyPress::Enter
        );
    }
}
