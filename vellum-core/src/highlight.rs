//! The pluggable highlighter boundary.
//!
//! A [`Highlighter`] turns plain edits into styled values: it rebuilds the
//! span tree after every substantive edit, splices programmatic insertions,
//! and re-derives styling for unchanged text. It is allowed to rewrite the
//! buffer itself (auto-indent after Enter is the canonical case); it signals
//! that by flagging its product as remotely edited, which makes the
//! synchronization layer echo the correction back to the input channel.
//!
//! The crate ships one implementation, [`AlternatingHighlighter`], a toy
//! that alternates two styles per word and marks leading indentation as
//! decoration. It exists to exercise the machinery, not to be a grammar.

use thiserror::Error;

use crate::classify::{KeyPress, classify};
use crate::selection::{TextRange, TextSelection};
use crate::span::{SpanHit, SpanStyle, StyledSpan, byte_of_char, char_len};
use crate::value::EditingValue;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    #[error("highlight pass failed: {reason}")]
    Failed { reason: String },
    #[error("highlighter produced an invalid value: {reason}")]
    InvalidValue { reason: String },
}

/// Re-derives styled spans from editing values.
///
/// Implementations must be pure with respect to their inputs: same old/new
/// pair, same product. `parse` must return `old` unchanged when old and new
/// carry identical text, selection and composing range.
pub trait Highlighter: Send + Sync {
    /// Builds the styled value for a keystroke-level transition.
    fn parse(
        &self,
        old: &EditingValue,
        new: &EditingValue,
        style: SpanStyle,
    ) -> Result<EditingValue, HighlightError>;

    /// Splices programmatically inserted text (paste and the like) over the
    /// current selection and restyles.
    fn insert_text_remotely(
        &self,
        old: &EditingValue,
        text: &str,
    ) -> Result<EditingValue, HighlightError>;

    /// Re-derives styling for unchanged text.
    ///
    /// Must not alter text, selection or composing range; clears the
    /// remotely-edited flag, since a refresh finalizes synchronization.
    fn refresh_style(&self, value: &EditingValue) -> Result<EditingValue, HighlightError>;

    /// Position lookup over a span tree this highlighter produced.
    fn span_at_offset<'a>(&self, root: &'a StyledSpan, offset: usize) -> Option<SpanHit<'a>> {
        root.span_at_offset(offset)
    }
}

/// Checks a highlighter product before it is adopted.
///
/// Rejects structurally invalid trees and selections or composing ranges
/// that point outside the flattened text.
pub fn validate_value(value: &EditingValue) -> Result<(), HighlightError> {
    if !value.spans().is_valid() {
        return Err(HighlightError::InvalidValue {
            reason: "interior span with no children".into(),
        });
    }
    let len = value.len() as i32;
    let selection = value.selection();
    if selection.is_valid() && (selection.start > len || selection.end > len) {
        return Err(HighlightError::InvalidValue {
            reason: format!(
                "selection [{}, {}] out of bounds for length {len}",
                selection.start, selection.end
            ),
        });
    }
    let composing = value.composing();
    if composing.is_valid() && composing.end > len {
        return Err(HighlightError::InvalidValue {
            reason: format!(
                "composing range [{}, {}] out of bounds for length {len}",
                composing.start, composing.end
            ),
        });
    }
    Ok(())
}

/// The shipped toy highlighter.
///
/// Splits each line into a leading-indentation decoration leaf followed by
/// word leaves alternating through a two-entry palette, with whitespace gaps
/// carrying the base style. With `auto_indent` enabled it also copies the
/// previous line's indentation after a classified Enter and flags the result
/// as remotely edited.
#[derive(Debug, Clone)]
pub struct AlternatingHighlighter {
    palette: [SpanStyle; 2],
    auto_indent: bool,
}

impl AlternatingHighlighter {
    pub fn new() -> Self {
        Self {
            palette: [SpanStyle(1), SpanStyle(2)],
            auto_indent: false,
        }
    }

    pub fn with_auto_indent() -> Self {
        Self {
            auto_indent: true,
            ..Self::new()
        }
    }

    pub fn with_palette(palette: [SpanStyle; 2]) -> Self {
        Self {
            palette,
            auto_indent: false,
        }
    }

    fn spanize(&self, text: &str, base: SpanStyle) -> StyledSpan {
        if text.is_empty() {
            return StyledSpan::leaf("", base);
        }

        let mut lines = Vec::new();
        for segment in text.split_inclusive('\n') {
            let mut leaves = Vec::new();
            let indent_end = segment.len() - segment.trim_start_matches([' ', '\t']).len();
            if indent_end > 0 {
                leaves.push(StyledSpan::leaf(&segment[..indent_end], SpanStyle::DECORATION));
            }

            let mut word_index = 0;
            for (chunk, is_word) in whitespace_runs(&segment[indent_end..]) {
                let style = if is_word {
                    let style = self.palette[word_index % self.palette.len()];
                    word_index += 1;
                    style
                } else {
                    base
                };
                leaves.push(StyledSpan::leaf(chunk, style));
            }

            if !leaves.is_empty() {
                lines.push(StyledSpan::interior(leaves));
            }
        }

        if lines.is_empty() {
            StyledSpan::leaf("", base)
        } else {
            StyledSpan::interior(lines)
        }
    }
}

impl Default for AlternatingHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for AlternatingHighlighter {
    fn parse(
        &self,
        old: &EditingValue,
        new: &EditingValue,
        style: SpanStyle,
    ) -> Result<EditingValue, HighlightError> {
        if old == new {
            return Ok(old.clone());
        }

        let mut text = new.text().to_string();
        let mut selection = new.selection();
        let mut remotely_edited = false;

        if self.auto_indent
            && classify(old, new) == KeyPress::Enter
            && selection.is_valid()
            && selection.is_collapsed()
        {
            let caret = selection.start as usize;
            if caret > 0 && char_at(&text, caret - 1) == Some('\n') {
                let indent = previous_line_indent(&text, caret);
                if !indent.is_empty() {
                    let at = byte_of_char(&text, caret);
                    text.insert_str(at, &indent);
                    selection = TextSelection::collapsed(caret + char_len(&indent))
                        .with_affinity(selection.affinity);
                    remotely_edited = true;
                }
            }
        }

        Ok(
            EditingValue::new(self.spanize(&text, style), selection, new.composing())
                .with_remotely_edited(remotely_edited),
        )
    }

    fn insert_text_remotely(
        &self,
        old: &EditingValue,
        text: &str,
    ) -> Result<EditingValue, HighlightError> {
        let selection = old.selection();
        let (start, end) = if selection.is_valid() {
            let normalized = selection.normalized().clamped(old.len());
            (normalized.start as usize, normalized.end as usize)
        } else {
            (old.len(), old.len())
        };

        let mut spliced = String::with_capacity(old.text().len() + text.len());
        spliced.push_str(&old.text()[..byte_of_char(old.text(), start)]);
        spliced.push_str(text);
        spliced.push_str(&old.text()[byte_of_char(old.text(), end)..]);

        let caret = start + char_len(text);
        Ok(EditingValue::new(
            self.spanize(&spliced, SpanStyle::PLAIN),
            TextSelection::collapsed(caret),
            TextRange::EMPTY,
        )
        .with_remotely_edited(true))
    }

    fn refresh_style(&self, value: &EditingValue) -> Result<EditingValue, HighlightError> {
        let spans = self.spanize(value.text(), SpanStyle::PLAIN);
        Ok(value
            .clone()
            .with_spans(spans)
            .with_remotely_edited(false))
    }
}

/// Splits into maximal runs, tagging each as word (true) or whitespace.
fn whitespace_runs(s: &str) -> impl Iterator<Item = (&str, bool)> {
    let mut rest = s;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let first_is_ws = rest.chars().next().is_some_and(char::is_whitespace);
        let split = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() != first_is_ws)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(split);
        rest = tail;
        Some((run, !first_is_ws))
    })
}

fn char_at(s: &str, char_offset: usize) -> Option<char> {
    s.chars().nth(char_offset)
}

/// Leading spaces/tabs of the line that ends at the newline just before
/// `caret`.
fn previous_line_indent(text: &str, caret: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let newline_at = caret.saturating_sub(1);
    let mut line_start = 0;
    for i in (0..newline_at).rev() {
        if chars[i] == '\n' {
            line_start = i + 1;
            break;
        }
    }
    chars[line_start..newline_at]
        .iter()
        .take_while(|c| **c == ' ' || **c == '\t')
        .collect()
}
