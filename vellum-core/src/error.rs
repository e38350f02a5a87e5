//! Error taxonomy.
//!
//! Every failure here is handled locally by the editing layer and surfaced
//! to an observer; none is fatal to the host. A rejected mutation always
//! leaves the previous value in place.

use thiserror::Error;

use crate::highlight::HighlightError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// A requested selection points outside the text. The mutation that
    /// carried it is refused.
    #[error("selection [{start}, {end}] out of bounds for text of length {len}")]
    InvalidSelection { start: i32, end: i32, len: usize },

    /// The pluggable highlighter failed or produced an invalid value.
    #[error("highlighter failure: {0}")]
    Highlighter(#[from] HighlightError),
}
