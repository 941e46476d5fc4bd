//! Error types for term configuration.

use thiserror::Error;

use crate::term::TermKind;

/// Malformed term, inclusion or exclusion specification.
///
/// These are caller errors: they are raised before any network activity and
/// are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermError {
    /// A term was given with no synonyms.
    #[error("a term needs at least one synonym")]
    EmptySynonyms,

    /// A word was empty after trimming whitespace.
    #[error("blank word in {kind}")]
    BlankWord { kind: TermKind },

    /// A word contains a double quote, which would break the query string.
    #[error("word contains a double quote: {0}")]
    QuoteInWord(String),

    /// Inclusion or exclusion lists do not line up with the terms.
    #[error("mismatch in number of {kind} and terms: expected {expected}, got {got}")]
    LengthMismatch {
        kind: TermKind,
        expected: usize,
        got: usize,
    },

    /// Two terms share the same label.
    #[error("duplicate term label: {0}")]
    DuplicateLabel(String),

    /// No term has the requested label.
    #[error("requested term not available: {0}")]
    UnknownLabel(String),
}

/// A counts matrix whose parts disagree about its dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// A vector does not have the length the grid shape implies.
    #[error("{part} has length {got}, expected {expected}")]
    Length {
        part: &'static str,
        expected: usize,
        got: usize,
    },

    /// A single-list matrix whose two axes hold different terms.
    #[error("single-list counts must use the same terms on both axes")]
    SingleAxesDiffer,
}
