//! # Content Errors

use thiserror::Error;

/// Errors surfaced by grammar expansion and mission generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// A formation or reward string contained a symbol with no rule.
    #[error("no production rule for symbol '{symbol}'")]
    UnknownSymbol {
        /// The offending symbol.
        symbol: char,
    },

    /// A symbol's productions sum to zero weight; selection is impossible.
    #[error("production weights for symbol '{symbol}' sum to zero")]
    EmptyWeightTable {
        /// The offending symbol.
        symbol: char,
    },

    /// A reward symbol expanded to something other than a quantity.
    #[error("reward symbol '{symbol}' expanded to non-numeric \"{text}\"")]
    InvalidQuantity {
        /// The item symbol being quantified.
        symbol: char,
        /// What it expanded to instead of digits.
        text: String,
    },
}

/// Result alias for content operations.
pub type ContentResult<T> = Result<T, ContentError>;
