//
// Copyright (c) 2025 Nathan Fiedler
//

//! Error types for the extendible array.

use thiserror::Error;

/// Error variants for extendible array operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// An index was provided that is not less than the length of the array.
    #[error("index out of bounds: {index} (len is {len})")]
    IndexOutOfBounds {
        /// the offending index
        index: usize,
        /// length of the array at the time of the call
        len: usize,
    },

    /// The internal geometry of the array is inconsistent.
    #[error("invariant violated: {0}")]
    InvariantViolation(&'static str),
}

/// A specialized Result type for extendible array operations.
pub type Result<T> = std::result::Result<T, Error>;
