//! Error types for the ledger store.

use crate::model::{OccurrenceId, SeriesId};
use chrono::NaiveDate;
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in ledger store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the snapshot backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Snapshot encoding or decoding failed.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the codec failure.
        message: String,
    },

    /// Series not found.
    #[error("series not found: {id}")]
    SeriesNotFound {
        /// The series id that was looked up.
        id: SeriesId,
    },

    /// Occurrence not found.
    #[error("occurrence not found: {id}")]
    OccurrenceNotFound {
        /// The occurrence id that was looked up.
        id: OccurrenceId,
    },

    /// An occurrence already exists for this series on this date.
    #[error("duplicate occurrence for series {series_id} on {expense_date}")]
    DuplicateOccurrence {
        /// The owning series.
        series_id: SeriesId,
        /// The conflicting due date.
        expense_date: NaiveDate,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl StoreError {
    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
