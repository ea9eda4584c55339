//! Error types for recurrence math.

use crate::descriptor::DescriptorError;
use thiserror::Error;

/// Result type for recurrence operations.
pub type RecurResult<T> = Result<T, RecurError>;

/// Errors that can occur while computing recurrences.
#[derive(Debug, Error)]
pub enum RecurError {
    /// A cadence was constructed with an interval of zero.
    #[error("cadence interval must be at least 1")]
    ZeroInterval,

    /// Enumeration exceeded the safety bound.
    ///
    /// This guards against degenerate cadences and windows unreachably far
    /// from the anchor; it is fatal rather than silently truncated.
    #[error("recurrence stepping exceeded {limit} iterations")]
    StepLimitExceeded {
        /// The bound that was exceeded.
        limit: u32,
    },

    /// A descriptor could not be parsed or interpreted.
    ///
    /// The calculator recovers from this internally by falling back to
    /// calendar stepping; it only surfaces when a caller parses descriptor
    /// text directly.
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
}
