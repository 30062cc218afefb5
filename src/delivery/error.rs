//! Delivery error types

use thiserror::Error;

/// Errors raised by the block queue, the registry and the poll protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Poll window elapsed with nothing queued.
    #[error("no work available")]
    NoWork,

    /// Client id was never registered.
    #[error("unknown client: {id}")]
    UnknownClient {
        /// Requested client id
        id: String,
    },

    /// Missing or unparsable request argument.
    #[error("malformed request: {reason}")]
    MalformedRequest {
        /// What was wrong
        reason: String,
    },

    /// Raw job bytes do not split into whole instructions.
    #[error("job payload of {len} bytes is not a whole number of instructions")]
    MisalignedPayload {
        /// Payload length
        len: usize,
    },

    /// Block size limit cannot hold a header plus one instruction.
    #[error("block limit {max} too small: need at least {required} bytes")]
    BlockLimitTooSmall {
        /// Configured limit
        max: usize,
        /// Smallest workable limit
        required: usize,
    },
}

impl DeliveryError {
    /// Shorthand for [`DeliveryError::MalformedRequest`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DeliveryError>;
