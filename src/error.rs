use crate::buffer::ContentType;
use crate::SerializeFormat;

/// Errors reported by [`Buffer`](crate::Buffer) operations.
///
/// Precondition failures are reported before the buffer is touched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The operation is not valid for the current buffer content.
    #[error("cannot {operation} a buffer holding {content:?} content")]
    InvalidOperation {
        /// What was attempted.
        operation: &'static str,
        /// The content type at the time of the call.
        content: ContentType,
    },

    /// An offset, length or index is out of bounds.
    #[error("range {start}..{end} is out of bounds for length {len}")]
    ArgumentOutOfRange {
        /// Start of the requested range.
        start: usize,
        /// End (exclusive) of the requested range.
        end: usize,
        /// Length of the indexed data.
        len: usize,
    },

    /// Serialized input does not match the grammar.
    #[error("malformed {format:?} input at byte {offset}: {reason}")]
    Format {
        /// The grammar being parsed.
        format: SerializeFormat,
        /// Byte offset into the input.
        offset: usize,
        /// What was expected.
        reason: String,
    },

    /// The named serialization format is unknown.
    #[error("unsupported serialization format '{0}'")]
    NotSupported(String),
}

impl Error {
    #[inline]
    pub(crate) fn invalid_operation(operation: &'static str, content: ContentType) -> Self {
        Error::InvalidOperation { operation, content }
    }

    #[inline]
    pub(crate) fn out_of_range(start: usize, end: usize, len: usize) -> Self {
        Error::ArgumentOutOfRange { start, end, len }
    }

    pub(crate) fn format(format: SerializeFormat, offset: usize, reason: impl Into<String>) -> Self {
        Error::Format {
            format,
            offset,
            reason: reason.into(),
        }
    }
}
