use thiserror::Error as ThisError;

/// Errors surfaced by the list encoding. Every operation that returns one of these leaves the
/// buffer exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ZipListError {
    /// The bytes at `offset` do not form a valid entry, or the entry runs past the declared end
    /// of the buffer. Always a sign of a corrupted buffer.
    #[error("malformed entry at offset {offset}: {reason}")]
    MalformedEntry { offset: usize, reason: &'static str },
    /// The caller supplied an offset that is not the start of an entry.
    #[error("offset {offset} is not an entry boundary")]
    OutOfBounds { offset: usize },
    #[error("content of {len} bytes exceeds the maximum encodable length")]
    ContentTooLarge { len: usize },
    /// Internal invariant violation: an encoding was chosen that can not hold the content.
    #[error("encoding overflow for content of {len} bytes")]
    EncodingOverflow { len: usize },
}
