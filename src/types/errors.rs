//! Envelope error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and carry
//! the key, index or limit that caused them.

use thiserror::Error;

/// Envelope result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for envelope operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A value staged with `add_obj`/`add_data` could not be serialized.
    #[error("encoding error: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Malformed JSON, or a fragment whose shape does not fit the target.
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Lookup miss in the keyed store.
    #[error("key does not exist: {0}")]
    KeyNotFound(String),

    /// Lookup miss in the indexed store.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The stored fragment is JSON `null` and the target cannot hold null.
    #[error("nil fragment: {0}")]
    NilFragment(String),

    /// Inbound document is larger than the configured decode limit.
    #[error("size limit exceeded: payload larger than {limit} bytes")]
    SizeLimitExceeded { limit: u64 },

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// I/O errors while reading an inbound stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for every lookup miss; an out-of-range index is a kind of missing key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_) | Error::IndexOutOfRange { .. })
    }
}

// Convenience constructors
impl Error {
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound(key.into())
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    pub fn nil_fragment(msg: impl Into<String>) -> Self {
        Self::NilFragment(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_covers_index_and_key() {
        assert!(Error::key_not_found("Car").is_not_found());
        assert!(Error::index_out_of_range(3, 1).is_not_found());
        assert!(!Error::nil_fragment("ObjMap[Car]").is_not_found());
        assert!(!Error::SizeLimitExceeded { limit: 1 }.is_not_found());
    }

    #[test]
    fn test_messages_name_the_missing_slot() {
        assert_eq!(
            Error::key_not_found("missing").to_string(),
            "key does not exist: missing"
        );
        assert_eq!(
            Error::index_out_of_range(7, 2).to_string(),
            "index 7 out of range (len 2)"
        );
        assert_eq!(
            Error::SizeLimitExceeded { limit: 16 }.to_string(),
            "size limit exceeded: payload larger than 16 bytes"
        );
    }
}
