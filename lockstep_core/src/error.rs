//! Error types for stream loading and synchronization.

use thiserror::Error;

/// Construction-time failures.
///
/// Everything that can go wrong with a recording is caught before a
/// [`SynchronizationSet`](crate::SynchronizationSet) exists. Playback itself
/// never fails: exhaustion, pause and clamped speed are states, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// A resample was requested with a zero source or target length.
    #[error("Invalid length for '{key}': source has {source_len} samples, target is {target_len}")]
    InvalidLength {
        key: String,
        source_len: usize,
        target_len: usize,
    },

    /// The channels of one series disagree on their sample count.
    #[error("Channel length mismatch in '{key}': channel '{channel}' has {found} samples, expected {expected}")]
    ChannelLengthMismatch {
        key: String,
        channel: String,
        expected: usize,
        found: usize,
    },

    /// The same channel was supplied twice for one series.
    #[error("Duplicate channel '{channel}' in '{key}'")]
    DuplicateChannel { key: String, channel: String },

    /// A synchronization set was built from zero streams.
    #[error("No streams supplied")]
    EmptyStreamSet,
}

impl ReplayError {
    /// Creates an invalid-length error.
    pub fn invalid_length(key: impl Into<String>, source_len: usize, target_len: usize) -> Self {
        Self::InvalidLength {
            key: key.into(),
            source_len,
            target_len,
        }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, ReplayError>;
