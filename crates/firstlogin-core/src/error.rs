//! Error types for first-login code generation

use std::path::PathBuf;
use thiserror::Error;

/// First-login error type
#[derive(Error, Debug)]
pub enum FirstLoginError {
    /// Tier level outside the registry
    #[error("invalid tier level {0}: must be 1, 2 or 3")]
    InvalidTier(u8),

    /// Audience id shorter than the policy minimum
    #[error("audience id too short: {len} characters, need at least {min} (was it truncated?)")]
    AudienceTooShort {
        /// Characters supplied
        len: usize,
        /// Policy minimum
        min: usize,
    },

    /// Audience id contains characters that cannot serve as keystream
    #[error("invalid audience id: character {character:?} at position {position} is not printable ASCII")]
    InvalidAudience {
        /// Zero-based character index
        position: usize,
        /// Offending character
        character: char,
    },

    /// Secret PIN is not exactly four decimal digits
    #[error("invalid PIN: {0}")]
    InvalidPin(String),

    /// Nothing to encode
    #[error("payload must not be empty")]
    EmptyPayload,

    /// Payload character outside printable ASCII
    #[error("invalid payload character {character:?} at position {position}")]
    InvalidPayloadCharacter {
        /// Zero-based character index
        position: usize,
        /// Offending character
        character: char,
    },

    /// Codec policy rejected
    #[error("invalid codec policy: {0}")]
    InvalidPolicy(String),

    /// Existing store could not be read
    #[error("failed to read store {path}: {source}")]
    StoreRead {
        /// Store file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Existing store is not a JSON object
    #[error("failed to parse store {path}: {reason}")]
    StoreParse {
        /// Store file, or the storage key for a malformed entry
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Store destination could not be written
    #[error("failed to write store {path}: {source}")]
    StoreWrite {
        /// Destination file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// No first-login entry under the storage key
    #[error("no entry for key {0}")]
    EntryNotFound(String),

    /// Decoded value does not map back to a printable character
    #[error("decode integrity failure at position {position}: {reason}")]
    DecodeIntegrity {
        /// Index into the encoded array
        position: usize,
        /// What failed at that index
        reason: String,
    },

    /// Decoded payload does not match the expected first-login pattern
    #[error("payload mismatch: {0}")]
    PayloadMismatch(String),
}

/// Result type for first-login operations
pub type FirstLoginResult<T> = Result<T, FirstLoginError>;

impl FirstLoginError {
    /// Input validation failures are raised before any store access
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTier(_)
                | Self::AudienceTooShort { .. }
                | Self::InvalidAudience { .. }
                | Self::InvalidPin(_)
                | Self::EmptyPayload
                | Self::InvalidPayloadCharacter { .. }
                | Self::InvalidPolicy(_)
        )
    }
}
