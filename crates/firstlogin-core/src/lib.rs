//! MEAM First-Login Codes
//!
//! Builds the obfuscated arrays used to bootstrap a user's first login and
//! merges them into the published store:
//!
//! ```text
//! TierRegistry ──► Payload ──► Codec::encode ──► Store::merge ──► somenumbers.json
//!   (PIN, locator)   (plaintext)  (c * a * d)     (one key only)
//! ```
//!
//! The decoding service runs the inverse ([`Codec::decode`]) with the same
//! tier PIN, audience id and [`CodecPolicy`]; [`Verifier`] is the reference
//! version of that consumer.
//!
//! The transform is deterministic obfuscation, not encryption.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod generator;
pub mod payload;
pub mod store;
pub mod tier;
pub mod verify;

pub use codec::{AudienceId, Codec, CodecPolicy, EncodedArray, SecretPin};
pub use error::{FirstLoginError, FirstLoginResult};
pub use generator::{FirstLoginCode, FirstLoginGenerator, GenerateRequest, GenerationReport};
pub use payload::Payload;
pub use store::{MergeOutcome, Store, StorageKey, StoreEntry, DEFAULT_STORE_FILE, LEGACY_KEY};
pub use tier::{AccessLevels, TierConfig, TierLevel, TierRegistry};
pub use verify::{Verification, Verifier};
