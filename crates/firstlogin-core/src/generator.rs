//! First-login code generation
//!
//! Tier lookup, payload, encoding and (unless dry-running) the store merge,
//! in that order. Every input check happens before the store is opened.

use crate::codec::{AudienceId, Codec, EncodedArray, SecretPin};
use crate::error::FirstLoginResult;
use crate::payload::Payload;
use crate::store::{MergeOutcome, Store, StorageKey};
use crate::tier::{TierConfig, TierRegistry};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Values shown in a dry-run preview
pub const PREVIEW_LEN: usize = 10;

/// A generated code, not yet persisted
#[derive(Debug, Clone)]
pub struct FirstLoginCode {
    /// Tier the code grants
    pub tier: TierConfig,
    /// Validated audience
    pub audience: AudienceId,
    /// Plaintext
    pub payload: Payload,
    /// Slot in the store
    pub storage_key: StorageKey,
    /// Encoded values
    pub array: EncodedArray,
}

impl FirstLoginCode {
    /// Bootstrap PIN handed to the user out of band
    pub fn pin(&self) -> &SecretPin {
        &self.tier.secret
    }
}

/// Result of writing a code into a store
#[derive(Debug, Clone, Serialize)]
pub struct StoreUpdate {
    /// Store file
    pub path: PathBuf,
    /// Whether the key was new
    pub outcome: MergeOutcome,
    /// Keys in the store after the merge
    pub total_keys: usize,
}

/// Operator-facing summary of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Tier level
    pub level: u8,
    /// Tier name
    pub tier: &'static str,
    /// Locator embedded in the payload
    pub locator: String,
    /// Bootstrap PIN for operator follow-up
    pub pin: String,
    /// Access levels the tier grants
    pub access_constraint: String,
    /// Plaintext
    pub payload: String,
    /// Plaintext length
    pub payload_len: usize,
    /// Abbreviated audience id
    pub audience: String,
    /// Slot in the store
    pub storage_key: String,
    /// Encoded array length
    pub length: usize,
    /// Leading encoded values
    pub preview: Vec<u32>,
    /// Store was not touched
    pub dry_run: bool,
    /// Absent on dry runs
    pub store: Option<StoreUpdate>,
}

impl GenerationReport {
    fn new(code: &FirstLoginCode, store: Option<StoreUpdate>) -> Self {
        Self {
            level: code.tier.level.as_u8(),
            tier: code.tier.name(),
            locator: code.tier.locator.clone(),
            pin: code.pin().to_string(),
            access_constraint: code.tier.constraint_description(),
            payload: code.payload.to_string(),
            payload_len: code.payload.len(),
            audience: code.audience.abbreviated(),
            storage_key: code.storage_key.to_string(),
            length: code.array.len(),
            preview: code.array.preview(PREVIEW_LEN).to_vec(),
            dry_run: store.is_none(),
            store,
        }
    }
}

/// Generation request
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Tier level, 1-3
    pub level: u8,
    /// Raw audience id
    pub audience: String,
    /// Store file
    pub output: PathBuf,
    /// Skip the store entirely
    pub dry_run: bool,
}

/// Generator bound to a tier table and codec
pub struct FirstLoginGenerator<'a> {
    registry: &'a TierRegistry,
    codec: Codec,
}

impl<'a> FirstLoginGenerator<'a> {
    /// Create generator
    pub fn new(registry: &'a TierRegistry, codec: Codec) -> Self {
        Self { registry, codec }
    }

    /// Derive the code for `level` and `audience` without touching any store
    pub fn generate(&self, level: u8, audience: &str) -> FirstLoginResult<FirstLoginCode> {
        let tier = self.registry.lookup(level)?;
        let audience = self.codec.audience(audience)?;
        let payload = Payload::for_tier(tier);
        let array = self.codec.encode(payload.as_str(), &audience, &tier.secret)?;
        let storage_key = StorageKey::new(tier.level, &audience);

        tracing::debug!(
            level = tier.level.as_u8(),
            tier = tier.name(),
            payload_len = payload.len(),
            key = %storage_key,
            "generated first-login code"
        );

        Ok(FirstLoginCode {
            tier: tier.clone(),
            audience,
            payload,
            storage_key,
            array,
        })
    }

    /// Merge `code` into the store at `path`
    pub fn commit(&self, code: &FirstLoginCode, path: &Path) -> FirstLoginResult<StoreUpdate> {
        let mut store = Store::load(path)?;
        let outcome = store.merge(&code.storage_key, &code.array);
        store.save(path)?;

        Ok(StoreUpdate {
            path: path.to_path_buf(),
            outcome,
            total_keys: store.len(),
        })
    }

    /// Generate and, unless dry-running, persist
    pub fn run(&self, request: &GenerateRequest) -> FirstLoginResult<GenerationReport> {
        let code = self.generate(request.level, &request.audience)?;
        if request.dry_run {
            tracing::info!(key = %code.storage_key, "dry run, store not touched");
            return Ok(GenerationReport::new(&code, None));
        }
        let update = self.commit(&code, &request.output)?;
        Ok(GenerationReport::new(&code, Some(update)))
    }
}
