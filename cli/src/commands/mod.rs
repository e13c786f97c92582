//! CLI Commands

pub mod config;
pub mod generate;
pub mod list;
pub mod tiers;
pub mod verify;

use crate::output::OutputFormat;
use firstlogin_core::{Codec, CodecPolicy, TierRegistry, DEFAULT_STORE_FILE};
use std::path::PathBuf;

/// Shared state for store commands
pub struct Context {
    pub registry: TierRegistry,
    pub codec: Codec,
    pub format: OutputFormat,
    default_store: PathBuf,
}

impl Context {
    pub fn new(
        policy: CodecPolicy,
        format: Option<OutputFormat>,
        default_store: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            registry: TierRegistry::builtin(),
            codec: Codec::new(policy)?,
            format: format.unwrap_or(OutputFormat::Table),
            default_store: default_store.unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE)),
        })
    }

    /// Explicit path, else the configured default
    pub fn store_path(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.default_store.clone())
    }
}
