//! CLI Configuration

use crate::output::OutputFormat;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use firstlogin_core::codec::DEFAULT_MIN_AUDIENCE_LEN;
use firstlogin_core::CodecPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by `config get|set`
pub const KEYS: [&str; 4] = [
    "store_path",
    "min_audience_len",
    "audience_offset",
    "default_format",
];

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub store_path: Option<PathBuf>,
    pub min_audience_len: Option<usize>,
    pub audience_offset: Option<usize>,
    pub default_format: Option<OutputFormat>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf> {
        let path = Self::config_path(profile)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }

    pub fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".meam").join(filename))
    }

    /// Policy from file values, with command-line overrides taking precedence
    pub fn codec_policy(
        &self,
        min_audience_len: Option<usize>,
        audience_offset: Option<usize>,
    ) -> CodecPolicy {
        CodecPolicy {
            min_audience_len: min_audience_len
                .or(self.min_audience_len)
                .unwrap_or(DEFAULT_MIN_AUDIENCE_LEN),
            audience_offset: audience_offset.or(self.audience_offset).unwrap_or(0),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "store_path" => self.store_path.as_ref().map(|p| p.display().to_string()),
            "min_audience_len" => self.min_audience_len.map(|v| v.to_string()),
            "audience_offset" => self.audience_offset.map(|v| v.to_string()),
            "default_format" => self.default_format.map(|f| f.to_string()),
            _ => bail!("Unknown config key: {}", key),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "store_path" => self.store_path = Some(PathBuf::from(value)),
            "min_audience_len" => {
                let min: usize = value.parse().context("min_audience_len must be a number")?;
                CodecPolicy::new(min, 0)?;
                self.min_audience_len = Some(min);
            }
            "audience_offset" => {
                self.audience_offset =
                    Some(value.parse().context("audience_offset must be a number")?)
            }
            "default_format" => {
                let format = OutputFormat::from_str(value, true)
                    .map_err(|e| anyhow::anyhow!("default_format: {}", e))?;
                self.default_format = Some(format);
            }
            _ => bail!("Unknown config key: {}", key),
        }
        Ok(())
    }
}
