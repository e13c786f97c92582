//! Store Merger
//!
//! The store is one JSON object. A merge touches exactly one key; all other
//! entries are carried through untouched and keep their position.

use crate::codec::{AudienceId, EncodedArray};
use crate::error::{FirstLoginError, FirstLoginResult};
use crate::tier::TierLevel;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Legacy default entry present in every store
pub const LEGACY_KEY: &str = "somenumbers";

/// Conventional store filename
pub const DEFAULT_STORE_FILE: &str = "somenumbers.json";

const KEY_PREFIX: &str = "firstlogin_level";

/// Storage key `firstlogin_level<L>_<audience>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for a tier and audience
    pub fn new(level: TierLevel, audience: &AudienceId) -> Self {
        Self(format!("{}{}_{}", KEY_PREFIX, level.as_u8(), audience.as_str()))
    }

    /// Get inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a raw key back into tier and audience
    pub fn parse(key: &str) -> Option<(TierLevel, &str)> {
        let rest = key.strip_prefix(KEY_PREFIX)?;
        let (level, audience) = rest.split_once('_')?;
        let level = level.parse::<u8>().ok()?;
        let level = TierLevel::try_from(level).ok()?;
        if audience.is_empty() {
            return None;
        }
        Some((level, audience))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a merge did to the targeted key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeOutcome {
    /// Key was new
    Inserted,
    /// Key existed and its value was replaced
    Replaced,
}

/// A first-login entry found in a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreEntry {
    /// Raw storage key
    pub key: String,
    /// Tier parsed from the key
    pub level: TierLevel,
    /// Audience id parsed from the key
    pub audience: String,
    /// Array length (0 if the value is not an array)
    pub values: usize,
}

/// In-memory store
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Store {
    entries: Map<String, Value>,
}

impl Store {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh store carrying only the legacy entry
    pub fn seeded() -> Self {
        let mut entries = Map::new();
        entries.insert(LEGACY_KEY.to_string(), Value::Array(Vec::new()));
        Self { entries }
    }

    /// Parse store content; blank content yields a seeded store
    pub fn from_json_str(content: &str) -> FirstLoginResult<Self> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, path: &Path) -> FirstLoginResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::seeded());
        }
        match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(entries)) => Ok(Self { entries }),
            Ok(other) => Err(FirstLoginError::StoreParse {
                path: path.to_path_buf(),
                reason: format!("top level must be an object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(FirstLoginError::StoreParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Load from disk; a missing file yields a seeded store
    pub fn load(path: &Path) -> FirstLoginResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let store = Self::parse(&content, path)?;
                tracing::debug!(path = %path.display(), keys = store.len(), "loaded store");
                Ok(store)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "store absent, starting fresh");
                Ok(Self::seeded())
            }
            Err(source) => Err(FirstLoginError::StoreRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Insert or overwrite the entry at `key`
    pub fn merge(&mut self, key: &StorageKey, array: &EncodedArray) -> MergeOutcome {
        let value = Value::Array(
            array
                .as_slice()
                .iter()
                .map(|&v| Value::from(v))
                .collect(),
        );
        match self.entries.insert(key.as_str().to_string(), value) {
            Some(_) => {
                tracing::warn!(key = %key, "replacing existing first-login entry");
                MergeOutcome::Replaced
            }
            None => MergeOutcome::Inserted,
        }
    }

    /// Raw value at `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Keys in stored order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the first-login array stored at `key`
    pub fn encoded_array(&self, key: &StorageKey) -> FirstLoginResult<EncodedArray> {
        let value = self
            .entries
            .get(key.as_str())
            .ok_or_else(|| FirstLoginError::EntryNotFound(key.to_string()))?;
        let items = value.as_array().ok_or_else(|| FirstLoginError::StoreParse {
            path: PathBuf::from(key.as_str()),
            reason: format!("expected an array, found {}", json_kind(value)),
        })?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .filter(|&v| v > 0)
                    .ok_or_else(|| FirstLoginError::StoreParse {
                        path: PathBuf::from(key.as_str()),
                        reason: format!("value {} at index {} is not a positive integer", item, i),
                    })
            })
            .collect::<FirstLoginResult<Vec<u32>>>()
            .map(EncodedArray::from_values)
    }

    /// First-login entries, in stored order
    pub fn first_login_entries(&self) -> Vec<StoreEntry> {
        self.entries
            .iter()
            .filter_map(|(key, value)| {
                let (level, audience) = StorageKey::parse(key)?;
                Some(StoreEntry {
                    key: key.clone(),
                    level,
                    audience: audience.to_string(),
                    values: value.as_array().map_or(0, Vec::len),
                })
            })
            .collect()
    }

    /// Serialized form written to disk (2-space indent)
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }

    /// Write to `path` through a temp file in the same directory.
    ///
    /// The destination is either left as it was or fully replaced.
    pub fn save(&self, path: &Path) -> FirstLoginResult<()> {
        let write_err = |source: std::io::Error| FirstLoginError::StoreWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut content = self
            .to_json_pretty()
            .map_err(|e| write_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        content.push('\n');

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
        temp.write_all(content.as_bytes()).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(path).map_err(|e| write_err(e.error))?;

        tracing::info!(path = %path.display(), keys = self.len(), "store written");
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecPolicy;

    const AUD: &str = "edc14b0fbb1c63640439b0c948515ddb63d15f6d2b2a7498c1d4f087a4706366";

    fn key(level: TierLevel, aud: &str) -> StorageKey {
        StorageKey::new(level, &AudienceId::new(aud, &CodecPolicy::default()).unwrap())
    }

    fn array(values: &[u32]) -> EncodedArray {
        EncodedArray::from_values(values.to_vec())
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(
            key(TierLevel::Restricted, AUD).as_str(),
            format!("firstlogin_level2_{}", AUD)
        );
    }

    #[test]
    fn test_storage_key_parse() {
        let k = key(TierLevel::Full, AUD);
        assert_eq!(StorageKey::parse(k.as_str()), Some((TierLevel::Full, AUD)));
        assert_eq!(
            StorageKey::parse("firstlogin_level1_abc_def"),
            Some((TierLevel::Basic, "abc_def"))
        );
        assert_eq!(StorageKey::parse(LEGACY_KEY), None);
        assert_eq!(StorageKey::parse("firstlogin_level9_abc"), None);
        assert_eq!(StorageKey::parse("firstlogin_level3_"), None);
    }

    #[test]
    fn test_blank_content_is_seeded() {
        let store = Store::from_json_str("  \n").unwrap();
        assert_eq!(store, Store::seeded());
        assert_eq!(store.get(LEGACY_KEY), Some(&Value::Array(vec![])));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            Store::from_json_str("[1, 2, 3]"),
            Err(FirstLoginError::StoreParse { .. })
        ));
        assert!(matches!(
            Store::from_json_str("{\"a\": [1,"),
            Err(FirstLoginError::StoreParse { .. })
        ));
    }

    #[test]
    fn test_merge_preserves_other_keys() {
        let mut store = Store::from_json_str(
            r#"{"somenumbers": [1, 2, 3], "other": {"nested": ["x", 1.5]}}"#,
        )
        .unwrap();
        let before_legacy = store.get(LEGACY_KEY).cloned();
        let before_other = store.get("other").cloned();

        let outcome = store.merge(&key(TierLevel::Full, AUD), &array(&[10, 20]));

        assert_eq!(outcome, MergeOutcome::Inserted);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(LEGACY_KEY).cloned(), before_legacy);
        assert_eq!(store.get("other").cloned(), before_other);
    }

    #[test]
    fn test_merge_overwrite_only_target() {
        let mut store = Store::seeded();
        let k1 = key(TierLevel::Full, AUD);
        let k2 = key(TierLevel::Basic, AUD);
        store.merge(&k1, &array(&[1, 2]));
        store.merge(&k2, &array(&[3, 4]));

        let outcome = store.merge(&k1, &array(&[5, 6, 7]));

        assert_eq!(outcome, MergeOutcome::Replaced);
        assert_eq!(store.encoded_array(&k1).unwrap(), array(&[5, 6, 7]));
        assert_eq!(store.encoded_array(&k2).unwrap(), array(&[3, 4]));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_merge_keeps_key_order() {
        let mut store = Store::from_json_str(r#"{"b": 1, "a": 2, "somenumbers": []}"#).unwrap();
        store.merge(&key(TierLevel::Full, AUD), &array(&[1]));
        store.merge(&StorageKey(String::from("a")), &array(&[9]));
        let keys: Vec<&str> = store.keys().collect();
        assert_eq!(keys[..3], ["b", "a", "somenumbers"]);
    }

    #[test]
    fn test_encoded_array_errors() {
        let store = Store::from_json_str(&format!(
            r#"{{"firstlogin_level3_{AUD}": [1, -2], "firstlogin_level2_{AUD}": "nope"}}"#
        ))
        .unwrap();
        assert!(matches!(
            store.encoded_array(&key(TierLevel::Full, AUD)),
            Err(FirstLoginError::StoreParse { .. })
        ));
        assert!(matches!(
            store.encoded_array(&key(TierLevel::Restricted, AUD)),
            Err(FirstLoginError::StoreParse { .. })
        ));
        assert!(matches!(
            store.encoded_array(&key(TierLevel::Basic, AUD)),
            Err(FirstLoginError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_first_login_entries() {
        let mut store = Store::seeded();
        store.merge(&key(TierLevel::Full, AUD), &array(&[1, 2, 3]));
        let entries = store.first_login_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, TierLevel::Full);
        assert_eq!(entries[0].audience, AUD);
        assert_eq!(entries[0].values, 3);
    }

    #[test]
    fn test_load_missing_file_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store, Store::seeded());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("somenumbers.json");
        let mut store = Store::seeded();
        store.merge(&key(TierLevel::Full, AUD), &array(&[100, 200]));
        store.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \"somenumbers\""));
        assert_eq!(Store::load(&path).unwrap(), store);
    }

    #[test]
    fn test_reserialize_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let original = "{\n  \"somenumbers\": [\n    5,\n    6\n  ],\n  \"meta\": {\n    \"v\": \"x\"\n  }\n}\n";
        std::fs::write(&path, original).unwrap();

        Store::load(&path).unwrap().save(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_oversized_integers_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let original = "{\n  \"somenumbers\": [\n    123456789012345678901234567890\n  ],\n  \"ratio\": 0.1000000000000000055511151231257827\n}\n";
        std::fs::write(&path, original).unwrap();

        let mut store = Store::load(&path).unwrap();
        store.merge(&key(TierLevel::Full, AUD), &array(&[1, 2]));
        store.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("123456789012345678901234567890"));
        assert!(content.contains("0.1000000000000000055511151231257827"));
        assert_eq!(store.encoded_array(&key(TierLevel::Full, AUD)).unwrap(), array(&[1, 2]));
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("store.json");
        let err = Store::seeded().save(&path).unwrap_err();
        assert!(matches!(err, FirstLoginError::StoreWrite { .. }));
        assert!(!path.exists());
    }
}
