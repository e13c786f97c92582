//! Reference consumer
//!
//! Mirrors what the decoding service does with a stored code: reverse the
//! codec with the tier PIN and audience id, then check the payload pattern.
//! Single-use tracking lives in the service and is not modelled here.

use crate::codec::Codec;
use crate::error::FirstLoginResult;
use crate::payload::parse_payload;
use crate::store::{Store, StorageKey};
use crate::tier::TierRegistry;
use serde::Serialize;

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// Key the array was read from
    pub storage_key: String,
    /// Tier level
    pub level: u8,
    /// Tier name
    pub tier: &'static str,
    /// Recovered payload
    pub decoded: String,
    /// Locator embedded in the payload
    pub locator: String,
    /// Whether that locator is the one the registry holds for the tier
    pub locator_current: bool,
    /// Array length
    pub length: usize,
}

/// Decoder bound to a tier table and codec
pub struct Verifier<'a> {
    registry: &'a TierRegistry,
    codec: Codec,
}

impl<'a> Verifier<'a> {
    /// Create verifier
    pub fn new(registry: &'a TierRegistry, codec: Codec) -> Self {
        Self { registry, codec }
    }

    /// Decode and check a raw array
    pub fn verify_array(
        &self,
        level: u8,
        audience: &str,
        encoded: &[u32],
    ) -> FirstLoginResult<Verification> {
        let tier = self.registry.lookup(level)?;
        let audience = self.codec.audience(audience)?;
        let decoded = self.codec.decode(encoded, &audience, &tier.secret)?;
        let parsed = parse_payload(&decoded, tier.level)?;
        let locator_current = parsed.locator == tier.locator;
        if !locator_current {
            tracing::warn!(
                level = tier.level.as_u8(),
                locator = %parsed.locator,
                "code carries a locator the registry no longer uses"
            );
        }

        Ok(Verification {
            storage_key: StorageKey::new(tier.level, &audience).to_string(),
            level: tier.level.as_u8(),
            tier: tier.name(),
            decoded,
            locator: parsed.locator,
            locator_current,
            length: encoded.len(),
        })
    }

    /// Look up the entry for `level`/`audience` in `store` and verify it
    pub fn verify_store(
        &self,
        store: &Store,
        level: u8,
        audience: &str,
    ) -> FirstLoginResult<Verification> {
        let tier = self.registry.lookup(level)?;
        let key = StorageKey::new(tier.level, &self.codec.audience(audience)?);
        let array = store.encoded_array(&key)?;
        self.verify_array(level, audience, array.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecPolicy;
    use crate::error::FirstLoginError;
    use crate::generator::FirstLoginGenerator;
    use crate::payload::Payload;
    use crate::tier::TierLevel;

    const AUD: &str = "2a1cae831a8b85fb7847b7aeedf2075cbe37316002f31ef308ebd5d4e5094e0d";

    #[test]
    fn test_verify_generated_code() {
        let registry = TierRegistry::builtin();
        let code = FirstLoginGenerator::new(&registry, Codec::default())
            .generate(3, AUD)
            .unwrap();
        let mut store = Store::seeded();
        store.merge(&code.storage_key, &code.array);

        let verification = Verifier::new(&registry, Codec::default())
            .verify_store(&store, 3, AUD)
            .unwrap();

        assert_eq!(verification.decoded, code.payload.as_str());
        assert_eq!(verification.tier, "FULL");
        assert!(verification.locator_current);
    }

    #[test]
    fn test_verify_wrong_tier_fails() {
        let registry = TierRegistry::builtin();
        let code = FirstLoginGenerator::new(&registry, Codec::default())
            .generate(3, AUD)
            .unwrap();
        let verifier = Verifier::new(&registry, Codec::default());
        assert!(verifier.verify_array(2, AUD, code.array.as_slice()).is_err());
    }

    #[test]
    fn test_verify_missing_entry() {
        let registry = TierRegistry::builtin();
        let err = Verifier::new(&registry, Codec::default())
            .verify_store(&Store::seeded(), 1, AUD)
            .unwrap_err();
        assert!(matches!(err, FirstLoginError::EntryNotFound(_)));
    }

    #[test]
    fn test_verify_stale_locator() {
        let registry = TierRegistry::builtin();
        let codec = Codec::default();
        let tier = registry.get(TierLevel::Basic);
        let audience = codec.audience(AUD).unwrap();
        let payload = Payload::build(tier, "https://retired.example.test");
        let encoded = codec.encode(payload.as_str(), &audience, &tier.secret).unwrap();

        let verification = Verifier::new(&registry, codec)
            .verify_array(1, AUD, encoded.as_slice())
            .unwrap();

        assert_eq!(verification.locator, "https://retired.example.test");
        assert!(!verification.locator_current);
    }

    #[test]
    fn test_verify_needs_matching_offset() {
        let registry = TierRegistry::builtin();
        let shifted = Codec::new(CodecPolicy::new(10, 13).unwrap()).unwrap();
        let code = FirstLoginGenerator::new(&registry, shifted)
            .generate(2, AUD)
            .unwrap();

        assert!(Verifier::new(&registry, shifted)
            .verify_array(2, AUD, code.array.as_slice())
            .is_ok());
        assert!(Verifier::new(&registry, Codec::default())
            .verify_array(2, AUD, code.array.as_slice())
            .is_err());
    }
}
