//! End-to-end generation against a store on disk

use firstlogin_core::{
    Codec, FirstLoginError, FirstLoginGenerator, GenerateRequest, MergeOutcome, Store,
    TierRegistry, Verifier, LEGACY_KEY,
};
use std::path::Path;

const FULL_AUD: &str = "2a1cae831a8b85fb7847b7aeedf2075cbe37316002f31ef308ebd5d4e5094e0d";
const RESTRICTED_AUD: &str = "edc14b0fbb1c63640439b0c948515ddb63d15f6d2b2a7498c1d4f087a4706366";

fn request(path: &Path, level: u8, audience: &str, dry_run: bool) -> GenerateRequest {
    GenerateRequest {
        level,
        audience: audience.into(),
        output: path.to_path_buf(),
        dry_run,
    }
}

#[test]
fn test_full_tier_scenario() {
    let registry = TierRegistry::builtin();
    let generator = FirstLoginGenerator::new(&registry, Codec::default());

    let code = generator.generate(3, FULL_AUD).unwrap();

    assert_eq!(
        code.payload.as_str(),
        "MEAM https://z3c9h1-qs7f5l2p8.johan-351.workers.dev tier3@meam-firstlogin.internal"
    );
    assert_eq!(code.array.len(), code.payload.len());
    assert_eq!(
        code.array.as_slice()[0],
        u32::from(b'M') * u32::from(FULL_AUD.as_bytes()[0]) * 5
    );
    assert_eq!(code.pin().to_string(), "5329");
}

#[test]
fn test_generation_is_deterministic() {
    let registry = TierRegistry::builtin();
    let generator = FirstLoginGenerator::new(&registry, Codec::default());
    for level in 1..=3 {
        let first = generator.generate(level, RESTRICTED_AUD).unwrap();
        let second = generator.generate(level, RESTRICTED_AUD).unwrap();
        assert_eq!(first.array, second.array);
    }
}

#[test]
fn test_short_audience_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("somenumbers.json");
    let registry = TierRegistry::builtin();
    let generator = FirstLoginGenerator::new(&registry, Codec::default());

    for dry_run in [false, true] {
        let err = generator.run(&request(&path, 3, "short", dry_run)).unwrap_err();
        assert!(matches!(err, FirstLoginError::AudienceTooShort { len: 5, .. }));
        assert!(err.is_validation());
        assert!(!path.exists());
    }
}

#[test]
fn test_invalid_level_never_touches_existing_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("somenumbers.json");
    std::fs::write(&path, "{\"somenumbers\": [7]}").unwrap();
    let registry = TierRegistry::builtin();
    let generator = FirstLoginGenerator::new(&registry, Codec::default());

    let err = generator.run(&request(&path, 0, FULL_AUD, false)).unwrap_err();

    assert!(matches!(err, FirstLoginError::InvalidTier(0)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"somenumbers\": [7]}");
}

#[test]
fn test_merges_are_non_destructive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("somenumbers.json");
    std::fs::write(
        &path,
        r#"{"somenumbers": [11, 22, 33], "unrelated": {"keep": true}}"#,
    )
    .unwrap();
    let registry = TierRegistry::builtin();
    let generator = FirstLoginGenerator::new(&registry, Codec::default());

    generator.run(&request(&path, 3, FULL_AUD, false)).unwrap();
    let report = generator
        .run(&request(&path, 2, RESTRICTED_AUD, false))
        .unwrap();

    let update = report.store.unwrap();
    assert_eq!(update.outcome, MergeOutcome::Inserted);
    assert_eq!(update.total_keys, 4);

    let store = Store::load(&path).unwrap();
    assert_eq!(store.get(LEGACY_KEY), Some(&serde_json::json!([11, 22, 33])));
    assert_eq!(store.get("unrelated"), Some(&serde_json::json!({"keep": true})));
    assert_eq!(store.first_login_entries().len(), 2);

    let verifier = Verifier::new(&registry, Codec::default());
    assert_eq!(verifier.verify_store(&store, 3, FULL_AUD).unwrap().tier, "FULL");
    assert_eq!(
        verifier.verify_store(&store, 2, RESTRICTED_AUD).unwrap().tier,
        "RESTRICTED"
    );
}
