//! Payload Builder
//!
//! Canonical plaintext carried by a first-login code:
//!
//! ```text
//! MEAM <locator> tier<L>@meam-firstlogin.internal
//! ```

use crate::error::{FirstLoginError, FirstLoginResult};
use crate::tier::{TierConfig, TierLevel};
use serde::Serialize;
use std::fmt;

/// Leading preamble
pub const PREAMBLE: &str = "MEAM";

/// Domain of the identity marker
pub const IDENTITY_DOMAIN: &str = "meam-firstlogin.internal";

/// Scheme the decoding service expects on the locator
pub const LOCATOR_SCHEME: &str = "https://";

/// Email-like identity marker for a tier, e.g. `tier3@meam-firstlogin.internal`
pub fn identity_marker(level: TierLevel) -> String {
    format!("tier{}@{}", level.as_u8(), IDENTITY_DOMAIN)
}

/// Plaintext payload (pure function of a tier)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    /// Build the payload for `tier` around an explicit locator
    pub fn build(tier: &TierConfig, locator: &str) -> Self {
        Self(format!(
            "{} {} {}",
            PREAMBLE,
            locator,
            identity_marker(tier.level)
        ))
    }

    /// Build the payload using the tier's own locator
    pub fn for_tier(tier: &TierConfig) -> Self {
        Self::build(tier, &tier.locator)
    }

    /// Get inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for built payloads
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Payload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fields recovered from a decoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPayload {
    /// Locator as embedded in the code
    pub locator: String,
    /// Tier named by the identity marker
    pub level: TierLevel,
}

/// Check a decoded payload against the first-login pattern for `expected`.
pub fn parse_payload(text: &str, expected: TierLevel) -> FirstLoginResult<ParsedPayload> {
    let parts: Vec<&str> = text.split(' ').collect();
    let [preamble, locator, marker] = parts.as_slice() else {
        return Err(FirstLoginError::PayloadMismatch(format!(
            "expected 3 space separated fields, found {}",
            parts.len()
        )));
    };

    if *preamble != PREAMBLE {
        return Err(FirstLoginError::PayloadMismatch(format!(
            "preamble {:?} is not {:?}",
            preamble, PREAMBLE
        )));
    }
    if !locator.starts_with(LOCATOR_SCHEME) || locator.len() == LOCATOR_SCHEME.len() {
        return Err(FirstLoginError::PayloadMismatch(format!(
            "locator {:?} does not start with {}",
            locator, LOCATOR_SCHEME
        )));
    }
    let expected_marker = identity_marker(expected);
    if *marker != expected_marker {
        return Err(FirstLoginError::PayloadMismatch(format!(
            "identity marker {:?}, expected {:?}",
            marker, expected_marker
        )));
    }

    Ok(ParsedPayload {
        locator: (*locator).to_string(),
        level: expected,
    })
}
