//! Keyed Codec
//!
//! Deterministic multiplicative transform shared with the decoding service.
//! This is obfuscation, not encryption: both sides must run exactly this
//! arithmetic, so it must not be changed independently of the consumer.
//!
//! For payload position `i`:
//!
//! ```text
//! c = ascii(payload[i])
//! a = ascii(audience[(offset + i) % audience.len()])
//! d = pin[i % 4], with 0 read as 10
//! encoded[i] = c * a * d
//! ```

use crate::error::{FirstLoginError, FirstLoginResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default minimum audience id length
pub const DEFAULT_MIN_AUDIENCE_LEN: usize = 10;

/// Printable ASCII range accepted on both sides of the transform
pub const PRINTABLE: std::ops::RangeInclusive<u8> = 32..=126;

/// Multiplier substituted for a zero PIN digit
const ZERO_DIGIT_MULTIPLIER: u32 = 10;

/// Number of digits in a bootstrap PIN
pub const PIN_DIGITS: usize = 4;

/// Four-digit bootstrap PIN
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecretPin([u8; PIN_DIGITS]);

impl SecretPin {
    /// Build from digits.
    ///
    /// # Panics
    /// If any digit is above 9. Intended for `const` tables where the check
    /// runs at compile time; use [`str::parse`] for runtime input.
    pub const fn from_digits(digits: [u8; PIN_DIGITS]) -> Self {
        let mut i = 0;
        while i < PIN_DIGITS {
            assert!(digits[i] <= 9, "PIN digits must be 0-9");
            i += 1;
        }
        Self(digits)
    }

    /// Raw digits
    pub const fn digits(&self) -> [u8; PIN_DIGITS] {
        self.0
    }

    /// Multiplier applied at payload position `index`
    #[inline]
    pub fn multiplier(&self, index: usize) -> u32 {
        match self.0[index % PIN_DIGITS] {
            0 => ZERO_DIGIT_MULTIPLIER,
            d => u32::from(d),
        }
    }
}

impl FromStr for SecretPin {
    type Err = FirstLoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != PIN_DIGITS {
            return Err(FirstLoginError::InvalidPin(format!(
                "expected {} digits, got {} characters",
                PIN_DIGITS,
                s.chars().count()
            )));
        }
        let mut digits = [0u8; PIN_DIGITS];
        for (slot, b) in digits.iter_mut().zip(bytes) {
            if !b.is_ascii_digit() {
                return Err(FirstLoginError::InvalidPin("digits only".into()));
            }
            *slot = b - b'0';
        }
        Ok(Self(digits))
    }
}

impl fmt::Display for SecretPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.0 {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SecretPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretPin(****)")
    }
}

/// Codec policy
///
/// Shared by encoder and decoder; both sides must agree on every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecPolicy {
    /// Shortest audience id accepted
    pub min_audience_len: usize,
    /// Starting position of the audience keystream walk
    pub audience_offset: usize,
}

impl Default for CodecPolicy {
    fn default() -> Self {
        Self {
            min_audience_len: DEFAULT_MIN_AUDIENCE_LEN,
            audience_offset: 0,
        }
    }
}

impl CodecPolicy {
    /// Create policy with validation
    pub fn new(min_audience_len: usize, audience_offset: usize) -> FirstLoginResult<Self> {
        let policy = Self {
            min_audience_len,
            audience_offset,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// A zero minimum would admit an empty keystream
    pub fn validate(&self) -> FirstLoginResult<()> {
        if self.min_audience_len == 0 {
            return Err(FirstLoginError::InvalidPolicy(
                "min_audience_len must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn check_audience(&self, raw: &str) -> FirstLoginResult<()> {
        self.validate()?;
        let len = raw.chars().count();
        if len < self.min_audience_len {
            return Err(FirstLoginError::AudienceTooShort {
                len,
                min: self.min_audience_len,
            });
        }
        if let Some((position, character)) = raw
            .chars()
            .enumerate()
            .find(|(_, c)| !c.is_ascii() || !PRINTABLE.contains(&(*c as u8)))
        {
            return Err(FirstLoginError::InvalidAudience {
                position,
                character,
            });
        }
        Ok(())
    }
}

/// Validated audience id
///
/// # Invariants
/// - Printable ASCII only
/// - At least `min_audience_len` characters under the policy it was built with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AudienceId(String);

impl AudienceId {
    /// Create audience id with validation
    pub fn new(raw: impl Into<String>, policy: &CodecPolicy) -> FirstLoginResult<Self> {
        let raw = raw.into();
        policy.check_audience(&raw)?;
        Ok(Self(raw))
    }

    /// Get inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a validated id
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Abbreviated form for operator output
    pub fn abbreviated(&self) -> String {
        if self.0.len() > 40 {
            format!("{}...{}", &self.0[..20], &self.0[self.0.len() - 20..])
        } else {
            self.0.clone()
        }
    }

    #[inline]
    fn key_byte(&self, offset: usize, index: usize) -> u32 {
        let bytes = self.0.as_bytes();
        let len = bytes.len();
        // Reduced separately so large offsets cannot overflow the sum
        u32::from(bytes[(offset % len + index % len) % len])
    }
}

impl fmt::Display for AudienceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoded first-login array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedArray(Vec<u32>);

impl EncodedArray {
    /// Wrap raw values
    pub fn from_values(values: Vec<u32>) -> Self {
        Self(values)
    }

    /// Values in payload order
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for an empty array
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First `n` values
    pub fn preview(&self, n: usize) -> &[u32] {
        &self.0[..n.min(self.0.len())]
    }

    /// Take the values
    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }
}

/// Codec bound to a policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    policy: CodecPolicy,
}

impl Codec {
    /// Create codec with validated policy
    pub fn new(policy: CodecPolicy) -> FirstLoginResult<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Policy in force
    pub fn policy(&self) -> &CodecPolicy {
        &self.policy
    }

    /// Validate a raw audience id under this codec's policy
    pub fn audience(&self, raw: impl Into<String>) -> FirstLoginResult<AudienceId> {
        AudienceId::new(raw, &self.policy)
    }

    #[inline]
    fn key_factor(&self, audience: &AudienceId, pin: &SecretPin, index: usize) -> u32 {
        audience.key_byte(self.policy.audience_offset, index) * pin.multiplier(index)
    }

    /// Encode `payload` under `audience` and `pin`
    pub fn encode(
        &self,
        payload: &str,
        audience: &AudienceId,
        pin: &SecretPin,
    ) -> FirstLoginResult<EncodedArray> {
        // Ids built under a looser policy are re-checked here.
        self.policy.check_audience(audience.as_str())?;
        if payload.is_empty() {
            return Err(FirstLoginError::EmptyPayload);
        }

        let values = payload
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                if !ch.is_ascii() || !PRINTABLE.contains(&(ch as u8)) {
                    return Err(FirstLoginError::InvalidPayloadCharacter {
                        position: i,
                        character: ch,
                    });
                }
                Ok(u32::from(ch as u8) * self.key_factor(audience, pin, i))
            })
            .collect::<FirstLoginResult<Vec<u32>>>()?;

        tracing::debug!(
            len = values.len(),
            offset = self.policy.audience_offset,
            "encoded payload"
        );
        Ok(EncodedArray(values))
    }

    /// Recover the payload from `encoded`.
    ///
    /// Every value must divide exactly by its key factor and land in
    /// printable ASCII.
    pub fn decode(
        &self,
        encoded: &[u32],
        audience: &AudienceId,
        pin: &SecretPin,
    ) -> FirstLoginResult<String> {
        self.policy.check_audience(audience.as_str())?;
        if encoded.is_empty() {
            return Err(FirstLoginError::EmptyPayload);
        }

        let mut decoded = String::with_capacity(encoded.len());
        for (i, &value) in encoded.iter().enumerate() {
            let factor = self.key_factor(audience, pin, i);
            if value % factor != 0 {
                return Err(FirstLoginError::DecodeIntegrity {
                    position: i,
                    reason: format!("{} is not a multiple of {}", value, factor),
                });
            }
            let code = value / factor;
            match u8::try_from(code) {
                Ok(c) if PRINTABLE.contains(&c) => decoded.push(char::from(c)),
                _ => {
                    return Err(FirstLoginError::DecodeIntegrity {
                        position: i,
                        reason: format!("character code {} outside printable ASCII", code),
                    })
                }
            }
        }
        Ok(decoded)
    }
}
