//! Tier Registry
//!
//! Fixed table binding each access tier to its bootstrap PIN, deployment
//! locator and the access levels it may grant. Built once at startup and
//! handed to whoever needs it; there are no mutation operations.

use crate::codec::SecretPin;
use crate::error::{FirstLoginError, FirstLoginResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const FULL_PIN: SecretPin = SecretPin::from_digits([5, 3, 2, 9]);
const RESTRICTED_PIN: SecretPin = SecretPin::from_digits([5, 2, 2, 9]);
const BASIC_PIN: SecretPin = SecretPin::from_digits([5, 1, 2, 9]);

const FULL_LOCATOR: &str = "https://z3c9h1-qs7f5l2p8.johan-351.workers.dev";
const RESTRICTED_LOCATOR: &str = "https://m4v8k2-rb6n0t3y9.johan-351.workers.dev";
const BASIC_LOCATOR: &str = "https://h7p3w5-xd1q6e4z8.johan-351.workers.dev";

/// Access tier
///
/// Higher tiers grant numerically lower access levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum TierLevel {
    /// Access levels 6-8
    Basic = 1,
    /// Access levels 3-5
    Restricted = 2,
    /// Access levels 0-2
    Full = 3,
}

impl TierLevel {
    /// All tiers, highest first
    pub const ALL: [TierLevel; 3] = [Self::Full, Self::Restricted, Self::Basic];

    /// Numeric level
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Identity label
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Restricted => "RESTRICTED",
            Self::Full => "FULL",
        }
    }
}

impl TryFrom<u8> for TierLevel {
    type Error = FirstLoginError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Self::Basic),
            2 => Ok(Self::Restricted),
            3 => Ok(Self::Full),
            other => Err(FirstLoginError::InvalidTier(other)),
        }
    }
}

impl fmt::Display for TierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Three contiguous access levels granted by a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessLevels {
    first: u8,
}

impl AccessLevels {
    /// Number of levels per tier
    pub const WIDTH: u8 = 3;

    /// Range starting at `first`
    pub const fn starting_at(first: u8) -> Self {
        Self { first }
    }

    /// Lowest granted level
    pub const fn first(&self) -> u8 {
        self.first
    }

    /// Highest granted level
    pub const fn last(&self) -> u8 {
        self.first + Self::WIDTH - 1
    }

    /// Granted levels in ascending order
    pub fn levels(&self) -> [u8; 3] {
        [self.first, self.first + 1, self.first + 2]
    }

    /// Check membership
    pub fn contains(&self, access_level: u8) -> bool {
        (self.first..=self.last()).contains(&access_level)
    }
}

/// Configuration for one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierConfig {
    /// Tier level
    pub level: TierLevel,
    /// Bootstrap PIN, also the codec multiplier source
    pub secret: SecretPin,
    /// Deployment locator embedded in the payload
    pub locator: String,
    /// Access levels this tier may grant
    pub access_levels: AccessLevels,
}

impl TierConfig {
    /// Identity label ("BASIC", "RESTRICTED", "FULL")
    pub fn name(&self) -> &'static str {
        self.level.name()
    }

    /// Whether an account at `access_level` belongs to this tier
    pub fn permits(&self, access_level: u8) -> bool {
        self.access_levels.contains(access_level)
    }

    /// Human readable access constraint, as quoted to operators
    pub fn constraint_description(&self) -> String {
        let lo = self.access_levels.first();
        let hi = self.access_levels.last();
        let listed = format!("levels {}, {}, {}", lo, lo + 1, hi);
        match self.level {
            TierLevel::Full => format!("accessLevel < {} ({})", hi + 1, listed),
            TierLevel::Restricted => {
                format!("{} < accessLevel < {} ({})", lo - 1, hi + 1, listed)
            }
            TierLevel::Basic => format!("accessLevel > {} ({})", lo - 1, listed),
        }
    }
}

/// Immutable tier table
#[derive(Debug, Clone)]
pub struct TierRegistry {
    // Indexed by level - 1
    tiers: [TierConfig; 3],
}

impl TierRegistry {
    /// The deployed tier table
    pub fn builtin() -> Self {
        Self {
            tiers: [
                TierConfig {
                    level: TierLevel::Basic,
                    secret: BASIC_PIN,
                    locator: BASIC_LOCATOR.into(),
                    access_levels: AccessLevels::starting_at(6),
                },
                TierConfig {
                    level: TierLevel::Restricted,
                    secret: RESTRICTED_PIN,
                    locator: RESTRICTED_LOCATOR.into(),
                    access_levels: AccessLevels::starting_at(3),
                },
                TierConfig {
                    level: TierLevel::Full,
                    secret: FULL_PIN,
                    locator: FULL_LOCATOR.into(),
                    access_levels: AccessLevels::starting_at(0),
                },
            ],
        }
    }

    /// Look up a tier by its numeric level
    pub fn lookup(&self, level: u8) -> FirstLoginResult<&TierConfig> {
        let level = TierLevel::try_from(level)?;
        Ok(self.get(level))
    }

    /// Get a tier by typed level
    pub fn get(&self, level: TierLevel) -> &TierConfig {
        &self.tiers[usize::from(level.as_u8() - 1)]
    }

    /// Tiers, highest first
    pub fn iter(&self) -> impl Iterator<Item = &TierConfig> {
        self.tiers.iter().rev()
    }

    /// Tier granting `access_level`, if any
    pub fn tier_for_access_level(&self, access_level: u8) -> Option<&TierConfig> {
        self.iter().find(|tier| tier.permits(access_level))
    }
}

impl Default for TierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
