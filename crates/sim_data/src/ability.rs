//! Ability definitions.
//!
//! An [`AbilityDefinition`] is the immutable, data-defined description of a
//! unit of behaviour. Entities never own definitions; they hold `Arc`s to the
//! shared copy and keep their own runtime state next to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The 32-bit hash clients use to refer to an ability by name.
///
/// Computed over the UTF-16 code units of the name:
///
/// ```text
/// hash = 0
/// for each unit in name:
///     hash = unit + 131 * hash   (wrapping, 32-bit)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityHash(pub u32);

impl AbilityHash {
    const MULTIPLIER: u32 = 131;

    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let hash = name.encode_utf16().fold(0u32, |hash, unit| {
            u32::from(unit).wrapping_add(Self::MULTIPLIER.wrapping_mul(hash))
        });
        Self(hash)
    }
}

impl std::fmt::Display for AbilityHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A static ability definition as loaded from game data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Unique ability name; also the lookup key.
    #[serde(alias = "abilityName")]
    pub ability_name: String,

    /// Named numeric parameters. Each bound instance starts from a copy.
    #[serde(default, alias = "abilitySpecials")]
    pub ability_specials: BTreeMap<String, f32>,

    /// Names of the modifiers this ability can apply.
    #[serde(default)]
    pub modifiers: Vec<String>,
}

impl AbilityDefinition {
    /// A definition with no specials and no modifiers.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            ability_name: name.into(),
            ability_specials: BTreeMap::new(),
            modifiers: Vec::new(),
        }
    }

    /// Add a named special, for building definitions in code.
    #[must_use]
    pub fn with_special(mut self, key: impl Into<String>, value: f32) -> Self {
        self.ability_specials.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn hash(&self) -> AbilityHash {
        AbilityHash::from_name(&self.ability_name)
    }
}
