//! Fight properties: sparse numeric attributes with change tracking.
//!
//! Every write goes through [`FightPropStore`], which records the key in a
//! dirty set. The synchronisation pass calls [`FightPropStore::drain_dirty`]
//! once per tick to obtain exactly the values clients have not seen yet.
//! Draining takes `&mut self`, so there is never more than one consumer.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A fight-property id (the attribute kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FightProp(pub u32);

impl FightProp {
    pub const BASE_HP: Self = Self(1);
    pub const HP: Self = Self(2);
    pub const HP_PERCENT: Self = Self(3);
    pub const BASE_ATTACK: Self = Self(4);
    pub const ATTACK: Self = Self(5);
    pub const ATTACK_PERCENT: Self = Self(6);
    pub const BASE_DEFENSE: Self = Self(7);
    pub const DEFENSE: Self = Self(8);
    pub const DEFENSE_PERCENT: Self = Self(9);
    pub const CRITICAL: Self = Self(20);
    pub const CRITICAL_HURT: Self = Self(22);
    pub const CHARGE_EFFICIENCY: Self = Self(23);
    pub const ELEMENT_MASTERY: Self = Self(28);
    pub const PHYSICAL_SUB_HURT: Self = Self(29);
    pub const FIRE_SUB_HURT: Self = Self(50);
    pub const ELEC_SUB_HURT: Self = Self(51);
    pub const WATER_SUB_HURT: Self = Self(52);
    pub const GRASS_SUB_HURT: Self = Self(53);
    pub const WIND_SUB_HURT: Self = Self(54);
    pub const ROCK_SUB_HURT: Self = Self(55);
    pub const ICE_SUB_HURT: Self = Self(56);
    pub const MAX_FIRE_ENERGY: Self = Self(70);
    pub const CUR_FIRE_ENERGY: Self = Self(1000);
    pub const CUR_HP: Self = Self(1010);
    pub const MAX_HP: Self = Self(2000);
    pub const CUR_ATTACK: Self = Self(2001);
    pub const CUR_DEFENSE: Self = Self(2002);
    pub const CUR_SPEED: Self = Self(2003);

    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl From<u32> for FightProp {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Per-entity fight-property values plus the set of keys changed since the
/// last drain.
///
/// An absent key reads as `0.0`. Only the values are serialised; the dirty
/// set is transient.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FightPropStore {
    values: HashMap<FightProp, f32>,
    #[serde(skip)]
    dirty: BTreeSet<FightProp>,
}

impl FightPropStore {
    /// The default value of an absent property.
    pub const DEFAULT_VALUE: f32 = 0.0;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `prop`, or [`Self::DEFAULT_VALUE`].
    #[must_use]
    pub fn get(&self, prop: FightProp) -> f32 {
        self.values
            .get(&prop)
            .copied()
            .unwrap_or(Self::DEFAULT_VALUE)
    }

    /// Overwrite `prop` and mark it dirty, whether or not the value changed.
    pub fn set(&mut self, prop: FightProp, value: f32) {
        self.values.insert(prop, value);
        self.dirty.insert(prop);
    }

    /// Add `delta` to the current value and return the new value.
    pub fn add(&mut self, prop: FightProp, delta: f32) -> f32 {
        let value = self.get(prop) + delta;
        self.set(prop, value);
        value
    }

    pub fn set_many(&mut self, values: impl IntoIterator<Item = (FightProp, f32)>) {
        for (prop, value) in values {
            self.set(prop, value);
        }
    }

    /// Drop `prop`. It is marked dirty so the next drain reports the default
    /// value to clients.
    pub fn remove(&mut self, prop: FightProp) -> Option<f32> {
        let old = self.values.remove(&prop);
        if old.is_some() {
            self.dirty.insert(prop);
        }
        old
    }

    /// Full snapshot, for initial sync on (re)join.
    #[must_use]
    pub fn get_all(&self) -> BTreeMap<FightProp, f32> {
        self.values.iter().map(|(&k, &v)| (k, v)).collect()
    }

    /// Return every property changed since the previous drain, with its
    /// current value, and clear the dirty set.
    pub fn drain_dirty(&mut self) -> BTreeMap<FightProp, f32> {
        std::mem::take(&mut self.dirty)
            .into_iter()
            .map(|prop| (prop, self.get(prop)))
            .collect()
    }

    /// Mark every present property dirty, forcing a full resync on the next
    /// drain.
    pub fn mark_all_dirty(&mut self) {
        self.dirty.extend(self.values.keys().copied());
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    #[must_use]
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
