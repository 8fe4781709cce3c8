//! Entity identities and allocation.
//!
//! An [`EntityId`] is a `u32` whose top 8 bits carry the [`EntityIdType`]
//! discriminator and whose low 24 bits are a per-world sequence number.
//! Identities are only ever handed out by a world's [`EntityIdAllocator`].

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Discriminator stored in the top byte of every [`EntityId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityIdType {
    Avatar = 0x01,
    Monster = 0x02,
    Npc = 0x03,
    Gadget = 0x04,
    Region = 0x05,
    Weapon = 0x06,
    Team = 0x09,
    MpLevel = 0x0b,
}

impl EntityIdType {
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(Self::Avatar),
            0x02 => Some(Self::Monster),
            0x03 => Some(Self::Npc),
            0x04 => Some(Self::Gadget),
            0x05 => Some(Self::Region),
            0x06 => Some(Self::Weapon),
            0x09 => Some(Self::Team),
            0x0b => Some(Self::MpLevel),
            _ => None,
        }
    }
}

/// A world-unique entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    const TYPE_SHIFT: u32 = 24;
    const SEQUENCE_MASK: u32 = (1 << Self::TYPE_SHIFT) - 1;

    /// The null / invalid entity sentinel.
    pub const INVALID: EntityId = EntityId(0);

    /// Largest sequence number an id can carry.
    pub const MAX_SEQUENCE: u32 = Self::SEQUENCE_MASK;

    /// Compose an id from its type and sequence number. Sequence bits above
    /// the low 24 are discarded.
    #[must_use]
    pub const fn compose(id_type: EntityIdType, sequence: u32) -> Self {
        Self(((id_type as u32) << Self::TYPE_SHIFT) | (sequence & Self::SEQUENCE_MASK))
    }

    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// The id widened for wire messages that carry 64-bit owners.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }

    /// The type tag, or `None` for ids not minted by an allocator.
    #[must_use]
    pub const fn id_type(self) -> Option<EntityIdType> {
        EntityIdType::from_id((self.0 >> Self::TYPE_SHIFT) as u8)
    }

    #[must_use]
    pub const fn sequence(self) -> u32 {
        self.0 & Self::SEQUENCE_MASK
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id_type() {
            Some(ty) => write!(f, "Entity({ty:?}#{})", self.sequence()),
            None => write!(f, "Entity({})", self.0),
        }
    }
}

/// A player account id. Entities refer to their owning player through this,
/// never through a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerUid(pub u32);

impl std::fmt::Display for PlayerUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// Allocates entity ids for one world.
///
/// The sequence is shared across id types and runs `1..=MAX_SEQUENCE`, then
/// wraps back to 1; sequence 0 never appears. After a wrap an id may still be
/// held by a live entity, so the world checks its table before using one.
/// Allocation is lock-free; any thread holding the world may allocate.
#[derive(Debug)]
pub struct EntityIdAllocator {
    last_sequence: AtomicU32,
}

impl EntityIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// An allocator whose next sequence follows `last`, e.g. when restoring
    /// a world.
    #[must_use]
    pub fn starting_after(last: u32) -> Self {
        Self {
            last_sequence: AtomicU32::new(last),
        }
    }

    /// Allocate the next id tagged with `id_type`.
    pub fn allocate(&self, id_type: EntityIdType) -> EntityId {
        let step = |last: u32| Some(last % EntityId::MAX_SEQUENCE + 1);
        let previous = match self
            .last_sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, step)
        {
            Ok(previous) | Err(previous) => previous,
        };
        EntityId::compose(id_type, previous % EntityId::MAX_SEQUENCE + 1)
    }

    /// The sequence number of the most recent allocation (0 before any).
    #[must_use]
    pub fn last_sequence(&self) -> u32 {
        self.last_sequence.load(Ordering::Relaxed)
    }
}

impl Default for EntityIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
