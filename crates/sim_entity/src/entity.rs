//! The entity model.
//!
//! Every simulated object is one [`Entity`]: the capabilities all entities
//! share live on the struct, and the variant-specific data lives in
//! [`EntityKind`]. Behaviour that differs per variant matches on the kind.

use serde::{Deserialize, Serialize};
use sim_math::Position;
use tracing::warn;

use crate::ability::AbilitySet;
use crate::fight_prop::{FightProp, FightPropStore};
use crate::id::{EntityId, EntityIdType, PlayerUid};
use crate::info::{EntityPayload, FightPropPair, MotionInfo, SceneEntityInfo};

/// Variant payload of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A player-controlled character.
    Avatar {
        avatar_id: u32,
        /// Inventory guid; avatar notifies are keyed by this.
        guid: u64,
        owner: PlayerUid,
    },
    Monster {
        monster_id: u32,
        level: u32,
    },
    Gadget {
        gadget_id: u32,
    },
    /// One player's team container.
    Team {
        owner: PlayerUid,
    },
    /// The world anchor. One per world.
    MpLevel,
}

impl EntityKind {
    /// The tag the world's allocator stamps into this entity's id.
    #[must_use]
    pub fn allocation_type(&self) -> EntityIdType {
        match self {
            Self::Avatar { .. } => EntityIdType::Avatar,
            Self::Monster { .. } => EntityIdType::Monster,
            Self::Gadget { .. } => EntityIdType::Gadget,
            Self::Team { .. } => EntityIdType::Team,
            Self::MpLevel => EntityIdType::MpLevel,
        }
    }

    /// The type reported to clients.
    ///
    /// The world anchor is allocated as `MpLevel` but reports itself as
    /// `Team`; clients key on the reported value.
    #[must_use]
    pub fn entity_type(&self) -> EntityIdType {
        match self {
            Self::MpLevel => EntityIdType::Team,
            other => other.allocation_type(),
        }
    }

    /// The owning player, for player-bound variants.
    #[must_use]
    pub fn owner(&self) -> Option<PlayerUid> {
        match self {
            Self::Avatar { owner, .. } | Self::Team { owner } => Some(*owner),
            _ => None,
        }
    }

    /// Containers have no scene presence and never serialise to an info
    /// record.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Team { .. } | Self::MpLevel)
    }
}

/// Where an entity is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Constructed, no identity yet.
    #[default]
    Unbound,
    /// In the world's table and spatial index.
    Active,
    /// Terminal.
    Removed,
}

/// A simulated object.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    position: Position,
    rotation: Position,
    fight_props: FightPropStore,
    abilities: AbilitySet,
    state: LifecycleState,
}

impl Entity {
    /// A fresh, unbound entity. It gets an id when a world activates it.
    #[must_use]
    pub fn new(kind: EntityKind, position: Position, rotation: Position) -> Self {
        Self {
            id: EntityId::INVALID,
            kind,
            position,
            rotation,
            fight_props: FightPropStore::new(),
            abilities: AbilitySet::new(),
            state: LifecycleState::Unbound,
        }
    }

    /// Seed fight properties before activation.
    #[must_use]
    pub fn with_fight_props(mut self, props: impl IntoIterator<Item = (FightProp, f32)>) -> Self {
        self.fight_props.set_many(props);
        self
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    #[must_use]
    pub fn entity_type(&self) -> EntityIdType {
        self.kind.entity_type()
    }

    #[must_use]
    pub fn owner(&self) -> Option<PlayerUid> {
        self.kind.owner()
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Set the authoritative position. Only the world calls this, under the
    /// same guard it uses to update the spatial index.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    #[must_use]
    pub fn rotation(&self) -> Position {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Position) {
        self.rotation = rotation;
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    #[must_use]
    pub fn fight_props(&self) -> &FightPropStore {
        &self.fight_props
    }

    /// Mutable fight properties, or `None` once the entity is removed.
    pub fn fight_props_mut(&mut self) -> Option<&mut FightPropStore> {
        match self.state {
            LifecycleState::Removed => None,
            _ => Some(&mut self.fight_props),
        }
    }

    /// Set one fight property. Returns `false` (and changes nothing) on a
    /// removed entity.
    pub fn set_fight_prop(&mut self, prop: FightProp, value: f32) -> bool {
        let id = self.id;
        match self.fight_props_mut() {
            Some(store) => {
                store.set(prop, value);
                true
            }
            None => {
                warn!(entity = %id, prop = prop.id(), "fight prop write on removed entity ignored");
                false
            }
        }
    }

    #[must_use]
    pub fn fight_prop(&self, prop: FightProp) -> f32 {
        self.fight_props.get(prop)
    }

    #[must_use]
    pub fn abilities(&self) -> &AbilitySet {
        &self.abilities
    }

    pub fn abilities_mut(&mut self) -> &mut AbilitySet {
        &mut self.abilities
    }

    /// Give the entity its identity and mark it live.
    pub fn activate(&mut self, id: EntityId) {
        self.id = id;
        self.state = LifecycleState::Active;
    }

    /// Mark the entity terminal.
    pub fn mark_removed(&mut self) {
        self.state = LifecycleState::Removed;
    }

    /// Per-tick update. Does nothing unless active.
    pub fn on_tick(&mut self, dt: f32) {
        if self.is_active() {
            self.abilities.on_tick(dt);
        }
    }

    /// The client-facing description, or `None` for containers.
    #[must_use]
    pub fn to_info(&self) -> Option<SceneEntityInfo> {
        let payload = match self.kind {
            EntityKind::Avatar {
                avatar_id,
                guid,
                owner,
            } => EntityPayload::Avatar {
                avatar_id,
                guid,
                owner_uid: owner,
            },
            EntityKind::Monster { monster_id, level } => {
                EntityPayload::Monster { monster_id, level }
            }
            EntityKind::Gadget { gadget_id } => EntityPayload::Gadget { gadget_id },
            EntityKind::Team { .. } | EntityKind::MpLevel => return None,
        };
        Some(SceneEntityInfo {
            entity_id: self.id.id(),
            entity_type: self.entity_type(),
            motion_info: MotionInfo {
                pos: self.position.into(),
                rot: self.rotation.into(),
            },
            fight_prop_list: FightPropPair::list_from(&self.fight_props),
            payload,
        })
    }
}
