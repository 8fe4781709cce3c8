//! Wire records describing an entity to clients.
//!
//! These are plain `serde` structs. Field order is part of the wire contract
//! (MessagePack encodes structs positionally), so new fields go at the end.

use serde::{Deserialize, Serialize};
use sim_math::Position;

use crate::fight_prop::{FightProp, FightPropStore};
use crate::id::{EntityIdType, PlayerUid};

/// Wire vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Position> for Vector {
    fn from(p: Position) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

impl From<Vector> for Position {
    fn from(v: Vector) -> Self {
        Position::new(v.x, v.y, v.z)
    }
}

/// One entry of a full fight-property list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FightPropPair {
    pub prop_type: u32,
    pub prop_value: f32,
}

impl FightPropPair {
    /// Every property in `store`, ordered by id.
    #[must_use]
    pub fn list_from(store: &FightPropStore) -> Vec<Self> {
        store
            .get_all()
            .into_iter()
            .map(|(FightProp(prop_type), prop_value)| Self {
                prop_type,
                prop_value,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionInfo {
    pub pos: Vector,
    pub rot: Vector,
}

/// Variant-specific part of [`SceneEntityInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityPayload {
    Avatar {
        avatar_id: u32,
        guid: u64,
        owner_uid: PlayerUid,
    },
    Monster {
        monster_id: u32,
        level: u32,
    },
    Gadget {
        gadget_id: u32,
    },
}

/// The full description of a visible entity, sent on appear and on (re)join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntityInfo {
    pub entity_id: u32,
    pub entity_type: EntityIdType,
    pub motion_info: MotionInfo,
    pub fight_prop_list: Vec<FightPropPair>,
    pub payload: EntityPayload,
}
