//! Fight-property delta encoding.
//!
//! [`drain_fight_props`] is the one place an entity's dirty set is consumed.
//! It needs `&mut Entity`, so two drains for the same entity cannot race.

use std::collections::BTreeMap;

use sim_entity::{Entity, EntityKind, FightProp};

use crate::error::NetError;
use crate::messages::{AvatarFightPropUpdateNotify, EntityFightPropUpdateNotify};
use crate::transport::Packet;

/// A drained fight-property delta, addressed by entity variant.
#[derive(Debug, Clone, PartialEq)]
pub enum FightPropNotify {
    /// Goes to the avatar's owner only.
    Avatar(AvatarFightPropUpdateNotify),
    /// Goes to everyone in the world.
    Entity(EntityFightPropUpdateNotify),
}

impl FightPropNotify {
    /// The carried property map.
    #[must_use]
    pub fn fight_prop_map(&self) -> &BTreeMap<u32, f32> {
        match self {
            Self::Avatar(n) => &n.fight_prop_map,
            Self::Entity(n) => &n.fight_prop_map,
        }
    }

    /// Encode into a transport packet.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if serialisation fails.
    pub fn to_packet(&self) -> Result<Packet, NetError> {
        match self {
            Self::Avatar(n) => Packet::from_notify(n),
            Self::Entity(n) => Packet::from_notify(n),
        }
    }
}

/// Drain `entity`'s dirty fight properties into a notify.
///
/// Returns `None` when nothing changed (or the entity is removed): an empty
/// delta is never sent.
pub fn drain_fight_props(entity: &mut Entity) -> Option<FightPropNotify> {
    let id = entity.id();
    let guid = match entity.kind() {
        EntityKind::Avatar { guid, .. } => Some(*guid),
        _ => None,
    };
    let dirty = entity.fight_props_mut()?.drain_dirty();
    if dirty.is_empty() {
        return None;
    }
    let fight_prop_map = to_wire_map(dirty);
    Some(match guid {
        Some(avatar_guid) => FightPropNotify::Avatar(AvatarFightPropUpdateNotify {
            avatar_guid,
            fight_prop_map,
        }),
        None => FightPropNotify::Entity(EntityFightPropUpdateNotify {
            entity_id: id.as_u64(),
            fight_prop_map,
        }),
    })
}

fn to_wire_map(props: BTreeMap<FightProp, f32>) -> BTreeMap<u32, f32> {
    props.into_iter().map(|(k, v)| (k.id(), v)).collect()
}
