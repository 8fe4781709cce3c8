//! Notify payloads pushed to clients.
//!
//! Each payload type carries a stable command id through [`Notify::CMD_ID`];
//! the transport ships the id next to the encoded body. Field order is the
//! compatibility contract: append new fields, never reorder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sim_entity::SceneEntityInfo;

/// A message that can be sent to a client.
pub trait Notify: Serialize {
    /// Command id identifying the payload type on the wire.
    const CMD_ID: u16;
}

/// Command ids.
pub mod cmd {
    pub const AVATAR_FIGHT_PROP_UPDATE_NOTIFY: u16 = 1207;
    pub const ENTITY_FIGHT_PROP_UPDATE_NOTIFY: u16 = 1210;
    pub const SCENE_ENTITY_APPEAR_NOTIFY: u16 = 221;
    pub const SCENE_ENTITY_DISAPPEAR_NOTIFY: u16 = 203;
}

// ── Fight-property deltas ───────────────────────────────────────────────────

/// Changed fight properties of one of the receiving player's avatars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarFightPropUpdateNotify {
    pub avatar_guid: u64,
    /// Property id → new value. Only changed properties appear.
    pub fight_prop_map: BTreeMap<u32, f32>,
}

impl Notify for AvatarFightPropUpdateNotify {
    const CMD_ID: u16 = cmd::AVATAR_FIGHT_PROP_UPDATE_NOTIFY;
}

/// Changed fight properties of any other entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFightPropUpdateNotify {
    pub entity_id: u64,
    /// Property id → new value. Only changed properties appear.
    pub fight_prop_map: BTreeMap<u32, f32>,
}

impl Notify for EntityFightPropUpdateNotify {
    const CMD_ID: u16 = cmd::ENTITY_FIGHT_PROP_UPDATE_NOTIFY;
}

// ── Visibility ──────────────────────────────────────────────────────────────

/// Why entities appear or disappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VisionType {
    #[default]
    Meet,
    Born,
    Miss,
    Die,
    Remove,
}

/// Full records of entities that became visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntityAppearNotify {
    pub entity_list: Vec<SceneEntityInfo>,
    pub appear_type: VisionType,
}

impl Notify for SceneEntityAppearNotify {
    const CMD_ID: u16 = cmd::SCENE_ENTITY_APPEAR_NOTIFY;
}

/// Ids of entities that are no longer visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntityDisappearNotify {
    pub entity_list: Vec<u32>,
    pub disappear_type: VisionType,
}

impl Notify for SceneEntityDisappearNotify {
    const CMD_ID: u16 = cmd::SCENE_ENTITY_DISAPPEAR_NOTIFY;
}
