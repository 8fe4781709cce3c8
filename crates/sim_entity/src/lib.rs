//! # sim_entity
//!
//! The "E" of the simulation core: what an entity is and what it carries.
//!
//! - [`EntityId`] / [`EntityIdAllocator`]: type-tagged identities.
//! - [`FightPropStore`]: sparse numeric attributes with dirty tracking.
//! - [`AbilitySet`]: ability instances bound to one entity.
//! - [`Entity`] / [`EntityKind`]: the entity model, one struct with a
//!   variant payload.
//! - [`SceneEntityInfo`]: the wire record an entity serialises to.
//! - [`Inventory`]: the per-player item contract consumed by tooling.

pub mod ability;
pub mod entity;
pub mod fight_prop;
pub mod id;
pub mod info;
pub mod inventory;

pub use ability::{AbilityInstance, AbilitySet};
pub use entity::{Entity, EntityKind, LifecycleState};
pub use fight_prop::{FightProp, FightPropStore};
pub use id::{EntityId, EntityIdAllocator, EntityIdType, PlayerUid};
pub use info::{EntityPayload, FightPropPair, MotionInfo, SceneEntityInfo, Vector};
pub use inventory::{GameItem, Inventory};
