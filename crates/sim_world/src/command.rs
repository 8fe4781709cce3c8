//! Mutations queued from outside the tick.
//!
//! Network and tooling threads send [`WorldCommand`]s down the tick loop's
//! channel; the loop applies them at the start of the next tick.

use sim_entity::{Entity, EntityId, FightProp, PlayerUid};
use sim_math::Position;
use sim_net::SessionId;

#[derive(Debug, Clone)]
pub enum WorldCommand {
    Spawn(Box<Entity>),
    Despawn(EntityId),
    Move {
        id: EntityId,
        position: Position,
        rotation: Option<Position>,
    },
    SetFightProp {
        id: EntityId,
        prop: FightProp,
        value: f32,
    },
    PlayerJoin {
        uid: PlayerUid,
        session: SessionId,
    },
    PlayerLeave(PlayerUid),
}
