//! World-level error types.

use sim_entity::{EntityId, EntityIdType, LifecycleState, PlayerUid};
use sim_net::NetError;

/// Spatial index misuse. Both variants point at a lifecycle bug upstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("{0} is already indexed")]
    DuplicateEntity(EntityId),

    #[error("{0} is not indexed")]
    NotIndexed(EntityId),
}

/// A [`WorldConfig`](crate::WorldConfig) the world cannot run with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick rate must give a tick interval between 0 and Duration::MAX, got {0}")]
    TickRate(f64),

    #[error("spatial rank must be below 32, got {0}")]
    SpatialRank(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("no such entity: {0}")]
    UnknownEntity(EntityId),

    /// Only unbound entities can be spawned.
    #[error("cannot spawn an entity in state {0:?}")]
    NotUnbound(LifecycleState),

    #[error("{0} is not in this world")]
    UnknownPlayer(PlayerUid),

    #[error("{0} is already in this world")]
    PlayerAlreadyJoined(PlayerUid),

    /// Every sequence number for this type is held by a live entity.
    #[error("no free entity id for {0:?}")]
    IdsExhausted(EntityIdType),
}
