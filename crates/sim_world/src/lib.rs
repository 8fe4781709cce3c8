//! # sim_world
//!
//! One simulated world and the loop that drives it.
//!
//! - [`World`]: entity table, spatial index, player sessions, lifecycle and
//!   the fight-prop sync pass.
//! - [`SpatialIndex`]: hashed-grid proximity queries.
//! - [`ability`]: binds default abilities from static data.
//! - [`TickLoop`]: fixed-timestep driver fed by [`WorldCommand`]s.
//! - [`WorldConfig`]: tunables.

pub mod ability;
pub mod command;
pub mod config;
pub mod error;
pub mod spatial;
pub mod tick;
pub mod world;

pub use ability::{AbilityContext, BindReport};
pub use command::WorldCommand;
pub use config::WorldConfig;
pub use error::{ConfigError, SpatialError, WorldError};
pub use spatial::{Query, Shape, SpatialIndex};
pub use tick::TickLoop;
pub use world::World;
