//! # sim_data
//!
//! Static game data as seen by the simulation core. Everything here is loaded
//! once and never mutated afterwards.
//!
//! - [`StaticData`]: the lookup interface the world and binder depend on.
//! - [`GameData`]: the JSON-backed implementation, plus a builder for tests.
//! - [`AbilityDefinition`], [`GlobalCombatConfig`], [`ItemData`]: records.

pub mod ability;
pub mod combat;
pub mod error;
pub mod item;
pub mod store;

pub use ability::{AbilityDefinition, AbilityHash};
pub use combat::{DefaultAbilities, GlobalCombatConfig};
pub use error::DataError;
pub use item::{ItemData, ItemType};
pub use store::{GameData, GameDataBuilder, StaticData};
