//! # sim_math
//!
//! Geometry for the world simulation core. Defines [`Position`], the value
//! type every entity, spatial query and wire vector is expressed in, and
//! re-exports the [`glam`] types it converts to and from.

pub mod position;

pub use glam::Vec3;

pub use position::{Position, PositionParseError};
