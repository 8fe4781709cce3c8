//! # sim_net
//!
//! Everything between an entity's dirty set and a client socket.
//!
//! - [`messages`]: notify payloads and their command ids.
//! - [`codec`]: MessagePack helpers.
//! - [`encoder`]: drains an entity's dirty fight props into a notify.
//! - [`transport`]: the fire-and-forget [`Transport`] seam and an
//!   in-process channel implementation.
//! - [`connection`]: NATS connection and the NATS-backed transport.
//! - [`subjects`]: NATS subject builders.
//! - [`error`]: network-layer error types.

pub mod codec;
pub mod connection;
pub mod encoder;
pub mod error;
pub mod messages;
pub mod subjects;
pub mod transport;

pub use codec::{decode, encode};
pub use connection::{NatsConnection, NatsTransport};
pub use encoder::{FightPropNotify, drain_fight_props};
pub use error::NetError;
pub use messages::{
    AvatarFightPropUpdateNotify, EntityFightPropUpdateNotify, Notify, SceneEntityAppearNotify,
    SceneEntityDisappearNotify, VisionType,
};
pub use transport::{ChannelTransport, Packet, SessionId, Transport};
