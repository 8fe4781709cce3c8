//! The outbound seam.
//!
//! The simulation only ever calls [`Transport::send`]. Delivery is
//! fire-and-forget: a transport that cannot deliver logs and drops, it never
//! reports back into the tick.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::codec;
use crate::error::NetError;
use crate::messages::Notify;

/// A connected client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u32);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

/// An encoded notify plus its command id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub cmd_id: u16,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Encode `notify` with its command id.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if serialisation fails.
    pub fn from_notify<T: Notify>(notify: &T) -> Result<Self, NetError> {
        Ok(Self {
            cmd_id: T::CMD_ID,
            payload: codec::encode(notify)?,
        })
    }
}

/// Fire-and-forget delivery of packets to sessions.
pub trait Transport: Send + Sync {
    fn send(&self, session: SessionId, packet: Packet);
}

/// In-process transport: packets go down an unbounded Tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<(SessionId, Packet)>,
}

impl ChannelTransport {
    /// A transport plus the receiver that sees everything it sends.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(SessionId, Packet)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Like [`Transport::send`] but reports a closed channel.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::ChannelClosed`] if the receiver was dropped.
    pub fn try_send(&self, session: SessionId, packet: Packet) -> Result<(), NetError> {
        self.tx
            .send((session, packet))
            .map_err(|_| NetError::ChannelClosed)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, session: SessionId, packet: Packet) {
        let cmd_id = packet.cmd_id;
        match self.try_send(session, packet) {
            Ok(()) => trace!(%session, cmd_id, "packet queued"),
            Err(e) => warn!(%session, cmd_id, error = %e, "dropping packet"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::messages::{AvatarFightPropUpdateNotify, cmd};

    fn packet() -> Packet {
        Packet::from_notify(&AvatarFightPropUpdateNotify {
            avatar_guid: 1,
            fight_prop_map: BTreeMap::from([(1010, 5.0)]),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (transport, mut rx) = ChannelTransport::new();
        transport.send(SessionId(1), packet());
        transport.send(SessionId(2), packet());

        let (first, p) = rx.recv().await.unwrap();
        assert_eq!(first, SessionId(1));
        assert_eq!(p.cmd_id, cmd::AVATAR_FIGHT_PROP_UPDATE_NOTIFY);
        let (second, _) = rx.recv().await.unwrap();
        assert_eq!(second, SessionId(2));
    }

    #[test]
    fn test_closed_channel_is_not_fatal() {
        let (transport, rx) = ChannelTransport::new();
        drop(rx);
        transport.send(SessionId(1), packet());
        assert!(matches!(
            transport.try_send(SessionId(1), packet()),
            Err(NetError::ChannelClosed)
        ));
    }

    #[test]
    fn test_transport_is_object_safe() {
        let (transport, _rx) = ChannelTransport::new();
        let dynamic: &dyn Transport = &transport;
        dynamic.send(SessionId(3), packet());
    }
}
