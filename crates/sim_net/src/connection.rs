//! NATS connection management and the NATS-backed transport.

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::error::NetError;
use crate::subjects;
use crate::transport::{Packet, SessionId, Transport};

/// Default NATS server URL.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable used to override the NATS URL.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// A connected `async-nats` client.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect using `NATS_URL`, falling back to [`DEFAULT_NATS_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect() -> Result<Self, NetError> {
        let url = std::env::var(NATS_URL_ENV).unwrap_or_else(|_| DEFAULT_NATS_URL.to_string());
        Self::connect_to(&url).await
    }

    /// Connect to NATS at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        info!(url, "connecting to NATS");
        let client = async_nats::connect(url).await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    #[must_use]
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }

    /// Publish `packet` to `session`'s notify subject, with the command id in
    /// a header.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Publish`] if the client rejects the message.
    pub async fn publish_packet(&self, session: SessionId, packet: Packet) -> Result<(), NetError> {
        let mut headers = async_nats::HeaderMap::new();
        headers.insert(subjects::CMD_ID_HEADER, packet.cmd_id.to_string().as_str());
        self.client
            .publish_with_headers(
                subjects::session_notify(session.0),
                headers,
                packet.payload.into(),
            )
            .await?;
        Ok(())
    }
}

/// [`Transport`] that publishes over NATS.
///
/// `send` is synchronous; each publish is spawned onto the runtime captured
/// at construction. Failures are logged.
#[derive(Debug, Clone)]
pub struct NatsTransport {
    connection: NatsConnection,
    runtime: Handle,
}

impl NatsTransport {
    /// Bind to the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::NoRuntime`] when called outside a runtime.
    pub fn new(connection: NatsConnection) -> Result<Self, NetError> {
        Ok(Self {
            connection,
            runtime: Handle::try_current()?,
        })
    }
}

impl Transport for NatsTransport {
    fn send(&self, session: SessionId, packet: Packet) {
        let connection = self.connection.clone();
        self.runtime.spawn(async move {
            let cmd_id = packet.cmd_id;
            if let Err(e) = connection.publish_packet(session, packet).await {
                warn!(%session, cmd_id, error = %e, "NATS publish failed");
            }
        });
    }
}

