//! Network-layer error types.

/// Errors from encoding notifies or handing them to a transport.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// The receiving side of a channel transport is gone.
    #[error("transport channel closed")]
    ChannelClosed,

    /// A NATS transport was used outside a Tokio runtime.
    #[error("no Tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
