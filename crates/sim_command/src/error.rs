//! Command errors. Each renders as the message shown to the operator.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Bad or missing arguments.
    #[error("Usage: {}", .0.join("\n       "))]
    Usage(&'static [&'static str]),

    #[error("Unknown item id: {0}")]
    UnknownItem(u32),
}
