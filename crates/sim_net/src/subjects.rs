//! NATS subject hierarchy.
//!
//! Everything the simulation publishes lives under `sim.`.

/// Root prefix for all simulation subjects.
pub const PREFIX: &str = "sim";

/// Header carrying the packet's command id.
pub const CMD_ID_HEADER: &str = "cmd-id";

/// Outbound notifies for one session.
///
/// `sim.session.<id>.notify`
#[must_use]
pub fn session_notify(session: u32) -> String {
    format!("{PREFIX}.session.{session}.notify")
}

/// Wildcard matching every session's notifies.
///
/// `sim.session.*.notify`
#[must_use]
pub fn all_session_notifies() -> String {
    format!("{PREFIX}.session.*.notify")
}
