//! Protocol session lifecycle.
use std::fmt;

/// Where a `ProtocolClient` is in its conversation with the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Link open; the device greeting has not been read yet.
    AwaitingGreeting,
    /// Handshake done; one command may be issued at a time.
    Ready,
    /// A protocol error ended the session. Only closing is possible.
    Failed,
    /// Link released.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::AwaitingGreeting => "awaiting greeting",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        })
    }
}
