//! Maps `Box<dyn Error>` from the `DeviceLink` boundary to `ProtocolError`.
//!
//! The trait uses boxed errors so any transport can plug in; this module
//! recovers the typed cause, with an optional feature-gated path for
//! `screentimer_hardware::HwError` downcasting.

use crate::error::ProtocolError;

/// Map a link-boundary error to a typed `ProtocolError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_link_error(e: &(dyn std::error::Error + 'static)) -> ProtocolError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<screentimer_hardware::HwError>() {
            return match hw {
                screentimer_hardware::HwError::Timeout => ProtocolError::Timeout,
                other => ProtocolError::Transport(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>()
        && io.kind() == std::io::ErrorKind::TimedOut
    {
        return ProtocolError::Timeout;
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        ProtocolError::Timeout
    } else {
        ProtocolError::Transport(s)
    }
}
