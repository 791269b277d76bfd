//! Tick/time helpers.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Microseconds per device timer tick for a resolution in ticks per second.
/// - Clamps `resolution` to at least 1 to avoid division by zero.
#[inline]
pub fn us_per_tick(resolution: u32) -> f64 {
    MICROS_PER_SEC as f64 / f64::from(resolution.max(1))
}

/// Render device bytes for error messages and logs.
pub(crate) fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_per_tick_known_rates() {
        assert_eq!(us_per_tick(1_000_000), 1.0);
        assert_eq!(us_per_tick(16_000_000), 0.0625);
        assert_eq!(us_per_tick(1), 1_000_000.0);
    }

    #[test]
    fn zero_resolution_is_clamped() {
        assert_eq!(us_per_tick(0), us_per_tick(1));
    }
}
