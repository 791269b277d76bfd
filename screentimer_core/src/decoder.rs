//! Binary measurement frames and their decoding into a `Sample`.
use tracing::trace;

use crate::types::{DeviceInfo, Sample};

/// Frame terminating a measurement that failed on the device.
pub const ERROR_TERMINATOR: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
/// Frame terminating a successful measurement.
pub const SUCCESS_TERMINATOR: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFE];

/// One 4-byte unit of the measurement stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFrame {
    /// Big-endian `(delta_time, value)` pair.
    Data { delta_time: u16, value: u16 },
    ErrorTerminator,
    SuccessTerminator,
}

impl RawFrame {
    pub fn parse(bytes: [u8; 4]) -> Self {
        match bytes {
            ERROR_TERMINATOR => RawFrame::ErrorTerminator,
            SUCCESS_TERMINATOR => RawFrame::SuccessTerminator,
            [t0, t1, v0, v1] => RawFrame::Data {
                delta_time: u16::from_be_bytes([t0, t1]),
                value: u16::from_be_bytes([v0, v1]),
            },
        }
    }
}

/// Accumulates data frames into absolute timestamps.
///
/// The first frame of every measurement is a startup artifact with an
/// unreliable delta and is dropped.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    ts: u64,
    frames_seen: usize,
    points: Vec<(f64, i64)>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta_time: u16, value: u16) {
        self.frames_seen += 1;
        if self.frames_seen == 1 {
            trace!(delta_time, value, "discarding startup frame");
            return;
        }
        self.ts += u64::from(delta_time);
        self.points.push((self.ts as f64, i64::from(value)));
    }

    /// Data frames received so far, the discarded one included.
    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    pub fn finish(self, variance: u16) -> Sample {
        Sample::from_points(variance, self.points)
    }
}

/// Decode a complete list of `(delta_time, value)` data frames.
pub fn decode_frames(variance: u16, frames: impl IntoIterator<Item = (u16, u16)>) -> Sample {
    let mut decoder = FrameDecoder::new();
    for (d, v) in frames {
        decoder.push(d, v);
    }
    decoder.finish(variance)
}

/// Convert a tick-based time axis to microseconds. Values are untouched.
pub fn to_microseconds(sample: &Sample, info: &DeviceInfo) -> Sample {
    let scale = info.us_per_tick();
    sample.map_times(|t| t * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_recognized() {
        assert_eq!(RawFrame::parse(ERROR_TERMINATOR), RawFrame::ErrorTerminator);
        assert_eq!(
            RawFrame::parse(SUCCESS_TERMINATOR),
            RawFrame::SuccessTerminator
        );
        assert_eq!(
            RawFrame::parse([0x01, 0x02, 0xFF, 0xFF]),
            RawFrame::Data {
                delta_time: 0x0102,
                value: 0xFFFF
            }
        );
    }

    #[test]
    fn first_frame_is_discarded() {
        let s = decode_frames(9, [(60_000, 0), (10, 5), (0, 6), (20, 7)]);
        assert_eq!(s.times(), &[10.0, 10.0, 30.0]);
        assert_eq!(s.values(), &[5, 6, 7]);
        assert_eq!(s.variance(), 9);
    }

    #[test]
    fn single_or_no_frames_yield_empty_sample() {
        assert!(decode_frames(0, [(5, 5)]).is_empty());
        assert!(decode_frames(0, Vec::<(u16, u16)>::new()).is_empty());
    }

    #[test]
    fn timestamps_do_not_wrap_past_u16() {
        let frames = std::iter::once((0, 0)).chain(std::iter::repeat_n((u16::MAX - 1, 1), 3));
        let s = decode_frames(0, frames);
        assert_eq!(s.times().last().copied(), Some(3.0 * 65_534.0));
    }

    #[test]
    fn microsecond_conversion_scales_times_only() {
        let s = Sample::from_points(1, [(16.0, 3), (32.0, 4)]);
        let us = to_microseconds(&s, &DeviceInfo { resolution: 16_000_000 });
        assert_eq!(us.times(), &[1.0, 2.0]);
        assert_eq!(us.values(), s.values());
        assert_eq!(us.variance(), 1);
    }
}
