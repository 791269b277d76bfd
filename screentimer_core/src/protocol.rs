//! Command/response state machine for the ScreenTimer device.
//!
//! Every exchange is one command line followed by blocking reads. Calibration
//! answers in newline-framed text, measurement in fixed-width binary frames;
//! the client always knows which framing it expects and never sniffs bytes.
//!
//! Any unexpected response ends the session: the client moves to
//! [`SessionState::Failed`] and refuses further commands. Retrying means
//! opening a new link.
use screentimer_traits::DeviceLink;
use tracing::{debug, trace, warn};

use crate::decoder::{FrameDecoder, RawFrame};
use crate::error::ProtocolError;
use crate::link_error::map_link_error;
use crate::status::SessionState;
use crate::types::{DeviceInfo, Sample};
use crate::util::lossy;

const ACCEPT: &str = "ACPT\n";
const CALIBRATION_START: &str = "CSTA\n";
const CALIBRATION_SUCCESS: &[u8] = b"CSUC\n";
const CALIBRATION_ERROR: &[u8] = b"CERR\n";
const MEASUREMENT_START: &str = "MSTA\n";

/// Owns a `DeviceLink` for one session and closes it on every exit path.
pub struct ProtocolClient<L: DeviceLink> {
    link: L,
    state: SessionState,
}

impl<L: DeviceLink> ProtocolClient<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            state: SessionState::AwaitingGreeting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read the device greeting; it must start with `HELO`.
    pub fn handshake(&mut self) -> Result<(), ProtocolError> {
        self.guard("HELO", SessionState::AwaitingGreeting)?;
        let result = self.read_greeting();
        self.settle(result)
    }

    /// Tell the device which key codes to press for a test and to reset.
    pub fn configure_keys(&mut self, test: u8, reset: u8) -> Result<(), ProtocolError> {
        self.guard("K", SessionState::Ready)?;
        let result = self.exchange_keys(test, reset);
        self.settle(result)
    }

    /// Ask the device for its timer resolution.
    pub fn query_info(&mut self) -> Result<DeviceInfo, ProtocolError> {
        self.guard("I", SessionState::Ready)?;
        let result = self.exchange_info();
        self.settle(result)
    }

    /// Record a calibration trace of the resting light level.
    ///
    /// Calibration carries no variance; the returned sample reports 0.
    pub fn calibrate(&mut self) -> Result<Sample, ProtocolError> {
        self.guard("C", SessionState::Ready)?;
        let result = self.exchange_calibration();
        self.settle(result)
    }

    /// Trigger one key press and record the light response.
    pub fn measure(&mut self) -> Result<Sample, ProtocolError> {
        self.guard("M", SessionState::Ready)?;
        let result = self.exchange_measurement();
        self.settle(result)
    }

    /// Release the link now and report any failure doing so.
    pub fn close(mut self) -> Result<(), ProtocolError> {
        self.release()
    }

    fn guard(&self, command: &'static str, required: SessionState) -> Result<(), ProtocolError> {
        match self.state {
            SessionState::Failed => Err(ProtocolError::SessionFailed),
            state if state != required => Err(ProtocolError::OutOfSequence { command, state }),
            _ => Ok(()),
        }
    }

    fn settle<T>(&mut self, result: Result<T, ProtocolError>) -> Result<T, ProtocolError> {
        match &result {
            Ok(_) => self.state = SessionState::Ready,
            Err(e) => {
                warn!(error = %e, "protocol session failed");
                self.state = SessionState::Failed;
            }
        }
        result
    }

    fn release(&mut self) -> Result<(), ProtocolError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        debug!("releasing device link");
        self.link.close().map_err(|e| map_link_error(&*e))
    }

    fn send(&mut self, command: &[u8]) -> Result<(), ProtocolError> {
        debug!(command = %lossy(command).trim_end(), "send");
        self.link
            .write_all(command)
            .map_err(|e| map_link_error(&*e))
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let line = self
            .link
            .read_line()
            .map_err(|e| map_link_error(&*e))?;
        trace!(line = %lossy(&line).escape_debug(), "recv line");
        Ok(line)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut buf = [0u8; N];
        self.link
            .read_exact(&mut buf)
            .map_err(|e| map_link_error(&*e))?;
        Ok(buf)
    }

    fn expect_line(
        &mut self,
        command: &'static str,
        expected: &'static str,
    ) -> Result<(), ProtocolError> {
        let line = self.read_line()?;
        if line == expected.as_bytes() {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedResponse {
                command,
                expected,
                actual: lossy(&line),
            })
        }
    }

    fn read_greeting(&mut self) -> Result<(), ProtocolError> {
        let line = self.read_line()?;
        if !line.starts_with(b"HELO") {
            return Err(ProtocolError::UnexpectedGreeting {
                actual: lossy(&line),
            });
        }
        debug!(greeting = %lossy(&line).trim_end(), "device greeted");
        Ok(())
    }

    fn exchange_keys(&mut self, test: u8, reset: u8) -> Result<(), ProtocolError> {
        self.send(format!("K {test} {reset}\n").as_bytes())?;
        let line = self.read_line()?;
        if line != ACCEPT.as_bytes() {
            return Err(ProtocolError::Rejected {
                command: "K",
                actual: lossy(&line),
            });
        }
        debug!(test, reset, "key codes accepted");
        Ok(())
    }

    fn exchange_info(&mut self) -> Result<DeviceInfo, ProtocolError> {
        self.send(b"I\n")?;
        let line = self.read_line()?;
        let resolution = parse_resolution(&line)?;
        debug!(resolution, "device info");
        Ok(DeviceInfo { resolution })
    }

    fn exchange_calibration(&mut self) -> Result<Sample, ProtocolError> {
        self.send(b"C\n")?;
        self.expect_line("C", CALIBRATION_START)?;

        let mut ts: u64 = 0;
        let mut points = Vec::new();
        loop {
            let line = self.read_line()?;
            match line.as_slice() {
                CALIBRATION_SUCCESS => break,
                CALIBRATION_ERROR => return Err(ProtocolError::CalibrationFailed),
                _ => {
                    let (delta, value) = parse_calibration_line(&line)?;
                    ts = ts.saturating_add(delta);
                    points.push((ts as f64, value));
                }
            }
        }
        debug!(points = points.len(), "calibration complete");
        Ok(Sample::from_points(0, points))
    }

    fn exchange_measurement(&mut self) -> Result<Sample, ProtocolError> {
        self.send(b"M\n")?;
        self.expect_line("M", MEASUREMENT_START)?;

        let variance = u16::from_be_bytes(self.read_array::<2>()?);
        let mut decoder = FrameDecoder::new();
        loop {
            match RawFrame::parse(self.read_array::<4>()?) {
                RawFrame::SuccessTerminator => break,
                RawFrame::ErrorTerminator => {
                    return Err(ProtocolError::MeasurementFailed {
                        frames_received: decoder.frames_seen(),
                    });
                }
                RawFrame::Data { delta_time, value } => {
                    trace!(delta_time, value, "frame");
                    decoder.push(delta_time, value);
                }
            }
        }
        let frames = decoder.frames_seen();
        let sample = decoder.finish(variance);
        debug!(frames, points = sample.len(), variance, "measurement complete");
        Ok(sample)
    }
}

impl<L: DeviceLink> Drop for ProtocolClient<L> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "failed to close device link");
        }
    }
}

/// Parse an info line such as `RESL 16000000UL\n`.
///
/// The device prints the resolution as a C literal, so trailing `U`/`L`
/// suffixes are stripped before parsing.
pub fn parse_resolution(line: &[u8]) -> Result<u32, ProtocolError> {
    let malformed = || ProtocolError::MalformedInfo {
        actual: lossy(line),
    };
    let payload = line.strip_prefix(b"RESL").ok_or_else(malformed)?;
    let text = std::str::from_utf8(payload).map_err(|_| malformed())?;
    let digits = text.trim().trim_end_matches(['U', 'L']);
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => Err(malformed()),
        Ok(resolution) => Ok(resolution),
    }
}

/// Parse a calibration line `<delta_time>;<value>\n`.
pub fn parse_calibration_line(line: &[u8]) -> Result<(u64, i64), ProtocolError> {
    let malformed = || ProtocolError::MalformedFrame {
        actual: lossy(line),
    };
    let text = std::str::from_utf8(line).map_err(|_| malformed())?;
    let (delta, value) = text.trim_end().split_once(';').ok_or_else(malformed)?;
    let delta = delta.trim().parse::<u64>().map_err(|_| malformed())?;
    let value = value.trim().parse::<i64>().map_err(|_| malformed())?;
    Ok((delta, value))
}
