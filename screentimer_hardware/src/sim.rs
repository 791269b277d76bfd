//! In-memory emulation of the ScreenTimer firmware.
//!
//! The simulator speaks the same command set as the device: it greets on
//! connect, answers `K`, `I`, `C` and `M`, and produces a synthetic light
//! step with a randomized lag for every measurement. Faults can be injected
//! to exercise the error paths of the protocol client.
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::str::FromStr;

use tracing::trace;

/// Timer ticks per second reported by the simulated firmware (16 MHz).
pub const SIM_RESOLUTION: u32 = 16_000_000;

const CALIBRATION_POINTS: usize = 100;
const MEASUREMENT_FRAMES: usize = 400;
const BASE_LEVEL: u16 = 40;
const PEAK_LEVEL: u16 = 600;
// 0.1 ms between samples, +/- jitter.
const FRAME_TICKS: u32 = 1_500;
const FRAME_JITTER: u32 = 200;
// Lag between key press and light change: 8..24 ms.
const MIN_LAG_TICKS: u32 = 128_000;
const LAG_SPAN_TICKS: u32 = 256_000;
// Panel transition time: 2 ms.
const RISE_TICKS: u32 = 32_000;

/// Failure to inject into the simulated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimFault {
    #[default]
    None,
    /// Greet with something other than `HELO`.
    BadGreeting,
    /// Answer every key configuration with `REJT`.
    RejectKeys,
    /// Terminate calibration with `CERR`.
    CalibrationError,
    /// Terminate measurements with the error sentinel.
    MeasurementError,
    /// Stop a measurement stream midway without any sentinel.
    Truncated,
}

impl FromStr for SimFault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(SimFault::None),
            "greeting" => Ok(SimFault::BadGreeting),
            "keys" => Ok(SimFault::RejectKeys),
            "calibration" => Ok(SimFault::CalibrationError),
            "measurement" => Ok(SimFault::MeasurementError),
            "truncate" => Ok(SimFault::Truncated),
            other => Err(format!("unknown simulator fault '{other}'")),
        }
    }
}

/// Firmware emulator exposed as a byte stream.
///
/// Bytes written are parsed as newline-terminated commands; responses are
/// queued and handed out by `read`. An empty queue reads as end of stream.
#[derive(Debug)]
pub struct SimulatedDevice {
    outbound: VecDeque<u8>,
    pending: Vec<u8>,
    fault: SimFault,
    rng: XorShift32,
    test_key: Option<u8>,
    reset_key: Option<u8>,
    commands: Vec<String>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::with_fault(SimFault::None, 0x5eed)
    }

    pub fn with_fault(fault: SimFault, seed: u32) -> Self {
        let mut dev = Self {
            outbound: VecDeque::new(),
            pending: Vec::new(),
            fault,
            rng: XorShift32::new(seed),
            test_key: None,
            reset_key: None,
            commands: Vec::new(),
        };
        if fault == SimFault::BadGreeting {
            dev.push_str("BOOT\n");
        } else {
            dev.push_str("HELO ScreenTimer ready\n");
        }
        dev
    }

    /// Commands received so far, without terminators.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Key codes accepted by the last valid `K` command.
    pub fn key_codes(&self) -> Option<(u8, u8)> {
        self.test_key.zip(self.reset_key)
    }

    fn push_str(&mut self, s: &str) {
        self.outbound.extend(s.as_bytes());
    }

    fn push_u16(&mut self, v: u16) {
        self.outbound.extend(v.to_be_bytes());
    }

    fn handle_command(&mut self, cmd: String) {
        trace!(cmd = %cmd, "simulator command");
        match cmd.as_bytes().first() {
            None => self.push_str("REJT\n"),
            Some(b'C') => self.calibrate(),
            Some(b'M') => self.measure(),
            Some(b'I') => self.push_str(&format!("RESL {SIM_RESOLUTION}UL\n")),
            Some(b'K') => self.configure_keys(&cmd),
            // The firmware ignores anything else.
            Some(_) => {}
        }
        self.commands.push(cmd);
    }

    fn configure_keys(&mut self, cmd: &str) {
        let parsed = cmd
            .strip_prefix("K ")
            .and_then(|rest| rest.split_once(' '))
            .and_then(|(a, b)| {
                let digits = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());
                if digits(a) && digits(b) {
                    // atoi into uint8_t wraps on the device
                    Some((wrap_u8(a), wrap_u8(b)))
                } else {
                    None
                }
            });
        match parsed {
            Some((test, reset)) if self.fault != SimFault::RejectKeys => {
                self.test_key = Some(test);
                self.reset_key = Some(reset);
                self.push_str("ACPT\n");
            }
            _ => self.push_str("REJT\n"),
        }
    }

    fn calibrate(&mut self) {
        self.push_str("CSTA\n");
        for _ in 0..CALIBRATION_POINTS {
            let delta = 830 + self.rng.below(40);
            let value = BASE_LEVEL + self.noise();
            self.push_str(&format!("{delta};{value}\n"));
        }
        if self.fault == SimFault::CalibrationError {
            self.push_str("CERR\n");
        } else {
            self.push_str("CSUC\n");
        }
    }

    fn measure(&mut self) {
        self.push_str("MSTA\n");
        let variance = 10 + self.rng.below(20) as u16;
        self.push_u16(variance);

        // Startup artifact: stale timer value from before the key press.
        let stale = 0x8000 + self.rng.below(0x4000) as u16;
        self.push_u16(stale);
        self.push_u16(0);

        let onset = MIN_LAG_TICKS + self.rng.below(LAG_SPAN_TICKS);
        let frames = match self.fault {
            SimFault::MeasurementError | SimFault::Truncated => MEASUREMENT_FRAMES / 2,
            _ => MEASUREMENT_FRAMES,
        };
        let mut t: u32 = 0;
        for _ in 0..frames {
            let delta = FRAME_TICKS + self.rng.below(FRAME_JITTER);
            t += delta;
            let progress = if t <= onset {
                0.0
            } else {
                (f64::from(t - onset) / f64::from(RISE_TICKS)).min(1.0)
            };
            let level = f64::from(BASE_LEVEL) + progress * f64::from(PEAK_LEVEL - BASE_LEVEL);
            let value = (level as u16).saturating_add(self.noise());
            self.push_u16(delta as u16);
            self.push_u16(value);
        }

        match self.fault {
            SimFault::MeasurementError => self.push_u16_pair(0xFFFF, 0xFFFF),
            SimFault::Truncated => {}
            _ => self.push_u16_pair(0xFFFF, 0xFFFE),
        }
    }

    fn push_u16_pair(&mut self, a: u16, b: u16) {
        self.push_u16(a);
        self.push_u16(b);
    }

    fn noise(&mut self) -> u16 {
        self.rng.below(7) as u16
    }
}

impl Read for SimulatedDevice {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.outbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for SimulatedDevice {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &b in buf {
            match b {
                b'\r' | b'\n' => {
                    let cmd = String::from_utf8_lossy(&self.pending).into_owned();
                    self.pending.clear();
                    self.handle_command(cmd);
                }
                b' '..=b'~' => self.pending.push(b),
                _ => {}
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn wrap_u8(digits: &str) -> u8 {
    digits
        .bytes()
        .fold(0u8, |acc, d| acc.wrapping_mul(10).wrapping_add(d - b'0'))
}

/// Tiny deterministic PRNG; good enough for jitter and noise.
#[derive(Debug, Clone)]
struct XorShift32(u32);

impl XorShift32 {
    fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    fn below(&mut self, n: u32) -> u32 {
        self.next() % n.max(1)
    }
}
