//! Seams between the ScreenTimer protocol core and whatever carries its bytes.
//!
//! The core only ever talks to a device through [`DeviceLink`] and only ever
//! waits through [`Clock`], so tests and the simulator can stand in for the
//! serial port and the wall clock.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

/// Error type used at the trait boundary. Implementations box their own
/// error types; the core maps them back to typed protocol errors.
pub type LinkError = Box<dyn std::error::Error + Send + Sync>;

/// Blocking byte transport to a measurement device.
///
/// Implementations carry no protocol knowledge: they move bytes and report
/// transport failures (timeouts, disconnects, closed links).
pub trait DeviceLink {
    /// Write every byte of `bytes`, flushing before returning.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    /// Fill `buf` completely or fail.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), LinkError>;

    /// Read one line, returning its bytes including the trailing `\n`.
    ///
    /// A stream that ends before the terminator is an error, never a
    /// partial line.
    fn read_line(&mut self) -> Result<Vec<u8>, LinkError>;

    /// Release the underlying transport. Idempotent.
    fn close(&mut self) -> Result<(), LinkError>;
}

impl<L: DeviceLink + ?Sized> DeviceLink for Box<L> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        (**self).write_all(bytes)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), LinkError> {
        (**self).read_exact(buf)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, LinkError> {
        (**self).read_line()
    }

    fn close(&mut self) -> Result<(), LinkError> {
        (**self).close()
    }
}
