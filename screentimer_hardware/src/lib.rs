//! Byte transports for the ScreenTimer device.
//!
//! - [`StreamLink`] adapts any `Read + Write` stream to `DeviceLink`.
//! - [`SimulatedDevice`] emulates the firmware in memory and is the default
//!   backend when the `hardware` feature is off.
//! - `serial` (feature `hardware`) opens the real USB serial port and finds
//!   it by vendor/product id.
pub mod error;
pub mod link;
#[cfg(feature = "hardware")]
pub mod serial;
pub mod sim;

pub use error::HwError;
pub use link::{MAX_LINE_LEN, StreamLink};
pub use sim::{SIM_RESOLUTION, SimFault, SimulatedDevice};

/// Link to the in-memory firmware emulator.
pub type SimLink = StreamLink<SimulatedDevice>;

/// Build a simulated link with the given fault injected.
pub fn simulated_link(fault: SimFault, seed: u32) -> SimLink {
    StreamLink::with_label(SimulatedDevice::with_fault(fault, seed), "simulator")
}
