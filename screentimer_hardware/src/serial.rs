//! USB serial backend (feature `hardware`).
use std::time::Duration;

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::error::{HwError, Result};
use crate::link::StreamLink;

/// Link to a physical device over its USB CDC serial port.
pub type SerialLink = StreamLink<Box<dyn SerialPort>>;

/// Find the serial port whose USB descriptor matches `vid:pid`.
pub fn find_device(vid: u16, pid: u16) -> Result<String> {
    let ports = serialport::available_ports()?;
    debug!(count = ports.len(), "scanned serial ports");
    ports
        .into_iter()
        .find_map(|p| match p.port_type {
            SerialPortType::UsbPort(usb) if usb.vid == vid && usb.pid == pid => Some(p.port_name),
            _ => None,
        })
        .ok_or(HwError::DeviceNotFound { vid, pid })
}

/// Open `path` and assert DTR; the firmware only greets once DTR is set.
pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<SerialLink> {
    let mut port = serialport::new(path, baud).timeout(timeout).open()?;
    port.write_data_terminal_ready(true)?;
    info!(port = path, baud, timeout_ms = timeout.as_millis() as u64, "serial port open");
    Ok(StreamLink::with_label(port, path))
}
