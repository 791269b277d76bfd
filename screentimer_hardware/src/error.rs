use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("serial port error: {0}")]
    Serial(String),
    #[error("device read timeout")]
    Timeout,
    #[error("device closed the stream before the expected data arrived")]
    UnexpectedEof,
    #[error("device line exceeds {limit} bytes without a terminator")]
    LineTooLong { limit: usize },
    #[error("link already closed")]
    Closed,
    #[error("no device with USB id {vid:04x}:{pid:04x} found")]
    DeviceNotFound { vid: u16, pid: u16 },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl HwError {
    /// Classify an I/O error from the underlying stream.
    pub fn from_io(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => HwError::Timeout,
            std::io::ErrorKind::UnexpectedEof => HwError::UnexpectedEof,
            _ => HwError::Io(e),
        }
    }
}

#[cfg(feature = "hardware")]
impl From<serialport::Error> for HwError {
    fn from(e: serialport::Error) -> Self {
        HwError::Serial(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
