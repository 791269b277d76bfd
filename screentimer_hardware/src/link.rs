use std::io::{BufRead, BufReader, Read, Write};

use screentimer_traits::{DeviceLink, LinkError};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

/// Longest line the device is allowed to send, terminator included.
pub const MAX_LINE_LEN: usize = 256;

/// `DeviceLink` over any blocking byte stream.
///
/// Reads go through one shared buffer so line-framed and fixed-width reads
/// can be interleaved on the same stream without losing bytes.
pub struct StreamLink<T: Read + Write> {
    inner: Option<BufReader<T>>,
    label: String,
}

impl<T: Read + Write> StreamLink<T> {
    pub fn new(stream: T) -> Self {
        Self::with_label(stream, "stream")
    }

    pub fn with_label(stream: T, label: impl Into<String>) -> Self {
        Self {
            inner: Some(BufReader::new(stream)),
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrow the underlying stream while the link is open.
    pub fn get_ref(&self) -> Option<&T> {
        self.inner.as_ref().map(BufReader::get_ref)
    }

    fn stream(&mut self) -> Result<&mut BufReader<T>> {
        self.inner.as_mut().ok_or(HwError::Closed)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let writer = self.stream()?.get_mut();
        writer.write_all(bytes).map_err(HwError::from_io)?;
        writer.flush().map_err(HwError::from_io)?;
        trace!(len = bytes.len(), "link write");
        Ok(())
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream()?.read_exact(buf).map_err(HwError::from_io)
    }

    fn recv_line(&mut self) -> Result<Vec<u8>> {
        let reader = self.stream()?;
        let mut line = Vec::new();
        Read::take(&mut *reader, MAX_LINE_LEN as u64)
            .read_until(b'\n', &mut line)
            .map_err(HwError::from_io)?;
        match line.last() {
            Some(b'\n') => Ok(line),
            _ if line.len() >= MAX_LINE_LEN => Err(HwError::LineTooLong {
                limit: MAX_LINE_LEN,
            }),
            _ => Err(HwError::UnexpectedEof),
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(mut reader) = self.inner.take() else {
            return Ok(());
        };
        debug!(link = %self.label, "closing link");
        reader.get_mut().flush().map_err(HwError::from_io)
    }
}

impl<T: Read + Write> DeviceLink for StreamLink<T> {
    fn write_all(&mut self, bytes: &[u8]) -> std::result::Result<(), LinkError> {
        Ok(self.send(bytes)?)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> std::result::Result<(), LinkError> {
        Ok(self.recv_exact(buf)?)
    }

    fn read_line(&mut self) -> std::result::Result<Vec<u8>, LinkError> {
        Ok(self.recv_line()?)
    }

    fn close(&mut self) -> std::result::Result<(), LinkError> {
        Ok(self.shutdown()?)
    }
}
