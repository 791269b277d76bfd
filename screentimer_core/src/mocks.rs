//! Test and helper mocks for screentimer_core

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use screentimer_traits::{DeviceLink, LinkError};

/// A link that replays a fixed byte script and records everything written.
///
/// Once the script is exhausted reads fail with `on_empty` (end of stream by
/// default, or a timeout to mimic a silent serial device).
pub struct ScriptedLink {
    rx: VecDeque<u8>,
    on_empty: io::ErrorKind,
    probe: LinkProbe,
}

/// Shared view of a `ScriptedLink` that outlives the link itself.
#[derive(Clone, Default)]
pub struct LinkProbe {
    written: Rc<RefCell<Vec<u8>>>,
    closes: Rc<Cell<usize>>,
}

impl LinkProbe {
    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written.borrow()).into_owned()
    }

    pub fn is_closed(&self) -> bool {
        self.closes.get() > 0
    }

    pub fn close_calls(&self) -> usize {
        self.closes.get()
    }
}

impl ScriptedLink {
    pub fn new(script: impl AsRef<[u8]>) -> Self {
        Self {
            rx: script.as_ref().iter().copied().collect(),
            on_empty: io::ErrorKind::UnexpectedEof,
            probe: LinkProbe::default(),
        }
    }

    /// Fail exhausted reads with a timeout instead of end of stream.
    pub fn timing_out(mut self) -> Self {
        self.on_empty = io::ErrorKind::TimedOut;
        self
    }

    pub fn probe(&self) -> LinkProbe {
        self.probe.clone()
    }

    fn closed_error(&self) -> Result<(), LinkError> {
        if self.probe.is_closed() {
            Err(Box::new(io::Error::other("scripted link closed")))
        } else {
            Ok(())
        }
    }

    fn starved(&self) -> LinkError {
        Box::new(io::Error::new(self.on_empty, "script exhausted"))
    }
}

impl DeviceLink for ScriptedLink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.closed_error()?;
        self.probe.written.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), LinkError> {
        self.closed_error()?;
        let n = buf.len();
        if self.rx.len() < n {
            self.rx.clear();
            return Err(self.starved());
        }
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, LinkError> {
        self.closed_error()?;
        match self.rx.iter().position(|&b| b == b'\n') {
            Some(end) => Ok(self.rx.drain(..=end).collect()),
            None => {
                self.rx.clear();
                Err(self.starved())
            }
        }
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.probe.closes.set(self.probe.closes.get() + 1);
        Ok(())
    }
}

/// Build the byte stream of a complete measurement response.
pub fn measurement_script(variance: u16, frames: &[(u16, u16)], terminator: [u8; 4]) -> Vec<u8> {
    let mut out = b"MSTA\n".to_vec();
    out.extend(variance.to_be_bytes());
    for (d, v) in frames {
        out.extend(d.to_be_bytes());
        out.extend(v.to_be_bytes());
    }
    out.extend(terminator);
    out
}
