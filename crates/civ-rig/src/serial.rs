//! Serial-port transport
//!
//! Adapts a `serialport` port to [`Transport`] and opens ports at a
//! requested line speed through [`PortOpener`].

use std::io::{self, Read, Write};
use std::time::Duration;

use civ_protocol::{PortOpener, Transport};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, trace};

/// A CI-V line on a serial port (8N1, no flow control)
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open `path` at `baud_rate`
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> io::Result<Self> {
        debug!("Opening {} at {} baud", path, baud_rate);
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;
        Ok(Self { port })
    }

    /// Wrap an already open port
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        trace!("Serial tx {:02X?}", data);
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.port.set_timeout(timeout)?;
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn flush_input(&mut self) -> io::Result<()> {
        Ok(self.port.clear(ClearBuffer::Input)?)
    }
}

/// Opens one serial device at whatever speed is asked for
#[derive(Debug, Clone)]
pub struct SerialOpener {
    path: String,
}

impl SerialOpener {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl PortOpener for SerialOpener {
    type Port = SerialTransport;

    fn open(&mut self, baud_rate: u32, timeout: Duration) -> io::Result<SerialTransport> {
        SerialTransport::open(&self.path, baud_rate, timeout)
    }
}
