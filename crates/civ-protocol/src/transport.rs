//! Byte transport abstraction
//!
//! The CI-V bus is consumed as a plain duplex byte channel. Serial ports,
//! simulated buses and test doubles all implement [`Transport`]; discovery
//! code that has to reopen the line at different speeds goes through a
//! [`PortOpener`].

use std::io;
use std::time::Duration;

/// A blocking, half-duplex byte channel
pub trait Transport {
    /// Write all of `data` to the bus
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout`.
    ///
    /// Returns `Ok(0)` when nothing arrived in time.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Discard anything already received but not yet read
    fn flush_input(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).read(buf, timeout)
    }

    fn flush_input(&mut self) -> io::Result<()> {
        (**self).flush_input()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).read(buf, timeout)
    }

    fn flush_input(&mut self) -> io::Result<()> {
        (**self).flush_input()
    }
}

/// Opens a fresh transport at a given line speed.
///
/// The returned port is closed when dropped.
pub trait PortOpener {
    type Port: Transport;

    fn open(&mut self, baud_rate: u32, timeout: Duration) -> io::Result<Self::Port>;
}
