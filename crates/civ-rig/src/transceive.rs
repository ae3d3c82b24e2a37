//! Transceive announcements
//!
//! With transceive enabled a radio broadcasts frequency (0x00) and mode
//! (0x01) changes made on its front panel. Nothing is sent back for them.
//! Announcements are picked up two ways: by polling the bus between
//! operations, or when they arrive in the middle of a transaction and the
//! engine sets them aside.

use std::time::Duration;

use civ_protocol::bcd::bcd_to_frequency;
use civ_protocol::command::cmd;
use civ_protocol::frame::ParsedFrame;
use civ_protocol::{Frame, ModeReport, Transport};
use tracing::{debug, warn};

use crate::error::{Result, RigError};
use crate::rig::Rig;

/// A change the radio announced on its own
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RigEvent {
    /// New frequency in Hz
    Frequency(u64),
    Mode(ModeReport),
}

/// Callback invoked for every decoded announcement
pub type EventCallback = Box<dyn FnMut(&RigEvent) + Send>;

impl<T: Transport> Rig<T> {
    /// Register a callback for announcements
    pub fn on_event(&mut self, callback: impl FnMut(&RigEvent) + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Wait up to `timeout` for one announcement.
    ///
    /// Returns `None` when the bus stays quiet. Decoded events also go to
    /// every registered callback.
    pub fn poll_event(&mut self, timeout: Duration) -> Result<Option<RigEvent>> {
        match self.engine.read_unsolicited(timeout)? {
            ParsedFrame::Complete(frame) => {
                let event = self.decode_announcement(&frame)?;
                self.emit(&event);
                Ok(Some(event))
            }
            ParsedFrame::Timeout => Ok(None),
            ParsedFrame::Collision(_) => Err(RigError::BusBusy),
            ParsedFrame::Malformed(reason) => Err(RigError::Protocol(reason)),
        }
    }

    /// Handle announcements until the bus is quiet for `timeout`, returning
    /// how many were delivered
    pub fn poll_events(&mut self, timeout: Duration) -> Result<usize> {
        let mut delivered = 0;
        while self.poll_event(timeout)?.is_some() {
            delivered += 1;
        }
        Ok(delivered)
    }

    fn decode_announcement(&self, frame: &Frame) -> Result<RigEvent> {
        if frame.src() != self.engine.radio_address() {
            return Err(RigError::Protocol(format!(
                "announcement from 0x{:02X}",
                frame.src()
            )));
        }
        let body = frame.body();
        match frame.cmd() {
            cmd::SEND_FREQ => {
                if body.len() != self.state.freq_width() {
                    return Err(RigError::Protocol(format!(
                        "frequency announcement is {} bytes",
                        body.len()
                    )));
                }
                Ok(RigEvent::Frequency(bcd_to_frequency(body)?))
            }
            cmd::SEND_MODE => {
                let (&code, rest) = body
                    .split_first()
                    .ok_or_else(|| RigError::Protocol("empty mode announcement".into()))?;
                let (mode, passband) = self
                    .caps
                    .mode_translation()
                    .decode(code, rest.first().copied())?;
                Ok(RigEvent::Mode(ModeReport {
                    mode,
                    passband,
                    width_hz: None,
                }))
            }
            other => {
                warn!("Unsolicited command 0x{:02X} ignored", other);
                Err(RigError::Unsupported(format!(
                    "unsolicited command 0x{:02X}",
                    other
                )))
            }
        }
    }

    fn emit(&mut self, event: &RigEvent) {
        debug!("Transceive event {:?}", event);
        for callback in &mut self.callbacks {
            callback(event);
        }
    }

    /// Deliver announcements the engine set aside during a transaction
    pub(crate) fn deliver_set_aside(&mut self) {
        for frame in self.engine.take_set_aside() {
            match self.decode_announcement(&frame) {
                Ok(event) => self.emit(&event),
                Err(e) => warn!("Dropping interleaved announcement: {}", e),
            }
        }
    }
}
