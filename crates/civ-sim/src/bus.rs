//! Simulated CI-V bus
//!
//! [`SimulatedBus`] is a cheap handle onto shared bus state. Give one clone
//! to the code under test as its [`Transport`] (or [`PortOpener`]) and keep
//! another to inspect the rigs and script faults.
//!
//! Reads never block: an empty receive queue reads as a timeout right away,
//! so retry and timeout paths run at full speed in tests.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use civ_protocol::frame::{Frame, COLLISION, NAK, PREAMBLE, TERMINATOR};
use civ_protocol::{OperatingMode, Passband, PortOpener, Transport};
use tracing::{debug, trace};

use crate::radio::{SimulatedAccessory, SimulatedRig};

/// Scripted misbehaviour applied to one request frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The frame is lost; no device sees it and nothing answers
    Silence,
    /// The bus reports a collision instead of the reply
    Collision,
    /// A NAK comes back without the rig acting on the frame
    Nak,
    /// These bytes come back instead of the reply
    Reply(Vec<u8>),
    /// These bytes arrive ahead of the normal reply
    Interleave(Vec<u8>),
}

#[derive(Debug, Default)]
struct BusState {
    rigs: Vec<SimulatedRig>,
    accessories: Vec<SimulatedAccessory>,
    /// Line speed chosen by the last open; `None` lets every device hear
    baud_rate: Option<u32>,
    echo: bool,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    sent: Vec<Frame>,
    scheduled: BTreeMap<usize, Fault>,
    persistent: Option<Fault>,
    opened_rates: Vec<u32>,
}

impl BusState {
    /// Cut complete frames out of the transmit buffer and deliver them
    fn dispatch(&mut self) {
        while let Some(end) = self.tx.iter().position(|&b| b == TERMINATOR) {
            let raw: Vec<u8> = self.tx.drain(..=end).collect();
            // Wake-up runs of FE collapse into the preamble
            let start = raw.iter().position(|&b| b != PREAMBLE).unwrap_or(raw.len());
            if start < 2 {
                trace!("Dropping unframed bytes {:02X?}", raw);
                continue;
            }
            let mut bytes = vec![PREAMBLE, PREAMBLE];
            bytes.extend_from_slice(&raw[start..]);
            match Frame::from_bytes(bytes) {
                Ok(frame) => self.deliver(frame),
                Err(e) => debug!("Bus dropped bad frame: {}", e),
            }
        }
    }

    fn deliver(&mut self, frame: Frame) {
        let index = self.sent.len();
        self.sent.push(frame.clone());
        let fault = self.scheduled.remove(&index).or_else(|| self.persistent.clone());

        match fault {
            Some(Fault::Silence) => {
                debug!("Fault: frame {} lost", index);
                return;
            }
            Some(Fault::Collision) => {
                debug!("Fault: collision on frame {}", index);
                self.rx.extend([PREAMBLE, PREAMBLE, COLLISION]);
                return;
            }
            Some(Fault::Nak) => {
                debug!("Fault: NAK for frame {}", index);
                if let Ok(nak) = Frame::build_request(frame.src(), frame.dest(), NAK, None, &[]) {
                    self.rx.extend(nak.as_bytes());
                }
                return;
            }
            Some(Fault::Reply(bytes)) => {
                debug!("Fault: scripted reply to frame {}", index);
                self.rx.extend(bytes);
                return;
            }
            Some(Fault::Interleave(bytes)) => {
                debug!("Fault: {} bytes ahead of reply to frame {}", bytes.len(), index);
                self.rx.extend(bytes);
            }
            None => {}
        }

        let baud = self.baud_rate;
        let hears = |device_baud: u32| baud.map_or(true, |rate| rate == device_baud);
        let mut replies = Vec::new();
        for rig in &mut self.rigs {
            if hears(rig.baud_rate()) {
                replies.extend(rig.handle(&frame));
            }
        }
        for accessory in &self.accessories {
            if hears(accessory.baud_rate) {
                replies.extend(accessory.handle(&frame));
            }
        }
        for reply in replies {
            trace!("Bus reply {:02X?}", reply);
            self.rx.extend(reply);
        }
    }
}

/// Handle onto a simulated CI-V bus
#[derive(Debug, Clone, Default)]
pub struct SimulatedBus {
    state: Arc<Mutex<BusState>>,
}

impl SimulatedBus {
    /// Empty bus with no line speed chosen yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus with a single rig attached
    pub fn with_rig(rig: SimulatedRig) -> Self {
        let bus = Self::new();
        bus.add_rig(rig);
        bus
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_rig(&self, rig: SimulatedRig) {
        self.lock().rigs.push(rig);
    }

    pub fn add_accessory(&self, accessory: SimulatedAccessory) {
        self.lock().accessories.push(accessory);
    }

    /// Make the interface echo every written byte back, like a USB CI-V cable
    pub fn set_echo(&self, echo: bool) {
        self.lock().echo = echo;
    }

    /// Line speed selected by the last open
    pub fn baud_rate(&self) -> Option<u32> {
        self.lock().baud_rate
    }

    /// Every rate the bus was opened at, in order
    pub fn opened_rates(&self) -> Vec<u32> {
        self.lock().opened_rates.clone()
    }

    /// Read a rig's state
    pub fn inspect_rig<R>(&self, address: u8, f: impl FnOnce(&SimulatedRig) -> R) -> Option<R> {
        self.lock().rigs.iter().find(|r| r.address() == address).map(f)
    }

    /// Change a rig's state directly
    pub fn update_rig<R>(
        &self,
        address: u8,
        f: impl FnOnce(&mut SimulatedRig) -> R,
    ) -> Option<R> {
        self.lock()
            .rigs
            .iter_mut()
            .find(|r| r.address() == address)
            .map(f)
    }

    /// Frames written by the controller, in order
    pub fn sent_frames(&self) -> Vec<Frame> {
        self.lock().sent.clone()
    }

    /// Command byte and body of every frame written, in order
    pub fn sent_commands(&self) -> Vec<Vec<u8>> {
        self.lock()
            .sent
            .iter()
            .map(|f| {
                let mut entry = vec![f.cmd()];
                entry.extend_from_slice(f.body());
                entry
            })
            .collect()
    }

    /// Forget the sent-frame log; scheduled faults keep their relative position
    pub fn clear_sent(&self) {
        let mut state = self.lock();
        let shift = state.sent.len();
        state.scheduled = std::mem::take(&mut state.scheduled)
            .into_iter()
            .filter(|(index, _)| *index >= shift)
            .map(|(index, fault)| (index - shift, fault))
            .collect();
        state.sent.clear();
    }

    /// Apply `fault` to the `nth` frame written from now on (0 = the next one)
    pub fn schedule_fault(&self, nth: usize, fault: Fault) {
        let mut state = self.lock();
        let index = state.sent.len() + nth;
        state.scheduled.insert(index, fault);
    }

    /// Apply `fault` to every frame not covered by a scheduled fault
    pub fn set_persistent_fault(&self, fault: Option<Fault>) {
        self.lock().persistent = fault;
    }

    /// Put unsolicited bytes on the line
    pub fn inject(&self, bytes: &[u8]) {
        self.lock().rx.extend(bytes);
    }

    /// Bytes waiting to be read
    pub fn pending(&self) -> usize {
        self.lock().rx.len()
    }

    /// Turn a rig's dial; its announcement goes on the line when transceive is on
    pub fn front_panel_tune(&self, address: u8, hz: u64) {
        let mut state = self.lock();
        let announcement = state
            .rigs
            .iter_mut()
            .find(|r| r.address() == address)
            .and_then(|rig| rig.turn_dial(hz));
        state.rx.extend(announcement.into_iter().flatten());
    }

    /// Change a rig's mode from the front panel
    pub fn front_panel_mode(&self, address: u8, mode: OperatingMode, passband: Passband) {
        let mut state = self.lock();
        let announcement = state
            .rigs
            .iter_mut()
            .find(|r| r.address() == address)
            .and_then(|rig| rig.press_mode(mode, passband));
        state.rx.extend(announcement.into_iter().flatten());
    }
}

impl Transport for SimulatedBus {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        trace!("Bus tx {:02X?}", data);
        if state.echo {
            state.rx.extend(data);
        }
        state.tx.extend_from_slice(data);
        state.dispatch();
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        let mut state = self.lock();
        let n = buf.len().min(state.rx.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn flush_input(&mut self) -> io::Result<()> {
        self.lock().rx.clear();
        Ok(())
    }
}

impl PortOpener for SimulatedBus {
    type Port = SimulatedBus;

    fn open(&mut self, baud_rate: u32, _timeout: Duration) -> io::Result<SimulatedBus> {
        let mut state = self.lock();
        debug!("Simulated bus opened at {} baud", baud_rate);
        state.baud_rate = Some(baud_rate);
        state.opened_rates.push(baud_rate);
        state.rx.clear();
        state.tx.clear();
        drop(state);
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civ_protocol::frame::{FrameReader, ParsedFrame, CONTROLLER_ADDR};

    fn read_id(dest: u8) -> Vec<u8> {
        Frame::build_request(dest, CONTROLLER_ADDR, 0x19, Some(0x00), &[])
            .unwrap()
            .into_bytes()
    }

    fn next(bus: &mut SimulatedBus) -> ParsedFrame {
        FrameReader::new()
            .read_frame(bus, Duration::from_millis(1))
            .unwrap()
    }

    #[test]
    fn test_reply_routed_by_address() {
        let mut bus = SimulatedBus::with_rig(SimulatedRig::at(0x58, 9600));
        bus.write(&read_id(0x58)).unwrap();
        let ParsedFrame::Complete(reply) = next(&mut bus) else {
            panic!("expected reply");
        };
        assert_eq!(reply.body(), &[0x00, 0x58]);

        bus.write(&read_id(0x42)).unwrap();
        assert_eq!(next(&mut bus), ParsedFrame::Timeout);
    }

    #[test]
    fn test_wrong_baud_is_silent() {
        let mut opener = SimulatedBus::with_rig(SimulatedRig::at(0x58, 9600));
        let mut port = opener.open(19200, Duration::from_millis(1)).unwrap();
        port.write(&read_id(0x58)).unwrap();
        assert_eq!(next(&mut port), ParsedFrame::Timeout);
        assert_eq!(opener.opened_rates(), vec![19200]);
    }

    #[test]
    fn test_echo_precedes_reply() {
        let mut bus = SimulatedBus::with_rig(SimulatedRig::at(0x58, 9600));
        bus.set_echo(true);
        let request = read_id(0x58);
        bus.write(&request).unwrap();
        let mut reader = FrameReader::new();
        let echo = reader.read_frame(&mut bus, Duration::from_millis(1)).unwrap();
        assert_eq!(echo, ParsedFrame::Complete(Frame::from_bytes(request).unwrap()));
    }

    #[test]
    fn test_scheduled_faults() {
        let mut bus = SimulatedBus::with_rig(SimulatedRig::at(0x58, 9600));
        bus.schedule_fault(1, Fault::Collision);
        bus.write(&read_id(0x58)).unwrap();
        assert!(matches!(next(&mut bus), ParsedFrame::Complete(_)));
        bus.write(&read_id(0x58)).unwrap();
        assert!(matches!(next(&mut bus), ParsedFrame::Collision(_)));
        assert_eq!(bus.sent_frames().len(), 2);
    }

    #[test]
    fn test_wake_up_preamble_collapses() {
        let mut bus = SimulatedBus::with_rig(SimulatedRig::at(0x58, 9600));
        bus.write(&[PREAMBLE; 175]).unwrap();
        bus.write(&read_id(0x58)).unwrap();
        assert_eq!(bus.sent_commands(), vec![vec![0x19, 0x00]]);
    }
}
