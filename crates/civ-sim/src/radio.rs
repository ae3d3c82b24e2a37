//! Simulated CI-V transceiver
//!
//! Answers request frames the way a real rig does: ACK or NAK for settings,
//! data replies echoing the command head for reads, silence for frames
//! addressed elsewhere. State changes are visible through accessors so
//! tests can check what the controller actually did.

use std::collections::{HashMap, HashSet};

use civ_protocol::bcd::{bcd_to_frequency, frequency_to_bcd};
use civ_protocol::command::{cmd, split_sub, sub, vfo_sub};
use civ_protocol::frame::{Frame, ACK, BROADCAST_ADDR, NAK};
use civ_protocol::{ModeTranslation, OperatingMode, Passband, Vfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// VFO arrangement of the simulated radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimTopology {
    /// VFO A and B
    #[default]
    AB,
    /// Main and Sub receivers
    MainSub,
    /// Main and Sub receivers, each with A and B
    Both,
}

impl SimTopology {
    fn has_a_b(self) -> bool {
        matches!(self, SimTopology::AB | SimTopology::Both)
    }

    fn has_main_sub(self) -> bool {
        matches!(self, SimTopology::MainSub | SimTopology::Both)
    }
}

/// Frequency and mode held by one VFO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfoState {
    pub frequency_hz: u64,
    pub mode: OperatingMode,
    pub passband: Passband,
}

/// Configuration for creating a simulated rig
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedRigConfig {
    /// Display name
    pub id: String,
    /// CI-V address the rig answers on
    pub address: u8,
    /// Identity byte returned by the read-id command
    pub identity: u8,
    /// Line speed the rig listens at
    pub baud_rate: u32,
    pub topology: SimTopology,
    pub initial_frequency_hz: u64,
    pub initial_mode: OperatingMode,
    /// 4-byte frequency fields and no filter byte
    pub legacy_freq_width: bool,
    /// Answer the read-id command; NAK it otherwise
    pub supports_read_id: bool,
    /// Announce front-panel changes on the bus
    pub transceive: bool,
    /// Memory-area data-mode flag, at this subcommand
    pub data_mode_subcmd: Option<u8>,
    /// DSP filter index reported at this memory-area subcommand
    pub filter_width: Option<(u8, u8)>,
}

impl Default for SimulatedRigConfig {
    fn default() -> Self {
        Self {
            id: "Simulated IC-706MKIIG".to_string(),
            address: 0x58,
            identity: 0x58,
            baud_rate: 9600,
            topology: SimTopology::AB,
            initial_frequency_hz: 14_250_000, // 20m
            initial_mode: OperatingMode::Usb,
            legacy_freq_width: false,
            supports_read_id: true,
            transceive: false,
            data_mode_subcmd: None,
            filter_width: None,
        }
    }
}

/// A simulated transceiver on the CI-V bus
#[derive(Debug)]
pub struct SimulatedRig {
    config: SimulatedRigConfig,
    vfos: HashMap<Vfo, VfoState>,
    current: Vfo,
    memory_mode: bool,
    split: bool,
    /// 0x10/0x11/0x12 once a duplex shift was set
    shift: u8,
    powered: bool,
    ptt: bool,
    tuner: bool,
    squelch_open: bool,
    tuning_step: u8,
    attenuator: u8,
    antenna: (u8, Option<u8>),
    offset: Vec<u8>,
    memory_channel: u16,
    bank: u8,
    scan: Option<u8>,
    morse: String,
    /// Settings stored by (cmd, subcmd): levels, meters, functions, tones
    settings: HashMap<(u8, u8), Vec<u8>>,
    rejected: HashSet<u8>,
    received: Vec<Vec<u8>>,
}

impl SimulatedRig {
    /// Create a rig from configuration
    pub fn new(config: SimulatedRigConfig) -> Self {
        let state = VfoState {
            frequency_hz: config.initial_frequency_hz,
            mode: config.initial_mode,
            passband: Passband::Normal,
        };
        let mut vfos = HashMap::new();
        if config.topology.has_a_b() {
            vfos.insert(Vfo::A, state);
            vfos.insert(Vfo::B, state);
        }
        if config.topology.has_main_sub() {
            vfos.insert(Vfo::Main, state);
            vfos.insert(Vfo::Sub, state);
        }
        let current = if config.topology == SimTopology::MainSub {
            Vfo::Main
        } else {
            Vfo::A
        };

        let mut settings = HashMap::new();
        if let Some(subcmd) = config.data_mode_subcmd {
            settings.insert((cmd::CTL_MEM, subcmd), vec![0x00, 0x00]);
        }
        if let Some((subcmd, index)) = config.filter_width {
            settings.insert((cmd::CTL_MEM, subcmd), vec![index]);
        }

        Self {
            config,
            vfos,
            current,
            memory_mode: false,
            split: false,
            shift: split_sub::OFF,
            powered: true,
            ptt: false,
            tuner: false,
            squelch_open: false,
            tuning_step: 0x00,
            attenuator: 0x00,
            antenna: (0x00, Some(0x00)),
            offset: vec![0x00, 0x00, 0x00],
            memory_channel: 1,
            bank: 0,
            scan: None,
            morse: String::new(),
            settings,
            rejected: HashSet::new(),
            received: Vec::new(),
        }
    }

    /// Create a rig with default settings at `address`
    pub fn at(address: u8, baud_rate: u32) -> Self {
        Self::new(SimulatedRigConfig {
            address,
            identity: address,
            baud_rate,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &SimulatedRigConfig {
        &self.config
    }

    pub fn address(&self) -> u8 {
        self.config.address
    }

    pub fn baud_rate(&self) -> u32 {
        self.config.baud_rate
    }

    /// VFO the rig is currently operating on
    pub fn current_vfo(&self) -> Vfo {
        self.current
    }

    pub fn vfo_state(&self, vfo: Vfo) -> Option<VfoState> {
        self.vfos.get(&vfo).copied()
    }

    /// Frequency of the current VFO
    pub fn frequency_hz(&self) -> u64 {
        self.active().frequency_hz
    }

    pub fn mode(&self) -> OperatingMode {
        self.active().mode
    }

    pub fn split(&self) -> bool {
        self.split
    }

    pub fn ptt(&self) -> bool {
        self.ptt
    }

    pub fn powered(&self) -> bool {
        self.powered
    }

    pub fn memory_mode(&self) -> bool {
        self.memory_mode
    }

    pub fn memory_channel(&self) -> u16 {
        self.memory_channel
    }

    pub fn bank(&self) -> u8 {
        self.bank
    }

    /// Scan subcommand last started, if any
    pub fn scan(&self) -> Option<u8> {
        self.scan
    }

    /// Text keyed by the last Morse command
    pub fn morse(&self) -> &str {
        &self.morse
    }

    pub fn tuner_running(&self) -> bool {
        self.tuner
    }

    /// Stored value of a level, function or tone setting
    pub fn setting(&self, cmd: u8, subcmd: u8) -> Option<&[u8]> {
        self.settings.get(&(cmd, subcmd)).map(Vec::as_slice)
    }

    /// Seed a setting, e.g. a meter reading
    pub fn set_setting(&mut self, cmd: u8, subcmd: u8, value: &[u8]) {
        self.settings.insert((cmd, subcmd), value.to_vec());
    }

    pub fn set_squelch_open(&mut self, open: bool) {
        self.squelch_open = open;
    }

    pub fn set_powered(&mut self, on: bool) {
        self.powered = on;
    }

    /// Answer every request carrying `cmd` with NAK
    pub fn reject_command(&mut self, cmd: u8) {
        self.rejected.insert(cmd);
    }

    /// Requests the rig handled, as command byte followed by the body
    pub fn received(&self) -> &[Vec<u8>] {
        &self.received
    }

    pub fn clear_received(&mut self) {
        self.received.clear();
    }

    /// Turn the dial on the front panel.
    ///
    /// Returns the frequency announcement when transceive is enabled.
    pub fn turn_dial(&mut self, hz: u64) -> Option<Vec<u8>> {
        self.active_mut().frequency_hz = hz;
        if !self.config.transceive {
            return None;
        }
        let payload = frequency_to_bcd(hz, self.freq_width()).ok()?;
        self.frame(BROADCAST_ADDR, cmd::SEND_FREQ, &payload)
    }

    /// Press a mode button on the front panel.
    ///
    /// Returns the mode announcement when transceive is enabled.
    pub fn press_mode(&mut self, mode: OperatingMode, passband: Passband) -> Option<Vec<u8>> {
        let state = self.active_mut();
        state.mode = mode;
        state.passband = passband;
        if !self.config.transceive {
            return None;
        }
        let payload = self.mode_payload()?;
        self.frame(BROADCAST_ADDR, cmd::SEND_MODE, &payload)
    }

    /// Handle a request frame, returning the reply bytes if the rig answers
    pub fn handle(&mut self, frame: &Frame) -> Option<Vec<u8>> {
        if frame.dest() != self.config.address {
            return None;
        }

        let mut entry = vec![frame.cmd()];
        entry.extend_from_slice(frame.body());
        trace!("{} received {:02X?}", self.config.id, entry);

        if !self.powered && frame.cmd() != cmd::POWER {
            debug!("{} is powered off, ignoring 0x{:02X}", self.config.id, frame.cmd());
            return None;
        }
        self.received.push(entry);

        let to = frame.src();
        if self.rejected.contains(&frame.cmd()) {
            return self.nak(to);
        }

        let body = frame.body();
        match frame.cmd() {
            cmd::READ_FREQ => {
                let payload = frequency_to_bcd(self.frequency_hz(), self.freq_width()).ok()?;
                self.data(to, cmd::READ_FREQ, &payload)
            }
            cmd::SET_FREQ => match bcd_to_frequency(body) {
                Ok(hz) if body.len() == self.freq_width() => {
                    self.active_mut().frequency_hz = hz;
                    self.ack(to)
                }
                _ => self.nak(to),
            },
            cmd::READ_MODE => {
                let payload = self.mode_payload()?;
                self.data(to, cmd::READ_MODE, &payload)
            }
            cmd::SET_MODE => self.set_mode(to, body),
            cmd::SET_VFO => self.set_vfo(to, body),
            cmd::SPLIT => self.split_command(to, body),
            cmd::SET_MEM => self.set_mem(to, body),
            cmd::WRITE_MEM | cmd::MEM_TO_VFO | cmd::CLEAR_MEM => self.ack(to),
            cmd::READ_OFFSET => {
                let offset = self.offset.clone();
                self.data(to, cmd::READ_OFFSET, &offset)
            }
            cmd::SET_OFFSET => {
                self.offset = body.to_vec();
                self.ack(to)
            }
            cmd::SCAN => match body.first() {
                Some(&code) => {
                    self.scan = (code != 0x00).then_some(code);
                    self.ack(to)
                }
                None => self.nak(to),
            },
            cmd::TUNING_STEP => match body.first() {
                Some(&code) => {
                    self.tuning_step = code;
                    self.ack(to)
                }
                None => self.data(to, cmd::TUNING_STEP, &[self.tuning_step]),
            },
            cmd::ATTENUATOR => match body.first() {
                Some(&db) => {
                    self.attenuator = db;
                    self.ack(to)
                }
                None => self.data(to, cmd::ATTENUATOR, &[self.attenuator]),
            },
            cmd::ANTENNA => match body.split_first() {
                Some((&ant, rest)) => {
                    self.antenna = (ant, rest.first().copied());
                    self.ack(to)
                }
                None => {
                    let mut payload = vec![self.antenna.0];
                    payload.extend(self.antenna.1);
                    self.data(to, cmd::ANTENNA, &payload)
                }
            },
            cmd::READ_METER => match body {
                [sub::SQUELCH_STATUS] => {
                    let open = u8::from(self.squelch_open);
                    self.data(to, cmd::READ_METER, &[sub::SQUELCH_STATUS, open])
                }
                [meter] => {
                    let value = self.settings.get(&(cmd::READ_METER, *meter)).cloned();
                    let mut payload = vec![*meter];
                    payload.extend(value.unwrap_or_else(|| vec![0x00, 0x00]));
                    self.data(to, cmd::READ_METER, &payload)
                }
                _ => self.nak(to),
            },
            cmd::LEVEL => self.stored(to, cmd::LEVEL, body, Some(&[0x00, 0x00])),
            cmd::FUNC => self.stored(to, cmd::FUNC, body, Some(&[0x00])),
            cmd::TONE => self.stored(to, cmd::TONE, body, Some(&[0x00, 0x08, 0x85])),
            cmd::CTL_MEM => self.stored(to, cmd::CTL_MEM, body, None),
            cmd::SEND_CW => {
                self.morse = String::from_utf8_lossy(body).into_owned();
                self.ack(to)
            }
            cmd::POWER => match body {
                [] => self.data(to, cmd::POWER, &[u8::from(self.powered)]),
                [state] => {
                    self.powered = *state == sub::POWER_ON;
                    self.ack(to)
                }
                _ => self.nak(to),
            },
            cmd::READ_ID if body == [sub::READ_ID] && self.config.supports_read_id => {
                let identity = self.config.identity;
                self.data(to, cmd::READ_ID, &[sub::READ_ID, identity])
            }
            cmd::PTT => match body {
                [sub::PTT] => self.data(to, cmd::PTT, &[sub::PTT, u8::from(self.ptt)]),
                [sub::PTT, state] => {
                    self.ptt = *state == 0x01;
                    self.ack(to)
                }
                [sub::ANTENNA_TUNER, ..] => {
                    self.tuner = body.get(1) == Some(&0x02);
                    self.ack(to)
                }
                _ => self.nak(to),
            },
            cmd::RIT => self.stored(to, cmd::RIT, body, Some(&[0x00])),
            other => {
                debug!("{} has no handler for 0x{:02X}", self.config.id, other);
                self.nak(to)
            }
        }
    }

    fn freq_width(&self) -> usize {
        if self.config.legacy_freq_width {
            4
        } else {
            5
        }
    }

    fn translation(&self) -> ModeTranslation {
        if self.config.legacy_freq_width {
            ModeTranslation::Legacy
        } else {
            ModeTranslation::Standard
        }
    }

    fn active(&self) -> VfoState {
        self.vfos.get(&self.current).copied().unwrap_or(VfoState {
            frequency_hz: self.config.initial_frequency_hz,
            mode: self.config.initial_mode,
            passband: Passband::Normal,
        })
    }

    fn active_mut(&mut self) -> &mut VfoState {
        let fallback = self.active();
        self.vfos.entry(self.current).or_insert(fallback)
    }

    fn mode_payload(&self) -> Option<Vec<u8>> {
        let state = self.active();
        let code = self.translation().encode(state.mode.base())?;
        let mut payload = vec![code];
        if self.translation().sends_passband() {
            payload.push(state.passband.code());
        }
        Some(payload)
    }

    fn set_mode(&mut self, to: u8, body: &[u8]) -> Option<Vec<u8>> {
        let Some((&code, rest)) = body.split_first() else {
            return self.nak(to);
        };
        match self.translation().decode(code, rest.first().copied()) {
            Ok((mode, passband)) => {
                let state = self.active_mut();
                state.mode = mode;
                state.passband = passband;
                self.ack(to)
            }
            Err(_) => self.nak(to),
        }
    }

    fn set_vfo(&mut self, to: u8, body: &[u8]) -> Option<Vec<u8>> {
        let topology = self.config.topology;
        let selected = match body {
            [] => {
                self.memory_mode = false;
                return self.ack(to);
            }
            [vfo_sub::VFO_A] if topology.has_a_b() => Vfo::A,
            [vfo_sub::VFO_B] if topology.has_a_b() => Vfo::B,
            [vfo_sub::MAIN] if topology.has_main_sub() => Vfo::Main,
            [vfo_sub::SUB] if topology.has_main_sub() => Vfo::Sub,
            [vfo_sub::EXCHANGE] => {
                let (x, y) = self.pair();
                self.swap(x, y);
                return self.ack(to);
            }
            [vfo_sub::B_TO_A] if topology.has_a_b() => {
                self.copy(Vfo::B, Vfo::A);
                return self.ack(to);
            }
            [vfo_sub::SUB_TO_MAIN] if topology.has_main_sub() => {
                self.copy(Vfo::Sub, Vfo::Main);
                return self.ack(to);
            }
            _ => return self.nak(to),
        };
        debug!("{} selected {}", self.config.id, selected);
        self.current = selected;
        self.memory_mode = false;
        self.ack(to)
    }

    /// VFO pair the exchange operation swaps
    fn pair(&self) -> (Vfo, Vfo) {
        match self.current {
            Vfo::Main | Vfo::Sub => (Vfo::Main, Vfo::Sub),
            _ if self.config.topology == SimTopology::MainSub => (Vfo::Main, Vfo::Sub),
            _ => (Vfo::A, Vfo::B),
        }
    }

    fn swap(&mut self, x: Vfo, y: Vfo) {
        let (Some(a), Some(b)) = (self.vfos.get(&x).copied(), self.vfos.get(&y).copied()) else {
            return;
        };
        self.vfos.insert(x, b);
        self.vfos.insert(y, a);
    }

    fn copy(&mut self, from: Vfo, to: Vfo) {
        if let Some(state) = self.vfos.get(&from).copied() {
            self.vfos.insert(to, state);
        }
    }

    fn split_command(&mut self, to: u8, body: &[u8]) -> Option<Vec<u8>> {
        match body {
            [] => {
                let state = if self.split { split_sub::ON } else { self.shift };
                self.data(to, cmd::SPLIT, &[state])
            }
            [split_sub::OFF] => {
                self.split = false;
                self.ack(to)
            }
            [split_sub::ON] => {
                self.split = true;
                self.ack(to)
            }
            [code @ (split_sub::SIMPLEX | split_sub::DUPLEX_MINUS | split_sub::DUPLEX_PLUS)] => {
                self.shift = *code;
                self.ack(to)
            }
            _ => self.nak(to),
        }
    }

    fn set_mem(&mut self, to: u8, body: &[u8]) -> Option<Vec<u8>> {
        match body {
            [] => {
                self.memory_mode = true;
                self.ack(to)
            }
            [sub::BANK, bank] => {
                self.bank = *bank;
                self.ack(to)
            }
            [hi, lo] => {
                self.memory_channel = bcd_pair(*hi) * 100 + bcd_pair(*lo);
                self.ack(to)
            }
            [ch] => {
                self.memory_channel = bcd_pair(*ch);
                self.ack(to)
            }
            _ => self.nak(to),
        }
    }

    /// Generic (cmd, subcmd) store: one byte reads, more bytes write
    fn stored(&mut self, to: u8, command: u8, body: &[u8], default: Option<&[u8]>) -> Option<Vec<u8>> {
        match body.split_first() {
            None => self.nak(to),
            Some((&subcmd, [])) => {
                let value = match self.settings.get(&(command, subcmd)) {
                    Some(value) => value.clone(),
                    None => match default {
                        Some(value) => value.to_vec(),
                        None => return self.nak(to),
                    },
                };
                let mut payload = vec![subcmd];
                payload.extend(value);
                self.data(to, command, &payload)
            }
            Some((&subcmd, value)) => {
                self.settings.insert((command, subcmd), value.to_vec());
                self.ack(to)
            }
        }
    }

    fn frame(&self, to: u8, command: u8, payload: &[u8]) -> Option<Vec<u8>> {
        Frame::build_request(to, self.config.address, command, None, payload)
            .ok()
            .map(Frame::into_bytes)
    }

    fn data(&self, to: u8, command: u8, payload: &[u8]) -> Option<Vec<u8>> {
        self.frame(to, command, payload)
    }

    fn ack(&self, to: u8) -> Option<Vec<u8>> {
        self.frame(to, ACK, &[])
    }

    fn nak(&self, to: u8) -> Option<Vec<u8>> {
        self.frame(to, NAK, &[])
    }
}

fn bcd_pair(byte: u8) -> u16 {
    u16::from(byte >> 4) * 10 + u16::from(byte & 0x0F)
}

/// A signal-processing accessory answering the accessory identification command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedAccessory {
    pub address: u8,
    pub baud_rate: u32,
    /// 3-character model name, e.g. "535"
    pub name: String,
    /// Software version as one BCD byte (0x12 = 1.2)
    pub software_version: u8,
    /// Interface version as one BCD byte
    pub interface_version: u8,
}

impl SimulatedAccessory {
    pub fn new(address: u8, baud_rate: u32, name: &str) -> Self {
        Self {
            address,
            baud_rate,
            name: name.to_string(),
            software_version: 0x10,
            interface_version: 0x20,
        }
    }

    pub fn handle(&self, frame: &Frame) -> Option<Vec<u8>> {
        if frame.dest() != self.address
            || frame.cmd() != cmd::MISC
            || frame.body() != [sub::OPTO_READ_ID]
        {
            return None;
        }
        let mut payload = vec![sub::OPTO_READ_ID];
        payload.extend(self.name.bytes().take(3));
        payload.push(self.software_version);
        payload.push(self.interface_version);
        Frame::build_request(frame.src(), self.address, cmd::MISC, None, &payload)
            .ok()
            .map(Frame::into_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civ_protocol::frame::{parse_frame, ParsedFrame, CONTROLLER_ADDR};

    fn request(dest: u8, cmd: u8, body: &[u8]) -> Frame {
        Frame::build_request(dest, CONTROLLER_ADDR, cmd, None, body).unwrap()
    }

    fn reply(bytes: Option<Vec<u8>>) -> Frame {
        match parse_frame(&bytes.expect("rig did not answer")) {
            ParsedFrame::Complete(frame) => frame,
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_read_frequency() {
        let mut rig = SimulatedRig::at(0x58, 9600);
        let frame = reply(rig.handle(&request(0x58, cmd::READ_FREQ, &[])));
        // FE FE E0 58 03 00 00 25 14 00 FD
        assert_eq!(
            frame.as_bytes(),
            &[0xFE, 0xFE, 0xE0, 0x58, 0x03, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD]
        );
    }

    #[test]
    fn test_ignores_other_addresses() {
        let mut rig = SimulatedRig::at(0x58, 9600);
        assert!(rig.handle(&request(0x94, cmd::READ_FREQ, &[])).is_none());
        assert!(rig.received().is_empty());
    }

    #[test]
    fn test_select_and_exchange() {
        let mut rig = SimulatedRig::at(0x58, 9600);
        assert!(reply(rig.handle(&request(0x58, cmd::SET_VFO, &[0x01]))).is_ack());
        assert_eq!(rig.current_vfo(), Vfo::B);
        rig.turn_dial(7_074_000);

        assert!(reply(rig.handle(&request(0x58, cmd::SET_VFO, &[0xB0]))).is_ack());
        assert_eq!(rig.vfo_state(Vfo::A).unwrap().frequency_hz, 7_074_000);
        assert_eq!(rig.vfo_state(Vfo::B).unwrap().frequency_hz, 14_250_000);
    }

    #[test]
    fn test_main_sub_rejected_on_ab_rig() {
        let mut rig = SimulatedRig::at(0x58, 9600);
        assert!(reply(rig.handle(&request(0x58, cmd::SET_VFO, &[0xD0]))).is_nak());
    }

    #[test]
    fn test_read_id_nak_when_unsupported() {
        let mut rig = SimulatedRig::new(SimulatedRigConfig {
            supports_read_id: false,
            ..Default::default()
        });
        assert!(reply(rig.handle(&request(0x58, cmd::READ_ID, &[0x00]))).is_nak());
    }

    #[test]
    fn test_level_store() {
        let mut rig = SimulatedRig::at(0x58, 9600);
        assert!(reply(rig.handle(&request(0x58, cmd::LEVEL, &[0x01, 0x01, 0x28]))).is_ack());
        let frame = reply(rig.handle(&request(0x58, cmd::LEVEL, &[0x01])));
        assert_eq!(frame.body(), &[0x01, 0x01, 0x28]);
    }

    #[test]
    fn test_transceive_announcement() {
        let mut rig = SimulatedRig::new(SimulatedRigConfig {
            transceive: true,
            ..Default::default()
        });
        let frame = reply(rig.turn_dial(7_074_000));
        assert_eq!(frame.dest(), BROADCAST_ADDR);
        assert_eq!(frame.cmd(), cmd::SEND_FREQ);
    }

    #[test]
    fn test_accessory_identity() {
        let opto = SimulatedAccessory::new(0x80, 9600, "535");
        let frame = reply(opto.handle(&request(0x80, cmd::MISC, &[0x09])));
        assert_eq!(frame.body(), &[0x09, b'5', b'3', b'5', 0x10, 0x20]);
    }
}
