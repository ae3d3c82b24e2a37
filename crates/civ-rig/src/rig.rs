//! Rig sessions
//!
//! A [`Rig`] owns the transport (through its [`TransactionEngine`]), the
//! capability descriptor it was opened with, the session state and the
//! transceive callbacks. Every operation is a method on the session, so
//! state never leaks between radios.
//!
//! VFO selection and split access live in [`crate::vfo`], unsolicited
//! announcements in [`crate::transceive`].

use std::time::Duration;

use civ_protocol::bcd::{
    bcd_to_frequency, decode_bcd, encode_bcd, frequency_to_bcd, from_bcd_byte, to_bcd_byte,
    Endianness,
};
use civ_protocol::command::{cmd, scan_sub, split_sub, sub, tone_sub, vfo_sub};
use civ_protocol::frame::{BROADCAST_ADDR, PREAMBLE};
use civ_protocol::level::{func_entry, level_entry};
use civ_protocol::{
    FilterDecoding, Func, Level, LevelValue, ModeReport, OperatingMode, Passband, RepeaterShift,
    RigCaps, ScanKind, Transport, Vfo, VfoOp,
};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, RigError};
use crate::levels::{decode_level, encode_level};
use crate::session::{SessionState, VfoTopology};
use crate::transaction::{EchoMode, Reply, ReplyShape, TransactionEngine};
use crate::transceive::EventCallback;

/// Wake-up bytes sent ahead of the power-on command
const WAKE_UP_PREAMBLE_LEN: usize = 175;

/// Longest Morse message the radio buffers
const MAX_MORSE_LEN: usize = 30;

/// Largest RIT/XIT offset in Hz
const MAX_RIT_HZ: u32 = 9_999;

/// A control session with one radio
pub struct Rig<T> {
    pub(crate) engine: TransactionEngine<T>,
    pub(crate) caps: RigCaps,
    pub(crate) state: SessionState,
    config: SessionConfig,
    pub(crate) callbacks: Vec<EventCallback>,
}

impl<T: Transport> Rig<T> {
    /// Open a session over `transport`.
    ///
    /// The radio address comes from the config, falling back to the
    /// descriptor default. When the descriptor asks for it and the config
    /// does not force a policy, the interface is probed for local echo.
    pub fn open(transport: T, caps: RigCaps, config: SessionConfig) -> Result<Self> {
        let address = config.civ_address.unwrap_or(caps.default_address);
        if address == BROADCAST_ADDR || address == config.controller_address {
            return Err(RigError::InvalidArgument(format!(
                "0x{:02X} cannot be a radio address",
                address
            )));
        }

        let mut engine = TransactionEngine::new(transport, address, &config);
        let mut state = SessionState::new(&caps, &config);
        state.echo = match config.echo {
            Some(true) => EchoMode::Echo,
            Some(false) => EchoMode::NoEcho,
            None if caps.echo_check => engine.detect_echo(),
            None => EchoMode::NoEcho,
        };
        if state.topology == VfoTopology::Unknown {
            warn!("{} has no VFO pair; split access is unavailable", caps.model);
        }

        info!(
            "Opened {} at CI-V 0x{:02X} ({:?}, {:?}, {}-byte frequencies)",
            caps.model,
            address,
            state.topology,
            state.echo,
            state.freq_width()
        );

        Ok(Self {
            engine,
            caps,
            state,
            config,
            callbacks: Vec::new(),
        })
    }

    /// Close the session and hand back the transport
    pub fn close(self) -> T {
        debug!("Closing session with {}", self.caps.model);
        self.engine.into_transport()
    }

    pub fn caps(&self) -> &RigCaps {
        &self.caps
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn address(&self) -> u8 {
        self.engine.radio_address()
    }

    pub fn transport(&self) -> &T {
        self.engine.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.engine.transport_mut()
    }

    /// Run one transaction, then hand any announcements it set aside to
    /// the callbacks
    pub(crate) fn transact(
        &mut self,
        cmd: u8,
        subcmd: Option<u8>,
        payload: &[u8],
        shape: ReplyShape,
    ) -> Result<Reply> {
        let result = self
            .engine
            .execute(self.state.echo, cmd, subcmd, payload, shape);
        self.deliver_set_aside();
        result
    }

    /// Setting: expects an ACK
    pub(crate) fn command(&mut self, cmd: u8, subcmd: Option<u8>, payload: &[u8]) -> Result<()> {
        self.transact(cmd, subcmd, payload, ReplyShape::Ack).map(|_| ())
    }

    /// Read: expects data, returns the bytes after the command head
    pub(crate) fn query(&mut self, cmd: u8, subcmd: Option<u8>, payload: &[u8]) -> Result<Vec<u8>> {
        self.transact(cmd, subcmd, payload, ReplyShape::Data)?
            .into_payload()
    }

    // Frequency and mode

    /// Tune `vfo` to `hz`
    pub fn set_freq(&mut self, vfo: Vfo, hz: u64) -> Result<()> {
        self.select_vfo(vfo)?;
        self.write_freq(hz)
    }

    /// Frequency of `vfo` in Hz. A blank memory channel reads as 0.
    pub fn get_freq(&mut self, vfo: Vfo) -> Result<u64> {
        self.select_vfo(vfo)?;
        self.read_freq()
    }

    /// Set the mode and passband of `vfo`
    pub fn set_mode(&mut self, vfo: Vfo, mode: OperatingMode, passband: Passband) -> Result<()> {
        self.select_vfo(vfo)?;
        self.write_mode(mode, passband)
    }

    pub fn get_mode(&mut self, vfo: Vfo) -> Result<ModeReport> {
        self.select_vfo(vfo)?;
        self.read_mode()
    }

    /// Set frequency on whatever VFO is selected
    pub(crate) fn write_freq(&mut self, hz: u64) -> Result<()> {
        let payload = frequency_to_bcd(hz, self.state.freq_width())
            .map_err(|e| RigError::InvalidArgument(e.to_string()))?;
        self.command(cmd::SET_FREQ, None, &payload)
    }

    pub(crate) fn read_freq(&mut self) -> Result<u64> {
        let payload = self.query(cmd::READ_FREQ, None, &[])?;
        if payload == [0xFF] {
            debug!("Blank memory channel");
            return Ok(0);
        }
        if payload.len() != self.state.freq_width() {
            return Err(RigError::Protocol(format!(
                "frequency reply is {} bytes, expected {}",
                payload.len(),
                self.state.freq_width()
            )));
        }
        Ok(bcd_to_frequency(&payload)?)
    }

    pub(crate) fn write_mode(&mut self, mode: OperatingMode, passband: Passband) -> Result<()> {
        if mode.is_data() && !self.caps.has_data_mode {
            return Err(RigError::InvalidArgument(format!(
                "{} has no data modes",
                self.caps.model
            )));
        }
        let translation = self.caps.mode_translation();
        let code = translation.encode(mode.base()).ok_or_else(|| {
            RigError::InvalidArgument(format!("{} not available on {}", mode, self.caps.model))
        })?;

        let mut payload = vec![code];
        if translation.sends_passband() && !self.state.legacy_freq_width {
            payload.push(passband.code());
        }
        self.command(cmd::SET_MODE, None, &payload)?;

        if self.caps.has_data_mode {
            let flag = if mode.is_data() {
                [0x01, passband.code()]
            } else {
                [0x00, 0x00]
            };
            self.command(cmd::CTL_MEM, Some(self.caps.data_mode_subcmd()), &flag)?;
        }
        Ok(())
    }

    pub(crate) fn read_mode(&mut self) -> Result<ModeReport> {
        let payload = self.query(cmd::READ_MODE, None, &[])?;
        let (&code, rest) = payload
            .split_first()
            .ok_or_else(|| RigError::Protocol("empty mode reply".into()))?;
        let (mut mode, passband) = self
            .caps
            .mode_translation()
            .decode(code, rest.first().copied())?;

        if self.caps.has_data_mode {
            let data = self.query(cmd::CTL_MEM, Some(self.caps.data_mode_subcmd()), &[])?;
            if data.first() == Some(&0x01) {
                mode = mode.with_data().unwrap_or(mode);
            }
        }

        let width_hz = self.read_filter_width(mode)?;
        Ok(ModeReport {
            mode,
            passband,
            width_hz,
        })
    }

    /// DSP filter width, where the radio reports one
    fn read_filter_width(&mut self, mode: OperatingMode) -> Result<Option<u32>> {
        let decoding = self.caps.filter_decoding();
        if decoding != FilterDecoding::Dsp || self.state.filter_query_disabled {
            return Ok(None);
        }
        match self.query(cmd::CTL_MEM, Some(self.caps.filter_width_subcmd()), &[]) {
            Ok(payload) => {
                let &index = payload
                    .first()
                    .ok_or_else(|| RigError::Protocol("empty filter width reply".into()))?;
                let index = from_bcd_byte(index)?;
                Ok(decoding.width_hz(mode, u32::from(index)))
            }
            Err(RigError::Rejected { .. }) => {
                warn!("Filter width query rejected, not asking again this session");
                self.state.filter_query_disabled = true;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // VFO and memory operations

    pub fn vfo_op(&mut self, op: VfoOp) -> Result<()> {
        match op {
            VfoOp::Copy => {
                let subcmd = if self.caps.vfos.has_a_b() {
                    vfo_sub::B_TO_A
                } else if self.caps.vfos.has_main_sub() {
                    vfo_sub::SUB_TO_MAIN
                } else {
                    return Err(RigError::Unsupported(format!(
                        "{} has no VFO pair to copy",
                        self.caps.model
                    )));
                };
                self.command(cmd::SET_VFO, Some(subcmd), &[])
            }
            VfoOp::Exchange => {
                if !self.caps.has_exchange {
                    return Err(RigError::Unsupported(format!(
                        "{} cannot exchange VFOs",
                        self.caps.model
                    )));
                }
                self.command(cmd::SET_VFO, Some(vfo_sub::EXCHANGE), &[])
            }
            VfoOp::FromVfo => self.command(cmd::WRITE_MEM, None, &[]),
            VfoOp::ToVfo => self.command(cmd::MEM_TO_VFO, None, &[]),
            VfoOp::MemoryClear => self.command(cmd::CLEAR_MEM, None, &[]),
            VfoOp::Tune => self.command(cmd::PTT, Some(sub::ANTENNA_TUNER), &[0x02]),
        }
    }

    /// Select memory channel `channel` (0-9999)
    pub fn set_mem(&mut self, channel: u16) -> Result<()> {
        let digits = if channel < 100 { 2 } else { 4 };
        let payload = encode_bcd(u64::from(channel), digits, Endianness::Big)
            .map_err(|e| RigError::InvalidArgument(e.to_string()))?;
        self.command(cmd::SET_MEM, None, &payload)
    }

    pub fn set_bank(&mut self, bank: u8) -> Result<()> {
        let bank = to_bcd_byte(bank).map_err(|e| RigError::InvalidArgument(e.to_string()))?;
        self.command(cmd::SET_MEM, Some(sub::BANK), &[bank])
    }

    /// Start or stop a scan. `channel` is used by priority and programmed scans.
    pub fn scan(&mut self, kind: ScanKind, channel: u16) -> Result<()> {
        let subcmd = match kind {
            ScanKind::Stop => scan_sub::STOP,
            ScanKind::Memory => {
                self.select_vfo(Vfo::Memory)?;
                if self.caps.is_receiver {
                    scan_sub::MEMORY
                } else {
                    scan_sub::START
                }
            }
            ScanKind::Select => {
                self.select_vfo(Vfo::Memory)?;
                scan_sub::START
            }
            ScanKind::Priority | ScanKind::Programmed => {
                self.set_mem(channel)?;
                self.select_vfo(Vfo::Vfo)?;
                scan_sub::START
            }
            ScanKind::Delta => scan_sub::DELTA,
        };
        self.command(cmd::SCAN, Some(subcmd), &[])
    }

    // Levels and functions

    pub fn set_level(&mut self, level: Level, value: LevelValue) -> Result<()> {
        let entry = level_entry(self.caps.level_overrides, level)
            .ok_or_else(|| RigError::Unsupported(format!("level {:?}", level)))?;
        let payload = encode_level(&self.caps, &entry, value)?;
        debug!("Set {:?} to {:?} ({:02X?})", level, value, payload);
        self.command(entry.cmd, entry.subcmd, &payload)
    }

    pub fn get_level(&mut self, level: Level) -> Result<LevelValue> {
        let entry = level_entry(self.caps.level_overrides, level)
            .ok_or_else(|| RigError::Unsupported(format!("level {:?}", level)))?;
        let payload = self.query(entry.cmd, entry.subcmd, &[])?;
        decode_level(&self.caps, &entry, &payload)
    }

    pub fn set_func(&mut self, func: Func, on: bool) -> Result<()> {
        let entry = self.func_row(func)?;
        let value = if on { entry.on_value } else { 0x00 };
        self.command(entry.cmd, Some(entry.subcmd), &[value])
    }

    pub fn get_func(&mut self, func: Func) -> Result<bool> {
        let entry = self.func_row(func)?;
        let payload = self.query(entry.cmd, Some(entry.subcmd), &[])?;
        let &value = payload
            .first()
            .ok_or_else(|| RigError::Protocol(format!("empty {:?} reply", func)))?;
        Ok(value == entry.on_value)
    }

    fn func_row(&self, func: Func) -> Result<&'static civ_protocol::level::FuncEntry> {
        if func == Func::Xit && !self.caps.has_xit {
            return Err(RigError::Unsupported(format!("{} has no XIT", self.caps.model)));
        }
        func_entry(func).ok_or_else(|| RigError::Unsupported(format!("function {:?}", func)))
    }

    /// Squelch open
    pub fn get_dcd(&mut self) -> Result<bool> {
        let payload = self.query(cmd::READ_METER, Some(sub::SQUELCH_STATUS), &[])?;
        match payload.as_slice() {
            [flag] => Ok(*flag == 0x01),
            other => Err(RigError::Protocol(format!("squelch status {:02X?}", other))),
        }
    }

    pub fn set_ptt(&mut self, on: bool) -> Result<()> {
        if self.caps.is_receiver {
            return Err(RigError::Unsupported(format!("{} cannot transmit", self.caps.model)));
        }
        self.command(cmd::PTT, Some(sub::PTT), &[u8::from(on)])
    }

    pub fn get_ptt(&mut self) -> Result<bool> {
        let payload = self.query(cmd::PTT, Some(sub::PTT), &[])?;
        match payload.as_slice() {
            [state] => Ok(*state == 0x01),
            other => Err(RigError::Protocol(format!("PTT state {:02X?}", other))),
        }
    }

    // RIT / XIT

    /// Set the RIT offset; zero switches the offset functions off
    pub fn set_rit(&mut self, hz: i32) -> Result<()> {
        self.write_offset(Func::Rit, hz)
    }

    /// Set the XIT offset; zero switches the offset functions off
    pub fn set_xit(&mut self, hz: i32) -> Result<()> {
        if !self.caps.has_xit {
            return Err(RigError::Unsupported(format!("{} has no XIT", self.caps.model)));
        }
        self.write_offset(Func::Xit, hz)
    }

    pub fn get_rit(&mut self) -> Result<i32> {
        let payload = self.query(cmd::RIT, Some(sub::RIT_FREQ), &[])?;
        let [lo, hi, sign] = payload.as_slice() else {
            return Err(RigError::Protocol(format!("RIT reply {:02X?}", payload)));
        };
        let magnitude = decode_bcd(&[*lo, *hi], 4, Endianness::Little)? as i32;
        Ok(if *sign != 0 { -magnitude } else { magnitude })
    }

    /// RIT and XIT share one offset register
    fn write_offset(&mut self, func: Func, hz: i32) -> Result<()> {
        let magnitude = hz.unsigned_abs();
        if magnitude > MAX_RIT_HZ {
            return Err(RigError::InvalidArgument(format!(
                "offset {} Hz out of range",
                hz
            )));
        }
        let mut payload = encode_bcd(u64::from(magnitude), 4, Endianness::Little)?;
        payload.push(u8::from(hz < 0));
        self.command(cmd::RIT, Some(sub::RIT_FREQ), &payload)?;

        if hz == 0 {
            if self.caps.has_xit {
                self.set_func(Func::Xit, false)?;
            }
            self.set_func(Func::Rit, false)
        } else {
            self.set_func(func, true)
        }
    }

    // Repeater

    pub fn set_rptr_shift(&mut self, shift: RepeaterShift) -> Result<()> {
        let code = match shift {
            RepeaterShift::None => split_sub::SIMPLEX,
            RepeaterShift::Minus => split_sub::DUPLEX_MINUS,
            RepeaterShift::Plus => split_sub::DUPLEX_PLUS,
        };
        self.command(cmd::SPLIT, Some(code), &[])
    }

    pub fn get_rptr_shift(&mut self) -> Result<RepeaterShift> {
        let payload = self.query(cmd::SPLIT, None, &[])?;
        match payload.as_slice() {
            [split_sub::SIMPLEX] => Ok(RepeaterShift::None),
            [split_sub::DUPLEX_MINUS] => Ok(RepeaterShift::Minus),
            [split_sub::DUPLEX_PLUS] => Ok(RepeaterShift::Plus),
            other => Err(RigError::Protocol(format!("repeater shift {:02X?}", other))),
        }
    }

    /// Repeater offset in Hz, sent in 100 Hz units
    pub fn set_rptr_offs(&mut self, hz: u32) -> Result<()> {
        let payload = encode_bcd(
            u64::from(hz / 100),
            self.caps.offset_width * 2,
            Endianness::Little,
        )
        .map_err(|e| RigError::InvalidArgument(e.to_string()))?;
        self.command(cmd::SET_OFFSET, None, &payload)
    }

    pub fn get_rptr_offs(&mut self) -> Result<u32> {
        let payload = self.query(cmd::READ_OFFSET, None, &[])?;
        if payload.len() != self.caps.offset_width {
            return Err(RigError::Protocol(format!(
                "offset reply is {} bytes, expected {}",
                payload.len(),
                self.caps.offset_width
            )));
        }
        let units = decode_bcd(&payload, payload.len() * 2, Endianness::Little)?;
        u32::try_from(units * 100).map_err(|_| RigError::Protocol("offset overflow".into()))
    }

    // Tones, in tenths of Hz

    pub fn set_ctcss_tone(&mut self, tone: u32) -> Result<()> {
        self.write_tone(tone_sub::REPEATER, tone)
    }

    pub fn get_ctcss_tone(&mut self) -> Result<u32> {
        self.read_tone(tone_sub::REPEATER)
    }

    pub fn set_ctcss_sql(&mut self, tone: u32) -> Result<()> {
        self.write_tone(tone_sub::SQUELCH, tone)
    }

    pub fn get_ctcss_sql(&mut self) -> Result<u32> {
        self.read_tone(tone_sub::SQUELCH)
    }

    pub fn set_dcs_code(&mut self, code: u32) -> Result<()> {
        self.write_dcs(code)
    }

    pub fn get_dcs_code(&mut self) -> Result<u32> {
        self.read_dcs()
    }

    /// Same register as [`Rig::set_dcs_code`]; polarity is always normal
    pub fn set_dcs_sql(&mut self, code: u32) -> Result<()> {
        self.write_dcs(code)
    }

    pub fn get_dcs_sql(&mut self) -> Result<u32> {
        self.read_dcs()
    }

    fn write_tone(&mut self, subcmd: u8, tone: u32) -> Result<()> {
        if !self.caps.ctcss_tones.contains(&tone) {
            return Err(RigError::InvalidArgument(format!(
                "CTCSS tone {}.{} Hz not supported",
                tone / 10,
                tone % 10
            )));
        }
        let payload = encode_bcd(u64::from(tone), 6, Endianness::Big)?;
        self.command(cmd::TONE, Some(subcmd), &payload)
    }

    fn read_tone(&mut self, subcmd: u8) -> Result<u32> {
        let payload = self.query(cmd::TONE, Some(subcmd), &[])?;
        if payload.len() != 3 {
            return Err(RigError::Protocol(format!("tone reply {:02X?}", payload)));
        }
        let tone = decode_bcd(&payload, 6, Endianness::Big)? as u32;
        if !self.caps.ctcss_tones.contains(&tone) {
            return Err(RigError::Protocol(format!("unknown CTCSS tone {}", tone)));
        }
        Ok(tone)
    }

    fn write_dcs(&mut self, code: u32) -> Result<()> {
        if !self.caps.dcs_codes.contains(&code) {
            return Err(RigError::InvalidArgument(format!("DCS code {} not supported", code)));
        }
        let payload = encode_bcd(u64::from(code), 6, Endianness::Big)?;
        self.command(cmd::TONE, Some(tone_sub::DCS), &payload)
    }

    /// Reply is polarity then two code bytes
    fn read_dcs(&mut self) -> Result<u32> {
        let payload = self.query(cmd::TONE, Some(tone_sub::DCS), &[])?;
        let [_polarity, code @ ..] = payload.as_slice() else {
            return Err(RigError::Protocol("empty DCS reply".into()));
        };
        if code.len() != 2 {
            return Err(RigError::Protocol(format!("DCS reply {:02X?}", payload)));
        }
        let code = decode_bcd(code, 4, Endianness::Big)? as u32;
        if !self.caps.dcs_codes.contains(&code) {
            return Err(RigError::Protocol(format!("unknown DCS code {}", code)));
        }
        Ok(code)
    }

    // Tuning step and antenna

    pub fn set_ts(&mut self, hz: u32) -> Result<()> {
        let code = self.caps.step_code(hz).ok_or_else(|| {
            RigError::InvalidArgument(format!("no {} Hz step on {}", hz, self.caps.model))
        })?;
        self.command(cmd::TUNING_STEP, Some(code), &[])
    }

    pub fn get_ts(&mut self) -> Result<u32> {
        let payload = self.query(cmd::TUNING_STEP, None, &[])?;
        let &code = payload
            .first()
            .ok_or_else(|| RigError::Protocol("empty tuning step reply".into()))?;
        self.caps
            .step_hz(code)
            .ok_or_else(|| RigError::Protocol(format!("unknown tuning step code 0x{:02X}", code)))
    }

    /// Select antenna 1-4
    pub fn set_ant(&mut self, antenna: u8) -> Result<()> {
        if !(1..=4).contains(&antenna) {
            return Err(RigError::InvalidArgument(format!("antenna {}", antenna)));
        }
        let option: &[u8] = if self.caps.antenna_option_byte { &[0x00] } else { &[] };
        self.command(cmd::ANTENNA, Some(antenna - 1), option)
    }

    pub fn get_ant(&mut self) -> Result<u8> {
        let payload = self.query(cmd::ANTENNA, None, &[])?;
        match payload.first() {
            Some(&index) if index <= 3 => Ok(index + 1),
            _ => Err(RigError::Protocol(format!("antenna reply {:02X?}", payload))),
        }
    }

    // Morse and power

    /// Send text as Morse; anything past 30 characters is dropped
    pub fn send_morse(&mut self, text: &str) -> Result<()> {
        if !text.is_ascii() {
            return Err(RigError::InvalidArgument("Morse text must be ASCII".into()));
        }
        let bytes = &text.as_bytes()[..text.len().min(MAX_MORSE_LEN)];
        if bytes.len() < text.len() {
            warn!("Morse message truncated to {} characters", MAX_MORSE_LEN);
        }
        self.command(cmd::SEND_CW, None, bytes)
    }

    /// Switch the radio on or off.
    ///
    /// Power-on wakes the radio with a run of preamble bytes, then polls the
    /// frequency until the radio answers or the poll budget is spent.
    pub fn set_powerstat(&mut self, on: bool) -> Result<()> {
        self.state.current_vfo = None;
        if !on {
            return self.command(cmd::POWER, Some(sub::POWER_OFF), &[]);
        }

        self.engine.write_raw(&[PREAMBLE; WAKE_UP_PREAMBLE_LEN])?;
        match self.command(cmd::POWER, Some(sub::POWER_ON), &[]) {
            Ok(()) => {}
            // A radio still booting may not acknowledge
            Err(e) if e.is_retryable() => debug!("Power-on not acknowledged: {}", e),
            Err(e) => return Err(e),
        }

        let wait = Duration::from_millis(self.config.power_on_wait_ms);
        for poll in 1..=self.config.power_on_polls {
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
            match self.read_freq() {
                Ok(_) => {
                    info!("{} is up after {} poll(s)", self.caps.model, poll);
                    return Ok(());
                }
                Err(e) if e.is_retryable() => debug!("Wake-up poll {}: {}", poll, e),
                Err(e) => return Err(e),
            }
        }
        Err(RigError::Timeout)
    }

    pub fn get_powerstat(&mut self) -> Result<bool> {
        let payload = self.query(cmd::POWER, None, &[])?;
        match payload.as_slice() {
            [state] => Ok(*state == sub::POWER_ON),
            other => Err(RigError::Protocol(format!("power state {:02X?}", other))),
        }
    }

    // Raw passthrough

    /// Write `data` followed by `value` as `value_bytes` big-endian BCD bytes
    pub fn set_raw(
        &mut self,
        cmd: u8,
        subcmd: Option<u8>,
        data: &[u8],
        value_bytes: usize,
        value: u64,
    ) -> Result<()> {
        let mut payload = data.to_vec();
        if value_bytes > 0 {
            let encoded = encode_bcd(value, value_bytes * 2, Endianness::Big)
                .map_err(|e| RigError::InvalidArgument(e.to_string()))?;
            payload.extend(encoded);
        }
        self.command(cmd, subcmd, &payload)
    }

    /// Bytes the radio returns after the echoed command, subcommand and data
    pub fn get_raw_buf(&mut self, cmd: u8, subcmd: Option<u8>, data: &[u8]) -> Result<Vec<u8>> {
        let payload = self.query(cmd, subcmd, data)?;
        match payload.strip_prefix(data) {
            Some(value) => Ok(value.to_vec()),
            None => Err(RigError::Protocol(format!(
                "reply {:02X?} does not echo {:02X?}",
                payload, data
            ))),
        }
    }

    /// [`Rig::get_raw_buf`], decoded as big-endian BCD
    pub fn get_raw(&mut self, cmd: u8, subcmd: Option<u8>, data: &[u8]) -> Result<u64> {
        let value = self.get_raw_buf(cmd, subcmd, data)?;
        if value.is_empty() {
            return Err(RigError::Protocol("no value in reply".into()));
        }
        Ok(decode_bcd(&value, value.len() * 2, Endianness::Big)?)
    }
}
