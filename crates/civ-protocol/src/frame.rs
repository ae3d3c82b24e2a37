//! CI-V frame codec
//!
//! # Frame Format
//! ```text
//! FE FE [to] [from] [cmd] [subcmd] [data...] FD
//! ```
//!
//! - `FE FE`: Preamble (two bytes)
//! - `to`: Destination address (radio address, 0xE0 for the controller, 0x00 broadcast)
//! - `from`: Source address
//! - `cmd`: Command code
//! - `subcmd`: Sub-command code (optional, depends on command)
//! - `data`: Variable length payload
//! - `FD`: Terminator, or `FC` when the bus reports a collision
//!
//! Whether a frame carries a subcommand byte is a property of the command,
//! not of the bytes, so [`Frame::fields`] is told which shape to expect.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::error::ParseError;
use crate::transport::Transport;

/// CI-V frame preamble byte
pub const PREAMBLE: u8 = 0xFE;
/// CI-V frame terminator byte
pub const TERMINATOR: u8 = 0xFD;
/// Terminator replacing FD when two stations talked at once
pub const COLLISION: u8 = 0xFC;
/// Positive acknowledgement ("OK")
pub const ACK: u8 = 0xFB;
/// Negative acknowledgement ("NG")
pub const NAK: u8 = 0xFA;
/// Default controller address
pub const CONTROLLER_ADDR: u8 = 0xE0;
/// Broadcast address
pub const BROADCAST_ADDR: u8 = 0x00;

/// Maximum frame length, preamble and terminator included
pub const MAX_FRAME_LEN: usize = 80;

/// Preamble, addresses, command and terminator
const MIN_FRAME_LEN: usize = 6;

/// Framing bytes that cannot be carried inside a frame
fn is_reserved(byte: u8) -> bool {
    matches!(byte, PREAMBLE | TERMINATOR | COLLISION)
}

/// A complete CI-V frame, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

/// Structured view of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFields<'a> {
    /// Destination address
    pub dest: u8,
    /// Source address
    pub src: u8,
    /// Command id
    pub cmd: u8,
    /// Subcommand id, when the command carries one
    pub subcmd: Option<u8>,
    /// Payload between the command head and the terminator
    pub payload: &'a [u8],
}

impl Frame {
    /// Build an outbound command frame
    pub fn build_request(
        dest: u8,
        src: u8,
        cmd: u8,
        subcmd: Option<u8>,
        payload: &[u8],
    ) -> Result<Self, ParseError> {
        for addr in [dest, src] {
            if is_reserved(addr) {
                return Err(ParseError::InvalidAddress(addr));
            }
        }
        // Receivers end the frame at the first FD or FC, so none may appear inside
        let mut body = [cmd].into_iter().chain(subcmd).chain(payload.iter().copied());
        if let Some(byte) = body.find(|&b| is_reserved(b)) {
            return Err(ParseError::ReservedByte(byte));
        }

        let len = MIN_FRAME_LEN + usize::from(subcmd.is_some()) + payload.len();
        if len > MAX_FRAME_LEN {
            return Err(ParseError::FrameTooLong(len));
        }

        let mut bytes = Vec::with_capacity(len);
        bytes.extend_from_slice(&[PREAMBLE, PREAMBLE, dest, src, cmd]);
        if let Some(sc) = subcmd {
            bytes.push(sc);
        }
        bytes.extend_from_slice(payload);
        bytes.push(TERMINATOR);
        Ok(Self { bytes })
    }

    /// Wrap bytes received from the bus, checking the framing
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ParseError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(ParseError::InvalidFrame(format!(
                "frame too short: {} bytes",
                bytes.len()
            )));
        }
        if bytes.len() > MAX_FRAME_LEN {
            return Err(ParseError::FrameTooLong(bytes.len()));
        }
        if bytes[0] != PREAMBLE || bytes[1] != PREAMBLE {
            return Err(ParseError::InvalidFrame("missing preamble".into()));
        }
        if bytes[bytes.len() - 1] != TERMINATOR {
            return Err(ParseError::InvalidFrame("missing terminator".into()));
        }
        Ok(Self { bytes })
    }

    /// Raw wire bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the frame, returning its wire bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Frame length on the wire
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a frame has at least preamble, addresses, command and terminator
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn dest(&self) -> u8 {
        self.bytes[2]
    }

    pub fn src(&self) -> u8 {
        self.bytes[3]
    }

    pub fn cmd(&self) -> u8 {
        self.bytes[4]
    }

    /// Everything after the command byte, terminator excluded
    pub fn body(&self) -> &[u8] {
        &self.bytes[5..self.bytes.len() - 1]
    }

    /// True for a bare positive acknowledgement
    pub fn is_ack(&self) -> bool {
        self.cmd() == ACK && self.body().is_empty()
    }

    /// True for a bare negative acknowledgement
    pub fn is_nak(&self) -> bool {
        self.cmd() == NAK && self.body().is_empty()
    }

    /// Split the frame into fields, reading a subcommand byte when `with_subcmd`
    pub fn fields(&self, with_subcmd: bool) -> Result<FrameFields<'_>, ParseError> {
        let body = self.body();
        let (subcmd, payload) = if with_subcmd {
            match body.split_first() {
                Some((sc, rest)) => (Some(*sc), rest),
                None => {
                    return Err(ParseError::InvalidFrame(format!(
                        "command 0x{:02X} has no subcommand byte",
                        self.cmd()
                    )))
                }
            }
        } else {
            (None, body)
        };
        Ok(FrameFields {
            dest: self.dest(),
            src: self.src(),
            cmd: self.cmd(),
            subcmd,
            payload,
        })
    }
}

/// Outcome of reading one frame from the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFrame {
    /// Well-formed frame ending in FD
    Complete(Frame),
    /// Bytes up to and including the collision marker
    Collision(Vec<u8>),
    /// Nothing arrived before the deadline
    Timeout,
    /// Truncated, oversized or badly framed input
    Malformed(String),
}

/// Classify bytes read up to a terminator, collision marker or timeout
pub fn parse_frame(bytes: &[u8]) -> ParsedFrame {
    match bytes.last() {
        None => ParsedFrame::Timeout,
        Some(&COLLISION) => ParsedFrame::Collision(bytes.to_vec()),
        Some(&TERMINATOR) => match Frame::from_bytes(bytes.to_vec()) {
            Ok(frame) => ParsedFrame::Complete(frame),
            Err(e) => ParsedFrame::Malformed(e.to_string()),
        },
        Some(_) => ParsedFrame::Malformed(format!(
            "frame truncated after {} bytes: {:02X?}",
            bytes.len(),
            bytes
        )),
    }
}

/// Reads whole frames off a byte transport
///
/// Bytes that arrive after a terminator in the same read are kept for the
/// next call, so back-to-back frames are never lost.
#[derive(Debug, Default)]
pub struct FrameReader {
    pending: VecDeque<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any buffered bytes
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of bytes buffered from earlier reads
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Read one frame, waiting at most `timeout` overall
    pub fn read_frame<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        timeout: Duration,
    ) -> io::Result<ParsedFrame> {
        let deadline = Instant::now() + timeout;
        let mut frame = Vec::with_capacity(MAX_FRAME_LEN);
        let mut chunk = [0u8; MAX_FRAME_LEN];

        loop {
            while let Some(byte) = self.pending.pop_front() {
                if frame.is_empty() && byte != PREAMBLE && byte != COLLISION {
                    trace!("Discarding noise byte 0x{:02X} before preamble", byte);
                    continue;
                }
                frame.push(byte);
                match byte {
                    TERMINATOR | COLLISION => return Ok(parse_frame(&frame)),
                    _ if frame.len() >= MAX_FRAME_LEN => {
                        warn!("CI-V frame exceeded {} bytes, dropping", MAX_FRAME_LEN);
                        return Ok(ParsedFrame::Malformed(format!(
                            "no terminator within {} bytes",
                            MAX_FRAME_LEN
                        )));
                    }
                    _ => {}
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let n = if remaining.is_zero() {
                0
            } else {
                transport.read(&mut chunk, remaining)?
            };
            if n == 0 {
                // Timed out: nothing at all, or a partial frame
                return Ok(parse_frame(&frame));
            }
            trace!("CI-V rx: {:02X?}", &chunk[..n]);
            self.pending.extend(&chunk[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;

    /// Transport that hands out scripted chunks, one per read
    struct Chunks(VecDeque<Vec<u8>>);

    impl Transport for Chunks {
        fn write(&mut self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Ok(0),
            }
        }

        fn flush_input(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_build_set_frequency() {
        // FE FE 94 E0 05 00 00 25 14 00 FD
        let frame =
            Frame::build_request(0x94, CONTROLLER_ADDR, 0x05, None, &[0x00, 0x00, 0x25, 0x14, 0x00])
                .unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0xFE, 0xFE, 0x94, 0xE0, 0x05, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD]
        );
    }

    #[test]
    fn test_build_with_subcommand() {
        // FE FE 58 E0 07 B0 FD (exchange VFOs)
        let frame = Frame::build_request(0x58, 0xE0, 0x07, Some(0xB0), &[]).unwrap();
        assert_eq!(frame.as_bytes(), &[0xFE, 0xFE, 0x58, 0xE0, 0x07, 0xB0, 0xFD]);
        let fields = frame.fields(true).unwrap();
        assert_eq!(fields.subcmd, Some(0xB0));
        assert!(fields.payload.is_empty());
    }

    #[test]
    fn test_subcommand_absent_is_not_zero() {
        let frame = Frame::build_request(0x58, 0xE0, 0x03, None, &[]).unwrap();
        let fields = frame.fields(false).unwrap();
        assert_eq!(fields.subcmd, None);
        assert!(frame.fields(true).is_err());
    }

    #[test]
    fn test_frame_too_long() {
        let payload = [0u8; MAX_FRAME_LEN];
        assert!(matches!(
            Frame::build_request(0x58, 0xE0, 0x17, None, &payload),
            Err(ParseError::FrameTooLong(_))
        ));
    }

    #[test]
    fn test_reserved_address_rejected() {
        assert_eq!(
            Frame::build_request(0xFE, 0xE0, 0x03, None, &[]),
            Err(ParseError::InvalidAddress(0xFE))
        );
    }

    #[test]
    fn test_framing_bytes_rejected_in_body() {
        assert_eq!(
            Frame::build_request(0x58, 0xE0, 0x1A, Some(0x05), &[0x01, 0xFD, 0x02]),
            Err(ParseError::ReservedByte(0xFD))
        );
        assert_eq!(
            Frame::build_request(0x58, 0xE0, 0xFC, None, &[]),
            Err(ParseError::ReservedByte(0xFC))
        );
        assert_eq!(
            Frame::build_request(0x58, 0xE0, 0x1A, Some(0xFE), &[]),
            Err(ParseError::ReservedByte(0xFE))
        );
        // Blank-channel filler is ordinary data
        assert!(Frame::build_request(0x58, 0xE0, 0x05, None, &[0xFF; 5]).is_ok());
    }

    #[test]
    fn test_parse_ack_and_nak() {
        // FE FE E0 58 FB FD
        let ParsedFrame::Complete(ack) = parse_frame(&[0xFE, 0xFE, 0xE0, 0x58, 0xFB, 0xFD]) else {
            panic!("expected a complete frame");
        };
        assert!(ack.is_ack());
        assert_eq!(ack.src(), 0x58);

        let ParsedFrame::Complete(nak) = parse_frame(&[0xFE, 0xFE, 0xE0, 0x58, 0xFA, 0xFD]) else {
            panic!("expected a complete frame");
        };
        assert!(nak.is_nak());
    }

    #[test]
    fn test_parse_outcomes() {
        assert_eq!(parse_frame(&[]), ParsedFrame::Timeout);
        assert!(matches!(parse_frame(&[0xFE, 0xFE, 0xFC]), ParsedFrame::Collision(_)));
        assert!(matches!(parse_frame(&[0xFE, 0xFE, 0xE0]), ParsedFrame::Malformed(_)));
        assert!(matches!(parse_frame(&[0xFE, 0xE0, 0xFD]), ParsedFrame::Malformed(_)));
    }

    #[test]
    fn test_reader_keeps_trailing_frame() {
        // Echo and reply delivered in one read
        let mut transport = Chunks(VecDeque::from(vec![vec![
            0xFE, 0xFE, 0x58, 0xE0, 0x03, 0xFD, 0xFE, 0xFE, 0xE0, 0x58, 0x03, 0x00, 0x00, 0x25,
            0x14, 0x00, 0xFD,
        ]]));
        let mut reader = FrameReader::new();

        let echo = reader.read_frame(&mut transport, Duration::from_millis(10)).unwrap();
        assert!(matches!(echo, ParsedFrame::Complete(ref f) if f.cmd() == 0x03 && f.src() == 0xE0));
        assert_eq!(reader.buffered(), 11);

        let ParsedFrame::Complete(reply) = reader
            .read_frame(&mut transport, Duration::from_millis(10))
            .unwrap()
        else {
            panic!("expected reply frame");
        };
        assert_eq!(reply.body(), &[0x00, 0x00, 0x25, 0x14, 0x00]);
    }

    #[test]
    fn test_reader_split_across_reads() {
        let mut transport = Chunks(VecDeque::from(vec![
            vec![0x00, 0xFE, 0xFE, 0xE0],
            vec![0x58, 0xFB],
            vec![0xFD],
        ]));
        let mut reader = FrameReader::new();
        let parsed = reader.read_frame(&mut transport, Duration::from_millis(10)).unwrap();
        assert!(matches!(parsed, ParsedFrame::Complete(ref f) if f.is_ack()));
    }

    #[test]
    fn test_reader_partial_then_timeout_is_malformed() {
        let mut transport = Chunks(VecDeque::from(vec![vec![0xFE, 0xFE, 0xE0, 0x58]]));
        let mut reader = FrameReader::new();
        let parsed = reader.read_frame(&mut transport, Duration::from_millis(10)).unwrap();
        assert!(matches!(parsed, ParsedFrame::Malformed(_)));
    }

    #[test]
    fn test_reader_collision() {
        let mut transport = Chunks(VecDeque::from(vec![vec![0xFE, 0xFE, 0xFC]]));
        let mut reader = FrameReader::new();
        let parsed = reader.read_frame(&mut transport, Duration::from_millis(10)).unwrap();
        assert!(matches!(parsed, ParsedFrame::Collision(_)));
    }
}
