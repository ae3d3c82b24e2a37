//! Request/reply transactions over the CI-V bus
//!
//! One transaction is: flush, write the request, discard the local echo when
//! the session's interface echoes, read one reply, validate it. Timeouts and
//! collisions re-send the request unchanged up to the attempt bound; every
//! other failure is reported straight away.
//!
//! Broadcast frequency and mode announcements that arrive while a reply is
//! awaited are set aside for the transceive callbacks instead of being
//! mistaken for the reply.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use civ_protocol::command::cmd;
use civ_protocol::frame::{Frame, FrameReader, ParsedFrame, ACK, BROADCAST_ADDR};
use civ_protocol::Transport;
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::error::{Result, RigError};

/// Announcements kept while a transaction is in flight
const MAX_SET_ASIDE: usize = 16;

/// Whether the interface hands our own bytes back before the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoMode {
    /// Every written frame is read back first
    Echo,
    /// Only the radio's reply is read
    #[default]
    NoEcho,
}

/// Reply the caller is prepared to accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// A bare ACK (settings)
    Ack,
    /// A data frame echoing the request head (reads)
    Data,
    /// Either one
    AckOrData,
}

/// A validated reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ack,
    Data {
        cmd: u8,
        /// Subcommand byte, present when the request carried one
        subcmd: Option<u8>,
        /// Bytes after the command head
        payload: Vec<u8>,
    },
}

impl Reply {
    /// Payload of a data reply
    pub fn into_payload(self) -> Result<Vec<u8>> {
        match self {
            Reply::Data { payload, .. } => Ok(payload),
            Reply::Ack => Err(RigError::Protocol("expected data, got ACK".into())),
        }
    }
}

/// Runs transactions against one radio address
pub struct TransactionEngine<T> {
    transport: T,
    reader: FrameReader,
    radio_address: u8,
    controller_address: u8,
    max_attempts: u32,
    reply_timeout: Duration,
    retry_delay: Duration,
    set_aside: VecDeque<Frame>,
}

impl<T: Transport> TransactionEngine<T> {
    pub fn new(transport: T, radio_address: u8, config: &SessionConfig) -> Self {
        Self {
            transport,
            reader: FrameReader::new(),
            radio_address,
            controller_address: config.controller_address,
            max_attempts: config.max_attempts.max(1),
            reply_timeout: config.reply_timeout(),
            retry_delay: config.retry_delay(),
            set_aside: VecDeque::new(),
        }
    }

    pub fn radio_address(&self) -> u8 {
        self.radio_address
    }

    pub fn set_radio_address(&mut self, address: u8) {
        self.radio_address = address;
    }

    pub fn controller_address(&self) -> u8 {
        self.controller_address
    }

    /// Attempts per transaction, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send a request and wait for a validated reply
    pub fn execute(
        &mut self,
        echo: EchoMode,
        cmd: u8,
        subcmd: Option<u8>,
        payload: &[u8],
        shape: ReplyShape,
    ) -> Result<Reply> {
        let request = Frame::build_request(
            self.radio_address,
            self.controller_address,
            cmd,
            subcmd,
            payload,
        )
        // Nothing was sent; the request itself cannot go on the wire
        .map_err(|e| RigError::InvalidArgument(e.to_string()))?;

        let mut last_error = RigError::Timeout;
        for attempt in 1..=self.max_attempts {
            match self.attempt(echo, &request, subcmd, shape) {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() => {
                    debug!(
                        "CI-V 0x{:02X} attempt {}/{} failed: {}",
                        cmd, attempt, self.max_attempts, e
                    );
                    last_error = e;
                    if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                        std::thread::sleep(self.retry_delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error)
    }

    fn attempt(
        &mut self,
        echo: EchoMode,
        request: &Frame,
        subcmd: Option<u8>,
        shape: ReplyShape,
    ) -> Result<Reply> {
        self.transport.flush_input()?;
        self.reader.clear();
        trace!("CI-V tx: {:02X?}", request.as_bytes());
        self.transport.write(request.as_bytes())?;
        // One window per attempt, however many announcements arrive inside it
        let deadline = Instant::now() + self.reply_timeout;

        if echo == EchoMode::Echo {
            let echoed = self.expect_frame(deadline)?;
            if echoed != *request {
                return Err(RigError::Protocol(format!(
                    "echo mismatch: sent {:02X?}, read {:02X?}",
                    request.as_bytes(),
                    echoed.as_bytes()
                )));
            }
        }

        loop {
            let frame = self.expect_frame(deadline)?;
            if self.is_announcement(&frame) {
                self.set_aside(frame);
                continue;
            }
            return self.validate(request, subcmd, shape, frame);
        }
    }

    /// Read one complete frame before `deadline`, mapping the other outcomes to errors
    fn expect_frame(&mut self, deadline: Instant) -> Result<Frame> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(RigError::Timeout);
        }
        match self.reader.read_frame(&mut self.transport, remaining)? {
            ParsedFrame::Complete(frame) => Ok(frame),
            ParsedFrame::Collision(_) => Err(RigError::BusBusy),
            ParsedFrame::Timeout => Err(RigError::Timeout),
            ParsedFrame::Malformed(reason) => Err(RigError::Protocol(reason)),
        }
    }

    fn is_announcement(&self, frame: &Frame) -> bool {
        frame.dest() == BROADCAST_ADDR
            && frame.src() == self.radio_address
            && matches!(frame.cmd(), cmd::SEND_FREQ | cmd::SEND_MODE)
    }

    fn set_aside(&mut self, frame: Frame) {
        if self.set_aside.len() >= MAX_SET_ASIDE {
            warn!("Dropping oldest interleaved announcement");
            self.set_aside.pop_front();
        }
        debug!("Interleaved announcement 0x{:02X} set aside", frame.cmd());
        self.set_aside.push_back(frame);
    }

    fn validate(
        &self,
        request: &Frame,
        subcmd: Option<u8>,
        shape: ReplyShape,
        frame: Frame,
    ) -> Result<Reply> {
        if frame.src() != self.radio_address && frame.src() != BROADCAST_ADDR {
            return Err(RigError::Protocol(format!(
                "reply from 0x{:02X}, expected 0x{:02X}",
                frame.src(),
                self.radio_address
            )));
        }
        if frame.dest() != self.controller_address && frame.dest() != BROADCAST_ADDR {
            return Err(RigError::Protocol(format!(
                "reply addressed to 0x{:02X}",
                frame.dest()
            )));
        }

        let body = frame.body();
        if body.is_empty() {
            // Single-byte acknowledgement
            return match frame.cmd() {
                ACK if shape == ReplyShape::Data => {
                    Err(RigError::Protocol("expected data, got ACK".into()))
                }
                ACK => Ok(Reply::Ack),
                code => {
                    debug!("CI-V 0x{:02X} rejected with 0x{:02X}", request.cmd(), code);
                    Err(RigError::Rejected { code })
                }
            };
        }

        if shape == ReplyShape::Ack {
            return Err(RigError::Protocol(format!(
                "expected ACK, got {:02X?}",
                frame.as_bytes()
            )));
        }
        if frame.cmd() != request.cmd() {
            return Err(RigError::Protocol(format!(
                "reply command 0x{:02X} does not match request 0x{:02X}",
                frame.cmd(),
                request.cmd()
            )));
        }

        let fields = frame.fields(subcmd.is_some())?;
        if fields.subcmd != subcmd {
            return Err(RigError::Protocol(format!(
                "reply subcommand {:02X?} does not match request {:02X?}",
                fields.subcmd, subcmd
            )));
        }
        Ok(Reply::Data {
            cmd: fields.cmd,
            subcmd: fields.subcmd,
            payload: fields.payload.to_vec(),
        })
    }

    /// Write bytes outside any transaction, e.g. a wake-up preamble
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        trace!("CI-V raw tx: {:02X?}", bytes);
        self.transport.write(bytes)?;
        Ok(())
    }

    /// Read one unsolicited frame, waiting at most `timeout`
    pub fn read_unsolicited(&mut self, timeout: Duration) -> Result<ParsedFrame> {
        Ok(self.reader.read_frame(&mut self.transport, timeout)?)
    }

    /// Announcements set aside during transactions, oldest first
    pub fn take_set_aside(&mut self) -> Vec<Frame> {
        self.set_aside.drain(..).collect()
    }

    /// Find out whether the interface echoes.
    ///
    /// A harmless frequency read is tried without echo handling, then with
    /// it. Any genuine answer from the radio, a NAK included, settles the
    /// question. Falls back to no echo when neither works.
    pub fn detect_echo(&mut self) -> EchoMode {
        for mode in [EchoMode::NoEcho, EchoMode::Echo] {
            match self.execute(mode, cmd::READ_FREQ, None, &[], ReplyShape::Data) {
                Ok(_) | Err(RigError::Rejected { .. }) => {
                    debug!("Echo probe settled on {:?}", mode);
                    return mode;
                }
                Err(e) => debug!("Echo probe with {:?} failed: {}", mode, e),
            }
        }
        warn!("Echo probe inconclusive, assuming no echo");
        EchoMode::NoEcho
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Transport that records writes and replays one scripted reply per write
    struct Scripted {
        replies: VecDeque<Vec<u8>>,
        rx: VecDeque<u8>,
        writes: usize,
    }

    impl Scripted {
        fn new(replies: Vec<Vec<u8>>) -> Self {
            Self {
                replies: replies.into(),
                rx: VecDeque::new(),
                writes: 0,
            }
        }
    }

    impl Transport for Scripted {
        fn write(&mut self, _data: &[u8]) -> io::Result<()> {
            self.writes += 1;
            if let Some(reply) = self.replies.pop_front() {
                self.rx.extend(reply);
            }
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
            let n = buf.len().min(self.rx.len());
            for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }

        fn flush_input(&mut self) -> io::Result<()> {
            self.rx.clear();
            Ok(())
        }
    }

    fn engine(replies: Vec<Vec<u8>>) -> TransactionEngine<Scripted> {
        TransactionEngine::new(Scripted::new(replies), 0x58, &SessionConfig::default())
    }

    #[test]
    fn test_ack() {
        let mut e = engine(vec![vec![0xFE, 0xFE, 0xE0, 0x58, 0xFB, 0xFD]]);
        let reply = e
            .execute(EchoMode::NoEcho, 0x05, None, &[0, 0, 0x25, 0x14, 0], ReplyShape::Ack)
            .unwrap();
        assert_eq!(reply, Reply::Ack);
    }

    #[test]
    fn test_nak_and_other_byte_rejected() {
        let mut e = engine(vec![
            vec![0xFE, 0xFE, 0xE0, 0x58, 0xFA, 0xFD],
            vec![0xFE, 0xFE, 0xE0, 0x58, 0x42, 0xFD],
        ]);
        assert!(matches!(
            e.execute(EchoMode::NoEcho, 0x07, Some(0xD0), &[], ReplyShape::Ack),
            Err(RigError::Rejected { code: 0xFA })
        ));
        assert!(matches!(
            e.execute(EchoMode::NoEcho, 0x07, Some(0xD0), &[], ReplyShape::Ack),
            Err(RigError::Rejected { code: 0x42 })
        ));
    }

    #[test]
    fn test_data_reply_strips_head() {
        // FE FE E0 58 14 01 01 28 FD
        let mut e = engine(vec![vec![0xFE, 0xFE, 0xE0, 0x58, 0x14, 0x01, 0x01, 0x28, 0xFD]]);
        let payload = e
            .execute(EchoMode::NoEcho, 0x14, Some(0x01), &[], ReplyShape::Data)
            .unwrap()
            .into_payload()
            .unwrap();
        assert_eq!(payload, vec![0x01, 0x28]);
    }

    #[test]
    fn test_command_mismatch_is_protocol_error() {
        let mut e = engine(vec![vec![0xFE, 0xFE, 0xE0, 0x58, 0x04, 0x01, 0x02, 0xFD]]);
        assert!(matches!(
            e.execute(EchoMode::NoEcho, 0x03, None, &[], ReplyShape::Data),
            Err(RigError::Protocol(_))
        ));
        assert_eq!(e.transport().writes, 1);
    }

    #[test]
    fn test_subcommand_mismatch_is_protocol_error() {
        let mut e = engine(vec![vec![0xFE, 0xFE, 0xE0, 0x58, 0x14, 0x02, 0x01, 0x28, 0xFD]]);
        assert!(matches!(
            e.execute(EchoMode::NoEcho, 0x14, Some(0x01), &[], ReplyShape::Data),
            Err(RigError::Protocol(_))
        ));
    }

    #[test]
    fn test_wrong_source_not_retried() {
        let mut e = engine(vec![vec![0xFE, 0xFE, 0xE0, 0x94, 0xFB, 0xFD]]);
        assert!(matches!(
            e.execute(EchoMode::NoEcho, 0x05, None, &[], ReplyShape::Ack),
            Err(RigError::Protocol(_))
        ));
        assert_eq!(e.transport().writes, 1);
    }

    #[test]
    fn test_timeout_retries_exactly_max_attempts() {
        let mut e = engine(vec![]);
        assert!(matches!(
            e.execute(EchoMode::NoEcho, 0x03, None, &[], ReplyShape::Data),
            Err(RigError::Timeout)
        ));
        assert_eq!(e.transport().writes, 3);
    }

    #[test]
    fn test_collision_then_success() {
        let mut e = engine(vec![
            vec![0xFE, 0xFE, 0xFC],
            vec![0xFE, 0xFE, 0xE0, 0x58, 0xFB, 0xFD],
        ]);
        let reply = e.execute(EchoMode::NoEcho, 0x06, None, &[0x01, 0x02], ReplyShape::Ack);
        assert_eq!(reply.unwrap(), Reply::Ack);
        assert_eq!(e.transport().writes, 2);
    }

    #[test]
    fn test_echo_discarded() {
        let request = Frame::build_request(0x58, 0xE0, 0x03, None, &[]).unwrap();
        let mut reply = request.as_bytes().to_vec();
        reply.extend([0xFE, 0xFE, 0xE0, 0x58, 0x03, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD]);
        let mut e = engine(vec![reply]);
        let payload = e
            .execute(EchoMode::Echo, 0x03, None, &[], ReplyShape::Data)
            .unwrap()
            .into_payload()
            .unwrap();
        assert_eq!(payload, vec![0x00, 0x00, 0x25, 0x14, 0x00]);
    }

    #[test]
    fn test_interleaved_announcement_set_aside() {
        let mut e = engine(vec![vec![
            0xFE, 0xFE, 0x00, 0x58, 0x00, 0x00, 0x40, 0x07, 0x07, 0x00, 0xFD, // announce
            0xFE, 0xFE, 0xE0, 0x58, 0xFB, 0xFD,
        ]]);
        assert_eq!(
            e.execute(EchoMode::NoEcho, 0x06, None, &[0x03], ReplyShape::Ack).unwrap(),
            Reply::Ack
        );
        let aside = e.take_set_aside();
        assert_eq!(aside.len(), 1);
        assert_eq!(aside[0].cmd(), 0x00);
    }

    /// A radio whose dial keeps turning: every read yields another
    /// frequency announcement, the reply never comes
    struct Chatter {
        reads: usize,
        limit: usize,
        writes: usize,
    }

    impl Transport for Chatter {
        fn write(&mut self, _data: &[u8]) -> io::Result<()> {
            self.writes += 1;
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
            if self.reads >= self.limit {
                return Ok(0);
            }
            self.reads += 1;
            std::thread::sleep(Duration::from_millis(5));
            let announce = [0xFE, 0xFE, 0x00, 0x58, 0x00, 0x00, 0x40, 0x07, 0x07, 0x00, 0xFD];
            buf[..announce.len()].copy_from_slice(&announce);
            Ok(announce.len())
        }

        fn flush_input(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_announcement_stream_cannot_stretch_attempt() {
        let config = SessionConfig {
            timeout_ms: 20,
            max_attempts: 2,
            ..Default::default()
        };
        let window = config.reply_timeout();
        let chatter = Chatter {
            reads: 0,
            limit: 400,
            writes: 0,
        };
        let mut e = TransactionEngine::new(chatter, 0x58, &config);

        let started = Instant::now();
        let result = e.execute(EchoMode::NoEcho, 0x03, None, &[], ReplyShape::Data);
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(RigError::Timeout)));
        assert_eq!(e.transport().writes, 2);
        // Two windows plus one read that may straddle each deadline
        assert!(elapsed < window * 2 + Duration::from_millis(100), "took {:?}", elapsed);
        assert!(e.transport().reads < 400);
    }

    #[test]
    fn test_framing_byte_in_request_is_invalid_argument() {
        let mut e = engine(vec![]);
        assert!(matches!(
            e.execute(EchoMode::NoEcho, 0x1A, Some(0x05), &[0x01, 0xFD, 0x02], ReplyShape::Ack),
            Err(RigError::InvalidArgument(_))
        ));
        assert_eq!(e.transport().writes, 0);
    }
}
