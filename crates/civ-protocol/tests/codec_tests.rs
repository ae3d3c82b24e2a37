//! Codec tests for civ-protocol
//!
//! Exercises the BCD numerics and frame codec together the way the rig layer
//! uses them.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use civ_protocol::bcd::{bcd_to_frequency, frequency_to_bcd};
use civ_protocol::frame::{CONTROLLER_ADDR, MAX_FRAME_LEN};
use civ_protocol::{
    decode_bcd, encode_bcd, parse_frame, CalPoint, CalibrationTable, Endianness, Frame,
    FrameReader, ParseError, ParsedFrame, Transport,
};

/// Loopback transport fed from a byte queue
struct Wire {
    rx: VecDeque<u8>,
}

impl Wire {
    fn with(bytes: &[u8]) -> Self {
        Self {
            rx: bytes.iter().copied().collect(),
        }
    }
}

impl Transport for Wire {
    fn write(&mut self, _data: &[u8]) -> io::Result<()> {
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

// ============================================================================
// Wire examples
// ============================================================================

#[test]
fn read_frequency_reply_decodes() {
    // FE FE E0 94 03 00 40 07 07 00 FD = 7.074 MHz from an IC-7300
    let bytes = [0xFE, 0xFE, 0xE0, 0x94, 0x03, 0x00, 0x40, 0x07, 0x07, 0x00, 0xFD];
    let ParsedFrame::Complete(frame) = parse_frame(&bytes) else {
        panic!("expected complete frame");
    };
    let fields = frame.fields(false).unwrap();
    assert_eq!(fields.src, 0x94);
    assert_eq!(fields.dest, CONTROLLER_ADDR);
    assert_eq!(bcd_to_frequency(fields.payload).unwrap(), 7_074_000);
}

#[test]
fn level_payload_is_big_endian() {
    // AF gain 50%: 0x14 0x01 01 28
    let payload = encode_bcd(128, 4, Endianness::Big).unwrap();
    let frame = Frame::build_request(0x94, CONTROLLER_ADDR, 0x14, Some(0x01), &payload).unwrap();
    assert_eq!(
        frame.as_bytes(),
        &[0xFE, 0xFE, 0x94, 0xE0, 0x14, 0x01, 0x01, 0x28, 0xFD]
    );
}

#[test]
fn reader_skips_noise_and_reads_two_frames() {
    let mut wire = Wire::with(&[
        0x00, 0x13, // line noise
        0xFE, 0xFE, 0xE0, 0x58, 0xFB, 0xFD, // ACK
        0xFE, 0xFE, 0x00, 0x58, 0x00, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD, // transceive
    ]);
    let mut reader = FrameReader::new();

    let first = reader.read_frame(&mut wire, Duration::from_millis(5)).unwrap();
    assert!(matches!(first, ParsedFrame::Complete(ref f) if f.is_ack()));

    let second = reader.read_frame(&mut wire, Duration::from_millis(5)).unwrap();
    let ParsedFrame::Complete(announce) = second else {
        panic!("expected transceive frame");
    };
    assert_eq!(announce.dest(), 0x00);
    assert_eq!(bcd_to_frequency(announce.body()).unwrap(), 14_250_000);

    let third = reader.read_frame(&mut wire, Duration::from_millis(5)).unwrap();
    assert_eq!(third, ParsedFrame::Timeout);
}

#[test]
fn reader_reports_runaway_frame() {
    let mut bytes = vec![0xFE, 0xFE, 0xE0, 0x58, 0x03];
    bytes.extend(std::iter::repeat(0x11).take(MAX_FRAME_LEN));
    let mut wire = Wire::with(&bytes);
    let mut reader = FrameReader::new();
    let parsed = reader.read_frame(&mut wire, Duration::from_millis(5)).unwrap();
    assert!(matches!(parsed, ParsedFrame::Malformed(_)));
}

#[test]
fn calibration_midpoint() {
    let table =
        CalibrationTable::from_points(vec![CalPoint::new(0, 0.0), CalPoint::new(120, 1.0)])
            .unwrap();
    assert_eq!(table.interpolate(60), 0.5);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn amateur_frequency() -> impl Strategy<Value = u64> {
        prop_oneof![
            // 160m band
            1_800_000u64..2_000_000u64,
            // 40m band
            7_000_000u64..7_300_000u64,
            // 20m band
            14_000_000u64..14_350_000u64,
            // 2m band
            144_000_000u64..148_000_000u64,
            // 70cm band
            430_000_000u64..450_000_000u64,
            // 23cm band
            1_240_000_000u64..1_300_000_000u64,
        ]
    }

    /// Any byte that may travel inside a frame
    fn frame_byte() -> impl Strategy<Value = u8> {
        prop_oneof![0x00u8..0xFC, Just(0xFFu8)]
    }

    fn endianness() -> impl Strategy<Value = Endianness> {
        prop_oneof![Just(Endianness::Little), Just(Endianness::Big)]
    }

    proptest! {
        #[test]
        fn bcd_value_survives_any_order(value in 0u64..10_000_000_000, order in endianness()) {
            let bytes = encode_bcd(value, 10, order).unwrap();
            prop_assert_eq!(bytes.len(), 5);
            prop_assert_eq!(decode_bcd(&bytes, 10, order).unwrap(), value);
        }

        #[test]
        fn bcd_never_truncates(value in 1_000u64..u64::MAX) {
            let err = encode_bcd(value, 3, Endianness::Big).unwrap_err();
            let is_overflow = matches!(err, ParseError::BcdOverflow { .. });
            prop_assert!(is_overflow);
        }

        #[test]
        fn set_frequency_frame_parses_back(hz in amateur_frequency(), addr in 0x01u8..0xE0) {
            let payload = frequency_to_bcd(hz, 5).unwrap();
            let frame = Frame::build_request(addr, CONTROLLER_ADDR, 0x05, None, &payload).unwrap();

            let parsed = parse_frame(frame.as_bytes());
            let ParsedFrame::Complete(back) = parsed else {
                return Err(TestCaseError::fail("frame did not parse"));
            };
            prop_assert_eq!(back.dest(), addr);
            prop_assert_eq!(bcd_to_frequency(back.body()).unwrap(), hz);
        }

        #[test]
        fn any_request_reads_back_field_for_field(
            dest in frame_byte(),
            src in frame_byte(),
            cmd in frame_byte(),
            subcmd in proptest::option::of(frame_byte()),
            payload in proptest::collection::vec(frame_byte(), 0..=MAX_FRAME_LEN - 7),
        ) {
            let frame = Frame::build_request(dest, src, cmd, subcmd, &payload).unwrap();
            prop_assert!(frame.len() <= MAX_FRAME_LEN);

            let mut wire = Wire::with(frame.as_bytes());
            let mut reader = FrameReader::new();
            let parsed = reader.read_frame(&mut wire, Duration::from_millis(5)).unwrap();
            let ParsedFrame::Complete(back) = parsed else {
                return Err(TestCaseError::fail("frame did not read back whole"));
            };
            let fields = back.fields(subcmd.is_some()).unwrap();
            prop_assert_eq!(fields.dest, dest);
            prop_assert_eq!(fields.src, src);
            prop_assert_eq!(fields.cmd, cmd);
            prop_assert_eq!(fields.subcmd, subcmd);
            prop_assert_eq!(fields.payload, &payload[..]);
        }

        #[test]
        fn framing_byte_anywhere_in_body_is_refused(
            mut payload in proptest::collection::vec(frame_byte(), 1..20),
            at in any::<prop::sample::Index>(),
            framing in prop_oneof![Just(0xFCu8), Just(0xFDu8), Just(0xFEu8)],
        ) {
            let i = at.index(payload.len());
            payload[i] = framing;
            prop_assert_eq!(
                Frame::build_request(0x58, CONTROLLER_ADDR, 0x1A, Some(0x05), &payload),
                Err(ParseError::ReservedByte(framing))
            );
        }

        #[test]
        fn reader_handles_arbitrary_chunking(hz in amateur_frequency(), split in 1usize..10) {
            let payload = frequency_to_bcd(hz, 5).unwrap();
            let frame = Frame::build_request(CONTROLLER_ADDR, 0x94, 0x03, None, &payload).unwrap();
            let bytes = frame.as_bytes();
            let (head, tail) = bytes.split_at(split.min(bytes.len()));

            let mut wire = Wire::with(head);
            wire.rx.extend(tail);
            let mut reader = FrameReader::new();
            let parsed = reader.read_frame(&mut wire, Duration::from_millis(5)).unwrap();
            prop_assert_eq!(parsed, ParsedFrame::Complete(frame.clone()));
        }
    }
}
