//! CI-V Protocol Library
//!
//! This crate provides the wire-level pieces of the Icom CI-V control bus:
//!
//! - **BCD numerics** ([`bcd`]): packed decimal in little- and big-endian digit order
//! - **Frame codec** ([`frame`]): building requests, reading and classifying replies
//! - **Command codes** ([`command`]): command/subcommand ids and rig-level value types
//! - **Modes** ([`mode`]): mode codes and the per-family translation strategies
//! - **Setting tables** ([`level`]): level and function rows consumed by one generic routine
//! - **Calibration** ([`calibration`]): meter curves and fixed linear scales
//! - **Model data** ([`models`]): capability descriptors and identity bytes
//! - **Transport** ([`transport`]): the byte channel everything runs over
//!
//! # Example
//!
//! ```rust
//! use civ_protocol::frame::{parse_frame, Frame, ParsedFrame, CONTROLLER_ADDR};
//! use civ_protocol::bcd::{bcd_to_frequency, frequency_to_bcd};
//!
//! // Set 14.250 MHz on an IC-7300 (address 0x94)
//! let payload = frequency_to_bcd(14_250_000, 5).unwrap();
//! let request = Frame::build_request(0x94, CONTROLLER_ADDR, 0x05, None, &payload).unwrap();
//!
//! if let ParsedFrame::Complete(frame) = parse_frame(request.as_bytes()) {
//!     let fields = frame.fields(false).unwrap();
//!     assert_eq!(bcd_to_frequency(fields.payload).unwrap(), 14_250_000);
//! }
//! ```

pub mod bcd;
pub mod calibration;
pub mod command;
pub mod error;
pub mod frame;
pub mod level;
pub mod mode;
pub mod models;
pub mod transport;

pub use bcd::{decode_bcd, encode_bcd, Endianness};
pub use calibration::{CalPoint, CalibrationTable, ValueScaler};
pub use command::{RepeaterShift, ScanKind, Vfo, VfoOp};
pub use error::ParseError;
pub use frame::{parse_frame, Frame, FrameFields, FrameReader, ParsedFrame};
pub use level::{Func, Level, LevelValue, Meter};
pub use mode::{FilterDecoding, ModeReport, ModeTranslation, OperatingMode, Passband};
pub use models::{Accessory, AgcMode, RigCaps, VfoMask};
pub use transport::{PortOpener, Transport};
