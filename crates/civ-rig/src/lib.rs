//! CI-V Rig Control Library
//!
//! Blocking control sessions for CI-V transceivers:
//!
//! - **Transactions** ([`transaction`]): request/reply pairing, echo
//!   handling, ACK/NAK validation and the retry policy
//! - **Sessions** ([`rig`]): the operation surface, from frequency and mode
//!   to levels, tones, memory, scan and power
//! - **VFO topology** ([`vfo`]): VFO selection and split access across A/B,
//!   Main/Sub and combined radios
//! - **Transceive** ([`transceive`]): announcements decoded into callbacks
//! - **Serial** ([`serial`]): the transport over a real serial port
//!
//! # Example
//!
//! ```rust
//! use civ_protocol::{RigCaps, Vfo};
//! use civ_rig::{Rig, SessionConfig};
//! use civ_sim::{SimulatedBus, SimulatedRig};
//!
//! let bus = SimulatedBus::with_rig(SimulatedRig::at(0x58, 19200));
//! let caps = RigCaps::by_model("IC-706MKIIG").unwrap().clone();
//!
//! let mut rig = Rig::open(bus.clone(), caps, SessionConfig::default()).unwrap();
//! rig.set_freq(Vfo::A, 7_074_000).unwrap();
//! assert_eq!(rig.get_freq(Vfo::Current).unwrap(), 7_074_000);
//! ```

pub mod config;
pub mod error;
pub mod levels;
pub mod rig;
pub mod serial;
pub mod session;
pub mod transaction;
pub mod transceive;
pub mod vfo;

pub use config::SessionConfig;
pub use error::{Result, RigError};
pub use rig::Rig;
pub use serial::{SerialOpener, SerialTransport};
pub use session::{SessionState, VfoTopology};
pub use transaction::{EchoMode, Reply, ReplyShape, TransactionEngine};
pub use transceive::{EventCallback, RigEvent};
