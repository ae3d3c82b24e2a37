//! CI-V Bus Simulation Library
//!
//! This crate provides a simulated CI-V bus for testing rig control and
//! discovery without physical hardware. It includes:
//!
//! - **SimulatedBus**: a [`civ_protocol::Transport`] and [`civ_protocol::PortOpener`]
//!   with optional local echo, per-device line speeds and scripted faults
//! - **SimulatedRig**: a transceiver answering reads and settings like the real thing
//! - **SimulatedAccessory**: a signal-processing accessory on the accessory address range
//!
//! # Example
//!
//! ```rust
//! use civ_sim::{SimulatedBus, SimulatedRig};
//! use civ_protocol::frame::{Frame, FrameReader, ParsedFrame, CONTROLLER_ADDR};
//! use civ_protocol::Transport;
//! use std::time::Duration;
//!
//! let mut bus = SimulatedBus::with_rig(SimulatedRig::at(0x58, 9600));
//!
//! // Read the frequency
//! let request = Frame::build_request(0x58, CONTROLLER_ADDR, 0x03, None, &[]).unwrap();
//! bus.write(request.as_bytes()).unwrap();
//!
//! let reply = FrameReader::new().read_frame(&mut bus, Duration::from_millis(10)).unwrap();
//! assert!(matches!(reply, ParsedFrame::Complete(_)));
//! ```

pub mod bus;
pub mod radio;

pub use bus::{Fault, SimulatedBus};
pub use radio::{SimTopology, SimulatedAccessory, SimulatedRig, SimulatedRigConfig, VfoState};
