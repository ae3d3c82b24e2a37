//! CI-V Device Detection Library
//!
//! This crate finds what is connected to a CI-V bus before any session is
//! opened: serial port enumeration and a sweep of the bus addresses at each
//! candidate line speed.
//!
//! # Example
//!
//! ```rust
//! use civ_detect::{DeviceProbe, ProbedModel};
//! use civ_sim::{SimulatedBus, SimulatedRig};
//!
//! let mut bus = SimulatedBus::with_rig(SimulatedRig::at(0x58, 9600));
//! bus.set_echo(true);
//!
//! let outcome = DeviceProbe::new().probe(&mut bus, |_| {}).unwrap().unwrap();
//! assert_eq!(outcome.baud_rate, 9600);
//! assert_eq!(outcome.records[0].model, ProbedModel::Rig("IC-706MKIIG"));
//! ```

pub mod error;
pub mod probe;
pub mod scanner;

pub use error::DetectError;
pub use probe::{probe_serial_port, DeviceProbe, ProbeConfig, ProbeOutcome, ProbeRecord, ProbedModel};
pub use scanner::{PortScanner, ScannerConfig, SerialPortInfo};
