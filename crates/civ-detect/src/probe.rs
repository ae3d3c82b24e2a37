//! Bus discovery
//!
//! The probe walks the candidate line speeds from fast to slow. At each
//! speed it reopens the port, asks every rig address for its identity and
//! every accessory address for its name, then closes the port again. The
//! first speed at which anything answered ends the run, since all devices
//! on one bus share a speed.

use std::ops::RangeInclusive;
use std::time::Duration;

use civ_protocol::command::{cmd, sub};
use civ_protocol::frame::{CONTROLLER_ADDR, NAK};
use civ_protocol::models::model_for_id;
use civ_protocol::{Accessory, PortOpener, Transport};
use civ_rig::{EchoMode, ReplyShape, RigError, SerialOpener, SessionConfig, TransactionEngine};
use tracing::{debug, info, trace, warn};

use crate::error::DetectError;

/// Length of an accessory identification: 3 name bytes and 2 version bytes
const ACCESSORY_ID_LEN: usize = 5;

/// Bytes on the line per probed address: the echoed 7-byte request and the
/// 12-byte accessory identification, the longest reply the probe accepts
const PROBE_EXCHANGE_LEN: usize = 7 + 12;

/// What a discovered device turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbedModel {
    /// A radio from the known-device table
    Rig(&'static str),
    /// A radio whose identity byte is not in the known-device table
    Unknown,
    /// A signal-processing accessory, versions as (major, minor)
    Accessory {
        kind: Accessory,
        software_version: (u8, u8),
        interface_version: (u8, u8),
    },
}

/// One device found on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRecord {
    /// Address the device answered on
    pub address: u8,
    /// The identity byte of a radio, or the raw identification of an accessory
    pub identity: Vec<u8>,
    pub baud_rate: u32,
    pub model: ProbedModel,
}

impl ProbeRecord {
    /// Model name, when the device was recognised
    pub fn model_name(&self) -> Option<&'static str> {
        match self.model {
            ProbedModel::Rig(name) => Some(name),
            ProbedModel::Accessory { kind, .. } => Some(kind.model()),
            ProbedModel::Unknown => None,
        }
    }
}

/// Devices found at the speed that ended the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub baud_rate: u32,
    pub records: Vec<ProbeRecord>,
}

/// Configuration for probing
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Line speeds to try, in order
    pub baud_rates: Vec<u32>,
    /// Addresses asked for a radio identity
    pub rig_addresses: RangeInclusive<u8>,
    /// Addresses asked for an accessory identification
    pub accessory_addresses: RangeInclusive<u8>,
    pub controller_address: u8,
    /// The interface hands written bytes back before the reply
    pub echo: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            baud_rates: vec![19200, 9600, 300],
            rig_addresses: 0x01..=0x7F,
            accessory_addresses: 0x80..=0x8F,
            controller_address: CONTROLLER_ADDR,
            echo: true,
        }
    }
}

impl ProbeConfig {
    /// Base reply timeout at `baud_rate`, `2000 / rate + 40` ms.
    ///
    /// The engine adds the wire time of one probe exchange on top, so an
    /// address that stays silent costs 59 ms at 9600 baud and 679 ms at 300.
    pub fn timeout_for(&self, baud_rate: u32) -> Duration {
        let rate = u64::from(baud_rate.max(1));
        Duration::from_millis(2 * 1000 / rate + 40)
    }

    fn session_config(&self, baud_rate: u32) -> SessionConfig {
        SessionConfig {
            controller_address: self.controller_address,
            baud_rate,
            max_attempts: 1,
            timeout_ms: self.timeout_for(baud_rate).as_millis() as u64,
            max_reply_len: PROBE_EXCHANGE_LEN,
            ..Default::default()
        }
    }
}

/// How one address answered
enum Answer {
    Found(ProbeRecord),
    Absent,
    /// Something answered, but not in CI-V; the speed is probably wrong
    Garbled(String),
}

/// CI-V bus prober
pub struct DeviceProbe {
    config: ProbeConfig,
}

impl DeviceProbe {
    /// Create a prober with default configuration
    pub fn new() -> Self {
        Self {
            config: ProbeConfig::default(),
        }
    }

    /// Create a prober with custom configuration
    pub fn with_config(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Sweep the bus behind `opener`.
    ///
    /// Every device found is handed to `report` as soon as it answers.
    /// Returns the devices found at the first speed where any answered, or
    /// `None` when every speed stayed silent.
    pub fn probe<O: PortOpener>(
        &self,
        opener: &mut O,
        mut report: impl FnMut(&ProbeRecord),
    ) -> Result<Option<ProbeOutcome>, DetectError> {
        for &baud_rate in &self.config.baud_rates {
            let timeout = self.config.timeout_for(baud_rate);
            debug!("Probing at {} baud ({:?} timeout)", baud_rate, timeout);

            let port = opener
                .open(baud_rate, timeout)
                .map_err(|e| DetectError::OpenFailed {
                    baud_rate,
                    reason: e.to_string(),
                })?;
            let mut engine =
                TransactionEngine::new(port, 0, &self.config.session_config(baud_rate));

            let records = self.sweep(&mut engine, baud_rate, &mut report)?;
            // Dropping the engine closes the port before the next speed
            drop(engine);

            if !records.is_empty() {
                info!("Found {} device(s) at {} baud", records.len(), baud_rate);
                return Ok(Some(ProbeOutcome { baud_rate, records }));
            }
        }

        info!("No CI-V devices found");
        Ok(None)
    }

    fn sweep<T: Transport>(
        &self,
        engine: &mut TransactionEngine<T>,
        baud_rate: u32,
        report: &mut impl FnMut(&ProbeRecord),
    ) -> Result<Vec<ProbeRecord>, DetectError> {
        let mut records = Vec::new();

        for address in self.config.rig_addresses.clone() {
            match self.identify_rig(engine, address, baud_rate)? {
                Answer::Found(record) => {
                    report(&record);
                    records.push(record);
                }
                Answer::Absent => {}
                Answer::Garbled(reason) => {
                    warn!(
                        "Unexpected reply from 0x{:02X} at {} baud ({}), giving up on this speed",
                        address, baud_rate, reason
                    );
                    return Ok(records);
                }
            }
        }

        for address in self.config.accessory_addresses.clone() {
            if let Answer::Found(record) = self.identify_accessory(engine, address, baud_rate)? {
                report(&record);
                records.push(record);
                // One accessory per bus
                break;
            }
        }

        Ok(records)
    }

    fn echo(&self) -> EchoMode {
        if self.config.echo {
            EchoMode::Echo
        } else {
            EchoMode::NoEcho
        }
    }

    fn identify_rig<T: Transport>(
        &self,
        engine: &mut TransactionEngine<T>,
        address: u8,
        baud_rate: u32,
    ) -> Result<Answer, DetectError> {
        engine.set_radio_address(address);
        let reply = engine.execute(
            self.echo(),
            cmd::READ_ID,
            Some(sub::READ_ID),
            &[],
            ReplyShape::Data,
        );

        let identity = match reply {
            Ok(reply) => match reply.into_payload().map(|p| p.first().copied()) {
                Ok(Some(identity)) => identity,
                _ => return Ok(Answer::Garbled("identity reply without identity".into())),
            },
            // A radio without the identity command; its address is its identity
            Err(RigError::Rejected { code: NAK }) => {
                debug!("0x{:02X} refused identification", address);
                address
            }
            Err(RigError::Timeout) => {
                trace!("Nothing at 0x{:02X}", address);
                return Ok(Answer::Absent);
            }
            Err(RigError::BusBusy) => {
                debug!("Collision probing 0x{:02X}", address);
                return Ok(Answer::Absent);
            }
            Err(RigError::Io(e)) => return Err(DetectError::Io(e)),
            Err(e) => return Ok(Answer::Garbled(e.to_string())),
        };

        let model = match model_for_id(identity) {
            Some(name) => {
                info!("Found {} at 0x{:02X}", name, address);
                ProbedModel::Rig(name)
            }
            None => {
                warn!(
                    "Found unknown device with identity 0x{:02X} at 0x{:02X}",
                    identity, address
                );
                ProbedModel::Unknown
            }
        };

        Ok(Answer::Found(ProbeRecord {
            address,
            identity: vec![identity],
            baud_rate,
            model,
        }))
    }

    fn identify_accessory<T: Transport>(
        &self,
        engine: &mut TransactionEngine<T>,
        address: u8,
        baud_rate: u32,
    ) -> Result<Answer, DetectError> {
        engine.set_radio_address(address);
        let reply = engine.execute(
            self.echo(),
            cmd::MISC,
            Some(sub::OPTO_READ_ID),
            &[],
            ReplyShape::Data,
        );

        let payload = match reply.and_then(|r| r.into_payload()) {
            Ok(payload) if payload.len() == ACCESSORY_ID_LEN => payload,
            Ok(payload) => {
                debug!("Accessory reply {:02X?} at 0x{:02X} ignored", payload, address);
                return Ok(Answer::Absent);
            }
            Err(RigError::Io(e)) => return Err(DetectError::Io(e)),
            Err(_) => return Ok(Answer::Absent),
        };

        let name = String::from_utf8_lossy(&payload[..3]).into_owned();
        let Some(kind) = Accessory::from_name(&name) else {
            debug!("Unrecognised accessory {:?} at 0x{:02X}", name, address);
            return Ok(Answer::Absent);
        };
        let software_version = (payload[3] >> 4, payload[3] & 0x0F);
        let interface_version = (payload[4] >> 4, payload[4] & 0x0F);
        info!(
            "Found {}, software {}.{}, interface {}.{}, at 0x{:02X}",
            kind.model(),
            software_version.0,
            software_version.1,
            interface_version.0,
            interface_version.1,
            address
        );

        Ok(Answer::Found(ProbeRecord {
            address,
            identity: payload,
            baud_rate,
            model: ProbedModel::Accessory {
                kind,
                software_version,
                interface_version,
            },
        }))
    }
}

impl Default for DeviceProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe the serial device at `path`
pub fn probe_serial_port(
    path: &str,
    config: ProbeConfig,
    report: impl FnMut(&ProbeRecord),
) -> Result<Option<ProbeOutcome>, DetectError> {
    debug!("Probing {}", path);
    let mut opener = SerialOpener::new(path);
    DeviceProbe::with_config(config).probe(&mut opener, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_config_default() {
        let config = ProbeConfig::default();
        assert_eq!(config.baud_rates, vec![19200, 9600, 300]);
        assert_eq!(config.rig_addresses, 0x01..=0x7F);
        assert_eq!(config.accessory_addresses, 0x80..=0x8F);
        assert!(config.echo);
    }

    #[test]
    fn test_timeout_scales_with_rate() {
        let config = ProbeConfig::default();
        assert_eq!(config.timeout_for(19200), Duration::from_millis(40));
        assert_eq!(config.timeout_for(300), Duration::from_millis(46));
    }

    #[test]
    fn test_single_attempt_per_address() {
        let session = ProbeConfig::default().session_config(9600);
        assert_eq!(session.max_attempts, 1);
        assert_eq!(session.timeout_ms, 40);
        assert_eq!(session.baud_rate, 9600);
    }

    #[test]
    fn test_window_sized_for_identification_not_full_frame() {
        let config = ProbeConfig::default();
        assert_eq!(
            config.session_config(9600).reply_timeout(),
            Duration::from_millis(40 + 19)
        );
        assert_eq!(
            config.session_config(300).reply_timeout(),
            Duration::from_millis(46 + 633)
        );
    }

    #[test]
    fn test_model_name() {
        let record = ProbeRecord {
            address: 0x80,
            identity: b"535\x10\x20".to_vec(),
            baud_rate: 9600,
            model: ProbedModel::Accessory {
                kind: Accessory::OptoScan535,
                software_version: (1, 0),
                interface_version: (2, 0),
            },
        };
        assert_eq!(record.model_name(), Some("OptoScan535"));
    }
}
