//! Serial port enumeration
//!
//! Lists the ports a CI-V interface could be behind, so each can be handed
//! to [`crate::probe_serial_port`].

use serialport::{available_ports, SerialPortType};
use tracing::info;

use crate::error::DetectError;

/// USB-to-serial bridges found in CI-V interfaces and radios with a
/// built-in USB port: FTDI (CT-17 clones), Silicon Labs CP210x (IC-7300,
/// IC-9700, IC-705), Prolific PL2303 and WCH CH340
const CIV_USB_BRIDGES: &[(u16, u16)] = &[
    (0x0403, 0x6001),
    (0x0403, 0x6015),
    (0x10C4, 0xEA60),
    (0x10C4, 0xEA70),
    (0x067B, 0x2303),
    (0x1A86, 0x7523),
];

/// Information about a serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl SerialPortInfo {
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                serial_number: usb.serial_number.clone(),
                manufacturer: usb.manufacturer.clone(),
                product: usb.product.clone(),
            },
            _ => Self {
                port: name,
                vid: None,
                pid: None,
                serial_number: None,
                manufacturer: None,
                product: None,
            },
        }
    }

    /// The port sits on a USB bridge commonly used for CI-V
    pub fn is_civ_bridge(&self) -> bool {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => CIV_USB_BRIDGES.contains(&(vid, pid)),
            _ => false,
        }
    }
}

/// Serial port scanner configuration
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    /// Skip ports whose name contains any of these
    pub skip_patterns: Vec<String>,
    /// Only list ports on a known CI-V USB bridge
    pub civ_bridges_only: bool,
}

/// Serial port scanner
pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    pub fn new() -> Self {
        Self {
            config: ScannerConfig {
                skip_patterns: vec![
                    // Bluetooth ports on macOS
                    "Bluetooth".to_string(),
                    "debug".to_string(),
                ],
                civ_bridges_only: false,
            },
        }
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Enumerate candidate ports, known CI-V bridges first
    pub fn enumerate_ports(&self) -> Result<Vec<SerialPortInfo>, DetectError> {
        info!("Enumerating serial ports...");
        let ports = available_ports()?;

        let mut result: Vec<_> = ports
            .into_iter()
            .map(|p| SerialPortInfo::from_serialport(p.port_name, &p.port_type))
            .filter(|p| !self.should_skip_port(p))
            .collect();
        result.sort_by_key(|p| !p.is_civ_bridge());

        if result.is_empty() {
            info!("No serial ports found");
        } else {
            info!("Found {} serial port(s)", result.len());
            for port in &result {
                let desc = port.product.as_deref().unwrap_or("Unknown");
                info!("  {} - {}", port.port, desc);
            }
        }

        Ok(result)
    }

    fn should_skip_port(&self, port: &SerialPortInfo) -> bool {
        if self.config.civ_bridges_only && !port.is_civ_bridge() {
            return true;
        }
        self.config
            .skip_patterns
            .iter()
            .any(|pattern| port.port.contains(pattern.as_str()))
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(name: &str, vid: u16, pid: u16) -> SerialPortInfo {
        let usb_info = SerialPortType::UsbPort(UsbPortInfo {
            vid,
            pid,
            serial_number: Some("IC-7300 12345".to_string()),
            manufacturer: Some("Silicon Labs".to_string()),
            product: Some("CP2102 USB to UART Bridge Controller".to_string()),
        });
        SerialPortInfo::from_serialport(name.to_string(), &usb_info)
    }

    #[test]
    fn test_serial_port_info_from_usb() {
        let info = usb("/dev/ttyUSB0", 0x10C4, 0xEA60);
        assert_eq!(info.vid, Some(0x10C4));
        assert_eq!(info.pid, Some(0xEA60));
        assert!(info.is_civ_bridge());
    }

    #[test]
    fn test_non_usb_port_is_not_bridge() {
        let info = SerialPortInfo::from_serialport("/dev/ttyS0".to_string(), &SerialPortType::Unknown);
        assert!(!info.is_civ_bridge());
    }

    #[test]
    fn test_skip_rules() {
        let scanner = PortScanner::new();
        assert!(scanner.should_skip_port(&usb("/dev/cu.Bluetooth-Incoming-Port", 0x10C4, 0xEA60)));
        assert!(!scanner.should_skip_port(&usb("/dev/ttyUSB0", 0x1234, 0x0001)));

        let strict = PortScanner::with_config(ScannerConfig {
            civ_bridges_only: true,
            ..Default::default()
        });
        assert!(strict.should_skip_port(&usb("/dev/ttyUSB0", 0x1234, 0x0001)));
        assert!(!strict.should_skip_port(&usb("/dev/ttyUSB1", 0x0403, 0x6001)));
    }
}
