//! Error types for CI-V detection

use thiserror::Error;

/// Errors that end a detection run
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to open the port at a probe speed
    #[error("failed to open port at {baud_rate} baud: {reason}")]
    OpenFailed { baud_rate: u32, reason: String },

    /// I/O error during a probe
    #[error("I/O error during probe: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error, e.g. while enumerating ports
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),
}
