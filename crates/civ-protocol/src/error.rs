//! Error types for CI-V frame and numeric decoding

use thiserror::Error;

/// Errors that can occur while encoding or parsing CI-V data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A nibble outside 0-9 was found in a BCD field
    #[error("invalid BCD digit: {0}")]
    InvalidBcd(u8),

    /// Value does not fit in the requested number of BCD digits
    #[error("value {value} does not fit in {digits} BCD digits")]
    BcdOverflow { value: u64, digits: usize },

    /// Not enough bytes to hold the requested number of digits
    #[error("BCD field too short: need {needed} bytes, got {actual}")]
    BcdTooShort { needed: usize, actual: usize },

    /// Frame would exceed the maximum frame length
    #[error("frame too long: {0} bytes")]
    FrameTooLong(usize),

    /// Invalid frame structure
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Invalid address (reserved preamble/terminator values)
    #[error("invalid address: 0x{0:02X}")]
    InvalidAddress(u8),

    /// Preamble, terminator or collision byte inside a frame body
    #[error("framing byte 0x{0:02X} inside frame body")]
    ReservedByte(u8),

    /// Mode byte not known to the mode tables
    #[error("unknown mode code: 0x{0:02X}")]
    UnknownMode(u8),
}
