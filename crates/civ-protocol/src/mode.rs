//! Operating modes, passbands and the per-family mode code strategies

use crate::error::ParseError;

/// Operating mode of the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperatingMode {
    /// Lower Sideband
    Lsb,
    /// Upper Sideband
    #[default]
    Usb,
    /// AM
    Am,
    /// Synchronous AM
    AmSync,
    /// CW (Morse code)
    Cw,
    /// CW Reverse
    CwR,
    /// RTTY (Radio Teletype)
    Rtty,
    /// RTTY Reverse
    RttyR,
    /// FM
    Fm,
    /// Wide FM (broadcast)
    Wfm,
    /// PSK
    Psk,
    /// PSK Reverse
    PskR,
    /// D-STAR digital voice
    DStar,
    /// USB with the data input selected
    PktUsb,
    /// LSB with the data input selected
    PktLsb,
    /// FM with the data input selected
    PktFm,
    /// AM with the data input selected
    PktAm,
}

impl OperatingMode {
    /// Voice mode underlying a data mode
    pub fn base(self) -> Self {
        match self {
            OperatingMode::PktUsb => OperatingMode::Usb,
            OperatingMode::PktLsb => OperatingMode::Lsb,
            OperatingMode::PktFm => OperatingMode::Fm,
            OperatingMode::PktAm => OperatingMode::Am,
            other => other,
        }
    }

    /// True when the data input is selected
    pub fn is_data(self) -> bool {
        self.base() != self
    }

    /// Data variant of a voice mode, if one exists
    pub fn with_data(self) -> Option<Self> {
        match self {
            OperatingMode::Usb => Some(OperatingMode::PktUsb),
            OperatingMode::Lsb => Some(OperatingMode::PktLsb),
            OperatingMode::Fm => Some(OperatingMode::PktFm),
            OperatingMode::Am => Some(OperatingMode::PktAm),
            _ => None,
        }
    }

    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingMode::Lsb => "LSB",
            OperatingMode::Usb => "USB",
            OperatingMode::Am => "AM",
            OperatingMode::AmSync => "AMS",
            OperatingMode::Cw => "CW",
            OperatingMode::CwR => "CWR",
            OperatingMode::Rtty => "RTTY",
            OperatingMode::RttyR => "RTTYR",
            OperatingMode::Fm => "FM",
            OperatingMode::Wfm => "WFM",
            OperatingMode::Psk => "PSK",
            OperatingMode::PskR => "PSKR",
            OperatingMode::DStar => "DSTAR",
            OperatingMode::PktUsb => "PKTUSB",
            OperatingMode::PktLsb => "PKTLSB",
            OperatingMode::PktFm => "PKTFM",
            OperatingMode::PktAm => "PKTAM",
        }
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter preset carried in the mode command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Passband {
    Wide,
    #[default]
    Normal,
    Narrow,
}

impl Passband {
    /// Filter byte (FIL1..FIL3)
    pub fn code(self) -> u8 {
        match self {
            Passband::Wide => 0x01,
            Passband::Normal => 0x02,
            Passband::Narrow => 0x03,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Passband::Wide),
            0x02 => Some(Passband::Normal),
            0x03 => Some(Passband::Narrow),
            _ => None,
        }
    }
}

/// Mode and filter as reported by the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeReport {
    pub mode: OperatingMode,
    pub passband: Passband,
    /// DSP filter width in Hz, when the radio reports one
    pub width_hz: Option<u32>,
}

/// How a device family maps modes to wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModeTranslation {
    /// Full mode table with a filter byte
    #[default]
    Standard,
    /// Early rigs: basic modes only and no filter byte
    Legacy,
}

impl ModeTranslation {
    /// Wire code for a voice mode. Data modes must be reduced with
    /// [`OperatingMode::base`] first.
    pub fn encode(self, mode: OperatingMode) -> Option<u8> {
        let code = match mode {
            OperatingMode::Lsb => 0x00,
            OperatingMode::Usb => 0x01,
            OperatingMode::Am => 0x02,
            OperatingMode::Cw => 0x03,
            OperatingMode::Rtty => 0x04,
            OperatingMode::Fm => 0x05,
            OperatingMode::Wfm => 0x06,
            OperatingMode::CwR => 0x07,
            OperatingMode::RttyR => 0x08,
            OperatingMode::AmSync => 0x11,
            OperatingMode::Psk => 0x12,
            OperatingMode::PskR => 0x13,
            OperatingMode::DStar => 0x17,
            _ => return None,
        };
        match self {
            ModeTranslation::Standard => Some(code),
            ModeTranslation::Legacy if code <= 0x05 => Some(code),
            ModeTranslation::Legacy => None,
        }
    }

    /// Decode a mode code and optional filter byte
    pub fn decode(self, code: u8, filter: Option<u8>) -> Result<(OperatingMode, Passband), ParseError> {
        let mode = match code {
            0x00 => OperatingMode::Lsb,
            0x01 => OperatingMode::Usb,
            0x02 => OperatingMode::Am,
            0x03 => OperatingMode::Cw,
            0x04 => OperatingMode::Rtty,
            0x05 => OperatingMode::Fm,
            0x06 if self == ModeTranslation::Standard => OperatingMode::Wfm,
            0x07 if self == ModeTranslation::Standard => OperatingMode::CwR,
            0x08 if self == ModeTranslation::Standard => OperatingMode::RttyR,
            0x11 if self == ModeTranslation::Standard => OperatingMode::AmSync,
            0x12 if self == ModeTranslation::Standard => OperatingMode::Psk,
            0x13 if self == ModeTranslation::Standard => OperatingMode::PskR,
            0x17 if self == ModeTranslation::Standard => OperatingMode::DStar,
            other => return Err(ParseError::UnknownMode(other)),
        };
        let passband = filter.and_then(Passband::from_code).unwrap_or_default();
        Ok((mode, passband))
    }

    /// Whether the set-mode command carries a filter byte
    pub fn sends_passband(self) -> bool {
        self == ModeTranslation::Standard
    }
}

/// How a device family reports its filter width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterDecoding {
    /// Only the FIL1..FIL3 preset is known
    #[default]
    Preset,
    /// DSP radios report a filter index through the memory area
    Dsp,
}

impl FilterDecoding {
    /// Width in Hz for a DSP filter index, where the mode has a defined scale
    pub fn width_hz(self, mode: OperatingMode, index: u32) -> Option<u32> {
        if self != FilterDecoding::Dsp {
            return None;
        }
        match mode.base() {
            OperatingMode::Am => Some((index + 1) * 200),
            OperatingMode::Cw
            | OperatingMode::CwR
            | OperatingMode::Usb
            | OperatingMode::Lsb
            | OperatingMode::Rtty
            | OperatingMode::RttyR => Some(if index < 10 {
                (index + 1) * 50
            } else {
                (index - 4) * 100
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_codes() {
        let t = ModeTranslation::Standard;
        assert_eq!(t.encode(OperatingMode::Usb), Some(0x01));
        assert_eq!(t.encode(OperatingMode::CwR), Some(0x07));
        assert_eq!(t.encode(OperatingMode::PktUsb), None);
        assert_eq!(t.decode(0x03, Some(0x03)).unwrap(), (OperatingMode::Cw, Passband::Narrow));
        assert_eq!(t.decode(0x05, None).unwrap(), (OperatingMode::Fm, Passband::Normal));
        assert_eq!(t.decode(0x42, None), Err(ParseError::UnknownMode(0x42)));
    }

    #[test]
    fn test_legacy_codes() {
        let t = ModeTranslation::Legacy;
        assert_eq!(t.encode(OperatingMode::Fm), Some(0x05));
        assert_eq!(t.encode(OperatingMode::Wfm), None);
        assert!(t.decode(0x07, None).is_err());
        assert!(!t.sends_passband());
    }

    #[test]
    fn test_data_modes() {
        assert_eq!(OperatingMode::PktLsb.base(), OperatingMode::Lsb);
        assert!(OperatingMode::PktFm.is_data());
        assert_eq!(OperatingMode::Am.with_data(), Some(OperatingMode::PktAm));
        assert_eq!(OperatingMode::Cw.with_data(), None);
    }

    #[test]
    fn test_dsp_widths() {
        let d = FilterDecoding::Dsp;
        assert_eq!(d.width_hz(OperatingMode::Usb, 9), Some(500));
        assert_eq!(d.width_hz(OperatingMode::Usb, 40), Some(3600));
        assert_eq!(d.width_hz(OperatingMode::Am, 49), Some(10_000));
        assert_eq!(d.width_hz(OperatingMode::Fm, 1), None);
        assert_eq!(FilterDecoding::Preset.width_hz(OperatingMode::Usb, 9), None);
    }
}
