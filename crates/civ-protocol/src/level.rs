//! Level and function setting tables
//!
//! Every settable or readable level maps to a command, an optional
//! subcommand, a payload width and a transform. The rig layer runs one
//! generic encode/decode routine over these rows; per-model differences are
//! override rows on the capability descriptor.

use crate::command::cmd;

/// Levels that can be set or read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// Preamp gain in dB (0 = off)
    Preamp,
    /// Attenuation in dB (0 = off)
    Attenuator,
    AfGain,
    RfGain,
    Squelch,
    IfShift,
    AudioPeakFilter,
    NoiseReduction,
    NoiseBlanker,
    PassbandTuneIn,
    PassbandTuneOut,
    /// CW sidetone pitch in Hz
    CwPitch,
    RfPower,
    MicGain,
    /// Keyer speed in words per minute
    KeySpeed,
    /// Manual notch position, raw
    NotchRaw,
    Compression,
    /// AGC time constant
    Agc,
    BreakInDelay,
    Balance,
    VoxGain,
    AntiVox,
    MonitorGain,
    /// S-meter raw count
    RawStrength,
    /// S-meter in dB relative to S9
    Strength,
    AlcMeter,
    SwrMeter,
    RfPowerMeter,
    CompMeter,
    VdMeter,
    IdMeter,
}

impl Level {
    /// Levels carried as 0.0-1.0 floats (or calibrated floats for meters)
    pub fn is_float(self) -> bool {
        !matches!(
            self,
            Level::Preamp
                | Level::Attenuator
                | Level::CwPitch
                | Level::KeySpeed
                | Level::NotchRaw
                | Level::Agc
                | Level::BreakInDelay
                | Level::RawStrength
                | Level::Strength
        )
    }

    /// Meters and the S-meter can only be read
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Level::RawStrength
                | Level::Strength
                | Level::AlcMeter
                | Level::SwrMeter
                | Level::RfPowerMeter
                | Level::CompMeter
                | Level::VdMeter
                | Level::IdMeter
        )
    }
}

/// Level value in the unit given by [`Level::is_float`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LevelValue {
    Float(f32),
    Int(i32),
}

impl LevelValue {
    pub fn as_f32(self) -> f32 {
        match self {
            LevelValue::Float(f) => f,
            LevelValue::Int(i) => i as f32,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            LevelValue::Float(f) => f.round() as i32,
            LevelValue::Int(i) => i,
        }
    }
}

/// Meter curves selectable on the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Meter {
    Swr,
    Alc,
    RfPower,
    Comp,
    Vd,
    Id,
}

/// How a raw wire value maps to the level's unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelTransform {
    /// 0.0-1.0 over 0-255
    Normalized,
    /// Wire value is the integer
    Integer,
    /// 6-48 wpm over 0-255
    KeySpeed,
    /// 300-900 Hz over 0-255
    CwPitch,
    /// 1-based index into the descriptor preamp list, 0 = off
    PreampIndex,
    /// Attenuation in dB, one BCD byte in the subcommand slot
    AttenuatorDb,
    /// Looked up in the descriptor AGC table
    AgcCode,
    /// Calibrated meter reading
    Meter(Meter),
    /// Calibrated S-meter
    Strength,
}

/// One row of the level table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEntry {
    pub level: Level,
    pub cmd: u8,
    pub subcmd: Option<u8>,
    /// Payload width in bytes (big-endian BCD)
    pub width: usize,
    pub transform: LevelTransform,
}

const fn row(level: Level, cmd: u8, subcmd: u8, width: usize, transform: LevelTransform) -> LevelEntry {
    LevelEntry {
        level,
        cmd,
        subcmd: Some(subcmd),
        width,
        transform,
    }
}

const fn lvl(level: Level, subcmd: u8) -> LevelEntry {
    row(level, cmd::LEVEL, subcmd, 2, LevelTransform::Normalized)
}

const fn meter(level: Level, subcmd: u8, meter: Meter) -> LevelEntry {
    row(level, cmd::READ_METER, subcmd, 2, LevelTransform::Meter(meter))
}

/// Default level mapping
pub const LEVEL_TABLE: &[LevelEntry] = &[
    row(Level::Preamp, cmd::FUNC, 0x02, 1, LevelTransform::PreampIndex),
    LevelEntry {
        level: Level::Attenuator,
        cmd: cmd::ATTENUATOR,
        subcmd: None,
        width: 1,
        transform: LevelTransform::AttenuatorDb,
    },
    lvl(Level::AfGain, 0x01),
    lvl(Level::RfGain, 0x02),
    lvl(Level::Squelch, 0x03),
    lvl(Level::IfShift, 0x04),
    lvl(Level::AudioPeakFilter, 0x05),
    lvl(Level::NoiseReduction, 0x06),
    lvl(Level::PassbandTuneIn, 0x07),
    lvl(Level::PassbandTuneOut, 0x08),
    row(Level::CwPitch, cmd::LEVEL, 0x09, 2, LevelTransform::CwPitch),
    lvl(Level::RfPower, 0x0A),
    lvl(Level::MicGain, 0x0B),
    row(Level::KeySpeed, cmd::LEVEL, 0x0C, 2, LevelTransform::KeySpeed),
    row(Level::NotchRaw, cmd::LEVEL, 0x0D, 2, LevelTransform::Integer),
    lvl(Level::Compression, 0x0E),
    row(Level::BreakInDelay, cmd::LEVEL, 0x0F, 2, LevelTransform::Integer),
    lvl(Level::Balance, 0x10),
    lvl(Level::NoiseBlanker, 0x12),
    lvl(Level::MonitorGain, 0x15),
    lvl(Level::VoxGain, 0x16),
    lvl(Level::AntiVox, 0x17),
    row(Level::Agc, cmd::FUNC, 0x12, 1, LevelTransform::AgcCode),
    row(Level::RawStrength, cmd::READ_METER, 0x02, 2, LevelTransform::Integer),
    row(Level::Strength, cmd::READ_METER, 0x02, 2, LevelTransform::Strength),
    meter(Level::RfPowerMeter, 0x11, Meter::RfPower),
    meter(Level::SwrMeter, 0x12, Meter::Swr),
    meter(Level::AlcMeter, 0x13, Meter::Alc),
    meter(Level::CompMeter, 0x14, Meter::Comp),
    meter(Level::VdMeter, 0x15, Meter::Vd),
    meter(Level::IdMeter, 0x16, Meter::Id),
];

/// Find the row for `level`, consulting `overrides` first
pub fn level_entry(overrides: &[LevelEntry], level: Level) -> Option<LevelEntry> {
    overrides
        .iter()
        .chain(LEVEL_TABLE)
        .find(|e| e.level == level)
        .copied()
}

/// On/off functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Func {
    NoiseBlanker,
    Compressor,
    Vox,
    /// Repeater tone encode
    Tone,
    /// Tone squelch
    ToneSquelch,
    /// Semi break-in
    SemiBreakIn,
    /// Full break-in
    FullBreakIn,
    AutoNotch,
    NoiseReduction,
    AudioPeakFilter,
    Monitor,
    ManualNotch,
    /// RTTY filter
    RttyFilter,
    Afc,
    /// Digital code squelch
    DcsSquelch,
    DialLock,
    Rit,
    Xit,
    Satellite,
}

/// One row of the function table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncEntry {
    pub func: Func,
    pub cmd: u8,
    pub subcmd: u8,
    /// Byte written to switch the function on
    pub on_value: u8,
}

const fn func(func: Func, subcmd: u8) -> FuncEntry {
    FuncEntry {
        func,
        cmd: cmd::FUNC,
        subcmd,
        on_value: 0x01,
    }
}

/// Default function mapping
pub const FUNC_TABLE: &[FuncEntry] = &[
    func(Func::NoiseBlanker, 0x22),
    func(Func::AudioPeakFilter, 0x32),
    func(Func::NoiseReduction, 0x40),
    func(Func::AutoNotch, 0x41),
    func(Func::Tone, 0x42),
    func(Func::ToneSquelch, 0x43),
    func(Func::Compressor, 0x44),
    func(Func::Monitor, 0x45),
    func(Func::Vox, 0x46),
    func(Func::SemiBreakIn, 0x47),
    FuncEntry {
        func: Func::FullBreakIn,
        cmd: cmd::FUNC,
        subcmd: 0x47,
        on_value: 0x02,
    },
    func(Func::ManualNotch, 0x48),
    func(Func::RttyFilter, 0x49),
    func(Func::Afc, 0x4A),
    func(Func::DcsSquelch, 0x4B),
    func(Func::DialLock, 0x50),
    func(Func::Satellite, 0x5A),
    FuncEntry {
        func: Func::Rit,
        cmd: cmd::RIT,
        subcmd: 0x01,
        on_value: 0x01,
    },
    FuncEntry {
        func: Func::Xit,
        cmd: cmd::RIT,
        subcmd: 0x02,
        on_value: 0x01,
    },
];

/// Find the row for `func`
pub fn func_entry(func: Func) -> Option<&'static FuncEntry> {
    FUNC_TABLE.iter().find(|e| e.func == func)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_level_has_a_row() {
        for level in [Level::AfGain, Level::KeySpeed, Level::SwrMeter, Level::Agc, Level::Attenuator] {
            assert!(level_entry(&[], level).is_some(), "{:?}", level);
        }
    }

    #[test]
    fn test_override_wins() {
        let vox_in_memory = LevelEntry {
            level: Level::VoxGain,
            cmd: cmd::CTL_MEM,
            subcmd: Some(0x06),
            width: 2,
            transform: LevelTransform::Normalized,
        };
        let entry = level_entry(&[vox_in_memory], Level::VoxGain).unwrap();
        assert_eq!(entry.cmd, cmd::CTL_MEM);
        assert_eq!(level_entry(&[], Level::VoxGain).unwrap().cmd, cmd::LEVEL);
    }

    #[test]
    fn test_level_kinds() {
        assert!(Level::AfGain.is_float());
        assert!(!Level::KeySpeed.is_float());
        assert!(Level::SwrMeter.is_read_only());
        assert!(!Level::RfPower.is_read_only());
    }

    #[test]
    fn test_break_in_variants_share_subcommand() {
        let semi = func_entry(Func::SemiBreakIn).unwrap();
        let full = func_entry(Func::FullBreakIn).unwrap();
        assert_eq!(semi.subcmd, full.subcmd);
        assert_ne!(semi.on_value, full.on_value);
    }
}
