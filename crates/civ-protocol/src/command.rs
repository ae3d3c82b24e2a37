//! CI-V command and subcommand codes, and the rig-level values they carry
//!
//! Codes are grouped by the command they qualify. Only the codes this
//! workspace sends or decodes are listed.

/// Command ids
pub mod cmd {
    /// Transceive frequency announcement (radio to broadcast)
    pub const SEND_FREQ: u8 = 0x00;
    /// Transceive mode announcement (radio to broadcast)
    pub const SEND_MODE: u8 = 0x01;
    pub const READ_FREQ: u8 = 0x03;
    pub const READ_MODE: u8 = 0x04;
    pub const SET_FREQ: u8 = 0x05;
    pub const SET_MODE: u8 = 0x06;
    /// VFO select, exchange and copy
    pub const SET_VFO: u8 = 0x07;
    /// Memory channel and bank select
    pub const SET_MEM: u8 = 0x08;
    /// VFO to memory
    pub const WRITE_MEM: u8 = 0x09;
    /// Memory to VFO
    pub const MEM_TO_VFO: u8 = 0x0A;
    pub const CLEAR_MEM: u8 = 0x0B;
    /// Read repeater offset
    pub const READ_OFFSET: u8 = 0x0C;
    /// Set repeater offset
    pub const SET_OFFSET: u8 = 0x0D;
    pub const SCAN: u8 = 0x0E;
    /// Split and duplex
    pub const SPLIT: u8 = 0x0F;
    pub const TUNING_STEP: u8 = 0x10;
    pub const ATTENUATOR: u8 = 0x11;
    pub const ANTENNA: u8 = 0x12;
    pub const LEVEL: u8 = 0x14;
    /// Squelch status and meters
    pub const READ_METER: u8 = 0x15;
    pub const FUNC: u8 = 0x16;
    pub const SEND_CW: u8 = 0x17;
    pub const POWER: u8 = 0x18;
    pub const READ_ID: u8 = 0x19;
    /// Memory-area extended settings
    pub const CTL_MEM: u8 = 0x1A;
    pub const TONE: u8 = 0x1B;
    /// PTT and antenna tuner
    pub const PTT: u8 = 0x1C;
    pub const RIT: u8 = 0x21;
    /// Accessory (OptoScan) commands
    pub const MISC: u8 = 0x7F;
}

/// Subcommands of [`cmd::SET_VFO`]
pub mod vfo_sub {
    pub const VFO_A: u8 = 0x00;
    pub const VFO_B: u8 = 0x01;
    /// Copy B to A
    pub const B_TO_A: u8 = 0xA0;
    /// Exchange the two VFOs
    pub const EXCHANGE: u8 = 0xB0;
    /// Copy Sub to Main
    pub const SUB_TO_MAIN: u8 = 0xB1;
    pub const MAIN: u8 = 0xD0;
    pub const SUB: u8 = 0xD1;
}

/// Subcommands of [`cmd::SPLIT`]
pub mod split_sub {
    pub const OFF: u8 = 0x00;
    pub const ON: u8 = 0x01;
    pub const SIMPLEX: u8 = 0x10;
    pub const DUPLEX_MINUS: u8 = 0x11;
    pub const DUPLEX_PLUS: u8 = 0x12;
}

/// Subcommands of [`cmd::SCAN`]
pub mod scan_sub {
    pub const STOP: u8 = 0x00;
    pub const START: u8 = 0x01;
    pub const DELTA: u8 = 0x03;
    /// Memory scan on dedicated receivers
    pub const MEMORY: u8 = 0x24;
}

/// Subcommands of [`cmd::CTL_MEM`]
pub mod mem_sub {
    /// Filter width, or the data-mode flag on rigs using alternate codes
    pub const ALT_FILTER_WIDTH: u8 = 0x02;
    pub const FILTER_WIDTH: u8 = 0x03;
    pub const ALT_DATA_MODE: u8 = 0x04;
    pub const DATA_MODE: u8 = 0x06;
    /// VOX gain on rigs that keep it in the memory area
    pub const VOX_GAIN: u8 = 0x06;
    pub const ANTI_VOX: u8 = 0x07;
}

/// Subcommands of [`cmd::TONE`]
pub mod tone_sub {
    pub const REPEATER: u8 = 0x00;
    pub const SQUELCH: u8 = 0x01;
    pub const DCS: u8 = 0x02;
}

/// Miscellaneous subcommands
pub mod sub {
    /// [`super::cmd::READ_ID`]: read transceiver id
    pub const READ_ID: u8 = 0x00;
    /// [`super::cmd::MISC`]: read accessory id
    pub const OPTO_READ_ID: u8 = 0x09;
    /// [`super::cmd::POWER`]
    pub const POWER_OFF: u8 = 0x00;
    pub const POWER_ON: u8 = 0x01;
    /// [`super::cmd::SET_MEM`]: bank select
    pub const BANK: u8 = 0xA0;
    /// [`super::cmd::PTT`]
    pub const PTT: u8 = 0x00;
    pub const ANTENNA_TUNER: u8 = 0x01;
    /// [`super::cmd::RIT`]
    pub const RIT_FREQ: u8 = 0x00;
    /// [`super::cmd::READ_METER`]: squelch open/closed
    pub const SQUELCH_STATUS: u8 = 0x01;
}

/// VFO / memory designators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Vfo {
    A,
    B,
    Main,
    Sub,
    /// Main receiver, VFO A (rigs with both topologies)
    MainA,
    /// Main receiver, VFO B
    MainB,
    /// Sub receiver, VFO A
    SubA,
    /// Sub receiver, VFO B
    SubB,
    /// Whatever VFO the session last selected
    Current,
    /// Receive VFO, resolved from split state
    Rx,
    /// Transmit VFO, resolved from split state
    Tx,
    /// Memory mode
    Memory,
    /// Leave memory mode for the last used VFO
    Vfo,
}

impl Vfo {
    /// True for designators that name one physical VFO
    pub fn is_concrete(self) -> bool {
        !matches!(self, Vfo::Current | Vfo::Rx | Vfo::Tx | Vfo::Vfo)
    }
}

impl std::fmt::Display for Vfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Vfo::A => "VFOA",
            Vfo::B => "VFOB",
            Vfo::Main => "Main",
            Vfo::Sub => "Sub",
            Vfo::MainA => "MainA",
            Vfo::MainB => "MainB",
            Vfo::SubA => "SubA",
            Vfo::SubB => "SubB",
            Vfo::Current => "currVFO",
            Vfo::Rx => "RX",
            Vfo::Tx => "TX",
            Vfo::Memory => "MEM",
            Vfo::Vfo => "VFO",
        };
        f.write_str(name)
    }
}

/// VFO and memory operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VfoOp {
    /// Copy the other VFO onto the current one (B to A, Sub to Main)
    Copy,
    /// Swap the VFOs
    Exchange,
    /// Store the VFO into the selected memory channel
    FromVfo,
    /// Load the selected memory channel into the VFO
    ToVfo,
    /// Clear the selected memory channel
    MemoryClear,
    /// Start an antenna tuner cycle
    Tune,
}

/// Repeater shift direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RepeaterShift {
    None,
    Minus,
    Plus,
}

/// Scan control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanKind {
    Stop,
    /// Memory scan
    Memory,
    /// Selected-memory scan
    Select,
    /// Priority watch on a channel
    Priority,
    /// Programmed scan between edge channels
    Programmed,
    /// Delta-f scan around the current frequency
    Delta,
}
