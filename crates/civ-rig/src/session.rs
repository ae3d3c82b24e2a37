//! Per-session state
//!
//! Everything a session learns or caches lives here and is owned by exactly
//! one [`crate::Rig`]. Nothing is shared between sessions.

use civ_protocol::{RigCaps, Vfo, VfoMask};

use crate::config::SessionConfig;
use crate::transaction::EchoMode;

/// VFO arrangement, classified once from the descriptor mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfoTopology {
    /// VFO A and B only
    AbOnly,
    /// Main and Sub receivers only
    MainSubOnly,
    /// Main and Sub, each with A and B
    Both,
    /// Neither pair is present
    Unknown,
}

impl VfoTopology {
    pub fn classify(mask: VfoMask) -> Self {
        match (mask.has_a_b(), mask.has_main_sub()) {
            (true, true) => VfoTopology::Both,
            (true, false) => VfoTopology::AbOnly,
            (false, true) => VfoTopology::MainSubOnly,
            (false, false) => VfoTopology::Unknown,
        }
    }

    /// VFO assumed current before anything has been selected
    pub fn default_vfo(self) -> Option<Vfo> {
        match self {
            VfoTopology::AbOnly => Some(Vfo::A),
            VfoTopology::MainSubOnly | VfoTopology::Both => Some(Vfo::Main),
            VfoTopology::Unknown => None,
        }
    }

    /// Fixed (rx, tx) pair, where the topology defines one
    pub fn split_pair(self) -> Option<(Vfo, Vfo)> {
        match self {
            VfoTopology::AbOnly => Some((Vfo::A, Vfo::B)),
            VfoTopology::MainSubOnly => Some((Vfo::Main, Vfo::Sub)),
            VfoTopology::Both | VfoTopology::Unknown => None,
        }
    }
}

/// Mutable state of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Last VFO the radio confirmed selecting. `None` once a selection
    /// failed and the radio's actual VFO is in doubt.
    pub current_vfo: Option<Vfo>,
    /// Receive VFO of the last split assignment
    pub rx_vfo: Option<Vfo>,
    /// Transmit VFO of the last split assignment
    pub tx_vfo: Option<Vfo>,
    pub split_on: bool,
    /// Never use the exchange operation for split access
    pub no_exchange: bool,
    /// 4-byte frequency fields
    pub legacy_freq_width: bool,
    pub echo: EchoMode,
    /// Set after the radio rejected a filter-width query
    pub filter_query_disabled: bool,
    pub topology: VfoTopology,
}

impl SessionState {
    pub fn new(caps: &RigCaps, config: &SessionConfig) -> Self {
        Self {
            current_vfo: None,
            rx_vfo: None,
            tx_vfo: None,
            split_on: false,
            no_exchange: config.no_xchg,
            legacy_freq_width: config.mode731.unwrap_or(caps.legacy_freq_width),
            echo: EchoMode::NoEcho,
            filter_query_disabled: false,
            topology: VfoTopology::classify(caps.vfos),
        }
    }

    /// Frequency field width in bytes
    pub fn freq_width(&self) -> usize {
        if self.legacy_freq_width {
            4
        } else {
            5
        }
    }
}
