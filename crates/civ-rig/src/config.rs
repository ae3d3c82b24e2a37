//! Session configuration

use std::path::Path;
use std::time::Duration;

use civ_protocol::frame::{CONTROLLER_ADDR, MAX_FRAME_LEN};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};

/// Settings a session is opened with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// CI-V address of the radio; the descriptor default when unset
    #[serde(default)]
    pub civ_address: Option<u8>,
    /// Our own address on the bus
    #[serde(default = "default_controller_address")]
    pub controller_address: u8,
    /// Line speed, used to size the reply window
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Attempts per transaction, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base reply timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Bytes expected on the line per attempt, echo included; sizes the
    /// wire-time part of the reply window
    #[serde(default = "default_max_reply_len")]
    pub max_reply_len: usize,
    /// Pause between attempts in milliseconds
    #[serde(default)]
    pub retry_delay_ms: u64,
    /// Force 4-byte frequency fields on or off
    #[serde(default)]
    pub mode731: Option<bool>,
    /// Never use the VFO exchange operation for split access
    #[serde(default)]
    pub no_xchg: bool,
    /// Force the echo policy instead of detecting it
    #[serde(default)]
    pub echo: Option<bool>,
    /// Pause between wake-up polls after power-on, in milliseconds
    #[serde(default = "default_power_on_wait_ms")]
    pub power_on_wait_ms: u64,
    /// Wake-up polls after power-on
    #[serde(default = "default_power_on_polls")]
    pub power_on_polls: u32,
}

fn default_controller_address() -> u8 {
    CONTROLLER_ADDR
}

fn default_baud_rate() -> u32 {
    19200
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    200
}

fn default_max_reply_len() -> usize {
    MAX_FRAME_LEN
}

fn default_power_on_wait_ms() -> u64 {
    1000
}

fn default_power_on_polls() -> u32 {
    3
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            civ_address: None,
            controller_address: default_controller_address(),
            baud_rate: default_baud_rate(),
            max_attempts: default_max_attempts(),
            timeout_ms: default_timeout_ms(),
            max_reply_len: default_max_reply_len(),
            retry_delay_ms: 0,
            mode731: None,
            no_xchg: false,
            echo: None,
            power_on_wait_ms: default_power_on_wait_ms(),
            power_on_polls: default_power_on_polls(),
        }
    }
}

impl SessionConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| RigError::InvalidArgument(format!("session config: {}", e)))
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RigError::InvalidArgument(format!("session config: {}", e)))
    }

    /// Reply window: the base timeout plus the wire time of `max_reply_len`
    /// bytes at 10 bits each
    pub fn reply_timeout(&self) -> Duration {
        let bits = self.max_reply_len as u64 * 10;
        let wire_ms = bits * 1000 / u64::from(self.baud_rate.max(1));
        Duration::from_millis(self.timeout_ms + wire_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
