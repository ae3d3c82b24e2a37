//! VFO selection and split access
//!
//! Radios arrange their VFOs as A/B, Main/Sub, or Main/Sub each with A/B.
//! The operations here hide that behind one set of split calls:
//!
//! 1. With an exchange operation (and the session not forbidding it), the
//!    transmit VFO is reached by exchanging, working on the current VFO and
//!    exchanging back.
//! 2. Otherwise the transmit VFO is selected, worked on, and the receive VFO
//!    selected again. A/B radios may swap designations while split is on,
//!    so split is switched off around the sequence and back on afterwards.
//!
//! The first failing step ends the sequence and is returned. The cached
//! current VFO is only updated after the radio confirms a selection, and
//! cleared when a selection fails, so `select_vfo` can always be retried
//! to get back in step with the radio.

use civ_protocol::command::{cmd, split_sub, vfo_sub};
use civ_protocol::{ModeReport, OperatingMode, Passband, Transport, Vfo, VfoMask, VfoOp};
use tracing::{debug, trace};

use crate::error::{Result, RigError};
use crate::rig::Rig;
use crate::session::VfoTopology;

impl<T: Transport> Rig<T> {
    /// Make `target` the radio's current VFO.
    ///
    /// Does nothing when the session already knows `target` is current.
    pub fn select_vfo(&mut self, target: Vfo) -> Result<()> {
        let Some(vfo) = self.resolve_vfo(target)? else {
            trace!("No VFO to select for {}", target);
            return Ok(());
        };
        if self.state.current_vfo == Some(vfo) {
            trace!("{} already selected", vfo);
            return Ok(());
        }
        self.check_vfo(vfo)?;

        match self.issue_select(vfo) {
            Ok(()) => {
                debug!("Selected {}", vfo);
                // Leaving memory mode returns to whichever VFO was last used
                self.state.current_vfo = (vfo != Vfo::Vfo).then_some(vfo);
                Ok(())
            }
            Err(e) => {
                debug!("Selecting {} failed: {}", vfo, e);
                self.state.current_vfo = None;
                Err(e)
            }
        }
    }

    /// Alias of [`Rig::select_vfo`]
    pub fn set_vfo(&mut self, vfo: Vfo) -> Result<()> {
        self.select_vfo(vfo)
    }

    /// Current VFO as last confirmed by the radio
    pub fn get_vfo(&self) -> Option<Vfo> {
        self.state.current_vfo
    }

    /// Turn a possibly symbolic designator into a physical one
    fn resolve_vfo(&self, target: Vfo) -> Result<Option<Vfo>> {
        match target {
            Vfo::Current => Ok(self.state.current_vfo.or(self.state.topology.default_vfo())),
            Vfo::Rx | Vfo::Tx if self.state.split_on => {
                let (rx, tx) = self.get_split_vfos()?;
                Ok(Some(if target == Vfo::Rx { rx } else { tx }))
            }
            Vfo::Rx | Vfo::Tx => self.resolve_vfo(Vfo::Current),
            other => Ok(Some(other)),
        }
    }

    fn check_vfo(&self, vfo: Vfo) -> Result<()> {
        let vfos = self.caps.vfos;
        let present = match vfo {
            Vfo::A => vfos.contains(VfoMask::A),
            Vfo::B => vfos.contains(VfoMask::B),
            Vfo::Main => vfos.contains(VfoMask::MAIN),
            Vfo::Sub => vfos.contains(VfoMask::SUB),
            Vfo::MainA | Vfo::MainB | Vfo::SubA | Vfo::SubB => {
                self.state.topology == VfoTopology::Both
            }
            Vfo::Memory => vfos.contains(VfoMask::MEM),
            Vfo::Vfo => vfos.intersects(VfoMask::A | VfoMask::MAIN),
            Vfo::Current | Vfo::Rx | Vfo::Tx => false,
        };
        if present {
            Ok(())
        } else {
            Err(RigError::InvalidArgument(format!(
                "{} has no {}",
                self.caps.model, vfo
            )))
        }
    }

    fn issue_select(&mut self, vfo: Vfo) -> Result<()> {
        match vfo {
            Vfo::A => self.command(cmd::SET_VFO, Some(vfo_sub::VFO_A), &[]),
            Vfo::B => self.command(cmd::SET_VFO, Some(vfo_sub::VFO_B), &[]),
            Vfo::Main => self.command(cmd::SET_VFO, Some(vfo_sub::MAIN), &[]),
            Vfo::Sub => self.command(cmd::SET_VFO, Some(vfo_sub::SUB), &[]),
            Vfo::MainA => self.select_pair(Vfo::Main, Vfo::A),
            Vfo::MainB => self.select_pair(Vfo::Main, Vfo::B),
            Vfo::SubA => self.select_pair(Vfo::Sub, Vfo::A),
            Vfo::SubB => self.select_pair(Vfo::Sub, Vfo::B),
            Vfo::Memory => self.command(cmd::SET_MEM, None, &[]),
            Vfo::Vfo => self.command(cmd::SET_VFO, None, &[]),
            Vfo::Current | Vfo::Rx | Vfo::Tx => Err(RigError::InvalidArgument(format!(
                "{} is not a physical VFO",
                vfo
            ))),
        }
    }

    fn select_pair(&mut self, receiver: Vfo, vfo: Vfo) -> Result<()> {
        self.issue_select(receiver)?;
        self.issue_select(vfo)
    }

    /// Receive and transmit VFO used for split.
    ///
    /// Fixed for A/B and Main/Sub radios. Radios with both arrangements
    /// cannot report the active pair, so the last one assigned through
    /// [`Rig::set_split_vfo`] is used.
    pub fn get_split_vfos(&self) -> Result<(Vfo, Vfo)> {
        match self.state.topology {
            VfoTopology::Both => match (self.state.rx_vfo, self.state.tx_vfo) {
                (Some(rx), Some(tx)) => Ok((rx, tx)),
                _ => Err(RigError::InvalidArgument(
                    "no split VFO pair assigned yet".into(),
                )),
            },
            VfoTopology::Unknown => Err(RigError::Unsupported(format!(
                "{} has no VFO pair",
                self.caps.model
            ))),
            topology => topology
                .split_pair()
                .ok_or_else(|| RigError::Unsupported("split".into())),
        }
    }

    /// Run `op` with the transmit VFO current, then return to receive
    fn with_tx_vfo<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        if self.caps.has_exchange && !self.state.no_exchange {
            debug!("Split access through VFO exchange");
            self.vfo_op(VfoOp::Exchange)?;
            let value = op(self)?;
            self.vfo_op(VfoOp::Exchange)?;
            return Ok(value);
        }

        let (rx, tx) = self.get_split_vfos()?;
        let suspend_split = self.state.topology == VfoTopology::AbOnly && self.state.split_on;
        if suspend_split {
            debug!("Suspending split for VFO access");
            self.command(cmd::SPLIT, Some(split_sub::OFF), &[])?;
            self.state.split_on = false;
        }

        self.select_vfo(tx)?;
        let value = op(self)?;
        self.select_vfo(rx)?;

        if suspend_split {
            self.command(cmd::SPLIT, Some(split_sub::ON), &[])?;
            self.state.split_on = true;
        }
        Ok(value)
    }

    pub fn set_split_freq(&mut self, hz: u64) -> Result<()> {
        self.with_tx_vfo(|rig| rig.write_freq(hz))
    }

    pub fn get_split_freq(&mut self) -> Result<u64> {
        self.with_tx_vfo(|rig| rig.read_freq())
    }

    pub fn set_split_mode(&mut self, mode: OperatingMode, passband: Passband) -> Result<()> {
        self.with_tx_vfo(|rig| rig.write_mode(mode, passband))
    }

    pub fn get_split_mode(&mut self) -> Result<ModeReport> {
        self.with_tx_vfo(|rig| rig.read_mode())
    }

    /// Frequency and mode of the transmit VFO in one visit
    pub fn set_split_freq_mode(
        &mut self,
        hz: u64,
        mode: OperatingMode,
        passband: Passband,
    ) -> Result<()> {
        self.with_tx_vfo(|rig| {
            rig.write_freq(hz)?;
            rig.write_mode(mode, passband)
        })
    }

    pub fn get_split_freq_mode(&mut self) -> Result<(u64, ModeReport)> {
        self.with_tx_vfo(|rig| Ok((rig.read_freq()?, rig.read_mode()?)))
    }

    /// Switch split on or off and record the receive/transmit assignment
    pub fn set_split_vfo(&mut self, rx: Vfo, split: bool, tx: Vfo) -> Result<()> {
        if split {
            if self.caps.vfos.has_a_b() {
                self.select_vfo(Vfo::A)?;
            }
            self.command(cmd::SPLIT, Some(split_sub::ON), &[])?;
        } else {
            match rx {
                Vfo::A | Vfo::B => self.select_vfo(Vfo::A)?,
                Vfo::Main | Vfo::Sub => self.select_vfo(Vfo::Main)?,
                _ => {}
            }
            self.command(cmd::SPLIT, Some(split_sub::OFF), &[])?;
        }

        self.state.split_on = split;
        if rx.is_concrete() {
            self.state.rx_vfo = Some(rx);
        }
        if tx.is_concrete() {
            self.state.tx_vfo = Some(tx);
        }
        debug!("Split {} (rx {}, tx {})", if split { "on" } else { "off" }, rx, tx);
        Ok(())
    }

    /// Split flag as the radio reports it, with the transmit VFO in use
    pub fn get_split_vfo(&mut self) -> Result<(bool, Option<Vfo>)> {
        let payload = self.query(cmd::SPLIT, None, &[])?;
        let split = match payload.as_slice() {
            [split_sub::OFF] => false,
            [split_sub::ON] => true,
            other => return Err(RigError::Protocol(format!("split state {:02X?}", other))),
        };
        self.state.split_on = split;

        let tx = if split {
            self.state
                .tx_vfo
                .or_else(|| self.state.topology.split_pair().map(|(_, tx)| tx))
        } else {
            self.state.current_vfo
        };
        Ok((split, tx))
    }
}
