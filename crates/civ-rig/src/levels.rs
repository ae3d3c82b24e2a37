//! Generic level encode/decode over the level table
//!
//! One routine per direction handles every row of
//! [`civ_protocol::level::LEVEL_TABLE`]; the row's transform decides the
//! unit conversion, the descriptor supplies the lookup lists and curves.

use civ_protocol::bcd::{decode_bcd, encode_bcd, Endianness};
use civ_protocol::level::{LevelEntry, LevelTransform};
use civ_protocol::{AgcMode, LevelValue, RigCaps, ValueScaler};

use crate::error::{Result, RigError};

/// Wire payload for writing `value` through `entry`
pub fn encode_level(caps: &RigCaps, entry: &LevelEntry, value: LevelValue) -> Result<Vec<u8>> {
    if entry.level.is_read_only() {
        return Err(RigError::InvalidArgument(format!(
            "{:?} can only be read",
            entry.level
        )));
    }

    let raw: u64 = match entry.transform {
        LevelTransform::Normalized => ValueScaler::normalized_to_raw(value.as_f32()).into(),
        LevelTransform::KeySpeed => ValueScaler::key_speed_to_raw(value.as_i32()).into(),
        LevelTransform::CwPitch => ValueScaler::cw_pitch_to_raw(value.as_i32()).into(),
        LevelTransform::Integer => u64::try_from(value.as_i32()).map_err(|_| {
            RigError::InvalidArgument(format!("{:?} cannot be negative", entry.level))
        })?,
        LevelTransform::PreampIndex => match value.as_i32() {
            0 => 0,
            db => {
                let index = caps.preamps.iter().position(|&p| p == db).ok_or_else(|| {
                    RigError::InvalidArgument(format!("no {} dB preamp on {}", db, caps.model))
                })?;
                index as u64 + 1
            }
        },
        LevelTransform::AttenuatorDb => match value.as_i32() {
            0 => 0,
            db if caps.attenuators.contains(&db) => db as u64,
            db => {
                return Err(RigError::InvalidArgument(format!(
                    "no {} dB attenuator on {}",
                    db, caps.model
                )))
            }
        },
        LevelTransform::AgcCode => {
            let agc = AgcMode::from_i32(value.as_i32());
            let code = caps
                .agc_table()
                .iter()
                .find(|(mode, _)| Some(*mode) == agc)
                .map(|(_, code)| *code)
                .ok_or_else(|| {
                    RigError::InvalidArgument(format!("AGC {} not available", value.as_i32()))
                })?;
            code.into()
        }
        LevelTransform::Meter(_) | LevelTransform::Strength => {
            return Err(RigError::InvalidArgument(format!(
                "{:?} can only be read",
                entry.level
            )))
        }
    };

    encode_bcd(raw, entry.width * 2, Endianness::Big)
        .map_err(|e| RigError::InvalidArgument(e.to_string()))
}

/// Value carried by a reply payload (command head already stripped)
pub fn decode_level(caps: &RigCaps, entry: &LevelEntry, payload: &[u8]) -> Result<LevelValue> {
    if payload.len() != entry.width {
        return Err(RigError::Protocol(format!(
            "{:?} reply is {} bytes, expected {}",
            entry.level,
            payload.len(),
            entry.width
        )));
    }
    let raw = decode_bcd(payload, entry.width * 2, Endianness::Big)?;
    // At most 4 BCD digits, so this always fits
    let raw = raw as i32;

    let value = match entry.transform {
        LevelTransform::Normalized => LevelValue::Float(ValueScaler::raw_to_normalized(raw as u16)),
        LevelTransform::Integer => LevelValue::Int(raw),
        LevelTransform::KeySpeed => LevelValue::Int(ValueScaler::raw_to_key_speed(raw as u16)),
        LevelTransform::CwPitch => LevelValue::Int(ValueScaler::raw_to_cw_pitch(raw as u16)),
        LevelTransform::PreampIndex => match raw {
            0 => LevelValue::Int(0),
            index => {
                let db = caps.preamps.get(index as usize - 1).ok_or_else(|| {
                    RigError::Protocol(format!("unknown preamp index {}", index))
                })?;
                LevelValue::Int(*db)
            }
        },
        LevelTransform::AttenuatorDb => LevelValue::Int(raw),
        LevelTransform::AgcCode => {
            let mode = caps
                .agc_table()
                .iter()
                .find(|(_, code)| i32::from(*code) == raw)
                .map(|(mode, _)| *mode)
                .ok_or_else(|| RigError::Protocol(format!("unknown AGC code {}", raw)))?;
            LevelValue::Int(mode as i32)
        }
        LevelTransform::Meter(meter) => {
            LevelValue::Float(caps.meter_calibration(meter).interpolate(raw))
        }
        LevelTransform::Strength => LevelValue::Int(caps.strength_calibration().interpolate_int(raw)),
    };
    Ok(value)
}
