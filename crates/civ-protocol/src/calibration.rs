//! Raw-to-engineering value scaling
//!
//! Meter readings come back as 0-255 counts that map onto SWR, volts, amps
//! and so on through piecewise-linear calibration curves. Settable levels use
//! fixed linear scales (normalized float, key speed, CW pitch).

use std::borrow::Cow;

/// One calibration breakpoint
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalPoint {
    /// Raw wire value
    pub raw: i32,
    /// Engineering value at `raw`
    pub value: f32,
}

impl CalPoint {
    pub const fn new(raw: i32, value: f32) -> Self {
        Self { raw, value }
    }
}

/// Breakpoints ordered by raw value, read-only once built
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    points: Cow<'static, [CalPoint]>,
}

impl CalibrationTable {
    /// Table over static breakpoints. The points must be sorted by `raw`.
    pub const fn from_static(points: &'static [CalPoint]) -> Self {
        Self {
            points: Cow::Borrowed(points),
        }
    }

    /// Table over runtime breakpoints; `None` unless sorted by `raw`
    pub fn from_points(points: Vec<CalPoint>) -> Option<Self> {
        if points.windows(2).any(|w| w[0].raw > w[1].raw) {
            return None;
        }
        Some(Self {
            points: Cow::Owned(points),
        })
    }

    pub fn points(&self) -> &[CalPoint] {
        &self.points
    }

    /// Linear interpolation between the breakpoints around `raw`.
    ///
    /// Values outside the table clamp to the first or last point. An empty
    /// table passes the raw value through.
    pub fn interpolate(&self, raw: i32) -> f32 {
        let points = self.points();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return raw as f32;
        };
        if raw <= first.raw {
            return first.value;
        }
        if raw >= last.raw {
            return last.value;
        }

        let upper = points.iter().position(|p| p.raw > raw).unwrap_or(points.len() - 1);
        let hi = points[upper];
        let lo = points[upper - 1];
        if hi.raw == lo.raw {
            return lo.value;
        }
        let span = (hi.raw - lo.raw) as f32;
        lo.value + (hi.value - lo.value) * (raw - lo.raw) as f32 / span
    }

    /// Interpolate and round, for integer-valued curves such as S-meter dB
    pub fn interpolate_int(&self, raw: i32) -> i32 {
        self.interpolate(raw).round() as i32
    }
}

/// SWR meter: 1.0 at 0 counts, 6.0 at 240
pub const DEFAULT_SWR_CAL: CalibrationTable = CalibrationTable::from_static(&[
    CalPoint::new(0, 1.0),
    CalPoint::new(48, 1.5),
    CalPoint::new(80, 2.0),
    CalPoint::new(120, 3.0),
    CalPoint::new(240, 6.0),
]);

/// ALC meter, normalized
pub const DEFAULT_ALC_CAL: CalibrationTable =
    CalibrationTable::from_static(&[CalPoint::new(0, 0.0), CalPoint::new(120, 1.0)]);

/// RF power meter, fraction of full power
pub const DEFAULT_RFPOWER_METER_CAL: CalibrationTable = CalibrationTable::from_static(&[
    CalPoint::new(0, 0.0),
    CalPoint::new(143, 0.5),
    CalPoint::new(213, 1.0),
]);

/// Compression meter in dB
pub const DEFAULT_COMP_METER_CAL: CalibrationTable = CalibrationTable::from_static(&[
    CalPoint::new(0, 0.0),
    CalPoint::new(130, 15.0),
    CalPoint::new(241, 30.0),
]);

/// Supply voltage meter in volts
pub const DEFAULT_VD_METER_CAL: CalibrationTable = CalibrationTable::from_static(&[
    CalPoint::new(0, 0.0),
    CalPoint::new(13, 10.0),
    CalPoint::new(241, 16.0),
]);

/// Drain current meter in amps
pub const DEFAULT_ID_METER_CAL: CalibrationTable = CalibrationTable::from_static(&[
    CalPoint::new(0, 0.0),
    CalPoint::new(97, 10.0),
    CalPoint::new(146, 15.0),
    CalPoint::new(241, 25.0),
]);

/// S-meter in dB relative to S9
pub const DEFAULT_STRENGTH_CAL: CalibrationTable = CalibrationTable::from_static(&[
    CalPoint::new(0, -54.0),
    CalPoint::new(120, 0.0),
    CalPoint::new(241, 60.0),
]);

/// Fixed linear scales between engineering units and 0-255 counts
pub struct ValueScaler;

impl ValueScaler {
    /// Full-scale raw count
    pub const FULL_SCALE: u16 = 255;

    /// 0.0-1.0 to 0-255, clamped
    pub fn normalized_to_raw(value: f32) -> u16 {
        (value.clamp(0.0, 1.0) * f32::from(Self::FULL_SCALE)).round() as u16
    }

    /// 0-255 to 0.0-1.0
    pub fn raw_to_normalized(raw: u16) -> f32 {
        f32::from(raw) / f32::from(Self::FULL_SCALE)
    }

    /// Keyer speed, 6-48 wpm over 0-255
    pub fn key_speed_to_raw(wpm: i32) -> u16 {
        let wpm = wpm.clamp(6, 48) as f32;
        ((wpm - 6.0) * (255.0 / 42.0)).round() as u16
    }

    pub fn raw_to_key_speed(raw: u16) -> i32 {
        (f32::from(raw) * (42.0 / 255.0) + 6.0).round() as i32
    }

    /// CW sidetone pitch, 300-900 Hz over 0-255
    pub fn cw_pitch_to_raw(hz: i32) -> u16 {
        let hz = hz.clamp(300, 900) as f32;
        ((hz - 300.0) * (255.0 / 600.0)).round() as u16
    }

    pub fn raw_to_cw_pitch(raw: u16) -> i32 {
        (300.0 + f32::from(raw) * 600.0 / 255.0).round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_midpoint() {
        const POINTS: &[CalPoint] = &[CalPoint::new(0, 0.0), CalPoint::new(120, 1.0)];
        let table = CalibrationTable::from_static(POINTS);
        assert_eq!(table.interpolate(60), 0.5);
    }

    #[test]
    fn test_interpolate_clamps_and_hits_breakpoints() {
        assert_eq!(DEFAULT_SWR_CAL.interpolate(-5), 1.0);
        assert_eq!(DEFAULT_SWR_CAL.interpolate(80), 2.0);
        assert_eq!(DEFAULT_SWR_CAL.interpolate(100), 2.5);
        assert_eq!(DEFAULT_SWR_CAL.interpolate(255), 6.0);
        assert_eq!(DEFAULT_STRENGTH_CAL.interpolate_int(120), 0);
    }

    #[test]
    fn test_empty_table_passes_through() {
        let table = CalibrationTable::from_points(Vec::new()).unwrap();
        assert_eq!(table.interpolate(42), 42.0);
    }

    #[test]
    fn test_unsorted_points_rejected() {
        assert!(CalibrationTable::from_points(vec![CalPoint::new(10, 1.0), CalPoint::new(5, 0.0)])
            .is_none());
    }

    #[test]
    fn test_linear_scales() {
        assert_eq!(ValueScaler::normalized_to_raw(1.0), 255);
        assert_eq!(ValueScaler::normalized_to_raw(2.0), 255);
        assert_eq!(ValueScaler::raw_to_normalized(0), 0.0);
        assert_eq!(ValueScaler::key_speed_to_raw(6), 0);
        assert_eq!(ValueScaler::key_speed_to_raw(48), 255);
        assert_eq!(ValueScaler::raw_to_key_speed(255), 48);
        assert_eq!(ValueScaler::cw_pitch_to_raw(900), 255);
        assert_eq!(ValueScaler::cw_pitch_to_raw(100), 0);
        assert_eq!(ValueScaler::raw_to_cw_pitch(0), 300);
        assert_eq!(ValueScaler::raw_to_cw_pitch(255), 900);
    }
}
