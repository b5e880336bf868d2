//! Analog axis calibration
//!
//! Maps a raw 12-bit input sample onto a 12-bit output value through a
//! piecewise-affine transform: a dead zone around the input midpoint pins
//! the output to the output midpoint, and the two sides share one slope
//! with separate intercepts so the curve stays continuous at the dead-zone
//! edges (up to integer division rounding). All math is i32 so both units
//! produce identical wire values.
//!
//! Transforms are computed once per configuration change, not per sample.

use crate::config::AxisCalibration;

/// Full 12-bit output range.
pub const AXIS_MAX: u16 = 4095;

/// Compiled transform for one output axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisTransform {
    lo: i32,
    hi: i32,
    k_num: i32,
    k_den: i32,
    d_low: i32,
    d_high: i32,
    in_mid: i32,
    out_mid: i32,
    in_inverted: bool,
    out_inverted: bool,
}

impl AxisTransform {
    /// Compiles the transform from the input/output calibration of the
    /// involved channels and the profile's dead zone (stored undoubled).
    pub fn compute(input: &AxisCalibration, output: &AxisCalibration, deadzone: u8) -> Self {
        let d = 2 * i32::from(deadzone);
        let ri = i32::from(input.margin);
        let ro = i32::from(output.margin);
        let mi = i32::from(input.midpoint);
        let mo = i32::from(output.midpoint);
        // A dead zone wider than the input margin would leave no usable
        // travel; keep the denominator positive instead of dividing by
        // zero or flipping the slope.
        let k_den = (ri - d).max(1);
        Self {
            lo: mi - d,
            hi: mi + d,
            k_num: ro,
            k_den,
            d_low: (ro * (ri - mi)) / k_den + mo - ro,
            d_high: (ro * (-d - mi)) / k_den + mo,
            in_mid: mi,
            out_mid: mo,
            in_inverted: input.inverted,
            out_inverted: output.inverted,
        }
    }

    pub fn apply(&self, raw: u16) -> u16 {
        let mut v = i32::from(raw.min(AXIS_MAX));
        if self.in_inverted {
            v = 2 * self.in_mid - v;
        }
        let mut out = if v < self.lo {
            (self.k_num * v) / self.k_den + self.d_low
        } else if v > self.hi {
            (self.k_num * v) / self.k_den + self.d_high
        } else {
            self.out_mid
        };
        if self.out_inverted {
            out = 2 * self.out_mid - out;
        }
        out.clamp(0, i32::from(AXIS_MAX)) as u16
    }
}
