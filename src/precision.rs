//! Channel-value -> 8-bit conversion (§4.5).
//!
//! No color management: linear and gamma precisions of the same width are
//! treated identically, exactly as spec'd. `num_traits::clamp` does the
//! float clamping, the one spot in the crate that leans on that dependency
//! instead of hand-rolling `f32::clamp` (kept for parity with the teacher's
//! `num-traits` usage in its typed-read helpers).

use crate::types::Precision;
use num_traits::clamp;

/// Converts one channel's raw big-endian bytes (`precision.bytes_per_channel()`
/// of them) to an 8-bit value.
pub fn channel_to_u8(precision: Precision, bytes: &[u8]) -> u8 {
    match (precision.bytes_per_channel(), precision.is_float()) {
        (1, _) => bytes[0],
        (2, false) => {
            let v = u16::from_be_bytes([bytes[0], bytes[1]]);
            (v / 257) as u8
        }
        (2, true) => {
            let bits = u16::from_be_bytes([bytes[0], bytes[1]]);
            float_to_u8(f16_to_f32(bits))
        }
        (4, false) => {
            let v = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            (v / 16_843_009) as u8
        }
        (4, true) => {
            let v = f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            float_to_u8(v)
        }
        (8, true) => {
            let v = f64::from_be_bytes(bytes[..8].try_into().unwrap());
            float_to_u8(v as f32)
        }
        (bpc, is_float) => unreachable!("no precision has {bpc} bytes/channel, float={is_float}"),
    }
}

#[inline]
fn float_to_u8(v: f32) -> u8 {
    (clamp(v, 0.0, 1.0) * 255.0).round() as u8
}

/// IEEE-754 binary16 -> f32, including subnormals and Inf/NaN.
pub fn f16_to_f32(bits: u16) -> f32 {
    let sign = ((bits >> 15) & 1) as u32;
    let exponent = ((bits >> 10) & 0x1F) as u32;
    let fraction = (bits & 0x3FF) as u32;

    let value = if exponent == 0 {
        if fraction == 0 {
            0.0
        } else {
            // Subnormal: ±2^-14 * fraction/1024.
            (fraction as f32) * 2f32.powi(-24)
        }
    } else if exponent == 0x1F {
        if fraction == 0 {
            f32::INFINITY
        } else {
            f32::NAN
        }
    } else {
        let exp = exponent as i32 - 15;
        let mantissa = 1.0 + (fraction as f32) / 1024.0;
        mantissa * 2f32.powi(exp)
    };

    if sign == 1 {
        -value
    } else {
        value
    }
}

/// Normalizes an 8-bit channel value ([0,255]) to `[0.0, 1.0]`.
#[inline]
pub fn normalize(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Denormalizes a `[0.0, 1.0]` value back to `[0, 255]`, rounding.
#[inline]
pub fn denormalize(v: f32) -> u8 {
    (clamp(v, 0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_precisions_roundtrip_extremes() {
        assert_eq!(channel_to_u8(Precision::Gamma8, &[0]), 0);
        assert_eq!(channel_to_u8(Precision::Gamma8, &[255]), 255);

        assert_eq!(channel_to_u8(Precision::Gamma16, &0u16.to_be_bytes()), 0);
        assert_eq!(channel_to_u8(Precision::Gamma16, &65535u16.to_be_bytes()), 255);

        assert_eq!(channel_to_u8(Precision::Gamma32, &0u32.to_be_bytes()), 0);
        assert_eq!(channel_to_u8(Precision::Gamma32, &u32::MAX.to_be_bytes()), 255);
    }

    #[test]
    fn float_precisions_clamp_and_scale() {
        assert_eq!(channel_to_u8(Precision::GammaFloat32, &0.0f32.to_be_bytes()), 0);
        assert_eq!(channel_to_u8(Precision::GammaFloat32, &1.0f32.to_be_bytes()), 255);
        assert_eq!(channel_to_u8(Precision::GammaFloat32, &2.0f32.to_be_bytes()), 255);
        assert_eq!(channel_to_u8(Precision::GammaFloat32, &(-1.0f32).to_be_bytes()), 0);

        assert_eq!(channel_to_u8(Precision::GammaFloat64, &1.0f64.to_be_bytes()), 255);
    }

    #[test]
    fn f16_decodes_one_and_zero() {
        assert_eq!(f16_to_f32(0x3C00), 1.0);
        assert_eq!(f16_to_f32(0x0000), 0.0);
    }

    #[test]
    fn f16_decodes_subnormal() {
        // Smallest positive subnormal: fraction=1, exponent=0.
        let v = f16_to_f32(0x0001);
        assert!(v > 0.0 && v < 1e-4);
    }
}
