//! The separable per-channel blend functions (§4.6).
//!
//! `overlay` and `burn` keep their historical formulas exactly as spec'd,
//! sub-expressions and all, rather than the algebraically simplified forms
//! a reader might expect — see `DESIGN.md` for why "correcting" them would
//! change pixel output.

use crate::types::BlendMode;

pub fn apply(mode: BlendMode, x1: f32, x2: f32) -> f32 {
    use BlendMode::*;

    match mode {
        Multiply => x1 * x2,
        Screen => 1.0 - (1.0 - x1) * (1.0 - x2),
        Overlay => (1.0 - x2) * x1.powi(2) + (x2 * (1.0 - (1.0 - x2))).powi(2),
        Difference => (x1 - x2).abs(),
        Addition => clamp01(x1 + x2),
        Subtract => clamp01(x1 - x2),
        DarkenOnly => x1.min(x2),
        LightenOnly => x1.max(x2),
        Divide => clamp01(safe_div(x1, x2)),
        Dodge => clamp01(safe_div(x1, 1.0 - x2)),
        Burn => clamp01(safe_div(1.0 - (1.0 - x1), x2)),
        HardLight => {
            if x2 < 0.5 {
                2.0 * x1 * x2
            } else {
                1.0 - 2.0 * (1.0 - x1) * (1.0 - x2)
            }
        }
        SoftLight => (1.0 - x2) * x1.powi(2) + x2 * (1.0 - (1.0 - x1).powi(2)),
        GrainExtract => clamp01(x1 - x2 + 0.5),
        GrainMerge => clamp01(x1 + x2 - 0.5),
        other => unreachable!("{other:?} is not a separable blend function"),
    }
}

#[inline]
fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Division with the spec's explicit zero-denominator rule: `1` if the
/// numerator is nonzero, `0` if the numerator is also zero.
#[inline]
fn safe_div(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 {
        if numerator == 0.0 {
            0.0
        } else {
            1.0
        }
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_and_screen() {
        assert_eq!(apply(BlendMode::Multiply, 0.5, 0.5), 0.25);
        assert_eq!(apply(BlendMode::Screen, 0.0, 0.0), 0.0);
        assert_eq!(apply(BlendMode::Screen, 1.0, 1.0), 1.0);
    }

    #[test]
    fn divide_handles_zero_denominator() {
        assert_eq!(apply(BlendMode::Divide, 0.0, 0.0), 0.0);
        assert_eq!(apply(BlendMode::Divide, 0.5, 0.0), 1.0);
    }

    #[test]
    fn hard_light_switches_at_half() {
        assert_eq!(apply(BlendMode::HardLight, 0.25, 0.25), 0.125);
        assert_eq!(apply(BlendMode::HardLight, 0.25, 0.75), 1.0 - 2.0 * 0.75 * 0.25);
    }

    #[test]
    fn grain_extract_and_merge_are_symmetric() {
        assert_eq!(apply(BlendMode::GrainExtract, 0.5, 0.5), 0.5);
        assert_eq!(apply(BlendMode::GrainMerge, 0.5, 0.5), 0.5);
    }
}
