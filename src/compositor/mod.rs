//! Per-pixel alpha compositing (§4.6): dispatches a layer's blend mode to
//! one of Normal compositing, the separable blend functions, the HSV
//! triple, `Behind`, or `Dissolve`.

pub mod blend;
pub mod dissolve;
pub mod hsv;

use crate::types::BlendMode;

/// A pixel in `[0.0, 1.0]` per channel, the unit the compositor works in;
/// conversion to/from 8-bit happens at the sink boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba01 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Blends `src` (already opacity-scaled where relevant) over `dst` under
/// `mode`. `dissolve_r` is only consulted when `mode == Dissolve`; callers
/// typically pass `dissolve::sample(seed, x, y)`.
pub fn blend_pixel(mode: BlendMode, dst: Rgba01, src: Rgba01, opacity: f32, dissolve_r: f32) -> Rgba01 {
    let a1 = dst.a;
    let a2 = (src.a * opacity).clamp(0.0, 1.0);

    if mode.is_hsv() {
        return hsv_blend(mode, dst, src, a1, a2, opacity);
    }
    if mode.is_separable() {
        return general_blend(mode, dst, src, a1, a2);
    }

    match mode {
        BlendMode::Dissolve => {
            if dissolve_r < a2 {
                Rgba01 { r: src.r, g: src.g, b: src.b, a: 1.0 }
            } else {
                dst
            }
        }
        BlendMode::Behind => behind(dst, src, a1, a2),
        _ => normal_blend(dst, src, a1, a2),
    }
}

#[inline]
fn lerp(x1: f32, x2: f32, t: f32) -> f32 {
    (1.0 - t) * x1 + t * x2
}

/// `blend(a1, x1, a2, x2)` from §4.6's "Normal compositing" bullet, shared
/// by the Normal path and (with a substituted `a2`) the general-blend path.
fn weighted_blend(a1: f32, x1: f32, a2: f32, x2: f32) -> (f32, f32) {
    let a_out = 1.0 - (1.0 - a1) * (1.0 - a2);
    let t = if a_out > 0.0 { a2 / a_out } else { 0.0 };
    (lerp(x1, x2, t), a_out)
}

fn normal_blend(dst: Rgba01, src: Rgba01, a1: f32, a2: f32) -> Rgba01 {
    let (r, out_a) = weighted_blend(a1, dst.r, a2, src.r);
    let (g, _) = weighted_blend(a1, dst.g, a2, src.g);
    let (b, _) = weighted_blend(a1, dst.b, a2, src.b);
    Rgba01 { r, g, b, a: out_a }
}

fn general_blend(mode: BlendMode, dst: Rgba01, src: Rgba01, a1: f32, a2: f32) -> Rgba01 {
    let a2p = a1.min(a2);
    let (r, _) = weighted_blend(a1, dst.r, a2p, blend::apply(mode, dst.r, src.r));
    let (g, _) = weighted_blend(a1, dst.g, a2p, blend::apply(mode, dst.g, src.g));
    let (b, _) = weighted_blend(a1, dst.b, a2p, blend::apply(mode, dst.b, src.b));
    Rgba01 { r, g, b, a: a1 }
}

fn hsv_blend(mode: BlendMode, dst: Rgba01, src: Rgba01, a1: f32, a2: f32, opacity: f32) -> Rgba01 {
    // Spec-literal: `comp_a = min(a1, a2) * opacity`, even though `a2`
    // already folds in `opacity` — preserved as written rather than
    // "fixed" to avoid a double opacity application.
    let comp_a = a1.min(a2) * opacity;
    let out_a = a1 + (1.0 - a1) * comp_a;
    let ratio = if out_a > 0.0 { comp_a / out_a } else { 0.0 };

    let (r, g, b) = hsv::apply_hsv(mode, (dst.r, dst.g, dst.b), (src.r, src.g, src.b));
    Rgba01 { r: lerp(dst.r, r, ratio), g: lerp(dst.g, g, ratio), b: lerp(dst.b, b, ratio), a: out_a }
}

/// Legacy GIMP "Behind": paints only where the destination is fully
/// transparent, leaving already-occupied destination pixels untouched.
/// The spec's separable-function table doesn't define `Behind` (§9, Open
/// Questions); this is the standard GIMP semantics and is recorded as such
/// in `DESIGN.md`.
fn behind(dst: Rgba01, src: Rgba01, a1: f32, a2: f32) -> Rgba01 {
    if a1 > 0.0 {
        dst
    } else {
        normal_blend(dst, src, a1, a2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_over_transparent_destination_is_source() {
        let dst = Rgba01 { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
        let src = Rgba01 { r: 1.0, g: 0.5, b: 0.25, a: 1.0 };
        let out = blend_pixel(BlendMode::Normal, dst, src, 1.0, 0.0);
        assert_eq!(out, Rgba01 { r: 1.0, g: 0.5, b: 0.25, a: 1.0 });
    }

    #[test]
    fn normal_over_opaque_destination_with_half_opacity_source() {
        let dst = Rgba01 { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
        let src = Rgba01 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
        let out = blend_pixel(BlendMode::Normal, dst, src, 0.5, 0.0);
        assert!((out.r - 0.5).abs() < 1e-6);
        assert_eq!(out.a, 1.0);
    }

    #[test]
    fn multiply_retains_destination_alpha() {
        let dst = Rgba01 { r: 0.5, g: 0.5, b: 0.5, a: 0.7 };
        let src = Rgba01 { r: 0.5, g: 0.5, b: 0.5, a: 1.0 };
        let out = blend_pixel(BlendMode::Multiply, dst, src, 1.0, 0.0);
        assert_eq!(out.a, 0.7);
        assert!((out.r - 0.375).abs() < 1e-4);
    }

    #[test]
    fn dissolve_picks_source_when_below_threshold() {
        let dst = Rgba01 { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
        let src = Rgba01 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
        let out = blend_pixel(BlendMode::Dissolve, dst, src, 1.0, 0.1);
        assert_eq!(out, Rgba01 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 });
    }

    #[test]
    fn dissolve_keeps_destination_when_above_threshold() {
        let dst = Rgba01 { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
        let src = Rgba01 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
        let out = blend_pixel(BlendMode::Dissolve, dst, src, 0.3, 0.9);
        assert_eq!(out, dst);
    }

    #[test]
    fn behind_skips_already_opaque_destination() {
        let dst = Rgba01 { r: 0.2, g: 0.2, b: 0.2, a: 1.0 };
        let src = Rgba01 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
        let out = blend_pixel(BlendMode::Behind, dst, src, 1.0, 0.0);
        assert_eq!(out, dst);
    }

    #[test]
    fn behind_paints_transparent_destination() {
        let dst = Rgba01 { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
        let src = Rgba01 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
        let out = blend_pixel(BlendMode::Behind, dst, src, 1.0, 0.0);
        assert_eq!(out, Rgba01 { r: 1.0, g: 1.0, b: 1.0, a: 1.0 });
    }
}
