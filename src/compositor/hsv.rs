//! RGB <-> HSV conversion for the Hue/Saturation/Color/Value blend modes
//! (§9 "HSV conversion").
//!
//! "Value" here is `(min+max)/2`, not `max` — a GIMP-historical quirk the
//! spec requires for pixel parity — which makes this conversion the
//! classic HSL transform wearing XCF's "HSV" name. Saturation is defined
//! piecewise around value=0.5 to match.

use crate::types::BlendMode;

/// `(hue, saturation, value)`, hue normalized to `[0, 1)`.
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let value = (max + min) / 2.0;
    let chroma = max - min;

    if chroma == 0.0 {
        return (0.0, 0.0, value);
    }

    let saturation = if value <= 0.5 { chroma / (max + min) } else { chroma / (2.0 - max - min) };

    let mut hue = if max == r {
        (g - b) / chroma + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / chroma + 2.0
    } else {
        (r - g) / chroma + 4.0
    };
    hue /= 6.0;

    (hue, saturation, value)
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (v, v, v);
    }

    let q = if v < 0.5 { v * (1.0 + s) } else { v + s - v * s };
    let p = 2.0 * v - q;

    (hue_channel(p, q, h + 1.0 / 3.0), hue_channel(p, q, h), hue_channel(p, q, h - 1.0 / 3.0))
}

fn hue_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Substitutes the channel(s) `mode` names from `src`'s HSV into `dst`'s,
/// then converts back to RGB. Hue mode leaves the hue unchanged when the
/// source is achromatic (zero saturation).
pub fn apply_hsv(mode: BlendMode, dst: (f32, f32, f32), src: (f32, f32, f32)) -> (f32, f32, f32) {
    let (dh, ds, dv) = rgb_to_hsv(dst.0, dst.1, dst.2);
    let (sh, ss, sv) = rgb_to_hsv(src.0, src.1, src.2);

    let (h, s, v) = match mode {
        BlendMode::Hue => {
            if ss == 0.0 {
                (dh, ds, dv)
            } else {
                (sh, ds, dv)
            }
        }
        BlendMode::Saturation => (dh, ss, dv),
        BlendMode::Color => {
            if ss == 0.0 {
                (dh, ds, dv)
            } else {
                (sh, ss, dv)
            }
        }
        BlendMode::Value => (dh, ds, sv),
        other => unreachable!("{other:?} is not an HSV blend mode"),
    };

    hsv_to_rgb(h, s, v)
}
