//! Tile-by-tile rendering: decode, convert to 8-bit RGBA, blend into a sink
//! (§4.6, §4.7 "Layer.render").
//!
//! Grounded on the teacher's own compositing loop in `main.rs` (walk tiles,
//! rotate into place, blend pixel-by-pixel into a flat buffer) generalized
//! from its one hard-coded Porter-Duff "over" into the full `BlendMode`
//! dispatch in [`crate::compositor`].

use crate::compositor::{blend_pixel, dissolve, Rgba01};
use crate::error::Result;
use crate::format::hierarchy::{tile_rect, Hierarchy, Level};
use crate::format::tile::decompress_tile;
use crate::image::{Layer, XcfImage};
use crate::precision::{channel_to_u8, denormalize, normalize};
use crate::reader::Reader;
use crate::sink::ImageSink;
use crate::types::BaseType;

/// Decodes one layer's tiles and blends them into `sink`.
pub(crate) fn render_layer_pixels(
    image: &XcfImage,
    layer: &Layer,
    level: &Level,
    hierarchy: &Hierarchy,
    sink: &mut dyn ImageSink,
    use_offset: bool,
) -> Result<()> {
    let bpp = hierarchy.bpp as usize;
    let has_alpha = layer.has_alpha();
    let opacity = normalize(layer.opacity());
    let mode = layer.mode();
    // The layer's own index is a stable per-layer seed, so repeated renders
    // of the same parsed image dissolve identically (§9 "Dissolve RNG").
    let dissolve_seed = layer.index as u64;

    for (tile_index, &tile_offset) in level.tile_offsets.iter().enumerate() {
        let (origin_x, origin_y, tile_w, tile_h) = tile_rect(tile_index, level.width, level.height);

        let reader = Reader::new(image.buffer());
        let mut tile_reader = reader.reader_at(tile_offset as usize)?;
        let tile = decompress_tile(&mut tile_reader, hierarchy.bpp, tile_w, tile_h)?;

        for ly in 0..tile_h {
            for lx in 0..tile_w {
                let pixel_start = (ly as usize * tile_w as usize + lx as usize) * bpp;
                let px = &tile[pixel_start..pixel_start + bpp];

                let src_rgba =
                    decode_pixel(image.base_type, image.precision, has_alpha, image.colormap(), px);
                let src = to_unit(src_rgba);

                let (dst_x, dst_y) = if use_offset {
                    (layer.dx() as i64 + (origin_x + lx) as i64, layer.dy() as i64 + (origin_y + ly) as i64)
                } else {
                    ((origin_x + lx) as i64, (origin_y + ly) as i64)
                };

                let dst = to_unit(sink.get_at(dst_x, dst_y));
                let r = dissolve::sample(dissolve_seed, origin_x + lx, origin_y + ly);
                let out = blend_pixel(mode, dst, src, opacity, r);
                sink.set_at(dst_x, dst_y, from_unit(out));
            }
        }
    }

    Ok(())
}

/// Decodes one pixel's raw channel bytes (`bpp` of them) into 8-bit RGBA,
/// per base type (§4.6 "Indexed color", "Grayscale").
fn decode_pixel(
    base_type: BaseType,
    precision: crate::types::Precision,
    has_alpha: bool,
    colormap: Option<&[[u8; 3]]>,
    px: &[u8],
) -> [u8; 4] {
    match base_type {
        BaseType::Rgb => {
            let bpc = precision.bytes_per_channel() as usize;
            let r = channel_to_u8(precision, &px[0..bpc]);
            let g = channel_to_u8(precision, &px[bpc..2 * bpc]);
            let b = channel_to_u8(precision, &px[2 * bpc..3 * bpc]);
            let a = if has_alpha { channel_to_u8(precision, &px[3 * bpc..4 * bpc]) } else { 255 };
            [r, g, b, a]
        }
        BaseType::Grayscale => {
            let bpc = precision.bytes_per_channel() as usize;
            let gray = channel_to_u8(precision, &px[0..bpc]);
            let a = if has_alpha { channel_to_u8(precision, &px[bpc..2 * bpc]) } else { 255 };
            [gray, gray, gray, a]
        }
        BaseType::Indexed => {
            // Indexed pixel data is always a raw one-byte-per-channel index;
            // it is never run through precision scaling (§4.6).
            let index = px[0] as usize;
            let [r, g, b] = colormap.and_then(|c| c.get(index)).copied().unwrap_or([0, 0, 0]);
            let a = if has_alpha { px[1] } else { 255 };
            [r, g, b, a]
        }
    }
}

#[inline]
fn to_unit(rgba: [u8; 4]) -> Rgba01 {
    Rgba01 { r: normalize(rgba[0]), g: normalize(rgba[1]), b: normalize(rgba[2]), a: normalize(rgba[3]) }
}

#[inline]
fn from_unit(px: Rgba01) -> [u8; 4] {
    [denormalize(px.r), denormalize(px.g), denormalize(px.b), denormalize(px.a)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Precision;

    #[test]
    fn decodes_8bit_rgb_without_alpha() {
        let px = [10u8, 20, 30];
        let out = decode_pixel(BaseType::Rgb, Precision::Gamma8, false, None, &px);
        assert_eq!(out, [10, 20, 30, 255]);
    }

    #[test]
    fn decodes_8bit_rgba() {
        let px = [10u8, 20, 30, 128];
        let out = decode_pixel(BaseType::Rgb, Precision::Gamma8, true, None, &px);
        assert_eq!(out, [10, 20, 30, 128]);
    }

    #[test]
    fn decodes_grayscale_without_alpha() {
        let px = [42u8];
        let out = decode_pixel(BaseType::Grayscale, Precision::Gamma8, false, None, &px);
        assert_eq!(out, [42, 42, 42, 255]);
    }

    #[test]
    fn decodes_indexed_via_colormap() {
        let colormap = vec![[0, 0, 0], [10, 20, 30], [255, 255, 255]];
        let px = [1u8];
        let out = decode_pixel(BaseType::Indexed, Precision::Gamma8, false, Some(&colormap), &px);
        assert_eq!(out, [10, 20, 30, 255]);
    }

    #[test]
    fn decodes_indexed_with_alpha_channel() {
        let colormap = vec![[0, 0, 0], [10, 20, 30]];
        let px = [1u8, 64];
        let out = decode_pixel(BaseType::Indexed, Precision::Gamma8, true, Some(&colormap), &px);
        assert_eq!(out, [10, 20, 30, 64]);
    }

    #[test]
    fn decodes_16bit_gamma_rgb() {
        let mut px = Vec::new();
        px.extend(65535u16.to_be_bytes());
        px.extend(0u16.to_be_bytes());
        px.extend(32896u16.to_be_bytes());
        let out = decode_pixel(BaseType::Rgb, Precision::Gamma16, false, None, &px);
        assert_eq!(out[0], 255);
        assert_eq!(out[1], 0);
        assert_eq!(out[3], 255);
    }
}
