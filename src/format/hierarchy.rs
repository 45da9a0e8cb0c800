//! Hierarchy and level records (§4.1 "Hierarchy", "Level", "Tile location").
//!
//! Only the first mip level is ever read; XCF's level chain beyond that is
//! a mipmap pyramid the spec has no use for.

use super::{read_offset, read_offset_table};
use crate::error::{Error, Result, ValidationKind};
use crate::reader::Reader;
use crate::types::{BaseType, Precision};

#[derive(Debug)]
pub struct Hierarchy {
    pub width: u32,
    pub height: u32,
    pub bpp: u32,
    /// Kept (rather than discarded once the level is resolved) so a caller
    /// can run the optional circular-reference guard over the full
    /// hierarchy -> level -> tile chain (§4.2).
    pub level_offset: u64,
}

#[derive(Debug)]
pub struct Level {
    pub width: u32,
    pub height: u32,
    pub tile_offsets: Vec<u64>,
}

/// Parses the hierarchy header and follows its `level_offset` to decode the
/// (only) level this crate cares about.
pub fn parse_hierarchy(reader: &mut Reader<'_>, is_v11: bool) -> Result<(Hierarchy, Level)> {
    let width = reader.read_u32_be()?;
    let height = reader.read_u32_be()?;
    let bpp = reader.read_u32_be()?;
    let level_offset = read_offset(reader, is_v11)?;

    let mut level_reader = reader.reader_at(level_offset as usize)?;
    let level = parse_level(&mut level_reader, is_v11)?;

    Ok((Hierarchy { width, height, bpp, level_offset }, level))
}

pub fn parse_level(reader: &mut Reader<'_>, is_v11: bool) -> Result<Level> {
    let width = reader.read_u32_be()?;
    let height = reader.read_u32_be()?;
    let tile_offsets = read_offset_table(reader, is_v11)?;

    let tiles_across = div_ceil_64(width);
    let tiles_down = div_ceil_64(height);
    let expected = tiles_across as usize * tiles_down as usize;
    if tile_offsets.len() != expected {
        return Err(Error::validation(
            ValidationKind::TileCount,
            format!(
                "level {width}x{height} expects {expected} tiles (={tiles_across}x{tiles_down}), found {}",
                tile_offsets.len()
            ),
        ));
    }

    Ok(Level { width, height, tile_offsets })
}

#[inline]
fn div_ceil_64(v: u32) -> u32 {
    (v + 63) / 64
}

/// The pixel origin and extent of tile `index` within a level, per the
/// "Tile location" rule: tiles are laid out row-major in 64x64 blocks,
/// clipped to the level's actual width/height at the right and bottom
/// edges.
pub fn tile_rect(index: usize, level_width: u32, level_height: u32) -> (u32, u32, u32, u32) {
    let tiles_across = div_ceil_64(level_width) as usize;
    let tile_x = (index % tiles_across) as u32;
    let tile_y = (index / tiles_across) as u32;
    let origin_x = tile_x * 64;
    let origin_y = tile_y * 64;
    let w = (64).min(level_width - origin_x);
    let h = (64).min(level_height - origin_y);
    (origin_x, origin_y, w, h)
}

/// Channel count for `base_type`, given whether the owning layer's
/// `color_type` is odd (alpha present).
pub fn channel_count(base_type: BaseType, has_alpha: bool) -> u32 {
    match base_type {
        BaseType::Rgb => if has_alpha { 4 } else { 3 },
        BaseType::Grayscale | BaseType::Indexed => if has_alpha { 2 } else { 1 },
    }
}

/// Validates a hierarchy's declared `bpp` against `channels(base_type) *
/// bytes_per_channel(precision)`.
pub fn check_bpp(bpp: u32, base_type: BaseType, has_alpha: bool, precision: Precision) -> Result<()> {
    let expected = channel_count(base_type, has_alpha) * precision.bytes_per_channel();
    if bpp != expected {
        return Err(Error::malformed(format!(
            "hierarchy bpp {bpp} does not match expected {expected} for this base_type/precision"
        )));
    }
    Ok(())
}
