//! Layer records (§4.1 "Layer record"): one per entry in the header's
//! layer-offset table.

use super::property::{parse_property_list, PropertyList};
use super::read_offset;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::reader::Reader;
use crate::validate::{check_layer_offset, ParseOptions};

#[derive(Debug)]
pub struct LayerRecord {
    pub width: u32,
    pub height: u32,
    pub color_type: u32,
    pub name: String,
    pub properties: PropertyList,
    /// `0` means absent; the spec defines "present" as either half of the
    /// v11+ pair being non-zero, which a combined `u64 != 0` check already
    /// captures for both offset widths.
    pub hierarchy_offset: u64,
    pub mask_offset: u64,
}

impl LayerRecord {
    pub fn has_mask(&self) -> bool {
        self.mask_offset != 0
    }
}

/// Parses one layer record. `reader` must be positioned at the start of
/// the record (i.e. at an offset taken from the header's layer table).
pub fn parse_layer(
    reader: &mut Reader<'_>,
    is_v11: bool,
    opts: &ParseOptions,
    diagnostics: &mut dyn Diagnostics,
) -> Result<LayerRecord> {
    let width = reader.read_u32_be()?;
    let height = reader.read_u32_be()?;
    let color_type = reader.read_u32_be()?;

    let name_length = reader.read_u32_be()? as usize;
    let name = reader.read_cstring()?;
    let name = String::from_utf8_lossy(name).into_owned();
    let consumed = name.len() + 1;
    if name_length > consumed {
        reader.skip(name_length - consumed)?;
    }

    let properties = parse_property_list(reader, diagnostics)?;

    if let Some(super::property::PropertyPayload::Offsets { dx, dy }) =
        properties.get(super::property::tag::OFFSETS)
    {
        check_layer_offset(*dx, *dy, opts)?;
    }

    let hierarchy_offset = read_offset(reader, is_v11)?;
    let mask_offset = read_offset(reader, is_v11)?;

    Ok(LayerRecord { width, height, color_type, name, properties, hierarchy_offset, mask_offset })
}
