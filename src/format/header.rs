//! The file header (§4.1): dimensions, base type, optional precision, the
//! header property list, and the layer/channel offset tables.
//!
//! Magic and version-token validation happen one level up, in
//! [`crate::image`], since they need to run before a [`Reader`] can even be
//! trusted to hold a sane `pos`; this module picks up right after the
//! 14-byte preamble.

use super::property::{parse_property_list, PropertyList};
use super::read_offset_table;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::reader::Reader;
use crate::types::{BaseType, Precision};
use crate::validate::{check_dimensions, check_offset_table, ParseOptions};

#[derive(Debug)]
pub struct FileHeader {
    pub width: u32,
    pub height: u32,
    pub base_type: BaseType,
    pub precision: Precision,
    pub properties: PropertyList,
    pub layer_offsets: Vec<u64>,
    pub channel_offsets: Vec<u64>,
}

/// Parses everything from the width field through the channel-offset
/// table. `reader` must already be positioned just past the 14-byte
/// magic/version/zero preamble.
pub fn parse_header(
    reader: &mut Reader<'_>,
    version: u32,
    opts: &ParseOptions,
    diagnostics: &mut dyn Diagnostics,
) -> Result<FileHeader> {
    let is_v11 = version >= 11;

    let width = reader.read_u32_be()?;
    let height = reader.read_u32_be()?;
    check_dimensions(width, height, opts)?;

    let base_type = BaseType::new(reader.read_u32_be()?)?;
    let precision = if is_v11 {
        Precision::new(reader.read_u32_be()?)?
    } else {
        Precision::legacy()
    };

    let properties = parse_property_list(reader, diagnostics)?;

    let buffer_len = reader.len();
    let layer_offsets = read_offset_table(reader, is_v11)?;
    check_offset_table(&layer_offsets, buffer_len)?;
    let channel_offsets = read_offset_table(reader, is_v11)?;
    check_offset_table(&channel_offsets, buffer_len)?;

    Ok(FileHeader { width, height, base_type, precision, properties, layer_offsets, channel_offsets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoopDiagnostics;

    fn minimal_header_bytes(is_v11: bool, layer_offset: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(100u32.to_be_bytes()); // width
        bytes.extend(50u32.to_be_bytes()); // height
        bytes.extend(0u32.to_be_bytes()); // base_type = RGB
        if is_v11 {
            bytes.extend(100u32.to_be_bytes()); // precision = Gamma8
        }
        bytes.extend(0u32.to_be_bytes()); // END property tag
        bytes.extend(0u32.to_be_bytes()); // END property length
        if is_v11 {
            bytes.extend(0u32.to_be_bytes());
            bytes.extend(layer_offset.to_be_bytes());
        } else {
            bytes.extend(layer_offset.to_be_bytes());
        }
        bytes.extend(0u32.to_be_bytes()); // layer table terminator (v10) / high half
        if is_v11 {
            bytes.extend(0u32.to_be_bytes()); // low half of terminator
        }
        bytes.extend(0u32.to_be_bytes()); // channel table terminator (v10)
        if is_v11 {
            bytes.extend(0u32.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn parses_v10_header() {
        let bytes = minimal_header_bytes(false, 20);
        let mut reader = Reader::new(&bytes);
        let header = parse_header(&mut reader, 0, &ParseOptions::default(), &mut NoopDiagnostics).unwrap();

        assert_eq!(header.width, 100);
        assert_eq!(header.height, 50);
        assert_eq!(header.base_type, BaseType::Rgb);
        assert_eq!(header.precision, Precision::Gamma8);
        assert_eq!(header.layer_offsets, vec![20]);
        assert!(header.channel_offsets.is_empty());
    }

    #[test]
    fn parses_v11_header_with_explicit_precision() {
        let bytes = minimal_header_bytes(true, 30);
        let mut reader = Reader::new(&bytes);
        let header = parse_header(&mut reader, 11, &ParseOptions::default(), &mut NoopDiagnostics).unwrap();

        assert_eq!(header.layer_offsets, vec![30]);
    }

    #[test]
    fn rejects_oversized_dimensions() {
        let mut bytes = Vec::new();
        bytes.extend(0xFFFF_FFFFu32.to_be_bytes());
        bytes.extend(50u32.to_be_bytes());
        let mut reader = Reader::new(&bytes);
        assert!(parse_header(&mut reader, 0, &ParseOptions::default(), &mut NoopDiagnostics).is_err());
    }
}
