//! The typed decoders for XCF's chunked binary layout (§4.1-§4.4).
//!
//! Every offset-bearing record branches explicitly on `is_v11` rather than
//! hiding the 32-/64-bit split behind a polymorphic offset type; the spec is
//! emphatic that the wire shapes genuinely differ and unifying them any
//! earlier than the decoded struct just obscures the parser.

pub mod header;
pub mod hierarchy;
pub mod layer;
pub mod parasite;
pub mod property;
pub mod tile;

use crate::error::Result;
use crate::reader::Reader;

/// Reads one offset: a plain `u32` pre-v11, or a big-endian `(high, low)`
/// pair combined as `high * 2^32 + low` from v11 on.
pub fn read_offset(reader: &mut Reader<'_>, is_v11: bool) -> Result<u64> {
    if is_v11 {
        let high = reader.read_u32_be()?;
        let low = reader.read_u32_be()?;
        Ok((u64::from(high) << 32) | u64::from(low))
    } else {
        Ok(u64::from(reader.read_u32_be()?))
    }
}

/// Reads offsets until a zero terminator (which is consumed but not
/// returned), as used by the header's layer/channel tables and a level's
/// tile-offset table.
pub fn read_offset_table(reader: &mut Reader<'_>, is_v11: bool) -> Result<Vec<u64>> {
    let mut offsets = Vec::new();
    loop {
        let offset = read_offset(reader, is_v11)?;
        if offset == 0 {
            break;
        }
        offsets.push(offset);
    }
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v10_offsets_are_plain_u32() {
        let bytes = 0x1234u32.to_be_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(read_offset(&mut reader, false).unwrap(), 0x1234);
    }

    #[test]
    fn v11_offsets_combine_high_and_low() {
        let mut bytes = Vec::new();
        bytes.extend(1u32.to_be_bytes());
        bytes.extend(2u32.to_be_bytes());
        let mut reader = Reader::new(&bytes);
        assert_eq!(read_offset(&mut reader, true).unwrap(), (1u64 << 32) | 2);
    }

    #[test]
    fn offset_table_stops_at_zero() {
        let mut bytes = Vec::new();
        bytes.extend(10u32.to_be_bytes());
        bytes.extend(20u32.to_be_bytes());
        bytes.extend(0u32.to_be_bytes());
        let mut reader = Reader::new(&bytes);
        assert_eq!(read_offset_table(&mut reader, false).unwrap(), vec![10, 20]);
    }
}
