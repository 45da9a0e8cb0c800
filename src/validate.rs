//! Pre-parse and structural checks (§4.2).
//!
//! The teacher validates SAI's block checksums in `block::Error`
//! (`BadSize`/`BadChecksum`); this is the same shape of "reject untrusted
//! input before trusting its shape" discipline, applied to XCF's offsets,
//! dimensions and item paths instead of CRC-like checksums.

use crate::error::{Error, Result, ValidationKind};
use std::collections::HashSet;

/// Tunable caps, all defaulted to the values spec'd in §4.2.
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    pub max_dim: u32,
    pub max_path_depth: usize,
    pub max_path_index: u32,
    pub max_offset_abs: i64,
    /// Whether to guard against cyclic hierarchy -> level -> tile chains.
    pub detect_cycles: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_dim: 524_288,
            max_path_depth: 100,
            max_path_index: 10_000,
            max_offset_abs: 1_000_000_000,
            detect_cycles: true,
        }
    }
}

pub fn check_magic(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 14 {
        return Err(Error::unsupported("buffer shorter than the 14-byte XCF header"));
    }
    if &bytes[0..9] != b"gimp xcf " {
        return Err(Error::validation(ValidationKind::Magic, "missing 'gimp xcf ' magic"));
    }
    Ok(())
}

/// Parses the 4-byte version token (`"file"` or `"v0XX"`) into a numeric
/// version; `"file"` is the oldest variant and maps to `0`.
pub fn parse_version(token: &[u8; 4]) -> Result<u32> {
    if token == b"file" {
        return Ok(0);
    }
    if token[0] != b'v' || !token[1..].iter().all(u8::is_ascii_digit) {
        return Err(Error::unsupported(format!(
            "version token {:?} is neither \"file\" nor \"v0XX\"",
            String::from_utf8_lossy(token)
        )));
    }
    let digits = std::str::from_utf8(&token[1..]).unwrap();
    digits
        .parse()
        .map_err(|_| Error::unsupported(format!("unparsable version digits {digits:?}")))
}

pub fn check_dimensions(width: u32, height: u32, opts: &ParseOptions) -> Result<()> {
    if width == 0 || width > opts.max_dim || height == 0 || height > opts.max_dim {
        return Err(Error::validation(
            ValidationKind::Dimensions,
            format!("{width}x{height} is outside (0, {}]", opts.max_dim),
        ));
    }
    Ok(())
}

/// Checks that every non-zero offset in `offsets` is inside the buffer and
/// that no two offsets in the same table collide.
pub fn check_offset_table(offsets: &[u64], buffer_len: usize) -> Result<()> {
    let mut seen = HashSet::with_capacity(offsets.len());
    for &offset in offsets {
        if offset == 0 {
            continue;
        }
        if offset >= buffer_len as u64 {
            return Err(Error::validation(
                ValidationKind::OffsetOutOfBounds,
                format!("offset {offset} is >= buffer length {buffer_len}"),
            ));
        }
        if !seen.insert(offset) {
            return Err(Error::validation(
                ValidationKind::DuplicateOffset,
                format!("offset {offset} appears twice in the same table"),
            ));
        }
    }
    Ok(())
}

pub fn check_item_path(path: &[u32], opts: &ParseOptions) -> Result<()> {
    if path.len() > opts.max_path_depth {
        return Err(Error::validation(
            ValidationKind::PathTooDeep,
            format!("path depth {} exceeds {}", path.len(), opts.max_path_depth),
        ));
    }
    if let Some(&bad) = path.iter().find(|&&i| i > opts.max_path_index) {
        return Err(Error::validation(
            ValidationKind::PathIndexTooLarge,
            format!("path index {bad} exceeds {}", opts.max_path_index),
        ));
    }
    Ok(())
}

/// The optional circular-reference guard (§4.2): rejects a layer whose
/// hierarchy -> level -> tile chain visits the same offset twice. Disabled
/// via [`ParseOptions::detect_cycles`] since it costs one hash-set pass per
/// rendered layer.
pub fn check_no_repeated_offsets(offsets: impl IntoIterator<Item = u64>) -> Result<()> {
    let mut seen = HashSet::new();
    for offset in offsets {
        if !seen.insert(offset) {
            return Err(Error::validation(
                ValidationKind::CyclicReference,
                format!("offset {offset} is visited twice in the same hierarchy/level/tile chain"),
            ));
        }
    }
    Ok(())
}

pub fn check_layer_offset(dx: i32, dy: i32, opts: &ParseOptions) -> Result<()> {
    if i64::from(dx).abs() > opts.max_offset_abs || i64::from(dy).abs() > opts.max_offset_abs {
        return Err(Error::validation(
            ValidationKind::LayerOffsetRange,
            format!("layer offset ({dx}, {dy}) exceeds +/-{}", opts.max_offset_abs),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_file_is_zero() {
        assert_eq!(parse_version(b"file").unwrap(), 0);
    }

    #[test]
    fn version_v011_is_11() {
        assert_eq!(parse_version(b"v011").unwrap(), 11);
    }

    #[test]
    fn bad_version_token_is_unsupported() {
        assert!(matches!(parse_version(b"XXXX"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn offset_table_rejects_out_of_bounds() {
        let err = check_offset_table(&[10, 9999], 100).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationKind::OffsetOutOfBounds, _)));
    }

    #[test]
    fn offset_table_rejects_duplicates() {
        let err = check_offset_table(&[10, 10], 100).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationKind::DuplicateOffset, _)));
    }

    #[test]
    fn offset_table_ignores_zero_terminator() {
        assert!(check_offset_table(&[10, 20, 0], 100).is_ok());
    }

    #[test]
    fn dimensions_reject_zero_and_overflow() {
        let opts = ParseOptions::default();
        assert!(check_dimensions(0, 10, &opts).is_err());
        assert!(check_dimensions(10, 0xFFFF_FFFF, &opts).is_err());
        assert!(check_dimensions(10, 10, &opts).is_ok());
    }
}
