//! The `PARASITES` property's own sub-format (§4.3.1).

use crate::error::Result;
use crate::reader::Reader;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parasite {
    pub name: String,
    pub flags: u32,
    pub payload: Vec<u8>,
    /// `(key, value)` pairs parsed out of a `gimp-text-layer` payload; empty
    /// for every other parasite name.
    pub text_layer_fields: Vec<(String, String)>,
}

/// A stream of parasite items until the blob (of `blob_len` bytes) ends.
pub fn parse_parasites(reader: &mut Reader<'_>, blob_len: u32) -> Result<Vec<Parasite>> {
    let end = reader.tell() + blob_len as usize;
    let mut parasites = Vec::new();

    while reader.tell() < end {
        let name_length = reader.read_u32_be()? as usize;
        let name = reader.read_cstring()?;
        let name = String::from_utf8_lossy(name).into_owned();
        // `name_length` counts the trailing NUL; skip any padding it implies
        // beyond the NUL already consumed by `read_cstring`.
        let consumed = name.len() + 1;
        if name_length > consumed {
            reader.skip(name_length - consumed)?;
        }

        let flags = reader.read_u32_be()?;
        let payload_length = reader.read_u32_be()? as usize;
        let payload = reader.read_bytes(payload_length)?.to_vec();

        let text_layer_fields = if name == "gimp-text-layer" {
            parse_text_layer_fields(&payload)
        } else {
            Vec::new()
        };

        parasites.push(Parasite { name, flags, payload, text_layer_fields });
    }

    Ok(parasites)
}

/// Splits a NUL-terminated ASCII string of Lisp-like `(key value ...)`
/// tuples into `(key, value)` pairs, stripping surrounding double quotes
/// from the value.
fn parse_text_layer_fields(payload: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(payload);
    let text = text.trim_end_matches('\0');

    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut group_start = None;

    for (i, c) in text.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    group_start = Some(i + 1);
                }
                depth += 1;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(start) = group_start.take() {
                        let body = &text[start..i];
                        if let Some((key, value)) = body.split_once(' ') {
                            let value = value.trim().trim_matches('"');
                            fields.push((key.to_string(), value.to_string()));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_blob(name: &str, flags: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        let name_len = name.len() as u32 + 1;
        bytes.extend(name_len.to_be_bytes());
        bytes.extend(name.as_bytes());
        bytes.push(0);
        bytes.extend(flags.to_be_bytes());
        bytes.extend((payload.len() as u32).to_be_bytes());
        bytes.extend(payload);
        bytes
    }

    #[test]
    fn parses_a_single_opaque_parasite() {
        let blob = build_blob("icc-profile", 1, b"\x01\x02\x03");
        let mut reader = Reader::new(&blob);
        let parasites = parse_parasites(&mut reader, blob.len() as u32).unwrap();

        assert_eq!(parasites.len(), 1);
        assert_eq!(parasites[0].name, "icc-profile");
        assert_eq!(parasites[0].flags, 1);
        assert_eq!(parasites[0].payload, vec![1, 2, 3]);
        assert!(parasites[0].text_layer_fields.is_empty());
    }

    #[test]
    fn parses_text_layer_fields() {
        let payload = b"(markup \"<b>hi</b>\")(font \"Sans\")\0";
        let blob = build_blob("gimp-text-layer", 0, payload);
        let mut reader = Reader::new(&blob);
        let parasites = parse_parasites(&mut reader, blob.len() as u32).unwrap();

        let fields = &parasites[0].text_layer_fields;
        assert_eq!(fields[0], ("markup".to_string(), "<b>hi</b>".to_string()));
        assert_eq!(fields[1], ("font".to_string(), "Sans".to_string()));
    }

    #[test]
    fn parses_multiple_parasites_back_to_back() {
        let mut blob = build_blob("a", 0, b"x");
        blob.extend(build_blob("b", 0, b"yz"));
        let mut reader = Reader::new(&blob);
        let parasites = parse_parasites(&mut reader, blob.len() as u32).unwrap();

        assert_eq!(parasites.len(), 2);
        assert_eq!(parasites[1].name, "b");
        assert_eq!(parasites[1].payload, b"yz");
    }
}
