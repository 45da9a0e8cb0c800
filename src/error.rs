//! The sum-typed error surface for the whole crate.
//!
//! Mirrors the teacher's `doc::Error` / `doc::FormatError` split: a hand
//! written `enum` with `Display`, no macro-derived error crate on the
//! library surface. Every variant carries enough context (an offset, a
//! field name, an expected-vs-actual pair) to diagnose a malformed file
//! without re-parsing it.

use std::fmt::{self, Display, Formatter};
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Only raised by the optional file-path adapter.
    Io(String),
    /// Not a GIMP XCF file, an unsupported compression scheme, or a version
    /// number outside the decoder's declared range.
    Unsupported(String),
    /// A structural check from [`crate::validate`] failed.
    Validation(ValidationKind, String),
    /// A length/terminator/offset mismatch caught during decoding.
    Malformed(String),
    /// A read past the end of the byte slice.
    UnexpectedEof(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationKind {
    Magic,
    Dimensions,
    BaseType,
    Precision,
    OffsetOutOfBounds,
    DuplicateOffset,
    PathTooDeep,
    PathIndexTooLarge,
    LayerOffsetRange,
    CyclicReference,
    GroupPath,
    TileCount,
}

impl Display for ValidationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use ValidationKind as K;

        let name = match self {
            K::Magic => "magic",
            K::Dimensions => "dimensions",
            K::BaseType => "base_type",
            K::Precision => "precision",
            K::OffsetOutOfBounds => "offset_out_of_bounds",
            K::DuplicateOffset => "duplicate_offset",
            K::PathTooDeep => "path_too_deep",
            K::PathIndexTooLarge => "path_index_too_large",
            K::LayerOffsetRange => "layer_offset_range",
            K::CyclicReference => "cyclic_reference",
            K::GroupPath => "group_path",
            K::TileCount => "tile_count",
        };
        f.write_str(name)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(detail) => write!(f, "I/O error: {detail}"),
            Error::Unsupported(detail) => write!(f, "unsupported: {detail}"),
            Error::Validation(kind, detail) => write!(f, "validation ({kind}): {detail}"),
            Error::Malformed(detail) => write!(f, "malformed: {detail}"),
            Error::UnexpectedEof(detail) => write!(f, "unexpected end of file: {detail}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl Error {
    pub(crate) fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Error::Validation(kind, detail.into())
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Error::Malformed(detail.into())
    }

    pub(crate) fn unsupported(detail: impl Into<String>) -> Self {
        Error::Unsupported(detail.into())
    }

    pub(crate) fn eof(detail: impl Into<String>) -> Self {
        Error::UnexpectedEof(detail.into())
    }
}
