#![allow(dead_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(rust_2018_idioms, clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::must_use_candidate,
    clippy::unreadable_literal
)]

//! A decoder for GIMP's native `.xcf` image format.
//!
//! Given a byte slice, [`XcfImage::parse_bytes`] produces a structured description
//! of the image's layer tree; [`XcfImage::render_composite`] (and friends)
//! walk that tree and paint a fully composited 8-bit RGBA raster into any
//! [`ImageSink`].
//!
//! Writing/encoding `.xcf`, rendering text layers as text, honoring layer
//! masks and vector/path properties, and color-managed gamma/linear
//! conversion are all out of scope; see `DESIGN.md` for the reasoning.

pub mod compositor;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod group;
pub mod image;
pub mod precision;
pub mod reader;
pub mod render;
pub mod sink;
pub mod types;

pub(crate) mod validate;

pub use diagnostics::{Diagnostics, NoopDiagnostics};
pub use error::{Error, Result, ValidationKind};
pub use image::XcfImage;
pub use sink::{ImageSink, OwnedRaster, Rgba};
pub use types::{BaseType, BlendMode, Precision};
pub use validate::ParseOptions;
