//! The `ImageSink` contract (§6) and an owned, in-memory implementation.
//!
//! Grounded on the teacher's `utils::image::PngImage`, which wraps a flat
//! RGBA buffer behind get/set accessors before handing it to the `png`
//! crate; `OwnedRaster` is the same shape, generalized to the trait the
//! compositor renders through instead of being PNG-specific.

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// The minimal interface between the core and a host's pixel buffer.
///
/// `get_at`/`set_at` are the contract every sink must honor; `direct_buffer`
/// is an optional fast path the renderer uses when available (8/16/32-bit
/// RGB(A) tiles copied straight into a row-major RGBA buffer).
pub trait ImageSink {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Pixels outside `[0,w) x [0,h)` read as fully transparent black.
    fn get_at(&self, x: i64, y: i64) -> Rgba;

    /// Writes outside bounds are no-ops.
    fn set_at(&mut self, x: i64, y: i64, value: Rgba);

    /// Row-major, 4 bytes/pixel, top-left origin. `None` forces the
    /// general per-pixel path.
    fn direct_buffer(&mut self) -> Option<&mut [u8]> {
        None
    }
}

/// A plain heap-allocated RGBA raster; the sink every caller reaches for
/// first, and what `Image::render_composite` tests against.
#[derive(Clone, Debug)]
pub struct OwnedRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl OwnedRaster {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![0u8; width as usize * height as usize * 4] }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

impl ImageSink for OwnedRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get_at(&self, x: i64, y: i64) -> Rgba {
        if !self.in_bounds(x, y) {
            return TRANSPARENT;
        }
        let i = self.index(x, y);
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    fn set_at(&mut self, x: i64, y: i64, value: Rgba) {
        if !self.in_bounds(x, y) {
            return;
        }
        let i = self.index(x, y);
        self.pixels[i..i + 4].copy_from_slice(&value);
    }

    fn direct_buffer(&mut self) -> Option<&mut [u8]> {
        Some(&mut self.pixels)
    }
}

#[cfg(feature = "png")]
pub mod png_sink {
    //! Encodes an [`OwnedRaster`] to a PNG byte stream, mirroring the
    //! teacher's `utils::image::PngImage::save` (same `png` crate, same
    //! "build an `Encoder`, write one `ImageData` call" shape).

    use super::OwnedRaster;
    use std::io::{self, Write};

    pub fn encode(raster: &OwnedRaster) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, raster.width(), raster.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            writer
                .write_image_data(raster.pixels())
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        }
        Ok(bytes)
    }

    pub fn write_to<W: Write>(raster: &OwnedRaster, mut out: W) -> io::Result<()> {
        out.write_all(&encode(raster)?)
    }
}
