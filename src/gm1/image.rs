#![forbid(unsafe_code)]

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::format::PixelFormat;
use crate::gm1::palette::{rgb555_to_rgba, Palette};

/// Largest canvas any entry may ask for. Entry headers are untrusted.
pub const MAX_CANVAS_PIXELS: usize = 4096 * 4096;

/// A decoded entry: row-major pixels plus the format needed to interpret them.
///
/// Freshly allocated images are filled with the format's color key, so any
/// pixel a decoder skips reads back as transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: usize,
    height: usize,
    format: PixelFormat,
    alpha_bit: bool,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Gm1Result<Self> {
        let count = width
            .checked_mul(height)
            .filter(|&n| n <= MAX_CANVAS_PIXELS)
            .ok_or_else(|| Gm1Error::format(format!("canvas {width}x{height} is too large")))?;

        let key = format.color_key();
        let pixels = match format {
            PixelFormat::Indexed8 => vec![key as u8; count],
            PixelFormat::Argb1555 => key.to_le_bytes().repeat(count),
        };
        Ok(Self {
            width,
            height,
            format,
            alpha_bit: false,
            pixels,
        })
    }

    /// Builds an image from one value per pixel. Indexed values must fit in a byte.
    pub fn from_values(
        width: usize,
        height: usize,
        format: PixelFormat,
        values: &[u16],
    ) -> Gm1Result<Self> {
        if values.len() != width * height {
            return Err(Gm1Error::format(format!(
                "{} pixel values for a {width}x{height} image",
                values.len()
            )));
        }
        let mut img = Self::new(width, height, format)?;
        for (i, &v) in values.iter().enumerate() {
            img.set_pixel(i % width, i / width, v)?;
        }
        Ok(img)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn depth(&self) -> u32 {
        self.format.depth()
    }

    pub fn color_key(&self) -> u16 {
        self.format.color_key()
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width * self.bytes_per_pixel()
    }

    /// Whether bit 15 of each 16-bit pixel carries coverage.
    pub fn has_alpha_bit(&self) -> bool {
        self.alpha_bit
    }

    pub(crate) fn set_alpha_bit(&mut self, on: bool) {
        self.alpha_bit = on;
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y * self.stride() + x * self.bytes_per_pixel();
        Some(match self.format {
            PixelFormat::Indexed8 => self.pixels[at] as u16,
            PixelFormat::Argb1555 => u16::from_le_bytes([self.pixels[at], self.pixels[at + 1]]),
        })
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: u16) -> Gm1Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Gm1Error::Overflow {
                row: y,
                x,
                len: 1,
                width: self.width,
            });
        }
        let at = y * self.stride() + x * self.bytes_per_pixel();
        match self.format {
            PixelFormat::Indexed8 => {
                let v = u8::try_from(value).map_err(|_| {
                    Gm1Error::format(format!("palette index {value} does not fit in 8 bits"))
                })?;
                self.pixels[at] = v;
            }
            PixelFormat::Argb1555 => {
                self.pixels[at..at + 2].copy_from_slice(&value.to_le_bytes());
            }
        }
        Ok(())
    }

    /// Pixel values of row `y`, widened to u16.
    pub fn row_values(&self, y: usize) -> Vec<u16> {
        (0..self.width).filter_map(|x| self.pixel(x, y)).collect()
    }

    /// Converts to 8-bit RGBA. Indexed images need a palette.
    pub fn to_rgba8(&self, palette: Option<&Palette>) -> Gm1Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.width * self.height * 4);
        match self.format {
            PixelFormat::Indexed8 => {
                let palette = palette.ok_or_else(|| {
                    Gm1Error::format("indexed image needs a palette to convert")
                })?;
                for &i in &self.pixels {
                    out.extend_from_slice(&palette.rgba(i));
                }
            }
            PixelFormat::Argb1555 => {
                let key = self.color_key();
                for px in self.pixels.chunks_exact(2) {
                    let c = u16::from_le_bytes([px[0], px[1]]);
                    if c == key {
                        out.extend_from_slice(&[0, 0, 0, 0]);
                        continue;
                    }
                    let mut rgba = rgb555_to_rgba(c);
                    if self.alpha_bit && c & 0x8000 == 0 {
                        rgba[3] = 0;
                    }
                    out.extend_from_slice(&rgba);
                }
            }
        }
        Ok(out)
    }
}
