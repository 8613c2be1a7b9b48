#![forbid(unsafe_code)]

//! TGX run-length pixel codec.
//!
//! A token stream is a sequence of one-byte token headers, some followed by
//! pixel payload:
//!
//! ```text
//!  7   5 4       0
//! +-----+---------+
//! | typ | len - 1 |   len in 1..=32
//! +-----+---------+
//!
//! 000 stream       len pixels of payload follow
//! 001 transparent  skip len pixels, no payload
//! 010 line feed    end of row, len must be 1, no payload
//! 100 repeat       one pixel of payload, painted len times
//! ```
//!
//! Pixels are 1 byte (palette index) or 2 bytes (ARGB1555, little-endian).
//! The stream carries no length prefix; its byte budget comes from the caller.

use std::io::{Read, Write};

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::format::{PixelFormat, MAX_TOKEN_LEN};
use crate::gm1::image::DecodedImage;
use crate::gm1::io::{read_u32, read_vec, write_u32};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Stream,
    Transparent,
    LineFeed,
    Repeat,
}

impl TokenKind {
    fn bits(self) -> u8 {
        match self {
            TokenKind::Stream => 0b000,
            TokenKind::Transparent => 0b001,
            TokenKind::LineFeed => 0b010,
            TokenKind::Repeat => 0b100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub len: usize,
}

impl Token {
    pub const LINE_FEED: Token = Token {
        kind: TokenKind::LineFeed,
        len: 1,
    };

    pub fn parse(byte: u8) -> Gm1Result<Self> {
        let kind = match byte >> 5 {
            0b000 => TokenKind::Stream,
            0b001 => TokenKind::Transparent,
            0b010 => TokenKind::LineFeed,
            0b100 => TokenKind::Repeat,
            other => {
                return Err(Gm1Error::format(format!(
                    "unknown tgx token type {other:#05b} in byte {byte:#04x}"
                )))
            }
        };
        Ok(Self {
            kind,
            len: (byte & 0x1F) as usize + 1,
        })
    }

    /// Packs the token. `len` must be in `1..=32`.
    pub fn to_byte(self) -> u8 {
        debug_assert!((1..=MAX_TOKEN_LEN).contains(&self.len));
        (self.kind.bits() << 5) | ((self.len - 1) as u8 & 0x1F)
    }
}

/// Rectangle of an image that a token stream paints, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn full(image: &DecodedImage) -> Self {
        Self {
            x: 0,
            y: 0,
            width: image.width(),
            height: image.height(),
        }
    }

    fn check_within(&self, image: &DecodedImage) -> Gm1Result<()> {
        if self.x + self.width > image.width() || self.y + self.height > image.height() {
            return Err(Gm1Error::format(format!(
                "region {}x{} at ({}, {}) is outside the {}x{} canvas",
                self.width,
                self.height,
                self.x,
                self.y,
                image.width(),
                image.height()
            )));
        }
        Ok(())
    }
}

/// Decodes a token stream over the whole image.
pub fn decode(data: &[u8], image: &mut DecodedImage) -> Gm1Result<()> {
    let region = Region::full(image);
    decode_region(data, image, region)
}

/// Decodes a token stream into `region`, consuming all of `data`.
///
/// Every token is bounds-checked against the current row before anything is
/// written. Transparent runs leave the canvas untouched.
pub fn decode_region(data: &[u8], image: &mut DecodedImage, region: Region) -> Gm1Result<()> {
    region.check_within(image)?;
    let bpp = image.bytes_per_pixel();
    let stride = image.stride();
    let pixels = image.pixels_mut();

    let mut pos = 0;
    let mut row = 0;
    let mut x = 0;

    while pos < data.len() {
        let token = Token::parse(data[pos])?;
        pos += 1;

        if token.kind == TokenKind::LineFeed {
            if token.len != 1 {
                return Err(Gm1Error::format(format!(
                    "line feed with length {} at byte {}",
                    token.len,
                    pos - 1
                )));
            }
            row += 1;
            x = 0;
            continue;
        }

        if row >= region.height || x + token.len > region.width {
            return Err(Gm1Error::Overflow {
                row,
                x,
                len: token.len,
                width: region.width,
            });
        }

        let dst = (region.y + row) * stride + (region.x + x) * bpp;
        match token.kind {
            TokenKind::Stream => {
                let n = token.len * bpp;
                let src = data
                    .get(pos..pos + n)
                    .ok_or_else(|| Gm1Error::format(format!("stream token at byte {} runs past the budget", pos - 1)))?;
                pixels[dst..dst + n].copy_from_slice(src);
                pos += n;
            }
            TokenKind::Repeat => {
                let src = data
                    .get(pos..pos + bpp)
                    .ok_or_else(|| Gm1Error::format(format!("repeat token at byte {} runs past the budget", pos - 1)))?;
                for px in pixels[dst..dst + token.len * bpp].chunks_exact_mut(bpp) {
                    px.copy_from_slice(src);
                }
                pos += bpp;
            }
            TokenKind::Transparent | TokenKind::LineFeed => {}
        }
        x += token.len;
    }
    Ok(())
}

/// Reads exactly `budget` bytes from `r` and decodes them into `image`.
///
/// The source ends up positioned at the end of the budget even when the
/// token stream itself is rejected.
pub fn decode_stream(r: &mut dyn Read, budget: usize, image: &mut DecodedImage) -> Gm1Result<()> {
    let data = read_vec(r, budget)?;
    decode(&data, image)
}

/// Row tokenizer. Pixels equal to the color key become transparent runs.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    format: PixelFormat,
    color_key: Option<u16>,
}

impl Encoder {
    pub fn new(format: PixelFormat, color_key: Option<u16>) -> Self {
        Self { format, color_key }
    }

    pub fn for_image(image: &DecodedImage) -> Self {
        Self::new(image.format(), Some(image.color_key()))
    }

    fn is_transparent(&self, p: u16) -> bool {
        self.color_key == Some(p)
    }

    fn push_pixel(&self, p: u16, out: &mut Vec<u8>) {
        match self.format {
            PixelFormat::Indexed8 => out.push(p as u8),
            PixelFormat::Argb1555 => out.extend_from_slice(&p.to_le_bytes()),
        }
    }

    /// Tokenizes one row and terminates it with a line feed.
    ///
    /// At each position the first match wins: a transparent run, a run of
    /// two or more equal pixels, then a stream of pixels up to the next run.
    pub fn encode_row(&self, row: &[u16], out: &mut Vec<u8>) {
        let n = row.len();
        let mut i = 0;

        while i < n {
            let p = row[i];

            if self.is_transparent(p) {
                let mut len = 1;
                while i + len < n && len < MAX_TOKEN_LEN && self.is_transparent(row[i + len]) {
                    len += 1;
                }
                out.push(Token { kind: TokenKind::Transparent, len }.to_byte());
                i += len;
                continue;
            }

            let mut run = 1;
            while i + run < n && run < MAX_TOKEN_LEN && row[i + run] == p {
                run += 1;
            }
            if run >= 2 {
                out.push(Token { kind: TokenKind::Repeat, len: run }.to_byte());
                self.push_pixel(p, out);
                i += run;
                continue;
            }

            let mut len = 1;
            while i + len < n && len < MAX_TOKEN_LEN {
                let q = row[i + len];
                if self.is_transparent(q) || (i + len + 1 < n && row[i + len + 1] == q) {
                    break;
                }
                len += 1;
            }
            out.push(Token { kind: TokenKind::Stream, len }.to_byte());
            for &q in &row[i..i + len] {
                self.push_pixel(q, out);
            }
            i += len;
        }

        out.push(Token::LINE_FEED.to_byte());
    }

    /// Encodes every row of `region`, top to bottom.
    pub fn encode_region(&self, image: &DecodedImage, region: Region) -> Vec<u8> {
        let mut out = Vec::new();
        for y in region.y..region.y + region.height {
            let row: Vec<u16> = (region.x..region.x + region.width)
                .filter_map(|x| image.pixel(x, y))
                .collect();
            self.encode_row(&row, &mut out);
        }
        out
    }
}

/// Encodes a whole image, keying out its color key.
pub fn encode(image: &DecodedImage) -> Vec<u8> {
    Encoder::for_image(image).encode_region(image, Region::full(image))
}

/// Reads a standalone `.tgx` file: u32 width, u32 height, then a 16-bit
/// token stream running to end of file.
pub fn read_tgx(r: &mut dyn Read) -> Gm1Result<DecodedImage> {
    let width = read_u32(r)? as usize;
    let height = read_u32(r)? as usize;
    let mut image = DecodedImage::new(width, height, PixelFormat::Argb1555)?;
    let mut data = Vec::new();
    r.read_to_end(&mut data)?;
    decode(&data, &mut image)?;
    Ok(image)
}

pub fn write_tgx(w: &mut dyn Write, image: &DecodedImage) -> Gm1Result<()> {
    if image.format() != PixelFormat::Argb1555 {
        return Err(Gm1Error::format("standalone tgx files hold 16-bit images only"));
    }
    let width = u32::try_from(image.width()).map_err(|_| Gm1Error::format("image too wide"))?;
    let height = u32::try_from(image.height()).map_err(|_| Gm1Error::format("image too tall"))?;
    write_u32(w, width)?;
    write_u32(w, height)?;
    w.write_all(&encode(image))?;
    Ok(())
}
