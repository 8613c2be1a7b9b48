#![forbid(unsafe_code)]

use tracing::warn;

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::format::{
    Encoding, PixelFormat, BITMAP_HEIGHT_TRIM, COLOR_KEY_16, TILE_BYTES, TILE_HEIGHT, TILE_ROWS,
    TILE_WIDTH,
};
use crate::gm1::image::DecodedImage;
use crate::gm1::index::EntryHeader;
use crate::gm1::tgx::{self, Encoder, Region};

/// How every entry of an archive is stored. Chosen once from the data class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Tgx16,
    Tgx8,
    Font,
    TileObject,
    Bitmap,
}

/// Canvas an entry decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
}

impl Geometry {
    pub fn depth(&self) -> u32 {
        self.format.depth()
    }

    pub fn color_key(&self) -> u16 {
        self.format.color_key()
    }

    fn allocate(&self) -> Gm1Result<DecodedImage> {
        DecodedImage::new(self.width, self.height, self.format)
    }
}

impl EntryKind {
    pub fn from_encoding(encoding: Encoding) -> Gm1Result<Self> {
        Ok(match encoding {
            Encoding::Tgx16 => EntryKind::Tgx16,
            Encoding::Tgx8 => EntryKind::Tgx8,
            Encoding::Font => EntryKind::Font,
            Encoding::TileObject => EntryKind::TileObject,
            Encoding::Bitmap => EntryKind::Bitmap,
            Encoding::Unknown => return Err(Gm1Error::format("unknown data class")),
        })
    }

    pub fn geometry(self, header: &EntryHeader) -> Gm1Result<Geometry> {
        let width = header.width as usize;
        let height = header.height as usize;
        Ok(match self {
            EntryKind::Tgx16 | EntryKind::Font => Geometry {
                width,
                height,
                format: PixelFormat::Argb1555,
            },
            EntryKind::Tgx8 => Geometry {
                width,
                height,
                format: PixelFormat::Indexed8,
            },
            EntryKind::TileObject => {
                let tile_y = usize::try_from(header.tile_y).map_err(|_| {
                    Gm1Error::format(format!("negative tile offset {}", header.tile_y))
                })?;
                Geometry {
                    width: TILE_WIDTH,
                    height: TILE_HEIGHT + tile_y,
                    format: PixelFormat::Argb1555,
                }
            }
            EntryKind::Bitmap => Geometry {
                width,
                height: height.checked_sub(BITMAP_HEIGHT_TRIM).ok_or_else(|| {
                    Gm1Error::format(format!("bitmap height {height} is below {BITMAP_HEIGHT_TRIM}"))
                })?,
                format: PixelFormat::Argb1555,
            },
        })
    }

    /// Decodes one entry payload into a freshly allocated canvas.
    pub fn decode(self, header: &EntryHeader, payload: &[u8]) -> Gm1Result<DecodedImage> {
        let mut image = self.geometry(header)?.allocate()?;
        match self {
            EntryKind::Tgx16 | EntryKind::Tgx8 => tgx::decode(payload, &mut image)?,
            EntryKind::Font => {
                tgx::decode(payload, &mut image)?;
                remap_green_to_alpha(&mut image);
            }
            EntryKind::TileObject => decode_tile_object(header, payload, &mut image)?,
            EntryKind::Bitmap => decode_bitmap(payload, &mut image),
        }
        Ok(image)
    }

    /// Produces the payload that [`EntryKind::decode`] turns back into `image`.
    ///
    /// Fonts are written as plain 16-bit TGX; the alpha remap is not undone.
    pub fn encode(self, header: &EntryHeader, image: &DecodedImage) -> Gm1Result<Vec<u8>> {
        let geometry = self.geometry(header)?;
        if image.width() != geometry.width
            || image.height() != geometry.height
            || image.format() != geometry.format
        {
            return Err(Gm1Error::format(format!(
                "{}x{} {:?} image does not match the entry's {}x{} {:?} canvas",
                image.width(),
                image.height(),
                image.format(),
                geometry.width,
                geometry.height,
                geometry.format
            )));
        }

        Ok(match self {
            EntryKind::Tgx16 | EntryKind::Tgx8 | EntryKind::Font => tgx::encode(image),
            EntryKind::TileObject => encode_tile_object(header, image)?,
            EntryKind::Bitmap => image.pixels().to_vec(),
        })
    }
}

fn tile_row_start(count: usize) -> usize {
    (TILE_WIDTH - count) / 2
}

fn box_region(header: &EntryHeader, image: &DecodedImage) -> Region {
    Region {
        x: header.h_offset as usize,
        y: 0,
        width: header.box_width as usize,
        height: image.height(),
    }
}

/// Paints the 512-byte rhombus block at `tile_y`, then the TGX box on top.
fn decode_tile_object(header: &EntryHeader, payload: &[u8], image: &mut DecodedImage) -> Gm1Result<()> {
    if payload.len() < TILE_BYTES {
        return Err(Gm1Error::format(format!(
            "tile object payload of {} bytes is under {TILE_BYTES}",
            payload.len()
        )));
    }
    let (tile, boxed) = payload.split_at(TILE_BYTES);

    let top = image.height() - TILE_HEIGHT;
    let stride = image.stride();
    let pixels = image.pixels_mut();
    let mut src = 0;
    for (row, &count) in TILE_ROWS.iter().enumerate() {
        let dst = (top + row) * stride + tile_row_start(count) * 2;
        pixels[dst..dst + count * 2].copy_from_slice(&tile[src..src + count * 2]);
        src += count * 2;
    }

    if !boxed.is_empty() {
        let region = box_region(header, image);
        tgx::decode_region(boxed, image, region)?;
    }
    Ok(())
}

fn encode_tile_object(header: &EntryHeader, image: &DecodedImage) -> Gm1Result<Vec<u8>> {
    let top = image.height() - TILE_HEIGHT;
    let mut out = Vec::with_capacity(TILE_BYTES);
    for (row, &count) in TILE_ROWS.iter().enumerate() {
        let start = tile_row_start(count);
        for x in start..start + count {
            let p = image.pixel(x, top + row).unwrap_or(COLOR_KEY_16);
            out.extend_from_slice(&p.to_le_bytes());
        }
    }

    if header.box_width > 0 {
        let region = box_region(header, image);
        if region.x + region.width > image.width() {
            return Err(Gm1Error::format(format!(
                "box {}..{} is outside the tile canvas",
                region.x,
                region.x + region.width
            )));
        }
        out.extend(Encoder::for_image(image).encode_region(image, region));
    }
    Ok(out)
}

/// Raw row-major dump; rows beyond the canvas are dropped.
fn decode_bitmap(payload: &[u8], image: &mut DecodedImage) {
    let pixels = image.pixels_mut();
    let n = payload.len().min(pixels.len());
    if payload.len() != pixels.len() {
        warn!(payload = payload.len(), canvas = pixels.len(), "bitmap size differs from canvas");
    }
    pixels[..n].copy_from_slice(&payload[..n]);
}

/// Font glyphs keep their coverage in the green channel; move it to the alpha bit.
fn remap_green_to_alpha(image: &mut DecodedImage) {
    let key = image.color_key();
    for px in image.pixels_mut().chunks_exact_mut(2) {
        let c = u16::from_le_bytes([px[0], px[1]]);
        if c == key {
            continue;
        }
        let green = (c >> 5) & 0x1F;
        let alpha = if green >= 0x10 { 0x8000 } else { 0 };
        px.copy_from_slice(&((c & 0x7FFF) | alpha).to_le_bytes());
    }
    image.set_alpha_bit(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gm1::format::COLOR_KEY_8;

    fn entry(width: u16, height: u16) -> EntryHeader {
        EntryHeader {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn unknown_class_has_no_variant() {
        assert!(matches!(
            EntryKind::from_encoding(Encoding::Unknown),
            Err(Gm1Error::Format(_))
        ));
        assert_eq!(
            EntryKind::from_encoding(Encoding::from_data_class(6)).unwrap(),
            EntryKind::Tgx16
        );
    }

    #[test]
    fn geometry_per_variant() {
        let h = entry(4, 23);
        let g = EntryKind::Tgx16.geometry(&h).unwrap();
        assert_eq!((g.width, g.height, g.depth(), g.color_key()), (4, 23, 16, COLOR_KEY_16));
        let g = EntryKind::Tgx8.geometry(&h).unwrap();
        assert_eq!((g.width, g.height, g.depth(), g.color_key()), (4, 23, 8, COLOR_KEY_8));
        let g = EntryKind::Bitmap.geometry(&h).unwrap();
        assert_eq!((g.width, g.height), (4, 16));

        let tile = EntryHeader {
            tile_y: 9,
            ..entry(30, 25)
        };
        let g = EntryKind::TileObject.geometry(&tile).unwrap();
        assert_eq!((g.width, g.height), (30, 25));

        assert!(EntryKind::Bitmap.geometry(&entry(4, 6)).is_err());
        let negative = EntryHeader { tile_y: -1, ..tile };
        assert!(EntryKind::TileObject.geometry(&negative).is_err());
    }

    #[test]
    fn bitmap_of_height_23_is_16_rows() {
        let h = entry(2, 23);
        let payload: Vec<u8> = (0..2 * 23 * 2).map(|i| i as u8).collect();
        let img = EntryKind::Bitmap.decode(&h, &payload).unwrap();
        assert_eq!((img.width(), img.height()), (2, 16));
        assert_eq!(img.pixel(0, 0), Some(0x0100));
        assert_eq!(img.pixel(1, 15), Some(u16::from_le_bytes([62, 63])));
    }

    #[test]
    fn short_bitmap_payload_leaves_rest_keyed() {
        let h = entry(2, 9);
        let img = EntryKind::Bitmap.decode(&h, &[0x22, 0x11, 0x44, 0x33]).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        assert_eq!(img.row_values(0), [0x1122, 0x3344]);
        assert_eq!(img.row_values(1), [COLOR_KEY_16; 2]);
    }

    #[test]
    fn font_moves_green_into_alpha() {
        let h = entry(3, 1);
        // Stream of three: bright green, dark green, then color key via transparent.
        let mut payload = vec![0x01];
        payload.extend_from_slice(&0x03E0u16.to_le_bytes());
        payload.extend_from_slice(&0x0020u16.to_le_bytes());
        payload.extend_from_slice(&[0x20, 0x40]);

        let img = EntryKind::Font.decode(&h, &payload).unwrap();
        assert!(img.has_alpha_bit());
        assert_eq!(img.pixel(0, 0), Some(0x83E0));
        assert_eq!(img.pixel(1, 0), Some(0x0020));
        assert_eq!(img.pixel(2, 0), Some(COLOR_KEY_16));

        let rgba = img.to_rgba8(None).unwrap();
        assert_eq!(rgba[3], 255);
        assert_eq!(rgba[7], 0);
        assert_eq!(rgba[11], 0);
    }

    #[test]
    fn tile_object_places_rhombus_and_box() {
        let header = EntryHeader {
            tile_y: 4,
            h_offset: 10,
            box_width: 5,
            ..entry(30, 20)
        };
        let mut payload = Vec::new();
        for i in 0..256u16 {
            payload.extend_from_slice(&(0x0100 + i).to_le_bytes());
        }
        // Box: first row painted with 5 pixels of 0x7777, the rest left transparent.
        payload.extend_from_slice(&[0x84, 0x77, 0x77, 0x40]);

        let img = EntryKind::TileObject.decode(&header, &payload).unwrap();
        assert_eq!((img.width(), img.height()), (30, 20));

        // First rhombus row: 2 pixels centered at x = 14..16, y = tile_y.
        assert_eq!(img.pixel(13, 4), Some(COLOR_KEY_16));
        assert_eq!(img.pixel(14, 4), Some(0x0100));
        assert_eq!(img.pixel(15, 4), Some(0x0101));
        assert_eq!(img.pixel(16, 4), Some(COLOR_KEY_16));
        // Widest rows span the whole canvas.
        assert_eq!(img.pixel(0, 4 + 7), Some(0x0100 + 98));
        assert_eq!(img.pixel(29, 4 + 8), Some(0x0100 + 128 + 29));
        // Last row.
        assert_eq!(img.pixel(14, 19), Some(0x0100 + 254));

        // Box pixels start at h_offset.
        assert_eq!(img.pixel(9, 0), Some(COLOR_KEY_16));
        assert!((10..15).all(|x| img.pixel(x, 0) == Some(0x7777)));
        assert_eq!(img.pixel(15, 0), Some(COLOR_KEY_16));
    }

    #[test]
    fn short_tile_payload_is_format_error() {
        let header = EntryHeader {
            tile_y: 0,
            ..entry(30, 16)
        };
        let err = EntryKind::TileObject.decode(&header, &[0u8; 511]).unwrap_err();
        assert!(matches!(err, Gm1Error::Format(_)), "{err}");
    }

    #[test]
    fn tile_object_round_trips() {
        let header = EntryHeader {
            tile_y: 3,
            h_offset: 8,
            box_width: 12,
            ..entry(30, 19)
        };
        let mut payload = Vec::new();
        for i in 0..256u16 {
            payload.extend_from_slice(&(i * 3).to_le_bytes());
        }
        let mut boxed = Vec::new();
        for y in 0..19 {
            let row: Vec<u16> = (0..12)
                .map(|x| if (x + y) % 5 == 0 { COLOR_KEY_16 } else { 0x4000 + y as u16 })
                .collect();
            Encoder::new(PixelFormat::Argb1555, Some(COLOR_KEY_16)).encode_row(&row, &mut boxed);
        }
        payload.extend_from_slice(&boxed);

        let img = EntryKind::TileObject.decode(&header, &payload).unwrap();
        let again = EntryKind::TileObject.encode(&header, &img).unwrap();
        let back = EntryKind::TileObject.decode(&header, &again).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn encode_rejects_mismatched_canvas() {
        let img = DecodedImage::new(4, 2, PixelFormat::Argb1555).unwrap();
        assert!(EntryKind::Tgx16.encode(&entry(4, 2), &img).is_ok());
        assert!(EntryKind::Tgx16.encode(&entry(5, 2), &img).is_err());
        assert!(EntryKind::Tgx8.encode(&entry(4, 2), &img).is_err());
    }
}
