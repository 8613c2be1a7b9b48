#![forbid(unsafe_code)]

/// Archive header: 22 little-endian u32 fields.
pub const HEADER_SIZE: usize = 88;
pub const HEADER_FIELDS: usize = 22;

pub const PALETTE_COUNT: usize = 10;
pub const PALETTE_COLORS: usize = 256;
/// Bytes per palette on disk (256 × u16).
pub const PALETTE_SIZE: usize = PALETTE_COLORS * 2;

pub const ENTRY_HEADER_SIZE: usize = 16;

/// Per-entry preamble cost: offset (u32) + size (u32) + entry header.
pub const INDEX_BYTES_PER_ENTRY: u64 = 4 + 4 + ENTRY_HEADER_SIZE as u64;

/// Color key for 16-bit images (magenta in ARGB1555 terms).
pub const COLOR_KEY_16: u16 = 0xF81F;
/// Color key for 8-bit images (palette index 0).
pub const COLOR_KEY_8: u16 = 0;

/// Token lengths are stored as `length - 1` in 5 bits.
pub const MAX_TOKEN_LEN: usize = 32;

pub const TILE_WIDTH: usize = 30;
pub const TILE_HEIGHT: usize = 16;
pub const TILE_BYTES: usize = 512;
/// Pixels per row of the isometric tile rhombus, top to bottom.
pub const TILE_ROWS: [usize; TILE_HEIGHT] = [2, 6, 10, 14, 18, 22, 26, 30, 30, 26, 22, 18, 14, 10, 6, 2];

/// Bitmap entries carry 7 more rows in their header than they display.
pub const BITMAP_HEIGHT_TRIM: usize = 7;

/// Decode variant selected by the header's data class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Tgx16,
    Tgx8,
    TileObject,
    Font,
    Bitmap,
    Unknown,
}

impl Encoding {
    pub fn from_data_class(class: u32) -> Self {
        match class {
            1 | 6 => Encoding::Tgx16,
            2 => Encoding::Tgx8,
            3 => Encoding::TileObject,
            4 => Encoding::Font,
            5 | 7 => Encoding::Bitmap,
            _ => Encoding::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Tgx16 => "tgx16",
            Encoding::Tgx8 => "tgx8",
            Encoding::TileObject => "tile-object",
            Encoding::Font => "font",
            Encoding::Bitmap => "bitmap",
            Encoding::Unknown => "unknown",
        }
    }
}

/// Pixel layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One byte per pixel, palette index; index 0 is the color key.
    Indexed8,
    /// Two bytes per pixel, little-endian ARGB1555.
    Argb1555,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Indexed8 => 1,
            PixelFormat::Argb1555 => 2,
        }
    }

    pub fn depth(self) -> u32 {
        match self {
            PixelFormat::Indexed8 => 8,
            PixelFormat::Argb1555 => 16,
        }
    }

    pub fn color_key(self) -> u16 {
        match self {
            PixelFormat::Indexed8 => COLOR_KEY_8,
            PixelFormat::Argb1555 => COLOR_KEY_16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_classes_map_to_variants() {
        assert_eq!(Encoding::from_data_class(1), Encoding::Tgx16);
        assert_eq!(Encoding::from_data_class(2), Encoding::Tgx8);
        assert_eq!(Encoding::from_data_class(3), Encoding::TileObject);
        assert_eq!(Encoding::from_data_class(4), Encoding::Font);
        assert_eq!(Encoding::from_data_class(5), Encoding::Bitmap);
        assert_eq!(Encoding::from_data_class(6), Encoding::Tgx16);
        assert_eq!(Encoding::from_data_class(7), Encoding::Bitmap);
        assert_eq!(Encoding::from_data_class(0), Encoding::Unknown);
        assert_eq!(Encoding::from_data_class(8), Encoding::Unknown);
    }

    #[test]
    fn tile_rows_cover_one_512_byte_block() {
        let pixels: usize = TILE_ROWS.iter().sum();
        assert_eq!(pixels * 2, TILE_BYTES);
        assert!(TILE_ROWS.iter().all(|&n| n <= TILE_WIDTH));
    }
}
