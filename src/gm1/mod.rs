#![forbid(unsafe_code)]

mod build;
mod error;
mod export;
mod format;
mod header;
mod image;
mod index;
mod io;
mod ops;
mod palette;
mod read;
pub mod tgx;
mod variant;

pub use build::{write_archive, Gm1Builder};
pub use error::{Gm1Error, Gm1Result};
pub use export::{export_image, write_png, ExportFormat};
pub use format::{
    Encoding, PixelFormat, COLOR_KEY_16, COLOR_KEY_8, ENTRY_HEADER_SIZE, HEADER_SIZE,
    MAX_TOKEN_LEN, PALETTE_COLORS, PALETTE_COUNT, PALETTE_SIZE, TILE_BYTES, TILE_HEIGHT,
    TILE_ROWS, TILE_WIDTH,
};
pub use header::{ArchiveHeader, FIELD_NAMES};
pub use image::{DecodedImage, MAX_CANVAS_PIXELS};
pub use index::{EntryHeader, EntryIndex};
pub use palette::{rgb555_to_rgba, Palette, PaletteTable};
pub use read::{CacheMode, Gm1Reader};
pub use variant::{EntryKind, Geometry};

pub use ops::{export, extract, info, list, palette, verify, verify_archive, VerifyReport};
