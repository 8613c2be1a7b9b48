#![forbid(unsafe_code)]

use std::io::{Read, Write};

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::format::{PALETTE_COLORS, PALETTE_COUNT};
use crate::gm1::io::{read_u16, write_u16};

/// Expands a 5-bit channel to 8 bits.
fn expand5(v: u16) -> u8 {
    let v = (v & 0x1F) as u8;
    (v << 3) | (v >> 2)
}

/// Converts an RGB555 color to opaque RGBA. The top bit is ignored.
pub fn rgb555_to_rgba(c: u16) -> [u8; 4] {
    [expand5(c >> 10), expand5(c >> 5), expand5(c), 0xFF]
}

/// 256 raw RGB555 colors. Index 0 is the color key by convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [u16; PALETTE_COLORS],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: [0; PALETTE_COLORS],
        }
    }
}

impl Palette {
    pub fn from_colors(colors: [u16; PALETTE_COLORS]) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[u16; PALETTE_COLORS] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Gm1Result<u16> {
        self.colors
            .get(index)
            .copied()
            .ok_or(Gm1Error::IndexOutOfRange {
                what: "color",
                index,
                count: PALETTE_COLORS,
            })
    }

    /// Color at `index` as RGBA; index 0 maps to transparent.
    pub fn rgba(&self, index: u8) -> [u8; 4] {
        if index == 0 {
            return [0, 0, 0, 0];
        }
        rgb555_to_rgba(self.colors[index as usize])
    }

    pub fn read(r: &mut dyn Read) -> Gm1Result<Self> {
        let mut colors = [0u16; PALETTE_COLORS];
        for c in colors.iter_mut() {
            *c = read_u16(r)?;
        }
        Ok(Self { colors })
    }

    pub fn write(&self, w: &mut dyn Write) -> Gm1Result<()> {
        for c in self.colors {
            write_u16(w, c)?;
        }
        Ok(())
    }
}

/// The fixed set of ten palettes stored after the archive header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteTable {
    palettes: [Palette; PALETTE_COUNT],
}

impl PaletteTable {
    pub fn from_palettes(palettes: [Palette; PALETTE_COUNT]) -> Self {
        Self { palettes }
    }

    pub fn get(&self, index: usize) -> Gm1Result<&Palette> {
        self.palettes.get(index).ok_or(Gm1Error::IndexOutOfRange {
            what: "palette",
            index,
            count: PALETTE_COUNT,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Palette> {
        self.palettes.iter()
    }

    pub fn read(r: &mut dyn Read) -> Gm1Result<Self> {
        let mut table = Self::default();
        for p in table.palettes.iter_mut() {
            *p = Palette::read(r)?;
        }
        Ok(table)
    }

    pub fn write(&self, w: &mut dyn Write) -> Gm1Result<()> {
        for p in &self.palettes {
            p.write(w)?;
        }
        Ok(())
    }
}
