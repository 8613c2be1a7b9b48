#![forbid(unsafe_code)]

use std::io::{Read, Write};

use crate::gm1::error::Gm1Result;
use crate::gm1::format::{
    Encoding, HEADER_FIELDS, HEADER_SIZE, INDEX_BYTES_PER_ENTRY, PALETTE_COUNT, PALETTE_SIZE,
};
use crate::gm1::io::{read_u32, write_u32};

/// Field names in on-disk order.
pub const FIELD_NAMES: [&str; HEADER_FIELDS] = [
    "u1",
    "u2",
    "u3",
    "image_count",
    "u4",
    "data_class",
    "u5",
    "u6",
    "size_category",
    "u7",
    "u8",
    "u9",
    "width",
    "height",
    "u10",
    "u11",
    "u12",
    "u13",
    "anchor_x",
    "anchor_y",
    "data_size",
    "u14",
];

/// Fixed 88-byte archive header. Unknown fields are kept for round trips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub u1: u32,
    pub u2: u32,
    pub u3: u32,
    pub image_count: u32,
    pub u4: u32,
    pub data_class: u32,
    pub u5: u32,
    pub u6: u32,
    pub size_category: u32,
    pub u7: u32,
    pub u8: u32,
    pub u9: u32,
    pub width: u32,
    pub height: u32,
    pub u10: u32,
    pub u11: u32,
    pub u12: u32,
    pub u13: u32,
    pub anchor_x: u32,
    pub anchor_y: u32,
    pub data_size: u32,
    pub u14: u32,
}

impl ArchiveHeader {
    pub fn from_fields(f: [u32; HEADER_FIELDS]) -> Self {
        Self {
            u1: f[0],
            u2: f[1],
            u3: f[2],
            image_count: f[3],
            u4: f[4],
            data_class: f[5],
            u5: f[6],
            u6: f[7],
            size_category: f[8],
            u7: f[9],
            u8: f[10],
            u9: f[11],
            width: f[12],
            height: f[13],
            u10: f[14],
            u11: f[15],
            u12: f[16],
            u13: f[17],
            anchor_x: f[18],
            anchor_y: f[19],
            data_size: f[20],
            u14: f[21],
        }
    }

    pub fn fields(&self) -> [u32; HEADER_FIELDS] {
        [
            self.u1,
            self.u2,
            self.u3,
            self.image_count,
            self.u4,
            self.data_class,
            self.u5,
            self.u6,
            self.size_category,
            self.u7,
            self.u8,
            self.u9,
            self.width,
            self.height,
            self.u10,
            self.u11,
            self.u12,
            self.u13,
            self.anchor_x,
            self.anchor_y,
            self.data_size,
            self.u14,
        ]
    }

    pub fn read(r: &mut dyn Read) -> Gm1Result<Self> {
        let mut f = [0u32; HEADER_FIELDS];
        for v in f.iter_mut() {
            *v = read_u32(r)?;
        }
        Ok(Self::from_fields(f))
    }

    pub fn write(&self, w: &mut dyn Write) -> Gm1Result<()> {
        for v in self.fields() {
            write_u32(w, v)?;
        }
        Ok(())
    }

    pub fn encoding(&self) -> Encoding {
        Encoding::from_data_class(self.data_class)
    }

    /// Bytes before the payload blob: header, palettes, offsets, sizes, entry headers.
    pub fn preamble_size(&self) -> u64 {
        HEADER_SIZE as u64
            + (PALETTE_COUNT * PALETTE_SIZE) as u64
            + self.image_count as u64 * INDEX_BYTES_PER_ENTRY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gm1::error::Gm1Error;

    #[test]
    fn fields_keep_declared_order() {
        let mut raw = Vec::new();
        for i in 0..HEADER_FIELDS as u32 {
            raw.extend_from_slice(&(100 + i).to_le_bytes());
        }
        assert_eq!(raw.len(), HEADER_SIZE);

        let h = ArchiveHeader::read(&mut &raw[..]).unwrap();
        assert_eq!(h.u1, 100);
        assert_eq!(h.image_count, 103);
        assert_eq!(h.data_class, 105);
        assert_eq!(h.size_category, 108);
        assert_eq!(h.width, 112);
        assert_eq!(h.height, 113);
        assert_eq!(h.anchor_x, 118);
        assert_eq!(h.anchor_y, 119);
        assert_eq!(h.data_size, 120);
        assert_eq!(h.u14, 121);

        let mut out = Vec::new();
        h.write(&mut out).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn short_header_is_format_error() {
        let raw = [0u8; HEADER_SIZE - 1];
        let err = ArchiveHeader::read(&mut &raw[..]).unwrap_err();
        assert!(matches!(err, Gm1Error::Format(_)), "{err}");
    }

    #[test]
    fn preamble_grows_by_24_bytes_per_image() {
        let mut h = ArchiveHeader::default();
        assert_eq!(h.preamble_size(), 88 + 5120);
        h.image_count = 3;
        assert_eq!(h.preamble_size(), 88 + 5120 + 3 * 24);
        h.image_count = u32::MAX;
        assert_eq!(h.preamble_size(), 88 + 5120 + u32::MAX as u64 * 24);
    }
}
