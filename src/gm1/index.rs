#![forbid(unsafe_code)]

use std::io::{Read, Write};

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::io::{read_i16, read_u16, read_u32, read_u8, write_i16, write_u16, write_u32, write_u8};

/// Per-image metadata, 16 bytes on disk.
///
/// `tile_y`, `h_offset` and `box_width` are only meaningful for tile objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryHeader {
    pub width: u16,
    pub height: u16,
    pub pos_x: u16,
    pub pos_y: u16,
    pub group: u8,
    pub group_size: u8,
    pub tile_y: i16,
    pub tile_orient: u8,
    pub h_offset: u8,
    pub box_width: u8,
    pub flags: u8,
}

impl EntryHeader {
    pub fn read(r: &mut dyn Read) -> Gm1Result<Self> {
        Ok(Self {
            width: read_u16(r)?,
            height: read_u16(r)?,
            pos_x: read_u16(r)?,
            pos_y: read_u16(r)?,
            group: read_u8(r)?,
            group_size: read_u8(r)?,
            tile_y: read_i16(r)?,
            tile_orient: read_u8(r)?,
            h_offset: read_u8(r)?,
            box_width: read_u8(r)?,
            flags: read_u8(r)?,
        })
    }

    pub fn write(&self, w: &mut dyn Write) -> Gm1Result<()> {
        write_u16(w, self.width)?;
        write_u16(w, self.height)?;
        write_u16(w, self.pos_x)?;
        write_u16(w, self.pos_y)?;
        write_u8(w, self.group)?;
        write_u8(w, self.group_size)?;
        write_i16(w, self.tile_y)?;
        write_u8(w, self.tile_orient)?;
        write_u8(w, self.h_offset)?;
        write_u8(w, self.box_width)?;
        write_u8(w, self.flags)?;
        Ok(())
    }
}

/// Where each entry's payload lives inside the payload blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryIndex {
    pub offsets: Vec<u32>,
    pub sizes: Vec<u32>,
    pub headers: Vec<EntryHeader>,
}

impl EntryIndex {
    /// Reads offsets, then sizes, then entry headers.
    ///
    /// The caller must have checked that the source holds `count` entries.
    pub fn read(r: &mut dyn Read, count: usize) -> Gm1Result<Self> {
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            offsets.push(read_u32(r)?);
        }
        let mut sizes = Vec::with_capacity(count);
        for _ in 0..count {
            sizes.push(read_u32(r)?);
        }
        let mut headers = Vec::with_capacity(count);
        for _ in 0..count {
            headers.push(EntryHeader::read(r)?);
        }
        Ok(Self {
            offsets,
            sizes,
            headers,
        })
    }

    pub fn write(&self, w: &mut dyn Write) -> Gm1Result<()> {
        for &o in &self.offsets {
            write_u32(w, o)?;
        }
        for &s in &self.sizes {
            write_u32(w, s)?;
        }
        for h in &self.headers {
            h.write(w)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Checks every `offset + size` against the blob size.
    pub fn validate(&self, data_size: u32) -> Gm1Result<()> {
        for (i, (&off, &size)) in self.offsets.iter().zip(&self.sizes).enumerate() {
            let end = off as u64 + size as u64;
            if end > data_size as u64 {
                return Err(Gm1Error::format(format!(
                    "entry {i} spans {off}..{end}, outside payload of {data_size} bytes"
                )));
            }
        }
        Ok(())
    }

    /// Byte range of entry `index` relative to the blob start.
    pub fn range(&self, index: usize) -> Gm1Result<std::ops::Range<usize>> {
        if index >= self.len() {
            return Err(Gm1Error::IndexOutOfRange {
                what: "entry",
                index,
                count: self.len(),
            });
        }
        let start = self.offsets[index] as usize;
        Ok(start..start + self.sizes[index] as usize)
    }
}
