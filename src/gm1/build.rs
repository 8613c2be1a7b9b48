#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::header::ArchiveHeader;
use crate::gm1::image::DecodedImage;
use crate::gm1::index::{EntryHeader, EntryIndex};
use crate::gm1::palette::PaletteTable;
use crate::gm1::variant::EntryKind;

/// GM1 layout:
/// - [header 88]        22 × u32
/// - [palettes 5120]    10 × 256 × u16 RGB555
/// - [offsets]          image_count × u32, relative to the payload blob
/// - [sizes]            image_count × u32
/// - [entry headers]    image_count × 16
/// - [payload blob]     data_size bytes
///
/// Payloads are laid out back to back in push order. `image_count` and
/// `data_size` are recomputed; every other header field is written as given.
#[derive(Debug, Clone)]
pub struct Gm1Builder {
    header: ArchiveHeader,
    palettes: PaletteTable,
    entries: Vec<(EntryHeader, Vec<u8>)>,
}

impl Gm1Builder {
    pub fn new(header: ArchiveHeader) -> Self {
        Self {
            header,
            palettes: PaletteTable::default(),
            entries: Vec::new(),
        }
    }

    pub fn with_palettes(mut self, palettes: PaletteTable) -> Self {
        self.palettes = palettes;
        self
    }

    /// Adds an entry whose payload is already encoded.
    pub fn push_raw(&mut self, header: EntryHeader, payload: Vec<u8>) {
        self.entries.push((header, payload));
    }

    /// Encodes `image` with the archive's variant and adds it.
    pub fn push_image(&mut self, header: EntryHeader, image: &DecodedImage) -> Gm1Result<()> {
        let kind = EntryKind::from_encoding(self.header.encoding())?;
        let payload = kind.encode(&header, image)?;
        self.entries.push((header, payload));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the archive and returns the header as written.
    pub fn write(&self, w: &mut dyn Write) -> Gm1Result<ArchiveHeader> {
        write_archive(w, &self.header, &self.palettes, &self.entries)
    }

    pub fn to_bytes(&self) -> Gm1Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    pub fn write_path(&self, path: &Path) -> Gm1Result<ArchiveHeader> {
        let mut out = BufWriter::new(File::create(path)?);
        let header = self.write(&mut out)?;
        out.flush()?;
        Ok(header)
    }
}

pub fn write_archive(
    w: &mut dyn Write,
    header: &ArchiveHeader,
    palettes: &PaletteTable,
    entries: &[(EntryHeader, Vec<u8>)],
) -> Gm1Result<ArchiveHeader> {
    let too_big = || Gm1Error::format("archive payload exceeds 4 GiB");

    let mut index = EntryIndex::default();
    let mut offset: u32 = 0;
    for (eh, payload) in entries {
        let size = u32::try_from(payload.len()).map_err(|_| too_big())?;
        index.offsets.push(offset);
        index.sizes.push(size);
        index.headers.push(*eh);
        offset = offset.checked_add(size).ok_or_else(too_big)?;
    }

    let mut header = *header;
    header.image_count = u32::try_from(entries.len()).map_err(|_| too_big())?;
    header.data_size = offset;

    header.write(w)?;
    palettes.write(w)?;
    index.write(w)?;
    for (_, payload) in entries {
        w.write_all(payload)?;
    }

    debug!(images = header.image_count, data_size = header.data_size, "wrote gm1");
    Ok(header)
}
