#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::format::{Encoding, HEADER_SIZE};
use crate::gm1::header::ArchiveHeader;
use crate::gm1::image::DecodedImage;
use crate::gm1::index::{EntryHeader, EntryIndex};
use crate::gm1::io::read_vec;
use crate::gm1::palette::{Palette, PaletteTable};
use crate::gm1::variant::{EntryKind, Geometry};

/// How entry payload bytes are pulled from the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Fetch each entry on first access and keep it.
    #[default]
    OnDemand,
    /// Read the whole payload blob while opening.
    Cached,
}

#[derive(Debug)]
enum Payload {
    Blob(Vec<u8>),
    Entries(Vec<Option<Vec<u8>>>),
}

/// An open GM1 archive.
///
/// Owns its byte source. Header, palettes and index are parsed up front;
/// images are decoded per call and handed to the caller.
#[derive(Debug)]
pub struct Gm1Reader<R> {
    source: R,
    header: ArchiveHeader,
    palettes: PaletteTable,
    index: EntryIndex,
    kind: EntryKind,
    data_offset: u64,
    payload: Payload,
}

impl Gm1Reader<BufReader<File>> {
    pub fn open_path(path: &Path, mode: CacheMode) -> Gm1Result<Self> {
        let f = File::open(path)?;
        Self::open(BufReader::new(f), mode)
    }
}

impl<R: Read + Seek> Gm1Reader<R> {
    /// Parses header, palettes and entry index.
    ///
    /// The source length is checked against the preamble implied by
    /// `image_count` before anything is sized from it.
    pub fn open(mut source: R, mode: CacheMode) -> Gm1Result<Self> {
        let file_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        if file_len < HEADER_SIZE as u64 {
            return Err(Gm1Error::format(format!(
                "file of {file_len} bytes is smaller than the {HEADER_SIZE}-byte header"
            )));
        }
        let header = ArchiveHeader::read(&mut source)?;

        let preamble = header.preamble_size();
        if file_len < preamble {
            return Err(Gm1Error::format(format!(
                "file of {file_len} bytes is smaller than the {preamble}-byte preamble for {} images",
                header.image_count
            )));
        }

        let kind = EntryKind::from_encoding(header.encoding())
            .map_err(|_| Gm1Error::format(format!("unknown data class {}", header.data_class)))?;

        let palettes = PaletteTable::read(&mut source)?;
        let index = EntryIndex::read(&mut source, header.image_count as usize)?;
        index.validate(header.data_size)?;

        let data_end = preamble + header.data_size as u64;
        if file_len < data_end {
            return Err(Gm1Error::format(format!(
                "payload ends at {data_end} but file is {file_len} bytes"
            )));
        }

        let payload = match mode {
            CacheMode::Cached => Payload::Blob(read_vec(&mut source, header.data_size as usize)?),
            CacheMode::OnDemand => Payload::Entries(vec![None; index.len()]),
        };

        debug!(
            images = header.image_count,
            data_class = header.data_class,
            kind = ?kind,
            ?mode,
            "opened gm1"
        );

        Ok(Self {
            source,
            header,
            palettes,
            index,
            kind,
            data_offset: preamble,
            payload,
        })
    }

    /// Raw payload of entry `index`, fetched through the cache.
    pub fn entry_bytes(&mut self, index: usize) -> Gm1Result<&[u8]> {
        let range = self.index.range(index)?;
        match &mut self.payload {
            Payload::Blob(blob) => Ok(&blob[range]),
            Payload::Entries(cache) => {
                if cache[index].is_none() {
                    debug!(index, offset = range.start, size = range.len(), "fetching entry");
                    self.source
                        .seek(SeekFrom::Start(self.data_offset + range.start as u64))?;
                    cache[index] = Some(read_vec(&mut self.source, range.len())?);
                }
                Ok(cache[index].as_deref().unwrap_or_default())
            }
        }
    }

    /// Decodes entry `index`. A failure here leaves the reader usable.
    pub fn read_entry(&mut self, index: usize) -> Gm1Result<DecodedImage> {
        let kind = self.kind;
        let header = *self.entry_header(index)?;
        let bytes = self.entry_bytes(index)?;
        kind.decode(&header, bytes)
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R> Gm1Reader<R> {
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn encoding(&self) -> Encoding {
        self.header.encoding()
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn palettes(&self) -> &PaletteTable {
        &self.palettes
    }

    pub fn palette(&self, index: usize) -> Gm1Result<&Palette> {
        self.palettes.get(index)
    }

    pub fn index(&self) -> &EntryIndex {
        &self.index
    }

    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    pub fn entry_header(&self, index: usize) -> Gm1Result<&EntryHeader> {
        self.index.headers.get(index).ok_or(Gm1Error::IndexOutOfRange {
            what: "entry",
            index,
            count: self.index.len(),
        })
    }

    pub fn entry_geometry(&self, index: usize) -> Gm1Result<Geometry> {
        self.kind.geometry(self.entry_header(index)?)
    }

    pub fn cache_mode(&self) -> CacheMode {
        match self.payload {
            Payload::Blob(_) => CacheMode::Cached,
            Payload::Entries(_) => CacheMode::OnDemand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gm1::build::Gm1Builder;
    use crate::gm1::format::{COLOR_KEY_16, PALETTE_COUNT, PALETTE_SIZE};
    use std::io::Cursor;

    /// Counts reads so tests can see when the source is touched.
    #[derive(Debug)]
    struct Counting {
        inner: Cursor<Vec<u8>>,
        reads: usize,
    }

    impl Read for Counting {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            self.inner.read(buf)
        }
    }

    impl Seek for Counting {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    fn header(data_class: u32) -> ArchiveHeader {
        ArchiveHeader {
            data_class,
            ..Default::default()
        }
    }

    /// Two 4x2 TGX16 entries: a repeat-filled one and a broken one.
    fn two_entry_archive() -> Vec<u8> {
        let mut b = Gm1Builder::new(header(1));
        let row = [0x83, 0x34, 0x12, 0x40];
        let eh = EntryHeader {
            width: 4,
            height: 2,
            ..Default::default()
        };
        b.push_raw(eh, [row, row].concat());
        b.push_raw(eh, vec![0x87, 0x00, 0x00]);
        b.to_bytes().unwrap()
    }

    #[test]
    fn reads_repeat_entry() {
        for mode in [CacheMode::OnDemand, CacheMode::Cached] {
            let mut r = Gm1Reader::open(Cursor::new(two_entry_archive()), mode).unwrap();
            assert_eq!(r.cache_mode(), mode);
            assert_eq!(r.entry_count(), 2);
            let img = r.read_entry(0).unwrap();
            assert_eq!((img.width(), img.height(), img.depth()), (4, 2, 16));
            assert!(img.row_values(0).iter().chain(&img.row_values(1)).all(|&p| p == 0x1234));
            assert!(matches!(
                r.read_entry(2),
                Err(Gm1Error::IndexOutOfRange { index: 2, count: 2, .. })
            ));
        }
    }

    #[test]
    fn failed_entry_leaves_reader_usable() {
        let mut r = Gm1Reader::open(Cursor::new(two_entry_archive()), CacheMode::OnDemand).unwrap();
        assert!(matches!(r.read_entry(1), Err(Gm1Error::Overflow { .. })));
        assert_eq!(r.read_entry(0).unwrap().pixel(3, 1), Some(0x1234));
        assert!(r.read_entry(1).is_err());
    }

    #[test]
    fn on_demand_fetches_each_entry_once() {
        let src = Counting {
            inner: Cursor::new(two_entry_archive()),
            reads: 0,
        };
        let mut r = Gm1Reader::open(src, CacheMode::OnDemand).unwrap();
        let after_open = r.source.reads;
        r.read_entry(0).unwrap();
        let after_first = r.source.reads;
        assert!(after_first > after_open);
        r.read_entry(0).unwrap();
        r.entry_bytes(0).unwrap();
        assert_eq!(r.source.reads, after_first);
    }

    #[test]
    fn cached_mode_does_not_touch_source_after_open() {
        let src = Counting {
            inner: Cursor::new(two_entry_archive()),
            reads: 0,
        };
        let mut r = Gm1Reader::open(src, CacheMode::Cached).unwrap();
        let after_open = r.source.reads;
        r.read_entry(0).unwrap();
        assert_eq!(r.source.reads, after_open);
    }

    #[test]
    fn short_preamble_fails_without_further_reads() {
        let mut h = header(1);
        h.image_count = 1_000_000;
        let mut raw = Vec::new();
        h.write(&mut raw).unwrap();
        raw.extend_from_slice(&[0u8; PALETTE_COUNT * PALETTE_SIZE]);

        let mut src = Counting {
            inner: Cursor::new(raw),
            reads: 0,
        };
        let err = Gm1Reader::open(&mut src, CacheMode::Cached).unwrap_err();
        assert!(matches!(err, Gm1Error::Format(_)), "{err}");
        assert_eq!(src.inner.position(), HEADER_SIZE as u64);
    }

    #[test]
    fn unknown_data_class_fails_at_open() {
        let mut raw = Vec::new();
        header(9).write(&mut raw).unwrap();
        raw.extend_from_slice(&[0u8; PALETTE_COUNT * PALETTE_SIZE]);
        let err = Gm1Reader::open(Cursor::new(raw), CacheMode::OnDemand).unwrap_err();
        assert!(matches!(err, Gm1Error::Format(ref m) if m.contains("data class")), "{err}");
    }

    #[test]
    fn entry_outside_payload_fails_at_open() {
        let mut bytes = two_entry_archive();
        // Second offset lives right after the first, at 88 + 5120 + 4.
        let at = HEADER_SIZE + PALETTE_COUNT * PALETTE_SIZE + 4;
        bytes[at..at + 4].copy_from_slice(&1000u32.to_le_bytes());
        let err = Gm1Reader::open(Cursor::new(bytes), CacheMode::OnDemand).unwrap_err();
        assert!(matches!(err, Gm1Error::Format(_)), "{err}");
    }

    #[test]
    fn truncated_payload_fails_at_open() {
        let mut bytes = two_entry_archive();
        bytes.pop();
        let err = Gm1Reader::open(Cursor::new(bytes), CacheMode::OnDemand).unwrap_err();
        assert!(matches!(err, Gm1Error::Format(_)), "{err}");
    }

    #[test]
    fn geometry_is_exposed_per_entry() {
        let r = Gm1Reader::open(Cursor::new(two_entry_archive()), CacheMode::OnDemand).unwrap();
        let g = r.entry_geometry(0).unwrap();
        assert_eq!((g.width, g.height, g.color_key()), (4, 2, COLOR_KEY_16));
        assert!(r.entry_geometry(5).is_err());
    }
}
