#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::export::export_image;
use crate::gm1::format::{PixelFormat, PALETTE_COUNT};
use crate::gm1::header::FIELD_NAMES;
use crate::gm1::io::hex32;
use crate::gm1::palette::rgb555_to_rgba;
use crate::gm1::read::{CacheMode, Gm1Reader};

pub fn info(gm1: &Path) -> Gm1Result<()> {
    let r = Gm1Reader::open_path(gm1, CacheMode::OnDemand)?;
    let h = r.header();
    for (name, value) in FIELD_NAMES.iter().zip(h.fields()) {
        println!("{name:>14} = {value}");
    }
    println!("{:>14} = {}", "encoding", r.encoding().name());
    println!("{:>14} = {}", "preamble", h.preamble_size());
    Ok(())
}

pub fn list(gm1: &Path, verbose: bool) -> Gm1Result<()> {
    let mut r = Gm1Reader::open_path(gm1, CacheMode::OnDemand)?;
    for i in 0..r.entry_count() {
        let e = *r.entry_header(i)?;
        print!(
            "{i:5}  {}x{}  pos=({}, {}) group={}/{} tile_y={} orient={} box={}+{} flags={:#04x}",
            e.width,
            e.height,
            e.pos_x,
            e.pos_y,
            e.group,
            e.group_size,
            e.tile_y,
            e.tile_orient,
            e.h_offset,
            e.box_width,
            e.flags
        );
        if verbose {
            let off = r.index().offsets[i];
            let hash: [u8; 32] = blake3::hash(r.entry_bytes(i)?).into();
            print!("  off={off} len={} hash={}", r.index().sizes[i], hex32(&hash));
        }
        println!();
    }
    Ok(())
}

pub fn palette(gm1: &Path, index: usize, binary: Option<&Path>) -> Gm1Result<()> {
    let r = Gm1Reader::open_path(gm1, CacheMode::OnDemand)?;
    let p = r.palette(index)?;

    if let Some(out) = binary {
        let mut f = File::create(out)?;
        p.write(&mut f)?;
        f.flush()?;
        println!("wrote palette {index} to {}", out.display());
        return Ok(());
    }

    for (i, &c) in p.colors().iter().enumerate() {
        let [red, green, blue, _] = rgb555_to_rgba(c);
        println!("{i:3}  {c:#06x}  #{red:02x}{green:02x}{blue:02x}");
    }
    Ok(())
}

pub fn export(
    gm1: &Path,
    entry: usize,
    output: &Path,
    palette: usize,
    mode: CacheMode,
) -> Gm1Result<()> {
    let mut r = Gm1Reader::open_path(gm1, mode)?;
    let image = r.read_entry(entry)?;
    let pal = match image.format() {
        PixelFormat::Indexed8 => Some(r.palette(palette)?),
        PixelFormat::Argb1555 => None,
    };
    export_image(output, &image, pal)?;
    info!(entry, output = %output.display(), "exported");
    Ok(())
}

/// Renders every entry to `output/NNNNN.png`.
pub fn extract(gm1: &Path, output: &Path, palette: usize, mode: CacheMode) -> Gm1Result<()> {
    if palette >= PALETTE_COUNT {
        return Err(Gm1Error::IndexOutOfRange {
            what: "palette",
            index: palette,
            count: PALETTE_COUNT,
        });
    }
    let mut r = Gm1Reader::open_path(gm1, mode)?;
    std::fs::create_dir_all(output)?;

    let mut written = 0;
    for i in 0..r.entry_count() {
        let image = match r.read_entry(i) {
            Ok(img) => img,
            Err(e) => {
                warn!(entry = i, "skipping: {e}");
                continue;
            }
        };
        if image.width() == 0 || image.height() == 0 {
            continue;
        }
        let pal = match image.format() {
            PixelFormat::Indexed8 => Some(r.palette(palette)?),
            PixelFormat::Argb1555 => None,
        };
        export_image(&output.join(format!("{i:05}.png")), &image, pal)?;
        written += 1;
    }

    println!("extracted {written} of {} entries", r.entry_count());
    Ok(())
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub entries: usize,
    pub failures: Vec<(usize, String)>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Opens `gm1` and decodes every entry.
pub fn verify_archive(gm1: &Path) -> Gm1Result<VerifyReport> {
    let mut r = Gm1Reader::open_path(gm1, CacheMode::Cached)?;
    let mut report = VerifyReport {
        entries: r.entry_count(),
        failures: Vec::new(),
    };
    for i in 0..r.entry_count() {
        if let Err(e) = r.read_entry(i) {
            report.failures.push((i, e.to_string()));
        }
    }
    Ok(report)
}

fn is_gm1(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gm1"))
}

/// Verifies one archive, or every `.gm1` under a directory.
pub fn verify(input: &Path) -> Gm1Result<()> {
    let mut files = Vec::new();
    if input.is_dir() {
        for ent in WalkDir::new(input).follow_links(false).sort_by_file_name() {
            let ent = ent.map_err(|e| {
                let msg = e.to_string();
                e.into_io_error()
                    .map(Gm1Error::Io)
                    .unwrap_or_else(|| Gm1Error::format(msg))
            })?;
            if ent.file_type().is_file() && is_gm1(ent.path()) {
                files.push(ent.into_path());
            }
        }
    } else {
        files.push(input.to_path_buf());
    }

    let mut bad = 0;
    for path in &files {
        match verify_archive(path) {
            Ok(report) if report.is_ok() => {
                println!("ok: {} ({} entries)", path.display(), report.entries);
            }
            Ok(report) => {
                bad += 1;
                for (i, e) in &report.failures {
                    println!("FAIL: {}: entry {i}: {e}", path.display());
                }
            }
            Err(e) => {
                bad += 1;
                println!("FAIL: {}: {e}", path.display());
            }
        }
    }

    if files.is_empty() {
        warn!(input = %input.display(), "no .gm1 files found");
    }
    if bad > 0 {
        return Err(Gm1Error::format(format!("{bad} of {} archives failed", files.len())));
    }
    Ok(())
}
