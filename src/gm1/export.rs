#![forbid(unsafe_code)]

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::gm1::error::{Gm1Error, Gm1Result};
use crate::gm1::image::DecodedImage;
use crate::gm1::palette::Palette;
use crate::gm1::tgx::write_tgx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Tgx,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Gm1Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(ExportFormat::Png),
            "tgx" => Ok(ExportFormat::Tgx),
            _ => Err(Gm1Error::format(format!(
                "cannot export to {}: use a .png or .tgx extension",
                path.display()
            ))),
        }
    }
}

/// Writes `image` to `path`, picking the format from the extension.
pub fn export_image(path: &Path, image: &DecodedImage, palette: Option<&Palette>) -> Gm1Result<()> {
    match ExportFormat::from_path(path)? {
        ExportFormat::Png => write_png(path, image, palette),
        ExportFormat::Tgx => {
            let mut w = BufWriter::new(File::create(path)?);
            write_tgx(&mut w, image)?;
            std::io::Write::flush(&mut w)?;
            Ok(())
        }
    }
}

pub fn write_png(path: &Path, image: &DecodedImage, palette: Option<&Palette>) -> Gm1Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Gm1Error::format("cannot write an empty image as png"));
    }
    let rgba = image.to_rgba8(palette)?;

    let file = File::create(path)?;
    let w = BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, image.width() as u32, image.height() as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba)?;
    writer.finish()?;
    Ok(())
}
