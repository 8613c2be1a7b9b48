#![forbid(unsafe_code)]

use gm1tool::gm1::{self as archive, CacheMode, Gm1Error, Gm1Reader, Gm1Result, PixelFormat};
use inquire::{Confirm, CustomType, Text};
use std::path::{Path, PathBuf};

fn prompt_err(e: inquire::InquireError) -> Gm1Error {
    Gm1Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}

fn validate_gm1(p: &Path) -> Gm1Result<()> {
    if !p.is_file() {
        return Err(Gm1Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", p.display()),
        )));
    }
    Ok(())
}

fn default_output(gm1: &Path, entry: usize) -> String {
    let stem = gm1
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "entry".to_string());
    format!("./{stem}_{entry:05}.png")
}

pub fn run() -> Gm1Result<()> {
    println!("GM1 Export Wizard\n");

    let gm1 = Text::new("Archive (.gm1)")
        .prompt()
        .map(PathBuf::from)
        .map_err(prompt_err)?;
    validate_gm1(&gm1)?;

    let reader = Gm1Reader::open_path(&gm1, CacheMode::OnDemand)?;
    let count = reader.entry_count();
    println!(
        "{}: {} entries, {}",
        gm1.display(),
        count,
        reader.encoding().name()
    );
    if count == 0 {
        return Ok(());
    }

    let entry = CustomType::<usize>::new("Entry index")
        .with_default(0)
        .with_help_message(&format!("0..{count}"))
        .prompt()
        .map_err(prompt_err)?;

    let palette = match reader.entry_geometry(entry)?.format {
        PixelFormat::Indexed8 => CustomType::<usize>::new("Palette (0..10)")
            .with_default(0)
            .prompt()
            .map_err(prompt_err)?,
        PixelFormat::Argb1555 => 0,
    };
    drop(reader);

    let output = Text::new("Output file (.png or .tgx)")
        .with_default(&default_output(&gm1, entry))
        .prompt()
        .map(PathBuf::from)
        .map_err(prompt_err)?;

    println!("\nExport summary:");
    println!("  archive : {}", gm1.display());
    println!("  entry   : {entry}");
    println!("  output  : {}", output.display());

    let proceed = Confirm::new("Proceed?")
        .with_default(true)
        .prompt()
        .map_err(prompt_err)?;
    if !proceed {
        return Ok(());
    }

    archive::export(&gm1, entry, &output, palette, CacheMode::OnDemand)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_uses_archive_stem() {
        assert_eq!(default_output(Path::new("/x/tile_land8.gm1"), 7), "./tile_land8_00007.png");
    }
}
