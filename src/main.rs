#![forbid(unsafe_code)]

mod ui;

use clap::{Parser, Subcommand};
use gm1tool::gm1::{self as archive, CacheMode};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gm1tool", version, about = "GM1 sprite archive inspector and exporter")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive wizard for exporting an entry (terminal).
    Ui,

    /// Print the archive header.
    Info {
        #[arg(long)]
        gm1: PathBuf,
    },

    /// List entry headers.
    List {
        #[arg(long)]
        gm1: PathBuf,
        /// Print payload offsets, sizes and hashes too.
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },

    /// Dump one of the ten palettes.
    Palette {
        #[arg(long)]
        gm1: PathBuf,
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Write the raw 512-byte palette here instead of printing it.
        #[arg(long)]
        binary: Option<PathBuf>,
    },

    /// Render one entry to a .png or .tgx file.
    Export {
        #[arg(long)]
        gm1: PathBuf,
        #[arg(long)]
        entry: usize,
        #[arg(long)]
        output: PathBuf,
        /// Palette for 8-bit archives.
        #[arg(long, default_value_t = 0)]
        palette: usize,
        /// Read the whole payload up front.
        #[arg(long, default_value_t = false)]
        cached: bool,
    },

    /// Render every entry to PNG files in a directory.
    Extract {
        #[arg(long)]
        gm1: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 0)]
        palette: usize,
        #[arg(long, default_value_t = false)]
        cached: bool,
    },

    /// Decode every entry of an archive, or of every .gm1 under a directory.
    Verify {
        #[arg(long)]
        input: PathBuf,
    },
}

fn cache_mode(cached: bool) -> CacheMode {
    if cached {
        CacheMode::Cached
    } else {
        CacheMode::OnDemand
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let res = match cli.cmd {
        Command::Ui => ui::run(),
        Command::Info { gm1 } => archive::info(&gm1),
        Command::List { gm1, verbose } => archive::list(&gm1, verbose),
        Command::Palette { gm1, index, binary } => archive::palette(&gm1, index, binary.as_deref()),
        Command::Export {
            gm1,
            entry,
            output,
            palette,
            cached,
        } => archive::export(&gm1, entry, &output, palette, cache_mode(cached)),
        Command::Extract {
            gm1,
            output,
            palette,
            cached,
        } => archive::extract(&gm1, &output, palette, cache_mode(cached)),
        Command::Verify { input } => archive::verify(&input),
    };

    if let Err(e) = res {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
