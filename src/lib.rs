#![forbid(unsafe_code)]

//! Reader and writer for GM1 sprite archives and the TGX run-length codec.
//!
//! ```no_run
//! use gm1tool::gm1::{CacheMode, Gm1Reader};
//!
//! let mut archive = Gm1Reader::open_path("tile_land8.gm1".as_ref(), CacheMode::OnDemand)?;
//! let image = archive.read_entry(0)?;
//! println!("{}x{} at {} bpp", image.width(), image.height(), image.depth());
//! # Ok::<(), gm1tool::gm1::Gm1Error>(())
//! ```

pub mod gm1;
