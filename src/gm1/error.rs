#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Gm1Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("png: {0}")]
    Png(#[from] png::EncodingError),

    #[error("invalid gm1: {0}")]
    Format(String),

    #[error("overflow: {len} pixel(s) at x={x} row={row} exceed row width {width}")]
    Overflow {
        row: usize,
        x: usize,
        len: usize,
        width: usize,
    },

    #[error("{what} index {index} out of range (count {count})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },
}

impl Gm1Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Gm1Error::Format(msg.into())
    }

    /// Short reads are structural defects of the file, not I/O failures.
    pub(crate) fn short_read(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Gm1Error::Format("unexpected end of data".into())
        } else {
            Gm1Error::Io(e)
        }
    }
}

pub type Gm1Result<T> = Result<T, Gm1Error>;
