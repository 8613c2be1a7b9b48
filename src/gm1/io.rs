#![forbid(unsafe_code)]

use std::io::{Read, Write};

use crate::gm1::error::{Gm1Error, Gm1Result};

pub fn write_u8(w: &mut dyn Write, v: u8) -> Gm1Result<()> {
    w.write_all(&[v])?;
    Ok(())
}

pub fn write_u16(w: &mut dyn Write, v: u16) -> Gm1Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_i16(w: &mut dyn Write, v: i16) -> Gm1Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_u32(w: &mut dyn Write, v: u32) -> Gm1Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn read_exact<const N: usize>(r: &mut dyn Read) -> Gm1Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(Gm1Error::short_read)?;
    Ok(buf)
}

pub fn read_u8(r: &mut dyn Read) -> Gm1Result<u8> {
    Ok(read_exact::<1>(r)?[0])
}

pub fn read_u16(r: &mut dyn Read) -> Gm1Result<u16> {
    Ok(u16::from_le_bytes(read_exact::<2>(r)?))
}

pub fn read_i16(r: &mut dyn Read) -> Gm1Result<i16> {
    Ok(i16::from_le_bytes(read_exact::<2>(r)?))
}

pub fn read_u32(r: &mut dyn Read) -> Gm1Result<u32> {
    Ok(u32::from_le_bytes(read_exact::<4>(r)?))
}

/// Reads `len` bytes into a fresh buffer. Callers must bound `len` first.
pub fn read_vec(r: &mut dyn Read, len: usize) -> Gm1Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).map_err(Gm1Error::short_read)?;
    Ok(buf)
}

pub fn hex32(v: &[u8; 32]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(64);
    for b in v.iter().copied() {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
    out
}
