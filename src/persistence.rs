//! Raw, native-endian binary I/O helpers shared by [`crate::bm25`] and
//! [`crate::vector`].
//!
//! The on-disk layout spec.md §6 mandates is host byte order and the
//! platform's native-width `usize` — tightly packed, no framing, no
//! compression. This is not a format a generic serializer like `bincode`
//! produces (it adds its own varint/length conventions), so the fields are
//! written and read one at a time with `to_ne_bytes`/`from_ne_bytes`,
//! mirroring `original_source/src/cpp/BM25Index.cpp`'s raw
//! `ofstream::write`/`ifstream::read` calls.

use std::io::{self, Read, Write};

pub fn write_usize<W: Write>(w: &mut W, v: usize) -> io::Result<()> {
    w.write_all(&v.to_ne_bytes())
}

pub fn read_usize<R: Read>(r: &mut R) -> io::Result<usize> {
    let mut buf = [0u8; std::mem::size_of::<usize>()];
    r.read_exact(&mut buf)?;
    Ok(usize::from_ne_bytes(buf))
}

pub fn write_i32<W: Write>(w: &mut W, v: i32) -> io::Result<()> {
    w.write_all(&v.to_ne_bytes())
}

pub fn read_i32<R: Read>(r: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_ne_bytes(buf))
}

pub fn write_f64<W: Write>(w: &mut W, v: f64) -> io::Result<()> {
    w.write_all(&v.to_ne_bytes())
}

pub fn read_f64<R: Read>(r: &mut R) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_ne_bytes(buf))
}

pub fn write_f32_slice<W: Write>(w: &mut W, v: &[f32]) -> io::Result<()> {
    for x in v {
        w.write_all(&x.to_ne_bytes())?;
    }
    Ok(())
}

pub fn read_f32_vec<R: Read>(r: &mut R, len: usize) -> io::Result<Vec<f32>> {
    let mut out = Vec::with_capacity(len);
    let mut buf = [0u8; 4];
    for _ in 0..len {
        r.read_exact(&mut buf)?;
        out.push(f32::from_ne_bytes(buf));
    }
    Ok(out)
}

/// Length-prefixed (native `usize`) UTF-8 bytes.
pub fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    write_usize(w, s.len())?;
    w.write_all(s.as_bytes())
}

pub fn read_string<R: Read>(r: &mut R) -> io::Result<String> {
    let len = read_usize(r)?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_scalars() {
        let mut buf = Vec::new();
        write_usize(&mut buf, 42).unwrap();
        write_i32(&mut buf, -7).unwrap();
        write_f64(&mut buf, 3.5).unwrap();

        let mut cur = Cursor::new(buf);
        assert_eq!(read_usize(&mut cur).unwrap(), 42);
        assert_eq!(read_i32(&mut cur).unwrap(), -7);
        assert_eq!(read_f64(&mut cur).unwrap(), 3.5);
    }

    #[test]
    fn round_trips_string() {
        let mut buf = Vec::new();
        write_string(&mut buf, "hello world").unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), "hello world");
    }

    #[test]
    fn round_trips_f32_slice() {
        let vals = vec![1.0f32, -2.5, 0.0, 100.25];
        let mut buf = Vec::new();
        write_f32_slice(&mut buf, &vals).unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_f32_vec(&mut cur, vals.len()).unwrap(), vals);
    }
}
