//! Length-prefixed record stream: every record is a big-endian `u32` byte count
//! followed by exactly that many bytes. No header, trailer, or checksum.

use std::io::Write;

use crate::error::{ConvertError, Result};

const PREFIX_LEN: usize = 4;

pub struct FrameWriter<W: Write> {
    inner: W,
    records: usize,
    bytes: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records: 0,
            bytes: 0,
        }
    }

    pub fn write_record(&mut self, record: &[u8]) -> std::io::Result<()> {
        let len = u32::try_from(record.len()).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("record of {} bytes does not fit a u32 length", record.len()),
            )
        })?;
        self.inner.write_all(&len.to_be_bytes())?;
        self.inner.write_all(record)?;
        self.records += 1;
        self.bytes += (PREFIX_LEN + record.len()) as u64;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Iterates the records of an in-memory stream. Stops after the first error.
pub struct FrameReader<'a> {
    buf: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            failed: false,
        }
    }

    fn truncated(&mut self, needed: usize) -> ConvertError {
        self.failed = true;
        ConvertError::Truncated {
            offset: self.offset as u64,
            needed: needed as u64,
            available: (self.buf.len() - self.offset) as u64,
        }
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset == self.buf.len() {
            return None;
        }
        let rest = &self.buf[self.offset..];
        if rest.len() < PREFIX_LEN {
            return Some(Err(self.truncated(PREFIX_LEN)));
        }
        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let needed = PREFIX_LEN + len;
        if rest.len() < needed {
            return Some(Err(self.truncated(needed)));
        }
        let record = &self.buf[self.offset + PREFIX_LEN..self.offset + needed];
        self.offset += needed;
        Some(Ok(record))
    }
}
