//! Byte-level primitives shared by the batch and WAL formats.
//!
//! Varints are little-endian base-128: 7 payload bits per byte, high bit set
//! on every byte except the last.
//!
//! ```text
//! 300 = 0b1_0010_1100  →  [0xAC, 0x02]
//!                           └ low 7 bits + continuation
//!                                 └ next 7 bits, terminator
//! ```

use crate::error::DecodeError;

/// Append `value` as a varint.
pub fn put_varint64(dst: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        dst.push((value as u8) | 0x80);
        value >>= 7;
    }
    dst.push(value as u8);
}

/// Append `value` as a varint. Same encoding as [`put_varint64`].
pub fn put_varint32(dst: &mut Vec<u8>, value: u32) {
    put_varint64(dst, u64::from(value));
}

/// Append a varint length followed by the bytes themselves.
pub fn put_length_prefixed_slice(dst: &mut Vec<u8>, data: &[u8]) {
    put_varint64(dst, data.len() as u64);
    dst.extend_from_slice(data);
}

pub fn put_fixed32(dst: &mut Vec<u8>, value: u32) {
    dst.extend_from_slice(&value.to_le_bytes());
}

pub fn put_fixed64(dst: &mut Vec<u8>, value: u64) {
    dst.extend_from_slice(&value.to_le_bytes());
}

/// Read a little-endian u32 from the first 4 bytes, if present.
pub fn decode_fixed32(src: &[u8]) -> Option<u32> {
    Some(u32::from_le_bytes(src.get(..4)?.try_into().ok()?))
}

/// Read a little-endian u64 from the first 8 bytes, if present.
pub fn decode_fixed64(src: &[u8]) -> Option<u64> {
    Some(u64::from_le_bytes(src.get(..8)?.try_into().ok()?))
}

/// Forward-only cursor over a borrowed buffer.
///
/// Positions are absolute, so errors point at the real offset in the
/// buffer. Reads that fail may have moved the cursor; callers work on a copy
/// and commit it only after a whole record decodes.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Cursor over `buf` starting at absolute offset `pos`.
    /// A `pos` past the end is clamped to the end.
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Reader {
            buf,
            pos: pos.min(buf.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or(DecodeError::ShortBuffer { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Decode a varint into a u64.
    ///
    /// There is no cap on the number of groups: decoding runs until a byte
    /// with the high bit clear or the end of input. Groups that would set
    /// bits above bit 63 make the value malformed, reported once the varint
    /// terminates.
    pub fn read_varint64(&mut self) -> Result<u64, DecodeError> {
        let start = self.pos;
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        let mut overflow = false;

        loop {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(DecodeError::ShortBuffer { offset: self.pos });
            };
            self.pos += 1;

            let payload = u64::from(byte & 0x7F);
            if shift < 64 {
                if shift == 63 && payload > 1 {
                    overflow = true;
                }
                value |= payload << shift;
            } else if payload != 0 {
                overflow = true;
            }

            if byte & 0x80 == 0 {
                break;
            }
            shift = shift.saturating_add(7);
        }

        if overflow {
            return Err(DecodeError::MalformedVarint { offset: start });
        }
        Ok(value)
    }

    /// Decode a varint that must fit in a u32.
    pub fn read_varint32(&mut self) -> Result<u32, DecodeError> {
        let start = self.pos;
        let value = self.read_varint64()?;
        u32::try_from(value).map_err(|_| DecodeError::MalformedVarint { offset: start })
    }

    /// Decode a varint length `l` and borrow the next `l` bytes.
    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_varint64()?;
        let start = self.pos;
        if len > self.remaining() as u64 {
            return Err(DecodeError::ShortBuffer { offset: start });
        }
        let end = start + len as usize;
        self.pos = end;
        Ok(&self.buf[start..end])
    }
}
