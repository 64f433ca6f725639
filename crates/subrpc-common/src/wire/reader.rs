use super::{DecodeError, FieldKey};

/// Forward-only reader over a byte slice.
///
/// All reads advance an internal cursor; running off the end of the input
/// fails with [`DecodeError::Truncated`]. Borrowed reads hand out sub-slices
/// of the original input, so decoded views stay valid for its lifetime.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        if self.is_empty() {
            return Err(DecodeError::Truncated { needed: 1, remaining: 0 });
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Borrows the next `len` bytes of input.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::Truncated { needed: len, remaining: self.remaining() });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    /// Reads a base-128 varint of at most ten groups.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.read_byte()?;
            // The tenth group may only carry the top bit of a u64.
            if shift == 63 && byte & 0xfe != 0 {
                return Err(DecodeError::VarintOverflow);
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::VarintOverflow)
    }

    /// Reads a length prefix, bounding it by the bytes actually remaining.
    pub fn read_len(&mut self) -> Result<usize, DecodeError> {
        let declared = self.read_varint()?;
        if declared > self.remaining() as u64 {
            return Err(DecodeError::Truncated {
                needed: usize::try_from(declared).unwrap_or(usize::MAX),
                remaining: self.remaining(),
            });
        }
        Ok(declared as usize)
    }

    /// Reads the next field key, or `None` at a clean end of input.
    ///
    /// Field numbers past the 32-bit tag space cannot belong to any schema
    /// and are rejected as unknown, never truncated onto a valid tag.
    pub fn read_key(&mut self) -> Result<Option<FieldKey>, DecodeError> {
        if self.is_empty() {
            return Ok(None);
        }
        let key = self.read_varint()?;
        let number = key >> 3;
        if number > u64::from(u32::MAX) {
            return Err(DecodeError::UnknownField { tag: number });
        }
        Ok(Some(FieldKey {
            number: number as u32,
            wire_type: (key & 0x7) as u8,
        }))
    }
}
