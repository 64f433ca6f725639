use super::{EncodeError, WireType, key};

/// Forward-only writer over a caller-provided buffer.
///
/// Bytes land directly in the destination slice and [`bytes_written`] tracks
/// the high-water mark. A write that would overrun the buffer fails with
/// [`EncodeError::BufferTooSmall`] and leaves the already-written prefix
/// untouched; callers must treat the whole encode as failed at that point.
///
/// [`bytes_written`]: WireWriter::bytes_written
pub struct WireWriter<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> WireWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, written: 0 }
    }

    /// Bytes committed so far.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), EncodeError> {
        if self.written == self.buf.len() {
            return Err(EncodeError::BufferTooSmall {
                needed: self.written + 1,
                capacity: self.buf.len(),
            });
        }
        self.buf[self.written] = byte;
        self.written += 1;
        Ok(())
    }

    /// Copies `bytes` verbatim into the buffer.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        let end = self.written + bytes.len();
        if end > self.buf.len() {
            return Err(EncodeError::BufferTooSmall {
                needed: end,
                capacity: self.buf.len(),
            });
        }
        self.buf[self.written..end].copy_from_slice(bytes);
        self.written = end;
        Ok(())
    }

    /// Writes `value` as a base-128 varint, least-significant group first.
    pub fn write_varint(&mut self, mut value: u64) -> Result<(), EncodeError> {
        loop {
            let group = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                return self.write_byte(group);
            }
            self.write_byte(group | 0x80)?;
        }
    }

    /// Writes a field key: the tag number shifted over the wire type.
    pub fn write_key(&mut self, number: u32, wire_type: WireType) -> Result<(), EncodeError> {
        self.write_varint(u64::from(key(number, wire_type)))
    }
}
