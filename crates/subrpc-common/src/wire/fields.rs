//! Pluggable handling of variable-length byte fields.
//!
//! The envelope schema knows *where* byte strings sit inside a message; a
//! [`ByteFieldCodec`] decides *how* their bytes are produced on encode and
//! stored on decode. The default strategy, [`OwnedBytes`], copies into owned
//! buffers, which is what the RPC client uses. Alternative strategies can
//! stream from or into foreign storage without touching the schema.

use super::{DecodeError, EncodeError, WireReader, WireType, WireWriter};

/// Static identity of a variable-length field, handed to the byte codec so
/// implementations can specialize per field or report precise errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Message the field belongs to.
    pub message: &'static str,
    /// Field name inside the message.
    pub field: &'static str,
    /// Wire tag number.
    pub number: u32,
}

/// Strategy for moving byte-string fields through the envelope codec.
pub trait ByteFieldCodec {
    /// Writes `value` as a length-delimited field: key, varint length, then
    /// the raw bytes. Fails if the destination buffer is exhausted.
    fn encode_bytes(
        &self,
        writer: &mut WireWriter<'_>,
        field: &FieldDescriptor,
        value: &[u8],
    ) -> Result<(), EncodeError>;

    /// Reads exactly `len` bytes of a length-delimited field. Ownership of
    /// the returned buffer moves to the caller; a zero `len` yields an empty
    /// buffer, not an error. Fails if fewer than `len` bytes remain.
    fn decode_bytes(
        &self,
        reader: &mut WireReader<'_>,
        field: &FieldDescriptor,
        len: usize,
    ) -> Result<Vec<u8>, DecodeError>;
}

/// Default strategy: raw bytes on the wire, owned `Vec<u8>` off it.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnedBytes;

impl ByteFieldCodec for OwnedBytes {
    fn encode_bytes(
        &self,
        writer: &mut WireWriter<'_>,
        field: &FieldDescriptor,
        value: &[u8],
    ) -> Result<(), EncodeError> {
        writer.write_key(field.number, WireType::LengthDelimited)?;
        writer.write_varint(value.len() as u64)?;
        writer.write_raw(value)
    }

    fn decode_bytes(
        &self,
        reader: &mut WireReader<'_>,
        _field: &FieldDescriptor,
        len: usize,
    ) -> Result<Vec<u8>, DecodeError> {
        Ok(reader.read_bytes(len)?.to_vec())
    }
}
