//! Low-level wire primitives for the envelope format.
//!
//! The format is a tag-length-value layout: every field is introduced by a
//! varint *key* packing the field's tag number together with a wire type,
//! followed by either a varint payload or a length-delimited run of bytes.
//! Varints are base-128, least-significant group first. Messages nest by
//! embedding an encoded message as a length-delimited field.

mod error;
pub mod fields;
mod reader;
mod writer;

pub use error::{DecodeError, EncodeError};
pub use fields::{ByteFieldCodec, FieldDescriptor, OwnedBytes};
pub use reader::WireReader;
pub use writer::WireWriter;

/// Wire types the format uses. The remaining protobuf wire types (groups and
/// fixed-width scalars) are not part of the schema and are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint payload.
    Varint = 0,
    /// Varint length followed by that many raw bytes.
    LengthDelimited = 2,
}

/// A decoded field key: tag number plus the wire type it arrived with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKey {
    pub number: u32,
    pub wire_type: u8,
}

impl FieldKey {
    /// Checks the key's wire type against what the schema declares for the
    /// field.
    pub fn expect(&self, field: &'static str, expected: WireType) -> Result<(), DecodeError> {
        if self.wire_type == expected as u8 {
            Ok(())
        } else {
            Err(DecodeError::UnexpectedWireType { field, wire_type: self.wire_type })
        }
    }
}

/// Packs a tag number and wire type into a field key.
pub const fn key(number: u32, wire_type: WireType) -> u32 {
    (number << 3) | wire_type as u32
}

/// Encoded size of `value` as a varint.
pub const fn varint_len(value: u64) -> usize {
    match value {
        0 => 1,
        v => (64 - v.leading_zeros() as usize + 6) / 7,
    }
}

/// Encoded size of a field key. Both wire types occupy the low three bits,
/// so the length depends on the tag number alone.
pub const fn key_len(number: u32) -> usize {
    varint_len((number as u64) << 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_varint(value: u64) -> u64 {
        let mut buf = [0u8; 10];
        let mut writer = WireWriter::new(&mut buf);
        writer.write_varint(value).unwrap();
        let written = writer.bytes_written();
        assert_eq!(written, varint_len(value));
        let mut reader = WireReader::new(&buf[..written]);
        let decoded = reader.read_varint().unwrap();
        assert!(reader.is_empty());
        decoded
    }

    #[test]
    fn test_varint_roundtrip() {
        for value in [0, 1, 127, 128, 300, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(roundtrip_varint(value), value);
        }
    }

    #[test]
    fn test_varint_single_byte_boundary() {
        let mut buf = [0u8; 10];
        let mut writer = WireWriter::new(&mut buf);
        writer.write_varint(127).unwrap();
        assert_eq!(writer.bytes_written(), 1);

        let mut writer = WireWriter::new(&mut buf);
        writer.write_varint(128).unwrap();
        assert_eq!(writer.bytes_written(), 2);
        assert_eq!(buf[0], 0x80);
        assert_eq!(buf[1], 0x01);
    }

    #[test]
    fn test_varint_overflow_rejected() {
        // Ten continuation groups never terminate within 64 bits.
        let mut reader = WireReader::new(&[0xff; 10]);
        assert_eq!(reader.read_varint(), Err(DecodeError::VarintOverflow));

        // A tenth group carrying more than the top bit overflows too.
        let mut bytes = vec![0x80u8; 9];
        bytes.push(0x02);
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_varint(), Err(DecodeError::VarintOverflow));
    }

    #[test]
    fn test_varint_truncated_mid_value() {
        let mut reader = WireReader::new(&[0x80]);
        assert_eq!(
            reader.read_varint(),
            Err(DecodeError::Truncated { needed: 1, remaining: 0 })
        );
    }

    #[test]
    fn test_writer_reports_exhaustion() {
        let mut buf = [0u8; 2];
        let mut writer = WireWriter::new(&mut buf);
        let err = writer.write_raw(b"abc").unwrap_err();
        assert_eq!(err, EncodeError::BufferTooSmall { needed: 3, capacity: 2 });
    }

    #[test]
    fn test_read_len_bounds_declared_length() {
        // Declared length of 5 with only 2 bytes behind it.
        let mut reader = WireReader::new(&[0x05, 0xaa, 0xbb]);
        assert_eq!(
            reader.read_len(),
            Err(DecodeError::Truncated { needed: 5, remaining: 2 })
        );
    }

    #[test]
    fn test_key_packs_number_and_wire_type() {
        assert_eq!(key(1, WireType::Varint), 0x08);
        assert_eq!(key(2, WireType::LengthDelimited), 0x12);
        assert_eq!(key_len(1), 1);
        assert_eq!(key_len(16), 2);
    }

    #[test]
    fn test_read_key_splits_fields() {
        let mut reader = WireReader::new(&[0x12]);
        let key = reader.read_key().unwrap().unwrap();
        assert_eq!(key.number, 2);
        assert_eq!(key.wire_type, WireType::LengthDelimited as u8);
        assert_eq!(reader.read_key().unwrap(), None);
    }

    #[test]
    fn test_read_key_rejects_oversized_field_number() {
        // Key varint for field number 2^32 + 1 with wire type 2. Truncating
        // to 32 bits would alias it onto tag 1.
        let mut reader = WireReader::new(&[0x8a, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(
            reader.read_key(),
            Err(DecodeError::UnknownField { tag: (1u64 << 32) + 1 })
        );
    }

    #[test]
    fn test_read_key_accepts_widest_tag_number() {
        let mut buf = [0u8; 10];
        let mut writer = WireWriter::new(&mut buf);
        writer
            .write_varint((u64::from(u32::MAX) << 3) | WireType::LengthDelimited as u64)
            .unwrap();
        let written = writer.bytes_written();

        let mut reader = WireReader::new(&buf[..written]);
        let key = reader.read_key().unwrap().unwrap();
        assert_eq!(key.number, u32::MAX);
        assert_eq!(key.wire_type, WireType::LengthDelimited as u8);
    }

    #[test]
    fn test_field_key_expect_checks_wire_type() {
        let key = FieldKey { number: 2, wire_type: 0 };
        assert_eq!(
            key.expect("blob", WireType::LengthDelimited),
            Err(DecodeError::UnexpectedWireType { field: "blob", wire_type: 0 })
        );
    }

    #[test]
    fn test_owned_bytes_roundtrip() {
        const FIELD: FieldDescriptor =
            FieldDescriptor { message: "Test", field: "blob", number: 3 };
        let mut buf = [0u8; 16];
        let mut writer = WireWriter::new(&mut buf);
        OwnedBytes.encode_bytes(&mut writer, &FIELD, b"hello").unwrap();
        let written = writer.bytes_written();
        assert_eq!(written, key_len(3) + varint_len(5) + 5);

        let mut reader = WireReader::new(&buf[..written]);
        let key = reader.read_key().unwrap().unwrap();
        assert_eq!(key.number, 3);
        let len = reader.read_len().unwrap();
        let decoded = OwnedBytes.decode_bytes(&mut reader, &FIELD, len).unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_owned_bytes_zero_length_yields_empty_buffer() {
        const FIELD: FieldDescriptor =
            FieldDescriptor { message: "Test", field: "blob", number: 3 };
        let mut reader = WireReader::new(&[]);
        let decoded = OwnedBytes.decode_bytes(&mut reader, &FIELD, 0).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_owned_bytes_truncated_field() {
        const FIELD: FieldDescriptor =
            FieldDescriptor { message: "Test", field: "blob", number: 3 };
        let mut reader = WireReader::new(&[0xaa, 0xbb]);
        assert_eq!(
            OwnedBytes.decode_bytes(&mut reader, &FIELD, 4),
            Err(DecodeError::Truncated { needed: 4, remaining: 2 })
        );
    }
}
