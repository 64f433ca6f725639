use thiserror::Error;

/// Errors produced while serializing a message into a wire buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The destination buffer cannot hold the encoded message. No partial
    /// output is valid when this is returned.
    #[error("buffer too small: need {needed} bytes, capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
}

/// Errors produced while parsing a message out of wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended before a declared length was satisfied.
    #[error("input truncated: need {needed} more bytes, {remaining} remain")]
    Truncated { needed: usize, remaining: usize },

    /// A field key carried a tag number that is not part of the schema. The
    /// tag is kept at full width so numbers past the 32-bit tag space report
    /// faithfully.
    #[error("unknown field tag {tag}")]
    UnknownField { tag: u64 },

    /// A known field arrived with a wire type the schema does not use for it.
    #[error("field {field} has unexpected wire type {wire_type}")]
    UnexpectedWireType { field: &'static str, wire_type: u8 },

    /// A closed enum field carried a numeric value outside its range.
    #[error("{field} has out-of-range value {value}")]
    InvalidEnum { field: &'static str, value: u64 },

    /// A string field carried bytes that are not valid UTF-8.
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// A varint ran past the 64-bit range.
    #[error("varint exceeds 64 bits")]
    VarintOverflow,
}
