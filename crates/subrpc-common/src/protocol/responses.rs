use std::fmt;

use super::requests::field_len;
use crate::wire::{FieldDescriptor, key_len, varint_len};

/// The envelope a caller receives for every completed call.
///
/// Success and failure travel on separate fields: a failed call carries an
/// [`ErrorPayload`] and an empty payload, a successful one carries payload
/// bytes (possibly none) and no error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub payload: Vec<u8>,
    pub error: Option<ErrorPayload>,
}

impl Response {
    pub(crate) const TAG_ERROR: u32 = 2;
    pub(crate) const PAYLOAD: FieldDescriptor =
        FieldDescriptor { message: "Response", field: "payload", number: 1 };

    /// A successful response carrying `payload`.
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self { payload: payload.into(), error: None }
    }

    /// A failed response carrying `error`.
    pub fn err(error: ErrorPayload) -> Self {
        Self { payload: Vec::new(), error: Some(error) }
    }

    /// Whether the remote handler reported an application error.
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Splits the response into the payload or the application error. The
    /// error wins when both are present.
    pub fn into_result(self) -> Result<Vec<u8>, ErrorPayload> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.payload),
        }
    }

    /// Exact size of the encoded envelope.
    pub fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.payload.is_empty() {
            len += field_len(&Self::PAYLOAD, self.payload.len());
        }
        if let Some(error) = &self.error {
            let body = error.encoded_len();
            len += key_len(Self::TAG_ERROR) + varint_len(body as u64) + body;
        }
        len
    }
}

/// Application-level failure reported by a remote handler.
///
/// This is a payload, not a transport fault: the call itself completed and
/// the handler chose to answer with an error. Codes are free-form strings
/// such as `PIT-404`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    /// Opaque context bytes, typically JSON.
    pub metadata: Vec<u8>,
}

impl ErrorPayload {
    pub(crate) const CODE: FieldDescriptor =
        FieldDescriptor { message: "Error", field: "code", number: 1 };
    pub(crate) const MESSAGE: FieldDescriptor =
        FieldDescriptor { message: "Error", field: "message", number: 2 };
    pub(crate) const METADATA: FieldDescriptor =
        FieldDescriptor { message: "Error", field: "metadata", number: 3 };

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), metadata: Vec::new() }
    }

    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Size of the encoded field body, excluding any enclosing key and
    /// length prefix.
    pub fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.code.is_empty() {
            len += field_len(&Self::CODE, self.code.len());
        }
        if !self.message.is_empty() {
            len += field_len(&Self::MESSAGE, self.message.len());
        }
        if !self.metadata.is_empty() {
            len += field_len(&Self::METADATA, self.metadata.len());
        }
        len
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
