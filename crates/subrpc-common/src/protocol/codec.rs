use super::requests::{Message, MessageKind, Request, RpcKind};
use super::responses::{ErrorPayload, Response};
use crate::wire::{
    ByteFieldCodec, DecodeError, EncodeError, OwnedBytes, WireReader, WireType, WireWriter,
};

/// Transport-independent serializer for RPC envelopes.
///
/// The codec is stateless and cheap to clone; one instance can serve any
/// number of concurrent calls. Encoding is deterministic: fields are written
/// in ascending tag order and fields holding their default value are skipped,
/// so equal envelopes always produce identical bytes. Decoding is strict:
/// unknown tag numbers, out-of-range enum values, and wire types the schema
/// does not use are all rejected rather than skipped.
///
/// Byte-string fields (routes, payloads, metadata) pass through the
/// [`ByteFieldCodec`] strategy `C`, which defaults to owned buffers.
///
/// # Example
///
/// ```
/// use subrpc_common::protocol::{EnvelopeCodec, Message, Request};
///
/// let codec = EnvelopeCodec::new();
/// let request = Request::user(Message::request("room.room.join", b"hi".to_vec()));
///
/// let mut buf = [0u8; 256];
/// let len = codec.encode_request(&request, &mut buf).unwrap();
/// assert_eq!(codec.decode_request(&buf[..len]).unwrap(), request);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec<C = OwnedBytes> {
    bytes: C,
}

impl EnvelopeCodec<OwnedBytes> {
    pub fn new() -> Self {
        Self { bytes: OwnedBytes }
    }
}

impl<C: ByteFieldCodec> EnvelopeCodec<C> {
    /// A codec routing byte-string fields through `bytes`.
    pub fn with_byte_codec(bytes: C) -> Self {
        Self { bytes }
    }

    /// Encodes `request` into `buf`, returning the number of bytes written.
    ///
    /// The required size is computed up front, so a buffer that is too small
    /// fails with [`EncodeError::BufferTooSmall`] before anything is written.
    pub fn encode_request(&self, request: &Request, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let needed = request.encoded_len();
        if needed > buf.len() {
            return Err(EncodeError::BufferTooSmall { needed, capacity: buf.len() });
        }
        let mut writer = WireWriter::new(buf);
        self.write_request(&mut writer, request)?;
        debug_assert_eq!(writer.bytes_written(), needed);
        Ok(writer.bytes_written())
    }

    /// Encodes `request` into a freshly sized buffer.
    pub fn request_to_vec(&self, request: &Request) -> Result<Vec<u8>, EncodeError> {
        let mut buf = vec![0u8; request.encoded_len()];
        let written = self.encode_request(request, &mut buf)?;
        buf.truncate(written);
        Ok(buf)
    }

    /// Encodes `response` into `buf`, returning the number of bytes written.
    pub fn encode_response(
        &self,
        response: &Response,
        buf: &mut [u8],
    ) -> Result<usize, EncodeError> {
        let needed = response.encoded_len();
        if needed > buf.len() {
            return Err(EncodeError::BufferTooSmall { needed, capacity: buf.len() });
        }
        let mut writer = WireWriter::new(buf);
        self.write_response(&mut writer, response)?;
        debug_assert_eq!(writer.bytes_written(), needed);
        Ok(writer.bytes_written())
    }

    /// Encodes `response` into a freshly sized buffer.
    pub fn response_to_vec(&self, response: &Response) -> Result<Vec<u8>, EncodeError> {
        let mut buf = vec![0u8; response.encoded_len()];
        let written = self.encode_response(response, &mut buf)?;
        buf.truncate(written);
        Ok(buf)
    }

    /// Decodes a [`Request`] from `bytes`, consuming the whole input.
    ///
    /// An empty input is a valid request with every field at its default.
    pub fn decode_request(&self, bytes: &[u8]) -> Result<Request, DecodeError> {
        let mut reader = WireReader::new(bytes);
        let mut request = Request::default();
        while let Some(key) = reader.read_key()? {
            match key.number {
                Request::TAG_KIND => {
                    key.expect("Request.kind", WireType::Varint)?;
                    let value = reader.read_varint()?;
                    request.kind = RpcKind::from_u64(value)
                        .ok_or(DecodeError::InvalidEnum { field: "Request.kind", value })?;
                }
                Request::TAG_MESSAGE => {
                    key.expect("Request.message", WireType::LengthDelimited)?;
                    let len = reader.read_len()?;
                    let body = reader.read_bytes(len)?;
                    request.message = Some(self.read_message(&mut WireReader::new(body))?);
                }
                n if n == Request::METADATA.number => {
                    key.expect("Request.metadata", WireType::LengthDelimited)?;
                    let len = reader.read_len()?;
                    request.metadata =
                        self.bytes.decode_bytes(&mut reader, &Request::METADATA, len)?;
                }
                tag => return Err(DecodeError::UnknownField { tag: u64::from(tag) }),
            }
        }
        Ok(request)
    }

    /// Decodes a [`Response`] from `bytes`, consuming the whole input.
    ///
    /// An empty input is a valid, successful response with no payload.
    pub fn decode_response(&self, bytes: &[u8]) -> Result<Response, DecodeError> {
        let mut reader = WireReader::new(bytes);
        let mut response = Response::default();
        while let Some(key) = reader.read_key()? {
            match key.number {
                n if n == Response::PAYLOAD.number => {
                    key.expect("Response.payload", WireType::LengthDelimited)?;
                    let len = reader.read_len()?;
                    response.payload =
                        self.bytes.decode_bytes(&mut reader, &Response::PAYLOAD, len)?;
                }
                Response::TAG_ERROR => {
                    key.expect("Response.error", WireType::LengthDelimited)?;
                    let len = reader.read_len()?;
                    let body = reader.read_bytes(len)?;
                    response.error = Some(self.read_error(&mut WireReader::new(body))?);
                }
                tag => return Err(DecodeError::UnknownField { tag: u64::from(tag) }),
            }
        }
        Ok(response)
    }

    fn write_request(&self, w: &mut WireWriter<'_>, request: &Request) -> Result<(), EncodeError> {
        if request.kind != RpcKind::default() {
            w.write_key(Request::TAG_KIND, WireType::Varint)?;
            w.write_varint(request.kind as u64)?;
        }
        if let Some(message) = &request.message {
            w.write_key(Request::TAG_MESSAGE, WireType::LengthDelimited)?;
            w.write_varint(message.encoded_len() as u64)?;
            self.write_message(w, message)?;
        }
        if !request.metadata.is_empty() {
            self.bytes.encode_bytes(w, &Request::METADATA, &request.metadata)?;
        }
        Ok(())
    }

    fn write_message(&self, w: &mut WireWriter<'_>, message: &Message) -> Result<(), EncodeError> {
        if message.id != 0 {
            w.write_key(Message::TAG_ID, WireType::Varint)?;
            w.write_varint(message.id)?;
        }
        if !message.route.is_empty() {
            self.bytes.encode_bytes(w, &Message::ROUTE, message.route.as_bytes())?;
        }
        if !message.payload.is_empty() {
            self.bytes.encode_bytes(w, &Message::PAYLOAD, &message.payload)?;
        }
        if message.kind != MessageKind::default() {
            w.write_key(Message::TAG_KIND, WireType::Varint)?;
            w.write_varint(message.kind as u64)?;
        }
        if !message.reply_to.is_empty() {
            self.bytes.encode_bytes(w, &Message::REPLY_TO, message.reply_to.as_bytes())?;
        }
        Ok(())
    }

    fn write_response(
        &self,
        w: &mut WireWriter<'_>,
        response: &Response,
    ) -> Result<(), EncodeError> {
        if !response.payload.is_empty() {
            self.bytes.encode_bytes(w, &Response::PAYLOAD, &response.payload)?;
        }
        if let Some(error) = &response.error {
            w.write_key(Response::TAG_ERROR, WireType::LengthDelimited)?;
            w.write_varint(error.encoded_len() as u64)?;
            self.write_error(w, error)?;
        }
        Ok(())
    }

    fn write_error(&self, w: &mut WireWriter<'_>, error: &ErrorPayload) -> Result<(), EncodeError> {
        if !error.code.is_empty() {
            self.bytes.encode_bytes(w, &ErrorPayload::CODE, error.code.as_bytes())?;
        }
        if !error.message.is_empty() {
            self.bytes.encode_bytes(w, &ErrorPayload::MESSAGE, error.message.as_bytes())?;
        }
        if !error.metadata.is_empty() {
            self.bytes.encode_bytes(w, &ErrorPayload::METADATA, &error.metadata)?;
        }
        Ok(())
    }

    fn read_message(&self, r: &mut WireReader<'_>) -> Result<Message, DecodeError> {
        let mut message = Message::default();
        while let Some(key) = r.read_key()? {
            match key.number {
                Message::TAG_ID => {
                    key.expect("Message.id", WireType::Varint)?;
                    message.id = r.read_varint()?;
                }
                n if n == Message::ROUTE.number => {
                    key.expect("Message.route", WireType::LengthDelimited)?;
                    let len = r.read_len()?;
                    let bytes = self.bytes.decode_bytes(r, &Message::ROUTE, len)?;
                    message.route = into_string(bytes, "Message.route")?;
                }
                n if n == Message::PAYLOAD.number => {
                    key.expect("Message.payload", WireType::LengthDelimited)?;
                    let len = r.read_len()?;
                    message.payload = self.bytes.decode_bytes(r, &Message::PAYLOAD, len)?;
                }
                Message::TAG_KIND => {
                    key.expect("Message.kind", WireType::Varint)?;
                    let value = r.read_varint()?;
                    message.kind = MessageKind::from_u64(value)
                        .ok_or(DecodeError::InvalidEnum { field: "Message.kind", value })?;
                }
                n if n == Message::REPLY_TO.number => {
                    key.expect("Message.reply_to", WireType::LengthDelimited)?;
                    let len = r.read_len()?;
                    let bytes = self.bytes.decode_bytes(r, &Message::REPLY_TO, len)?;
                    message.reply_to = into_string(bytes, "Message.reply_to")?;
                }
                tag => return Err(DecodeError::UnknownField { tag: u64::from(tag) }),
            }
        }
        Ok(message)
    }

    fn read_error(&self, r: &mut WireReader<'_>) -> Result<ErrorPayload, DecodeError> {
        let mut error = ErrorPayload::default();
        while let Some(key) = r.read_key()? {
            match key.number {
                n if n == ErrorPayload::CODE.number => {
                    key.expect("Error.code", WireType::LengthDelimited)?;
                    let len = r.read_len()?;
                    let bytes = self.bytes.decode_bytes(r, &ErrorPayload::CODE, len)?;
                    error.code = into_string(bytes, "Error.code")?;
                }
                n if n == ErrorPayload::MESSAGE.number => {
                    key.expect("Error.message", WireType::LengthDelimited)?;
                    let len = r.read_len()?;
                    let bytes = self.bytes.decode_bytes(r, &ErrorPayload::MESSAGE, len)?;
                    error.message = into_string(bytes, "Error.message")?;
                }
                n if n == ErrorPayload::METADATA.number => {
                    key.expect("Error.metadata", WireType::LengthDelimited)?;
                    let len = r.read_len()?;
                    error.metadata = self.bytes.decode_bytes(r, &ErrorPayload::METADATA, len)?;
                }
                tag => return Err(DecodeError::UnknownField { tag: u64::from(tag) }),
            }
        }
        Ok(error)
    }
}

fn into_string(bytes: Vec<u8>, field: &'static str) -> Result<String, DecodeError> {
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { field })
}
