#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::super::*;
    use crate::wire::{
        ByteFieldCodec, DecodeError, EncodeError, FieldDescriptor, OwnedBytes, WireReader,
        WireType, WireWriter, key,
    };

    fn join_request() -> Request {
        Request::user(Message::request("room.room.join", b"Some data to be sent".to_vec()))
            .with_metadata(b"{}".to_vec())
    }

    #[test]
    fn test_request_roundtrip_through_fixed_buffer() {
        let codec = EnvelopeCodec::new();
        let request = join_request();

        let mut buf = [0u8; 256];
        let written = codec.encode_request(&request, &mut buf).unwrap();
        assert!(written <= buf.len());
        assert_eq!(written, request.encoded_len());

        let decoded = codec.decode_request(&buf[..written]).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_roundtrip_across_payload_lengths() {
        let codec = EnvelopeCodec::new();
        for len in [0usize, 1, 7, 64, 255, 1024] {
            let payload = vec![0xabu8; len];
            let request = Request::user(Message::request("kind.service.method", payload));
            let bytes = codec.request_to_vec(&request).unwrap();
            assert_eq!(codec.decode_request(&bytes).unwrap(), request, "len {len}");
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let codec = EnvelopeCodec::new();
        let request = join_request();
        let first = codec.request_to_vec(&request).unwrap();
        let second = codec.request_to_vec(&request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_buffer_too_small_reports_needed_size() {
        let codec = EnvelopeCodec::new();
        let request = join_request();
        let needed = request.encoded_len();

        let mut buf = [0u8; 8];
        let err = codec.encode_request(&request, &mut buf).unwrap_err();
        assert_eq!(err, EncodeError::BufferTooSmall { needed, capacity: 8 });
    }

    #[test]
    fn test_empty_input_decodes_to_defaults() {
        let codec = EnvelopeCodec::new();
        assert_eq!(codec.decode_request(&[]).unwrap(), Request::default());

        let response = codec.decode_response(&[]).unwrap();
        assert!(!response.is_err());
        assert!(response.payload.is_empty());
    }

    #[test]
    fn test_absent_message_stays_absent() {
        let codec = EnvelopeCodec::new();
        let request = Request { kind: RpcKind::User, message: None, metadata: b"ctx".to_vec() };
        let bytes = codec.request_to_vec(&request).unwrap();
        let decoded = codec.decode_request(&bytes).unwrap();
        assert_eq!(decoded.message, None);
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_empty_message_keeps_presence() {
        // A present-but-default message is not the same thing as no message.
        let codec = EnvelopeCodec::new();
        let request = Request { kind: RpcKind::Sys, message: Some(Message::default()), metadata: Vec::new() };
        let bytes = codec.request_to_vec(&request).unwrap();
        let decoded = codec.decode_request(&bytes).unwrap();
        assert_eq!(decoded.message, Some(Message::default()));
    }

    #[test]
    fn test_unknown_field_tag_rejected() {
        let codec = EnvelopeCodec::new();
        // Field 3 does not exist on Response.
        let bytes = [u8::try_from(key(3, WireType::Varint)).unwrap(), 0x01];
        assert_eq!(
            codec.decode_response(&bytes),
            Err(DecodeError::UnknownField { tag: 3 })
        );
    }

    #[test]
    fn test_oversized_field_tag_rejected() {
        let codec = EnvelopeCodec::new();
        // Field number 2^32 + 1 with wire type 2, then a 1-byte body. A
        // 32-bit truncation would read this as Response.payload (tag 1).
        let bytes = [0x8a, 0x80, 0x80, 0x80, 0x80, 0x01, 0x01, 0x78];
        assert_eq!(
            codec.decode_response(&bytes),
            Err(DecodeError::UnknownField { tag: (1u64 << 32) + 1 })
        );
    }

    #[test]
    fn test_reserved_request_tags_rejected() {
        let codec = EnvelopeCodec::new();
        // Tag 3 is reserved on Request and no longer part of the schema.
        let bytes = [u8::try_from(key(3, WireType::LengthDelimited)).unwrap(), 0x00];
        assert_eq!(
            codec.decode_request(&bytes),
            Err(DecodeError::UnknownField { tag: 3 })
        );
    }

    #[test]
    fn test_out_of_range_rpc_kind_rejected() {
        let codec = EnvelopeCodec::new();
        let bytes = [u8::try_from(key(1, WireType::Varint)).unwrap(), 0x07];
        assert_eq!(
            codec.decode_request(&bytes),
            Err(DecodeError::InvalidEnum { field: "Request.kind", value: 7 })
        );
    }

    #[test]
    fn test_out_of_range_message_kind_rejected() {
        let codec = EnvelopeCodec::new();
        // Request.message wrapping a message whose kind field holds 9.
        let bytes = [
            u8::try_from(key(2, WireType::LengthDelimited)).unwrap(),
            0x02,
            u8::try_from(key(4, WireType::Varint)).unwrap(),
            0x09,
        ];
        assert_eq!(
            codec.decode_request(&bytes),
            Err(DecodeError::InvalidEnum { field: "Message.kind", value: 9 })
        );
    }

    #[test]
    fn test_wrong_wire_type_rejected() {
        let codec = EnvelopeCodec::new();
        // Response.payload is length-delimited, not a varint.
        let bytes = [u8::try_from(key(1, WireType::Varint)).unwrap(), 0x01];
        assert_eq!(
            codec.decode_response(&bytes),
            Err(DecodeError::UnexpectedWireType { field: "Response.payload", wire_type: 0 })
        );
    }

    #[test]
    fn test_truncated_response_rejected() {
        let codec = EnvelopeCodec::new();
        let bytes = codec.response_to_vec(&Response::ok(b"hello world".to_vec())).unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(
            codec.decode_response(cut),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_route_rejected() {
        let codec = EnvelopeCodec::new();
        // Message.route carrying a lone 0xff byte.
        let bytes = [
            u8::try_from(key(2, WireType::LengthDelimited)).unwrap(),
            0x03,
            u8::try_from(key(2, WireType::LengthDelimited)).unwrap(),
            0x01,
            0xff,
        ];
        assert_eq!(
            codec.decode_request(&bytes),
            Err(DecodeError::InvalidUtf8 { field: "Message.route" })
        );
    }

    #[test]
    fn test_error_response_roundtrip() {
        let codec = EnvelopeCodec::new();
        let response = Response::err(
            ErrorPayload::new("PIT-404", "route not found").with_metadata(b"{\"route\":\"x.y.z\"}".to_vec()),
        );
        let bytes = codec.response_to_vec(&response).unwrap();
        let decoded = codec.decode_response(&bytes).unwrap();
        assert!(decoded.is_err());
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_into_result_prefers_the_error() {
        let ok = Response::ok(b"data".to_vec());
        assert_eq!(ok.into_result().unwrap(), b"data");

        let both = Response {
            payload: b"ignored".to_vec(),
            error: Some(ErrorPayload::new("PIT-500", "boom")),
        };
        let err = both.into_result().unwrap_err();
        assert_eq!(err.code, "PIT-500");
    }

    #[test]
    fn test_decoder_accepts_any_field_order() {
        let codec = EnvelopeCodec::new();
        let reference = Request { kind: RpcKind::User, message: None, metadata: b"m".to_vec() };
        // Metadata (5) ahead of kind (1).
        let bytes = [
            u8::try_from(key(5, WireType::LengthDelimited)).unwrap(),
            0x01,
            b'm',
            u8::try_from(key(1, WireType::Varint)).unwrap(),
            0x01,
        ];
        assert_eq!(codec.decode_request(&bytes).unwrap(), reference);
    }

    #[test]
    fn test_duplicate_field_last_wins() {
        let codec = EnvelopeCodec::new();
        let bytes = [
            u8::try_from(key(1, WireType::LengthDelimited)).unwrap(),
            0x01,
            b'a',
            u8::try_from(key(1, WireType::LengthDelimited)).unwrap(),
            0x01,
            b'b',
        ];
        let decoded = codec.decode_response(&bytes).unwrap();
        assert_eq!(decoded.payload, b"b");
    }

    #[test]
    fn test_encoded_len_matches_bytes_written() {
        let codec = EnvelopeCodec::new();
        let shapes = [
            Request::default(),
            Request::sys(Message::notify("sys.ping.ping", Vec::new())),
            join_request(),
            Request::user(
                Message::request("room.room.message", vec![0u8; 300]).with_id(42).with_reply_to("inbox.7"),
            ),
        ];
        for request in shapes {
            let bytes = codec.request_to_vec(&request).unwrap();
            assert_eq!(bytes.len(), request.encoded_len());
        }
    }

    #[test]
    fn test_response_roundtrip_with_payload_and_error() {
        let codec = EnvelopeCodec::new();
        let response = Response {
            payload: b"partial".to_vec(),
            error: Some(ErrorPayload::new("PIT-408", "timed out upstream")),
        };
        let bytes = codec.response_to_vec(&response).unwrap();
        assert_eq!(codec.decode_response(&bytes).unwrap(), response);
    }

    /// Byte codec that records which fields pass through it, delegating the
    /// actual bytes to [`OwnedBytes`].
    struct RecordingBytes {
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ByteFieldCodec for RecordingBytes {
        fn encode_bytes(
            &self,
            writer: &mut WireWriter<'_>,
            field: &FieldDescriptor,
            value: &[u8],
        ) -> Result<(), EncodeError> {
            self.seen.lock().unwrap().push(field.field);
            OwnedBytes.encode_bytes(writer, field, value)
        }

        fn decode_bytes(
            &self,
            reader: &mut WireReader<'_>,
            field: &FieldDescriptor,
            len: usize,
        ) -> Result<Vec<u8>, DecodeError> {
            self.seen.lock().unwrap().push(field.field);
            OwnedBytes.decode_bytes(reader, field, len)
        }
    }

    #[test]
    fn test_byte_codec_strategy_sees_every_byte_field() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let codec = EnvelopeCodec::with_byte_codec(RecordingBytes { seen: seen.clone() });

        let bytes = codec.request_to_vec(&join_request()).unwrap();
        assert_eq!(*seen.lock().unwrap(), ["route", "payload", "metadata"]);

        seen.lock().unwrap().clear();
        assert_eq!(codec.decode_request(&bytes).unwrap(), join_request());
        assert_eq!(*seen.lock().unwrap(), ["route", "payload", "metadata"]);
    }
}
