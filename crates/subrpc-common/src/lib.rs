//! subrpc Envelope Schema and Wire Format
//!
//! This crate provides the message schema and binary codec shared by every
//! subrpc component.
//!
//! # Overview
//!
//! subrpc is a route-addressed RPC layer for clustered services: callers name
//! a handler by a dot-delimited route and a broker carries the encoded
//! envelope to whichever server owns it. This crate contains the pieces both
//! ends agree on:
//!
//! - **Wire Layer**: tag-length-value primitives with varint scalars
//! - **Protocol Layer**: Request/Response envelopes, routed messages, and the
//!   application error payload
//!
//! # Architecture
//!
//! The wire format is deliberately small:
//! - **Framing**: none; the surrounding transport delimits envelopes
//! - **Scalars**: base-128 varints
//! - **Byte strings**: varint length + raw bytes, moved through a pluggable
//!   [`wire::ByteFieldCodec`]
//! - **Unknown input**: rejected, never skipped
//!
//! # Components
//!
//! - [`protocol`] - Envelope types (Request, Message, Response, ErrorPayload)
//!   and their codec
//! - [`wire`] - Reader/writer primitives the codec is built on
//!
//! # Example
//!
//! ```
//! use subrpc_common::{EnvelopeCodec, Message, Request};
//!
//! let codec = EnvelopeCodec::new();
//! let request = Request::user(Message::request("room.room.join", b"hi".to_vec()));
//!
//! let bytes = codec.request_to_vec(&request).unwrap();
//! assert_eq!(codec.decode_request(&bytes).unwrap(), request);
//! ```

pub mod protocol;
pub mod wire;

pub use protocol::*;
