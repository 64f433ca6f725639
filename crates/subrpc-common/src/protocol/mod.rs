//! RPC envelope schema and its codec.
//!
//! A call travels as a [`Request`] wrapping a routed [`Message`]; the reply
//! comes back as a [`Response`] that carries either payload bytes or an
//! [`ErrorPayload`]. [`EnvelopeCodec`] moves all four across the wire format
//! defined in [`crate::wire`].

pub mod codec;
pub mod requests;
pub mod responses;

#[cfg(test)]
mod tests;

pub use codec::EnvelopeCodec;
pub use requests::{Message, MessageKind, Request, RpcKind};
pub use responses::{ErrorPayload, Response};
