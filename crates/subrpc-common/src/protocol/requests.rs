use crate::wire::{FieldDescriptor, key_len, varint_len};

/// Class of a call as seen by the receiving server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RpcKind {
    /// Framework-internal call.
    #[default]
    Sys = 0,
    /// Application-level call.
    User = 1,
}

impl RpcKind {
    pub(crate) fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Sys),
            1 => Some(Self::User),
            _ => None,
        }
    }
}

/// Interaction pattern a [`Message`] participates in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageKind {
    /// Expects a reply.
    #[default]
    Request = 0,
    /// Fire-and-forget.
    Notify = 1,
    /// Reply to an earlier request.
    Response = 2,
    /// Server-initiated push.
    Push = 3,
}

impl MessageKind {
    pub(crate) fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Request),
            1 => Some(Self::Notify),
            2 => Some(Self::Response),
            3 => Some(Self::Push),
            _ => None,
        }
    }
}

/// An application message routed to a remote handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Correlation id chosen by the caller; `0` means unset.
    pub id: u64,
    /// Dot-delimited logical address of the handler.
    pub route: String,
    /// Opaque application payload.
    pub payload: Vec<u8>,
    pub kind: MessageKind,
    /// Subject the reply should be published to, when not implied by the
    /// transport.
    pub reply_to: String,
}

impl Message {
    pub(crate) const TAG_ID: u32 = 1;
    pub(crate) const TAG_KIND: u32 = 4;
    pub(crate) const ROUTE: FieldDescriptor =
        FieldDescriptor { message: "Message", field: "route", number: 2 };
    pub(crate) const PAYLOAD: FieldDescriptor =
        FieldDescriptor { message: "Message", field: "payload", number: 3 };
    pub(crate) const REPLY_TO: FieldDescriptor =
        FieldDescriptor { message: "Message", field: "reply_to", number: 5 };

    /// A request-kind message addressed to `route`.
    pub fn request(route: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            route: route.into(),
            payload: payload.into(),
            kind: MessageKind::Request,
            ..Self::default()
        }
    }

    /// A notify-kind message addressed to `route`.
    pub fn notify(route: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            route: route.into(),
            payload: payload.into(),
            kind: MessageKind::Notify,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn with_reply_to(mut self, subject: impl Into<String>) -> Self {
        self.reply_to = subject.into();
        self
    }

    /// Size of the encoded field body, excluding any enclosing key and
    /// length prefix.
    pub fn encoded_len(&self) -> usize {
        let mut len = 0;
        if self.id != 0 {
            len += key_len(Self::TAG_ID) + varint_len(self.id);
        }
        if !self.route.is_empty() {
            len += field_len(&Self::ROUTE, self.route.len());
        }
        if !self.payload.is_empty() {
            len += field_len(&Self::PAYLOAD, self.payload.len());
        }
        if self.kind != MessageKind::default() {
            len += key_len(Self::TAG_KIND) + varint_len(self.kind as u64);
        }
        if !self.reply_to.is_empty() {
            len += field_len(&Self::REPLY_TO, self.reply_to.len());
        }
        len
    }
}

/// The envelope a server receives for every inbound call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub kind: RpcKind,
    /// The routed message, when the call carries one. Absence is preserved
    /// on the wire rather than encoded as an empty message.
    pub message: Option<Message>,
    /// Opaque context bytes forwarded verbatim, typically JSON.
    pub metadata: Vec<u8>,
}

impl Request {
    pub(crate) const TAG_KIND: u32 = 1;
    pub(crate) const TAG_MESSAGE: u32 = 2;
    // Tags 3 and 4 belonged to session state in an earlier revision of the
    // schema and stay reserved.
    pub(crate) const METADATA: FieldDescriptor =
        FieldDescriptor { message: "Request", field: "metadata", number: 5 };

    /// An application-level request wrapping `message`.
    pub fn user(message: Message) -> Self {
        Self { kind: RpcKind::User, message: Some(message), metadata: Vec::new() }
    }

    /// A framework-internal request wrapping `message`.
    pub fn sys(message: Message) -> Self {
        Self { kind: RpcKind::Sys, message: Some(message), metadata: Vec::new() }
    }

    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Exact size of the encoded envelope.
    pub fn encoded_len(&self) -> usize {
        let mut len = 0;
        if self.kind != RpcKind::default() {
            len += key_len(Self::TAG_KIND) + varint_len(self.kind as u64);
        }
        if let Some(message) = &self.message {
            let body = message.encoded_len();
            len += key_len(Self::TAG_MESSAGE) + varint_len(body as u64) + body;
        }
        if !self.metadata.is_empty() {
            len += field_len(&Self::METADATA, self.metadata.len());
        }
        len
    }
}

pub(crate) fn field_len(field: &FieldDescriptor, body: usize) -> usize {
    key_len(field.number) + varint_len(body as u64) + body
}
