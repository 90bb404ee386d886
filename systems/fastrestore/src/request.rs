//! Requests and the reply channels they carry.
//!
//! A concrete request is a plain struct that contains a [`ReplyPromise`]
//! next to its payload. The promise knows where the answer goes but nothing
//! about deadlines: waiting, timing out and retrying belong to the requester
//! (see [`TimedRequests`](crate::timed::TimedRequests)).

use std::{
    cell::Cell,
    fmt::{self, Debug, Display},
    marker::PhantomData,
};

use restsim::{Message, ProcessId, debug_process, send_to, warn_process};

use crate::{
    error::{DecodeError, DoubleFulfillment},
    reply::{ReplyEnvelope, RestoreCommonReply, RestoreRoleReply},
    role::RestoreRole,
    wire::{FileIdentifier, WireMessage, WireReader, WireWriter},
};

pub type RequestId = usize;

/// Address of a reply channel: the requester and its id for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyEndpoint {
    pub requester: ProcessId,
    pub request: RequestId,
}

impl ReplyEndpoint {
    fn encode(&self, writer: &mut WireWriter) {
        writer.put_u64(self.requester as u64);
        writer.put_u64(self.request as u64);
    }

    fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            requester: reader.get_u64()? as ProcessId,
            request: reader.get_u64()? as RequestId,
        })
    }
}

/// One-shot reply channel embedded in a request.
///
/// The network shares a request between everyone holding it, so the promise
/// cannot be consumed by value. It guards itself instead: the first
/// [`send`](ReplyPromise::send) delivers, any later one is logged and dropped.
pub struct ReplyPromise<R> {
    endpoint: ReplyEndpoint,
    sent: Cell<bool>,
    _reply: PhantomData<fn(R)>,
}

impl<R: ReplyEnvelope> ReplyPromise<R> {
    pub(crate) fn new(endpoint: ReplyEndpoint) -> Self {
        Self {
            endpoint,
            sent: Cell::new(false),
            _reply: PhantomData,
        }
    }

    pub fn endpoint(&self) -> ReplyEndpoint {
        self.endpoint
    }

    pub fn is_sent(&self) -> bool {
        self.sent.get()
    }

    /// Sends `reply` to the requester. Must run inside a simulated process.
    pub fn send(&self, reply: R) {
        if self.sent.replace(true) {
            let err = DoubleFulfillment {
                requester: self.endpoint.requester,
                request: self.endpoint.request,
            };
            warn_process!("{err}, dropping reply from {}", reply.sender());
            return;
        }
        debug_process!(
            "Replying to P{} for request #{}",
            self.endpoint.requester,
            self.endpoint.request
        );
        send_to(
            self.endpoint.requester,
            ReplyDelivery {
                request: self.endpoint.request,
                reply,
            },
        );
    }
}

impl<R> Debug for ReplyPromise<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyPromise")
            .field("endpoint", &self.endpoint)
            .field("sent", &self.sent.get())
            .finish()
    }
}

/// A fulfilled reply on its way back to the requester.
#[derive(Debug, Clone)]
pub struct ReplyDelivery<R> {
    pub request: RequestId,
    pub reply: R,
}

impl<R: ReplyEnvelope> Message for ReplyDelivery<R> {}

/// A request whose requester waits for the reply with its own deadline.
pub trait TimedRequest: Message + WireMessage + Display {
    type Reply: ReplyEnvelope;

    fn reply(&self) -> &ReplyPromise<Self::Reply>;
}

/// Payload-free request, used as a heartbeat.
#[derive(Debug)]
pub struct RestoreSimpleRequest {
    pub reply: ReplyPromise<RestoreCommonReply>,
}

impl RestoreSimpleRequest {
    pub fn new(reply: ReplyPromise<RestoreCommonReply>) -> Self {
        Self { reply }
    }
}

impl Message for RestoreSimpleRequest {}

impl TimedRequest for RestoreSimpleRequest {
    type Reply = RestoreCommonReply;

    fn reply(&self) -> &ReplyPromise<RestoreCommonReply> {
        &self.reply
    }
}

impl WireMessage for RestoreSimpleRequest {
    const FILE_IDENTIFIER: FileIdentifier = 83557801;

    fn encode_payload(&self, writer: &mut WireWriter) {
        self.reply.endpoint.encode(writer);
    }

    fn decode_payload(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self::new(ReplyPromise::new(ReplyEndpoint::decode(reader)?)))
    }
}

impl Display for RestoreSimpleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RestoreSimpleRequest")
    }
}

/// Asks a participant which role it runs as.
#[derive(Debug)]
pub struct RestoreRoleRequest {
    pub expected: RestoreRole,
    pub reply: ReplyPromise<RestoreRoleReply>,
}

impl RestoreRoleRequest {
    pub fn new(expected: RestoreRole, reply: ReplyPromise<RestoreRoleReply>) -> Self {
        Self { expected, reply }
    }
}

impl Message for RestoreRoleRequest {}

impl TimedRequest for RestoreRoleRequest {
    type Reply = RestoreRoleReply;

    fn reply(&self) -> &ReplyPromise<RestoreRoleReply> {
        &self.reply
    }
}

impl WireMessage for RestoreRoleRequest {
    const FILE_IDENTIFIER: FileIdentifier = 13018413;

    fn encode_payload(&self, writer: &mut WireWriter) {
        self.reply.endpoint.encode(writer);
        writer.put_role(self.expected);
    }

    fn decode_payload(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let endpoint = ReplyEndpoint::decode(reader)?;
        let expected = reader.get_role()?;
        Ok(Self::new(expected, ReplyPromise::new(endpoint)))
    }
}

impl Display for RestoreRoleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RestoreRoleRequest expected:{}", self.expected)
    }
}
