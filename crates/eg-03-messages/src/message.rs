//! # Message Envelope
//!
//! An immutable, author-signed body plus an optional routing header.
//!
//! ## Invariants
//!
//! - The body is shared (`Arc`) between every clone and relay copy of a
//!   message and is never mutated after `build`.
//! - `body_hash` is computed once, from the canonical body encoding.
//! - `route_to` returns a new message; the receiver is left untouched.

use crate::routing::ROUTES;
use crate::{
    decode_document, encode_document, Document, MessageError, RoutingHeader, Value,
    MESSAGE_VERSION,
};
use eg_01_elastic_grid::{Elastic3D, ElasticLayout};
use shared_crypto::{keccak256, NodeKey, RecoverableSignature};
use shared_types::{Address, Hash};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// Top-level regions.
const HEADER: &str = "header";
const BODY: &str = "body";

// Reserved header fields.
const VERSION: &str = "_ver";
const SIGNATURE: &str = "_signature";

// Reserved body fields.
const SENDER: &str = "_sender";
const TIMESTAMP: &str = "_timestamp";

/// Application action field.
pub const ACTION: &str = "action";

/// Ticks (100 ns) between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// A signed message, optionally mid-route.
#[derive(Clone, Debug)]
pub struct Message {
    body: Arc<Document>,
    body_hash: Hash,
    signature: RecoverableSignature,
    version: String,
    headers: Document,
    routing: Option<RoutingHeader>,
}

impl Message {
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Decode a message from its wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let mut root = decode_document(bytes)?;

        let mut headers = take_doc(&mut root, HEADER)?;
        let body = take_doc(&mut root, BODY)?;

        let version = match headers.remove(VERSION) {
            Some(Value::Str(v)) => v,
            Some(_) => return Err(invalid(VERSION, "expected string")),
            None => return Err(MessageError::MissingField(VERSION)),
        };

        let signature = match headers.remove(SIGNATURE) {
            Some(Value::Bytes(v)) => RecoverableSignature::from_slice(&v)?,
            Some(_) => return Err(invalid(SIGNATURE, "expected bytes")),
            None => return Err(MessageError::MissingField(SIGNATURE)),
        };

        let routing = match headers.remove(ROUTES) {
            Some(Value::Doc(doc)) => Some(RoutingHeader::from_document(&doc)?),
            Some(_) => return Err(invalid(ROUTES, "expected document")),
            None => None,
        };

        let body_hash = keccak256(&encode_document(&body)?);

        Ok(Self {
            body: Arc::new(body),
            body_hash,
            signature,
            version,
            headers,
            routing,
        })
    }

    /// Encode to wire form.
    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        let mut header = self.headers.clone();
        header.insert(VERSION.into(), Value::from(self.version.as_str()));
        header.insert(SIGNATURE.into(), Value::from(self.signature.to_vec()));
        if let Some(routing) = &self.routing {
            header.insert(ROUTES.into(), Value::from(routing.to_document()));
        }

        let mut root = Document::new();
        root.insert(HEADER.into(), Value::Doc(header));
        root.insert(BODY.into(), Value::Doc(self.body.as_ref().clone()));
        encode_document(&root)
    }

    /// Hex of the body hash; identifies the logical message across hops.
    pub fn id(&self) -> String {
        hex::encode(self.body_hash)
    }

    pub fn body_hash(&self) -> &Hash {
        &self.body_hash
    }

    /// keccak256 of the full encoded message (changes per hop).
    pub fn hash(&self) -> Result<Hash, MessageError> {
        Ok(keccak256(&self.encode()?))
    }

    /// Size of the encoded message in bytes.
    pub fn encoded_len(&self) -> Result<usize, MessageError> {
        Ok(self.encode()?.len())
    }

    pub fn body(&self) -> &Document {
        &self.body
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// Application header field (reserved fields are not visible here).
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name)
    }

    pub fn action(&self) -> Option<&str> {
        self.value(ACTION).and_then(Value::as_str)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `_timestamp` in 100 ns ticks since 0001-01-01 UTC.
    pub fn timestamp(&self) -> Option<i64> {
        self.value(TIMESTAMP).and_then(Value::as_int)
    }

    pub fn signature(&self) -> &RecoverableSignature {
        &self.signature
    }

    /// Address recovered from the author signature.
    pub fn sender(&self) -> Result<Address, MessageError> {
        Ok(self.signature.recover(&self.body_hash)?)
    }

    /// Address written in `_sender`.
    pub fn claimed_sender(&self) -> Result<Address, MessageError> {
        let hex = self
            .value(SENDER)
            .ok_or(MessageError::MissingField(SENDER))?
            .as_str()
            .ok_or_else(|| invalid(SENDER, "expected hex string"))?;
        Ok(Address::from_hex(hex)?)
    }

    /// True when the author signature recovers to `expected`.
    pub fn verify(&self, expected: &Address) -> bool {
        self.signature.verify(&self.body_hash, expected)
    }

    /// True when the author signature recovers to the claimed `_sender`.
    pub fn verify_self(&self) -> bool {
        match self.claimed_sender() {
            Ok(claimed) => self.verify(&claimed),
            Err(_) => false,
        }
    }

    pub fn routing(&self) -> Option<&RoutingHeader> {
        self.routing.as_ref()
    }

    /// True while a routing header with `ttl > 0` is attached.
    pub fn should_route(&self) -> bool {
        matches!(&self.routing, Some(routing) if routing.ttl > 0)
    }

    /// Copy of this message re-stamped for one relay hop, attested by `router`.
    pub fn route_to(
        &self,
        ttl: u8,
        to: Elastic3D,
        layout: ElasticLayout,
        router: &NodeKey,
    ) -> Result<Message, MessageError> {
        let routing = RoutingHeader {
            ttl,
            to,
            layout,
            router: router.address(),
            router_signature: router.sign(&self.body_hash)?,
        };

        Ok(Message {
            routing: Some(routing),
            ..self.clone()
        })
    }

    /// True when a routing header is attached and its signature recovers to
    /// its claimed router.
    pub fn verify_router(&self) -> bool {
        self.routing
            .as_ref()
            .is_some_and(|routing| routing.verify(&self.body_hash))
    }
}

/// Builder for author-signed messages.
#[derive(Clone, Debug, Default)]
pub struct MessageBuilder {
    body: Document,
    headers: Document,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `action` body field.
    pub fn action(self, name: &str) -> Self {
        self.body(ACTION, name)
    }

    pub fn body(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.body.insert(name.to_string(), value.into());
        self
    }

    /// Attach an application header field. Headers are not signed.
    pub fn header(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// Stamp timestamp and sender, then sign the body with `key`.
    pub fn build(self, key: &NodeKey) -> Result<Message, MessageError> {
        let mut body = self.body;
        body.insert(TIMESTAMP.into(), Value::Int(now_ticks()));
        body.insert(SENDER.into(), Value::from(key.address().to_checksum_hex()));

        let mut headers = self.headers;
        for reserved in [VERSION, SIGNATURE, ROUTES] {
            headers.remove(reserved);
        }

        let body_hash = keccak256(&encode_document(&body)?);
        let signature = key.sign(&body_hash)?;

        Ok(Message {
            body: Arc::new(body),
            body_hash,
            signature,
            version: MESSAGE_VERSION.to_string(),
            headers,
            routing: None,
        })
    }
}

fn now_ticks() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    (nanos / 100) as i64 + UNIX_EPOCH_TICKS
}

fn take_doc(root: &mut Document, field: &'static str) -> Result<Document, MessageError> {
    match root.remove(field) {
        Some(Value::Doc(doc)) => Ok(doc),
        Some(_) => Err(invalid(field, "expected document")),
        None => Err(MessageError::MissingField(field)),
    }
}

fn invalid(field: &'static str, reason: &str) -> MessageError {
    MessageError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}
