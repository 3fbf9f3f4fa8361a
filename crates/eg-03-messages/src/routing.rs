//! # Routing Header
//!
//! Per-hop relay metadata. Replaced wholesale at every hop, never edited.

use crate::{Document, MessageError, Value};
use eg_01_elastic_grid::{Elastic3D, ElasticLayout};
use shared_crypto::{RecoverableSignature, SIGNATURE_BYTES};
use shared_types::{Address, Hash};

pub(crate) const ROUTES: &str = "routes";

const TTL: &str = "ttl";
const TO: &str = "to";
const LAYOUT: &str = "layout";
const ROUTER: &str = "router";
const ROUTER_SIG: &str = "routerSig";

/// Routing metadata of a message in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingHeader {
    /// Axis round: 3 = Z, 2 = Y, 1 = X.
    pub ttl: u8,
    /// Destination region.
    pub to: Elastic3D,
    /// Layout in force for this broadcast.
    pub layout: ElasticLayout,
    /// Node that produced this hop.
    pub router: Address,
    /// Router's signature over the body hash.
    pub router_signature: RecoverableSignature,
}

impl RoutingHeader {
    /// True when `router_signature` recovers to `router` over `body_hash`.
    pub fn verify(&self, body_hash: &Hash) -> bool {
        self.router_signature.verify(body_hash, &self.router)
    }

    pub(crate) fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(TTL.into(), Value::from(self.ttl));
        doc.insert(TO.into(), Value::from(self.to.to_bytes().to_vec()));
        doc.insert(LAYOUT.into(), Value::from(self.layout.to_bytes().to_vec()));
        doc.insert(ROUTER.into(), Value::from(self.router.to_checksum_hex()));
        doc.insert(ROUTER_SIG.into(), Value::from(self.router_signature.to_vec()));
        doc
    }

    pub(crate) fn from_document(doc: &Document) -> Result<Self, MessageError> {
        let ttl = doc
            .get(TTL)
            .ok_or(MessageError::MissingField(TTL))?
            .as_int()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| invalid(TTL, "expected integer in 0..=255"))?;

        let to = Elastic3D::from_bytes(bytes_field(doc, TO)?)?;
        let layout = ElasticLayout::from_bytes(bytes_field(doc, LAYOUT)?)?;

        let router = doc
            .get(ROUTER)
            .ok_or(MessageError::MissingField(ROUTER))?
            .as_str()
            .ok_or_else(|| invalid(ROUTER, "expected hex string"))?;
        let router = Address::from_hex(router)?;

        let signature = bytes_field(doc, ROUTER_SIG)?;
        if signature.len() != SIGNATURE_BYTES {
            return Err(invalid(ROUTER_SIG, "expected 65 bytes"));
        }
        let router_signature = RecoverableSignature::from_slice(signature)?;

        Ok(Self {
            ttl,
            to,
            layout,
            router,
            router_signature,
        })
    }
}

fn bytes_field<'a>(doc: &'a Document, field: &'static str) -> Result<&'a [u8], MessageError> {
    doc.get(field)
        .ok_or(MessageError::MissingField(field))?
        .as_bytes()
        .ok_or_else(|| invalid(field, "expected bytes"))
}

fn invalid(field: &'static str, reason: &str) -> MessageError {
    MessageError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}
