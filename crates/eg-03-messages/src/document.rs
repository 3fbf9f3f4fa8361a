//! # Binary Document
//!
//! Schema-less key/value tree used for both message regions.

use crate::MessageError;
use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deepest nesting of lists and documents accepted on decode. The top-level
/// document is depth 0.
pub const MAX_DEPTH: usize = 32;

/// Ordered key/value map. Ordering makes the encoding canonical.
pub type Document = BTreeMap<String, Value>;

/// A document value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Doc(Document),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_doc(&self) -> Option<&Document> {
        match self {
            Value::Doc(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Doc(v)
    }
}

// Decoding tracks nesting depth so hostile frames cannot exhaust the stack.
// Variant indices follow the declaration order of `Value`.

const VARIANTS: &[&str] = &["Bool", "Int", "Str", "Bytes", "List", "Doc"];

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ValueSeed { depth: 1 }.deserialize(deserializer)
    }
}

#[derive(Clone, Copy)]
struct ValueSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        if self.depth > MAX_DEPTH {
            return Err(de::Error::custom(format!(
                "document nested deeper than {MAX_DEPTH}"
            )));
        }
        deserializer.deserialize_enum("Value", VARIANTS, self)
    }
}

impl<'de> Visitor<'de> for ValueSeed {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a document value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Value, A::Error> {
        let (index, variant) = data.variant::<u32>()?;
        match index {
            0 => variant.newtype_variant().map(Value::Bool),
            1 => variant.newtype_variant().map(Value::Int),
            2 => variant.newtype_variant().map(Value::Str),
            3 => variant.newtype_variant().map(Value::Bytes),
            4 => variant
                .newtype_variant_seed(ListSeed { depth: self.depth })
                .map(Value::List),
            5 => variant
                .newtype_variant_seed(DocSeed { depth: self.depth })
                .map(Value::Doc),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Unsigned(u64::from(other)),
                &"variant index 0 <= i < 6",
            )),
        }
    }
}

/// Elements of a list held at `depth`.
struct ListSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for ListSeed {
    type Value = Vec<Value>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Vec<Value>, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ListSeed {
    type Value = Vec<Value>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of values")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<Value>, A::Error> {
        let element = ValueSeed {
            depth: self.depth + 1,
        };
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(value) = seq.next_element_seed(element)? {
            out.push(value);
        }
        Ok(out)
    }
}

/// Entries of a document held at `depth`.
struct DocSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for DocSeed {
    type Value = Document;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Document, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for DocSeed {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let entry = ValueSeed {
            depth: self.depth + 1,
        };
        let mut doc = Document::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(entry)?;
            doc.insert(key, value);
        }
        Ok(doc)
    }
}

/// Encode a document to its canonical bytes.
pub fn encode_document(doc: &Document) -> Result<Vec<u8>, MessageError> {
    Ok(bincode::serialize(doc)?)
}

/// Decode a document. Trailing bytes and nesting past [`MAX_DEPTH`] are
/// rejected.
pub fn decode_document(bytes: &[u8]) -> Result<Document, MessageError> {
    use bincode::Options;

    let options = bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes();
    Ok(options.deserialize_seed(DocSeed { depth: 0 }, bytes)?)
}
