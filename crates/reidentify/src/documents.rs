//! Schema-less document helpers.
//!
//! Records are kept as plain BSON documents so every field survives a move between
//! collections untouched. Only the `_id` gets a typed view; everything else is rendered
//! to JSON on the way out.

use std::fmt;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value};

pub use mongodb::bson::doc;

/// Key under which the store keeps a document's identifier.
pub const ID_FIELD: &str = "_id";

/// Identifier of a request document, as assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub ObjectId);

impl RequestId {
    /// Parse a path segment. Returns `None` for anything that is not a 24-digit hex id.
    pub fn parse(raw: &str) -> Option<Self> {
        ObjectId::parse_str(raw).ok().map(Self)
    }

    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Read the identifier of a stored document.
    pub fn of(document: &Document) -> Option<Self> {
        document.get_object_id(ID_FIELD).ok().map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Render a document the way API clients expect it: ids as hex strings, dates as RFC 3339.
pub fn to_json(document: Document) -> Value {
    let mut object = Map::with_capacity(document.len());
    for (key, value) in document {
        object.insert(key, bson_to_json(value));
    }
    Value::Object(object)
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(date) => match date.try_to_rfc3339_string() {
            Ok(formatted) => Value::String(formatted),
            Err(_) => Bson::DateTime(date).into_relaxed_extjson(),
        },
        Bson::Document(nested) => to_json(nested),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
