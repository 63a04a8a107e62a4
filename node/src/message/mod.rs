//! The message-type / representation registry and the `Message` trait.
//!
//! Mirrors the Go original's `msgs` package: each message type registers its
//! supported wire representations and a factory for its default value once,
//! at process startup (there the registration happens via package-level
//! `init()` functions; here it happens once, lazily, the first time the
//! registry is touched — see [`REGISTRY`]).

pub mod base;
pub mod orchestra;

use crate::error::{NodeError, NodeResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use shared::Header;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Wire encoding of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    Json,
    Text,
    Octet,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::Json => "application/json",
            Representation::Text => "text/plain",
            Representation::Octet => "application/octet-stream",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Representation {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application/json" => Ok(Representation::Json),
            "text/plain" => Ok(Representation::Text),
            "application/octet-stream" => Ok(Representation::Octet),
            other => Err(NodeError::Config(format!("unknown representation '{other}'"))),
        }
    }
}

impl serde::Serialize for Representation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Representation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A value with a type name, a header, and a body; decodable and encodable
/// under any of the representations its type supports.
pub trait Message: std::fmt::Debug + Send + Sync + std::any::Any {
    /// The registered type name of this message, e.g. `"base/Bool"`.
    fn type_name(&self) -> &'static str;

    /// The timestamp carried by this message's most recent encode/decode.
    fn header(&self) -> &Header;

    /// Encode the message body in the given representation.
    fn encode(&self, representation: Representation) -> NodeResult<Vec<u8>>;

    /// Decode `bytes` in the given representation into this message,
    /// replacing its current value.
    fn decode(&mut self, representation: Representation, bytes: &[u8]) -> NodeResult<()>;

    /// Borrow as `Any`, so a processor that knows a port's concrete message
    /// type can downcast to it instead of round-tripping through bytes.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// The `{"Header": ..., "Body": {"Data": ...}}` wire envelope every JSON
/// representation of a base message type is wrapped in, matching the
/// envelope `orchestra`'s messages already use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "Header", default)]
    pub header: Header,
    #[serde(rename = "Body")]
    pub body: EnvelopeBody<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EnvelopeBody<T> {
    #[serde(rename = "Data")]
    pub data: T,
}

impl<T> Envelope<T> {
    pub(crate) fn new(header: Header, data: T) -> Self {
        Self {
            header,
            body: EnvelopeBody { data },
        }
    }
}

/// Factory producing a fresh, default-valued message of one registered type.
pub type MessageFactory = fn() -> Box<dyn Message>;

pub(crate) struct MessageTypeEntry {
    representations: Vec<Representation>,
    factory: MessageFactory,
}

static REGISTRY: Lazy<RwLock<HashMap<String, MessageTypeEntry>>> = Lazy::new(|| {
    let mut map = HashMap::new();
    base::register_all(&mut map);
    orchestra::register_all(&mut map);
    RwLock::new(map)
});

pub(crate) fn insert_entry(map: &mut HashMap<String, MessageTypeEntry>, type_name: &str, representations: Vec<Representation>, factory: MessageFactory) {
    map.insert(type_name.to_string(), MessageTypeEntry { representations, factory });
}

/// Register a new message type. Registration is additive only — the
/// registry never removes entries, and the runtime expects this to happen
/// once at startup (re-registering the same name overwrites the prior
/// entry, it does not error, matching the "side-effect-free after first
/// use" guidance).
pub fn register_message_type(type_name: &str, representations: Vec<Representation>, factory: MessageFactory) {
    let mut registry = REGISTRY.write().expect("message registry lock poisoned");
    insert_entry(&mut registry, type_name, representations, factory);
}

/// Whether `type_name` has been registered.
pub fn is_registered(type_name: &str) -> bool {
    REGISTRY.read().expect("message registry lock poisoned").contains_key(type_name)
}

/// Whether `type_name` supports `representation`.
pub fn supports_representation(type_name: &str, representation: Representation) -> bool {
    REGISTRY
        .read()
        .expect("message registry lock poisoned")
        .get(type_name)
        .map(|entry| entry.representations.contains(&representation))
        .unwrap_or(false)
}

/// Construct a fresh, default-valued message of the given registered type.
pub fn default_message(type_name: &str) -> NodeResult<Box<dyn Message>> {
    let registry = REGISTRY.read().expect("message registry lock poisoned");
    let entry = registry
        .get(type_name)
        .ok_or_else(|| NodeError::UnknownMessageType(type_name.to_string()))?;
    Ok((entry.factory)())
}
