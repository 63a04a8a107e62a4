//! Base message types: small, self-contained value types with no
//! orchestrator-specific meaning, grounded on the Go original's `msgs/base`
//! package (`Bool`, `Bytes`, `Float`, plus a catch-all `Any` for opaque
//! JSON payloads).

mod any;
mod bool_msg;
mod bytes;
mod float;

pub use any::AnyMessage;
pub use bool_msg::BoolMessage;
pub use bytes::BytesMessage;
pub use float::FloatMessage;

use super::{insert_entry, MessageTypeEntry, Representation};
use std::collections::HashMap;

pub(crate) fn register_all(map: &mut HashMap<String, MessageTypeEntry>) {
    insert_entry(
        map,
        "base/Bool",
        vec![Representation::Json, Representation::Text],
        || Box::new(BoolMessage::default()),
    );
    insert_entry(
        map,
        "base/Bytes",
        vec![Representation::Json, Representation::Octet],
        || Box::new(BytesMessage::default()),
    );
    insert_entry(
        map,
        "base/Float",
        vec![Representation::Json, Representation::Text],
        || Box::new(FloatMessage::default()),
    );
    insert_entry(
        map,
        "base/Any",
        vec![Representation::Json],
        || Box::new(AnyMessage::default()),
    );
}
