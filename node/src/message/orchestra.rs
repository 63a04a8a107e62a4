//! Orchestrator protocol messages, grounded on the Go original's
//! `msgs/orchestra` package: status reporting, and the processing/sending
//! trigger and completion notifications that drive synchronous mode.
//!
//! All of these carry the shared [`Header`] and are always JSON-encoded —
//! they are control-plane traffic between a node and its orchestrator, not
//! user data, so no other representation is registered for them.

use crate::error::{NodeError, NodeResult};
use crate::message::{insert_entry, Message, MessageTypeEntry, Representation};
use serde::{Deserialize, Serialize};
use shared::Header;
use std::collections::HashMap;

pub(crate) fn register_all(map: &mut HashMap<String, MessageTypeEntry>) {
    insert_entry(map, "orchestra/StatusRequest", vec![Representation::Json], || {
        Box::new(StatusRequestMessage::default())
    });
    insert_entry(map, "orchestra/StatusReport", vec![Representation::Json], || {
        Box::new(StatusReportMessage::default())
    });
    insert_entry(map, "orchestra/ReceiveAndProcess", vec![Representation::Json], || {
        Box::new(ReceiveAndProcessMessage::default())
    });
    insert_entry(map, "orchestra/ProcessingCompleted", vec![Representation::Json], || {
        Box::new(ProcessingCompletedMessage::default())
    });
    insert_entry(map, "orchestra/SendResults", vec![Representation::Json], || {
        Box::new(SendResultsMessage::default())
    });
    insert_entry(map, "orchestra/SendingCompleted", vec![Representation::Json], || {
        Box::new(SendingCompletedMessage::default())
    });
}

fn json_only_error(type_name: &str, representation: Representation) -> NodeError {
    NodeError::UnsupportedRepresentation {
        type_name: type_name.to_string(),
        representation: representation.to_string(),
    }
}

macro_rules! json_only_message {
    ($name:ident, $type_name:expr) => {
        impl Message for $name {
            fn type_name(&self) -> &'static str {
                $type_name
            }

            fn header(&self) -> &Header {
                &self.header
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn encode(&self, representation: Representation) -> NodeResult<Vec<u8>> {
                match representation {
                    Representation::Json => Ok(serde_json::to_vec(self)?),
                    other => Err(json_only_error($type_name, other)),
                }
            }

            fn decode(&mut self, representation: Representation, bytes: &[u8]) -> NodeResult<()> {
                match representation {
                    Representation::Json => {
                        *self = serde_json::from_slice(bytes).map_err(|source| NodeError::Decode {
                            port: $type_name.to_string(),
                            source,
                        })?;
                        Ok(())
                    }
                    other => Err(json_only_error($type_name, other)),
                }
            }
        }
    };
}

/// A channel binding: a name plus its transport kind (always `"TOPIC"` for
/// the broker transport this runtime targets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub channel_type: String,
}

impl Channel {
    pub fn topic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel_type: "TOPIC".to_string(),
        }
    }
}

/// One port's description as reported to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub message_type: String,
    #[serde(rename = "Representation")]
    pub representation: String,
    #[serde(rename = "Channel")]
    pub channel: Channel,
}

/// The node's full port list, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReportPorts {
    #[serde(rename = "In")]
    pub inputs: Vec<Port>,
    #[serde(rename = "Out")]
    pub outputs: Vec<Port>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReportBody {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub node_type: String,
    #[serde(rename = "Ports")]
    pub ports: StatusReportPorts,
    #[serde(rename = "Synchronization")]
    pub synchronization: String,
    #[serde(rename = "SpecsURL")]
    pub specs_url: String,
}

/// Published by a node's status responder in reply to `orchestra/StatusRequest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReportMessage {
    #[serde(rename = "Header")]
    pub header: Header,
    #[serde(rename = "Body")]
    pub body: StatusReportBody,
}

impl StatusReportMessage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node_name: impl Into<String>,
        node_type: impl Into<String>,
        ports: StatusReportPorts,
        synchronization: impl Into<String>,
        specs_url: impl Into<String>,
    ) -> Self {
        Self {
            header: Header::now(),
            body: StatusReportBody {
                name: node_name.into(),
                node_type: node_type.into(),
                ports,
                synchronization: synchronization.into(),
                specs_url: specs_url.into(),
            },
        }
    }
}

/// Body carried by the processing/sending completion notifications: just
/// the name of the node that finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeNameBody {
    #[serde(rename = "Data")]
    pub data: String,
}

/// Sent by the orchestrator to request a fresh [`StatusReportMessage`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusRequestMessage {
    #[serde(rename = "Header")]
    pub header: Header,
}

/// Sent by the orchestrator in synchronous mode: process the current
/// inputs snapshot now.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiveAndProcessMessage {
    #[serde(rename = "Header")]
    pub header: Header,
}

/// Published by a node's input receiver once it has forwarded a snapshot
/// to the processor, in synchronous mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingCompletedMessage {
    #[serde(rename = "Header")]
    pub header: Header,
    #[serde(rename = "Body")]
    pub body: NodeNameBody,
}

impl ProcessingCompletedMessage {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            header: Header::now(),
            body: NodeNameBody { data: node_name.into() },
        }
    }
}

/// Sent by the orchestrator in synchronous mode: publish the outputs
/// buffered since the last `send-results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendResultsMessage {
    #[serde(rename = "Header")]
    pub header: Header,
}

/// Published by a node's output sender once it has published the buffered
/// outputs, in synchronous mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendingCompletedMessage {
    #[serde(rename = "Header")]
    pub header: Header,
    #[serde(rename = "Body")]
    pub body: NodeNameBody,
}

impl SendingCompletedMessage {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            header: Header::now(),
            body: NodeNameBody { data: node_name.into() },
        }
    }
}

json_only_message!(StatusRequestMessage, "orchestra/StatusRequest");
json_only_message!(StatusReportMessage, "orchestra/StatusReport");
json_only_message!(ReceiveAndProcessMessage, "orchestra/ReceiveAndProcess");
json_only_message!(ProcessingCompletedMessage, "orchestra/ProcessingCompleted");
json_only_message!(SendResultsMessage, "orchestra/SendResults");
json_only_message!(SendingCompletedMessage, "orchestra/SendingCompleted");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_report_uses_pascal_case_wire_fields() {
        let msg = StatusReportMessage::new(
            "demo",
            "inverter",
            StatusReportPorts {
                inputs: vec![Port {
                    name: "in1".into(),
                    message_type: "base/Bool".into(),
                    representation: "application/json".into(),
                    channel: Channel::topic("in1-channel"),
                }],
                outputs: vec![],
            },
            "async",
            "https://specs.example/inverter",
        );
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""Header""#));
        assert!(json.contains(r#""Body""#));
        assert!(json.contains(r#""Name":"demo""#));
        assert!(json.contains(r#""Channel""#));
        assert!(json.contains(r#""Type":"TOPIC""#));
        assert!(json.contains(r#""Synchronization":"async""#));
        assert!(json.contains(r#""SpecsURL":"https://specs.example/inverter""#));
    }

    #[test]
    fn processing_completed_round_trips() {
        let mut msg = ProcessingCompletedMessage::default();
        let original = ProcessingCompletedMessage::new("worker-1");
        let bytes = original.encode(Representation::Json).unwrap();
        msg.decode(Representation::Json, &bytes).unwrap();
        assert_eq!(msg.body.data, "worker-1");
    }
}
