use crate::error::{NodeError, NodeResult};
use crate::message::{Envelope, Message, Representation};
use shared::Header;

/// A catch-all payload holding arbitrary JSON, registered as `base/Any`.
///
/// Used for ports whose producers and consumers agree on a shape out of
/// band, or for demo/test wiring that does not need a dedicated type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnyMessage {
    pub header: Header,
    pub value: serde_json::Value,
}

impl AnyMessage {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            header: Header::now(),
            value,
        }
    }
}

impl Message for AnyMessage {
    fn type_name(&self) -> &'static str {
        "base/Any"
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn encode(&self, representation: Representation) -> NodeResult<Vec<u8>> {
        match representation {
            Representation::Json => Ok(serde_json::to_vec(&Envelope::new(self.header.clone(), self.value.clone()))?),
            other => Err(NodeError::UnsupportedRepresentation {
                type_name: self.type_name().to_string(),
                representation: other.to_string(),
            }),
        }
    }

    fn decode(&mut self, representation: Representation, bytes: &[u8]) -> NodeResult<()> {
        match representation {
            Representation::Json => {
                let envelope: Envelope<serde_json::Value> = serde_json::from_slice(bytes).map_err(|source| NodeError::Decode {
                    port: self.type_name().to_string(),
                    source,
                })?;
                self.header = envelope.header;
                self.value = envelope.body.data;
                Ok(())
            }
            other => Err(NodeError::UnsupportedRepresentation {
                type_name: self.type_name().to_string(),
                representation: other.to_string(),
            }),
        }
    }
}
