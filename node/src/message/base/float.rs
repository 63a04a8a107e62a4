use crate::error::{NodeError, NodeResult};
use crate::message::{Envelope, Message, Representation};
use shared::Header;

/// A single 64-bit float value, registered as `base/Float`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatMessage {
    pub header: Header,
    pub value: f64,
}

impl FloatMessage {
    pub fn new(value: f64) -> Self {
        Self {
            header: Header::now(),
            value,
        }
    }
}

impl Message for FloatMessage {
    fn type_name(&self) -> &'static str {
        "base/Float"
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn encode(&self, representation: Representation) -> NodeResult<Vec<u8>> {
        match representation {
            Representation::Json => Ok(serde_json::to_vec(&Envelope::new(self.header.clone(), self.value))?),
            Representation::Text => Ok(self.value.to_string().into_bytes()),
            Representation::Octet => Err(NodeError::UnsupportedRepresentation {
                type_name: self.type_name().to_string(),
                representation: representation.to_string(),
            }),
        }
    }

    fn decode(&mut self, representation: Representation, bytes: &[u8]) -> NodeResult<()> {
        match representation {
            Representation::Json => {
                let envelope: Envelope<f64> = serde_json::from_slice(bytes).map_err(|source| NodeError::Decode {
                    port: self.type_name().to_string(),
                    source,
                })?;
                self.header = envelope.header;
                self.value = envelope.body.data;
                Ok(())
            }
            Representation::Text => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| NodeError::Encode(format!("invalid utf-8: {e}")))?;
                self.value = text
                    .trim()
                    .parse()
                    .map_err(|e| NodeError::Encode(format!("invalid float '{text}': {e}")))?;
                self.header = Header::now();
                Ok(())
            }
            Representation::Octet => Err(NodeError::UnsupportedRepresentation {
                type_name: self.type_name().to_string(),
                representation: representation.to_string(),
            }),
        }
    }
}
