use crate::error::{NodeError, NodeResult};
use crate::message::{Envelope, Message, Representation};
use shared::Header;

/// A single boolean value, registered as `base/Bool`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolMessage {
    pub header: Header,
    pub value: bool,
}

impl BoolMessage {
    pub fn new(value: bool) -> Self {
        Self {
            header: Header::now(),
            value,
        }
    }
}

impl Message for BoolMessage {
    fn type_name(&self) -> &'static str {
        "base/Bool"
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
                let envelope: Envelope<bool> = serde_json::from_slice(bytes).map_err(|source| NodeError::Decode {
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
                    .map_err(|e| NodeError::Encode(format!("invalid bool '{text}': {e}")))?;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let original = BoolMessage::new(true);
        let bytes = original.encode(Representation::Json).unwrap();
        let mut decoded = BoolMessage::default();
        decoded.decode(Representation::Json, &bytes).unwrap();
        assert_eq!(original.value, decoded.value);
    }

    #[test]
    fn json_wire_shape_carries_header_and_body_data() {
        let original = BoolMessage::new(true);
        let bytes = original.encode(Representation::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value.get("Header").is_some());
        assert_eq!(value["Body"]["Data"], serde_json::json!(true));
    }

    #[test]
    fn decodes_the_documented_envelope_without_a_header() {
        let mut decoded = BoolMessage::default();
        decoded.decode(Representation::Json, br#"{"Body":{"Data":true}}"#).unwrap();
        assert!(decoded.value);
    }

    #[test]
    fn round_trips_through_text() {
        let original = BoolMessage::new(false);
        let bytes = original.encode(Representation::Text).unwrap();
        assert_eq!(bytes, b"false");
        let mut decoded = BoolMessage::default();
        decoded.decode(Representation::Text, &bytes).unwrap();
        assert_eq!(original.value, decoded.value);
    }

    #[test]
    fn octet_stream_is_unsupported() {
        let msg = BoolMessage::default();
        assert!(msg.encode(Representation::Octet).is_err());
    }
}
