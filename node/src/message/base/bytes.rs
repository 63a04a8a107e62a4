use crate::error::{NodeError, NodeResult};
use crate::message::{Envelope, Message, Representation};
use shared::Header;

/// An opaque byte buffer, registered as `base/Bytes`.
///
/// Grounded on the original's `msgs/base/bytes.go`: the JSON representation
/// wraps the buffer in the `{Header, Body:{Data: ...}}` envelope every
/// message on this protocol uses (serde's usual base64 treatment of
/// `Vec<u8>` for the `Data` field); the octet-stream representation carries
/// the raw bytes unwrapped, with no envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BytesMessage {
    pub header: Header,
    pub value: Vec<u8>,
}

impl BytesMessage {
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            header: Header::now(),
            value,
        }
    }
}

impl Message for BytesMessage {
    fn type_name(&self) -> &'static str {
        "base/Bytes"
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
            Representation::Octet => Ok(self.value.clone()),
            Representation::Text => Err(NodeError::UnsupportedRepresentation {
                type_name: self.type_name().to_string(),
                representation: representation.to_string(),
            }),
        }
    }

    fn decode(&mut self, representation: Representation, bytes: &[u8]) -> NodeResult<()> {
        match representation {
            Representation::Json => {
                let envelope: Envelope<Vec<u8>> = serde_json::from_slice(bytes).map_err(|source| NodeError::Decode {
                    port: self.type_name().to_string(),
                    source,
                })?;
                self.header = envelope.header;
                self.value = envelope.body.data;
                Ok(())
            }
            Representation::Octet => {
                self.value = bytes.to_vec();
                self.header = Header::now();
                Ok(())
            }
            Representation::Text => Err(NodeError::UnsupportedRepresentation {
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
    fn round_trips_through_octet_stream() {
        let original = BytesMessage::new(vec![1, 2, 3, 255]);
        let bytes = original.encode(Representation::Octet).unwrap();
        let mut decoded = BytesMessage::default();
        decoded.decode(Representation::Octet, &bytes).unwrap();
        assert_eq!(original.value, decoded.value);
    }

    #[test]
    fn round_trips_through_json() {
        let original = BytesMessage::new(vec![9, 9, 9]);
        let bytes = original.encode(Representation::Json).unwrap();
        let mut decoded = BytesMessage::default();
        decoded.decode(Representation::Json, &bytes).unwrap();
        assert_eq!(original.value, decoded.value);
    }

    #[test]
    fn json_wire_shape_carries_header_and_body_data() {
        let original = BytesMessage::new(vec![1, 2, 3]);
        let bytes = original.encode(Representation::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value.get("Header").is_some());
        assert!(value["Body"]["Data"].is_string());
    }
}
