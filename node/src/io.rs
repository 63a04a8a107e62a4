//! Port descriptors and the shared input/output state a node's components
//! communicate through.
//!
//! `Inputs` is the reader/writer-locked snapshot every input port writes
//! into and the processor reads from (see the concurrency model: a single
//! writer decodes one port at a time, the processor takes a read lock for
//! the duration of one processing cycle). `Outputs` is the per-cycle
//! buffer the processor fills and the output sender drains.

use crate::error::{NodeError, NodeResult};
use crate::message::{default_message, Message, Representation};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};

/// Static description of one port, as configured for this node.
#[derive(Debug, Clone, PartialEq)]
pub struct PortDescriptor {
    pub name: String,
    pub message_type: String,
    pub representation: Representation,
    pub channel: String,
}

/// The node's input snapshot: one decoded message per input port, kept
/// behind a single reader/writer lock so the processor always sees a
/// consistent view across all ports.
pub struct Inputs {
    descriptors: HashMap<String, PortDescriptor>,
    state: RwLock<HashMap<String, Box<dyn Message>>>,
}

impl Inputs {
    /// Build a fresh snapshot with every port initialized to its message
    /// type's default value.
    pub fn new(descriptors: Vec<PortDescriptor>) -> NodeResult<Self> {
        let mut state = HashMap::with_capacity(descriptors.len());
        let mut by_name = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let message = default_message(&descriptor.message_type)?;
            state.insert(descriptor.name.clone(), message);
            by_name.insert(descriptor.name.clone(), descriptor);
        }
        Ok(Self {
            descriptors: by_name,
            state: RwLock::new(state),
        })
    }

    pub fn descriptor(&self, port: &str) -> NodeResult<&PortDescriptor> {
        self.descriptors
            .get(port)
            .ok_or_else(|| NodeError::UnknownPort(port.to_string()))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &PortDescriptor> {
        self.descriptors.values()
    }

    /// Decode `bytes` into the port's stored message, replacing its value.
    pub async fn set_message(&self, port: &str, representation: Representation, bytes: &[u8]) -> NodeResult<()> {
        self.descriptor(port)?;
        let mut guard = self.state.write().await;
        let message = guard
            .get_mut(port)
            .ok_or_else(|| NodeError::UnknownPort(port.to_string()))?;
        message.decode(representation, bytes)
    }

    /// Take a read lock on the whole snapshot, for the duration of one
    /// processing cycle.
    pub async fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Box<dyn Message>>> {
        self.state.read().await
    }

    /// Reset every port back to its message type's default value.
    pub async fn reset(&self) -> NodeResult<()> {
        let mut guard = self.state.write().await;
        for (name, descriptor) in &self.descriptors {
            let fresh = default_message(&descriptor.message_type)?;
            guard.insert(name.clone(), fresh);
        }
        Ok(())
    }

    /// Build a fresh, default-valued snapshot matching this node's
    /// configured input ports, for a caller to fill in and hand back to
    /// [`Inputs::replace`].
    pub fn fresh_snapshot(&self) -> NodeResult<HashMap<String, Box<dyn Message>>> {
        let mut snapshot = HashMap::with_capacity(self.descriptors.len());
        for (name, descriptor) in &self.descriptors {
            snapshot.insert(name.clone(), default_message(&descriptor.message_type)?);
        }
        Ok(snapshot)
    }

    /// Replace the whole snapshot atomically, as if it had just been
    /// received on every input port at once. Every declared port must be
    /// present in `snapshot` and hold a message of its declared type,
    /// preserving the snapshot-completeness invariant the processor relies
    /// on.
    pub async fn replace(&self, snapshot: HashMap<String, Box<dyn Message>>) -> NodeResult<()> {
        for (name, descriptor) in &self.descriptors {
            match snapshot.get(name) {
                Some(message) if message.type_name() == descriptor.message_type => {}
                Some(message) => {
                    return Err(NodeError::TypeMismatch {
                        port: name.clone(),
                        expected: descriptor.message_type.clone(),
                        actual: message.type_name().to_string(),
                    })
                }
                None => return Err(NodeError::Config(format!("snapshot is missing declared input port '{name}'"))),
            }
        }
        *self.state.write().await = snapshot;
        Ok(())
    }
}

/// One output port's per-cycle state: a pre-allocated default message plus
/// whether the processor actually set a value on it this cycle. An unset
/// port is skipped when outputs are published, mirroring the original's
/// "nil output means don't publish" behavior.
struct OutputSlot {
    descriptor: PortDescriptor,
    message: Box<dyn Message>,
    set: bool,
}

/// The node's output buffer: what the processor writes to, and what the
/// output sender drains and publishes.
pub struct Outputs {
    slots: Mutex<HashMap<String, OutputSlot>>,
}

impl Outputs {
    pub fn new(descriptors: Vec<PortDescriptor>) -> NodeResult<Self> {
        let mut slots = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let message = default_message(&descriptor.message_type)?;
            slots.insert(
                descriptor.name.clone(),
                OutputSlot {
                    descriptor,
                    message,
                    set: false,
                },
            );
        }
        Ok(Self { slots: Mutex::new(slots) })
    }

    /// Set the message to publish on `port` this cycle. The message's
    /// declared type must match the port's configured type.
    pub async fn set(&self, port: &str, message: Box<dyn Message>) -> NodeResult<()> {
        let mut slots = self.slots.lock().await;
        let slot = slots
            .get_mut(port)
            .ok_or_else(|| NodeError::UnknownPort(port.to_string()))?;
        if message.type_name() != slot.descriptor.message_type {
            return Err(NodeError::TypeMismatch {
                port: port.to_string(),
                expected: slot.descriptor.message_type.clone(),
                actual: message.type_name().to_string(),
            });
        }
        slot.message = message;
        slot.set = true;
        Ok(())
    }

    /// Drain every port that was set this cycle as `(descriptor, encoded
    /// bytes)`, and reset all ports to unset for the next cycle.
    pub async fn drain(&self) -> NodeResult<Vec<(PortDescriptor, Vec<u8>)>> {
        let mut slots = self.slots.lock().await;
        let mut drained = Vec::new();
        for slot in slots.values_mut() {
            if slot.set {
                let bytes = slot.message.encode(slot.descriptor.representation)?;
                drained.push((slot.descriptor.clone(), bytes));
                slot.set = false;
            }
        }
        Ok(drained)
    }

    pub async fn descriptors(&self) -> Vec<PortDescriptor> {
        self.slots.lock().await.values().map(|slot| slot.descriptor.clone()).collect()
    }
}
