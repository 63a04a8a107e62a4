//! The node supervisor: builds every component from a [`NodeConfig`] and a
//! [`Broker`], starts them in dependency order, and tears them down in the
//! reverse order.
//!
//! Grounded on `actor/node/node.go`'s `Node`/`NewNode`/`Start`/`Shutdown`.
//! Construction order is status → receiver → processor → sender: the
//! status responder is live, and this node visible to the orchestrator,
//! before anything starts consuming input; shutdown runs the reverse,
//! sender → processor → receiver → status, then the broker is closed
//! last.

use crate::broker::Broker;
use crate::config::{NodeConfig, Synchronization};
use crate::core::processor::Processor;
use crate::core::{processor, receiver, sender, status};
use crate::error::NodeResult;
use crate::io::{Inputs, Outputs, PortDescriptor};
use crate::message::Representation;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn to_descriptor(spec: &crate::config::PortSpec) -> PortDescriptor {
    PortDescriptor {
        name: spec.name.clone(),
        message_type: spec.message_type.clone(),
        representation: spec.representation,
        channel: spec.channel.clone(),
    }
}

struct Component {
    name: &'static str,
    done_tx: mpsc::Sender<()>,
    handle: JoinHandle<NodeResult<()>>,
}

/// A running actor node: one set of input ports, one set of output ports,
/// a processing function in between, wired to the orchestrator protocol
/// when configured to be present.
pub struct Node {
    name: String,
    inputs: Arc<Inputs>,
    outputs: Arc<Outputs>,
    broker: Arc<dyn Broker>,
    inputs_changed_tx: mpsc::Sender<()>,
    // Construction order: status, receiver, processor, sender. Shutdown
    // walks this in reverse.
    components: Vec<Component>,
}

impl Node {
    /// Build and start every component. `processor` is the node's
    /// business logic; `broker` is the transport every component
    /// publishes and subscribes through.
    pub async fn start(config: NodeConfig, broker: Arc<dyn Broker>, processing: Arc<dyn Processor>) -> NodeResult<Self> {
        let input_descriptors: Vec<PortDescriptor> = config.ports.inputs.iter().map(to_descriptor).collect();
        let output_descriptors: Vec<PortDescriptor> = config.ports.outputs.iter().map(to_descriptor).collect();

        let inputs = Arc::new(Inputs::new(input_descriptors.clone())?);
        for spec in &config.ports.inputs {
            if let Some(default_value) = &spec.default_value {
                inputs
                    .set_message(&spec.name, Representation::Json, default_value.as_bytes())
                    .await?;
            }
        }
        let outputs = Arc::new(Outputs::new(output_descriptors.clone())?);

        let mut components = Vec::new();

        let (inputs_changed_tx, inputs_changed_rx) = mpsc::channel(64);
        let (processing_done_tx, processing_done_rx) = mpsc::channel(16);

        if config.orchestration.presence {
            let (status_done_tx, status_done_rx) = mpsc::channel(1);
            let status_handle = status::spawn(
                config.node.clone(),
                config.node_type.clone(),
                broker.clone(),
                config.orchestration.channels.status_request.clone(),
                config.orchestration.channels.status_report.clone(),
                input_descriptors.clone(),
                output_descriptors.clone(),
                config.orchestration.synchronization.to_string(),
                config.specs_url.clone(),
                status_done_rx,
            )?;
            components.push(Component {
                name: "status",
                done_tx: status_done_tx,
                handle: status_handle,
            });
        }

        let (receiver_done_tx, receiver_done_rx) = mpsc::channel(1);
        let receiver_handle = match config.orchestration.synchronization {
            Synchronization::Async => receiver::spawn_async(
                config.node.clone(),
                broker.clone(),
                inputs.clone(),
                input_descriptors.clone(),
                inputs_changed_tx.clone(),
                receiver_done_rx,
            ),
            Synchronization::Sync => receiver::spawn_sync(
                config.node.clone(),
                broker.clone(),
                inputs.clone(),
                input_descriptors.clone(),
                config.orchestration.channels.receive_and_process.clone(),
                inputs_changed_tx.clone(),
                receiver_done_rx,
            ),
        };
        components.push(Component {
            name: "receiver",
            done_tx: receiver_done_tx,
            handle: receiver_handle,
        });

        let (processor_done_tx, processor_done_rx) = mpsc::channel(1);
        let processor_handle = processor::spawn(
            config.node.clone(),
            inputs.clone(),
            outputs.clone(),
            processing,
            inputs_changed_rx,
            processing_done_tx,
            processor_done_rx,
        );
        components.push(Component {
            name: "processor",
            done_tx: processor_done_tx,
            handle: processor_handle,
        });

        let (sender_done_tx, sender_done_rx) = mpsc::channel(1);
        let sender_handle = match config.orchestration.synchronization {
            Synchronization::Async => sender::spawn_async(
                config.node.clone(),
                broker.clone(),
                outputs.clone(),
                processing_done_rx,
                sender_done_rx,
            ),
            Synchronization::Sync => sender::spawn_sync(
                config.node.clone(),
                broker.clone(),
                outputs.clone(),
                config.orchestration.channels.processing_completed.clone(),
                config.orchestration.channels.sending_completed.clone(),
                config.orchestration.channels.send_results.clone(),
                processing_done_rx,
                sender_done_rx,
            ),
        };
        components.push(Component {
            name: "sender",
            done_tx: sender_done_tx,
            handle: sender_handle,
        });

        Ok(Self {
            name: config.node,
            inputs,
            outputs,
            broker,
            inputs_changed_tx,
            components,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reset every input port to its message type's default value, and
    /// forward that snapshot to the processor. Mirrors the original's
    /// `Node.Reset` — the orchestrator may ask a node to forget
    /// accumulated state without a full restart.
    pub async fn reset(&self) -> NodeResult<()> {
        self.inputs.reset().await?;
        let _ = self.inputs_changed_tx.send(()).await;
        Ok(())
    }

    /// Build a fresh, default-valued snapshot matching this node's
    /// configured input ports. Mirrors the original's `Node.NewInputs` —
    /// a starting point for a caller that wants to build a snapshot by
    /// hand and hand it to [`Node::next`].
    pub fn new_inputs(&self) -> NodeResult<std::collections::HashMap<String, Box<dyn crate::message::Message>>> {
        self.inputs.fresh_snapshot()
    }

    /// Inject `snapshot` directly as the node's current inputs, bypassing
    /// the receiver entirely, and wake the processor. Mirrors the
    /// original's `Node.Next` — used for testing and for driving a node
    /// locally without a broker round-trip.
    pub async fn next(&self, snapshot: std::collections::HashMap<String, Box<dyn crate::message::Message>>) -> NodeResult<()> {
        self.inputs.replace(snapshot).await?;
        let _ = self.inputs_changed_tx.send(()).await;
        Ok(())
    }

    /// Wait for every component task to finish on its own (normally only
    /// happens after [`Node::shutdown`], or if a component hits a fatal
    /// error and exits early).
    ///
    /// Races every component's task: the first one to finish — typically
    /// because it returned a fatal error — stops the rest and the error
    /// propagates out. In normal operation no component returns on its
    /// own, so in practice this only returns after `shutdown` has been
    /// called, or after a fatal error.
    pub async fn wait(self) -> NodeResult<()> {
        let mut done_txs = Vec::with_capacity(self.components.len());
        let mut set = tokio::task::JoinSet::new();
        for component in self.components {
            done_txs.push(component.done_tx);
            let handle = component.handle;
            set.spawn(async move { handle.await });
        }

        let first = set.join_next().await;
        drop(done_txs);
        while set.join_next().await.is_some() {}

        self.broker.close().await?;

        match first {
            None => Ok(()),
            Some(Err(join_err)) => Err(join_err.into()),
            Some(Ok(Err(join_err))) => Err(join_err.into()),
            Some(Ok(Ok(result))) => result,
        }
    }

    /// Stop every component, in reverse construction order, then close
    /// the broker.
    pub async fn shutdown(mut self) -> NodeResult<()> {
        while let Some(component) = self.components.pop() {
            shared::node_info!(self.name, "stopping {}", component.name);
            drop(component.done_tx);
            component.handle.await??;
        }
        self.broker.close().await
    }
}
