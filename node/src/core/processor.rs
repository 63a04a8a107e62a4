//! The processor: reads the current inputs snapshot, runs the node's
//! business logic, writes results into the outputs buffer.
//!
//! Grounded on `actor/processor/processor.go`'s `StartProcessor`: a single
//! task that waits on the inputs-changed channel, builds a `Context`, and
//! invokes the user-supplied processing function. A processing error there
//! is fatal — the original panics; here it is propagated out of the task
//! and the node supervisor treats it as a shutdown trigger.

use crate::error::NodeResult;
use crate::io::{Inputs, Outputs};
use crate::message::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What a processing cycle sees: the current inputs snapshot (held for the
/// whole call under a read lock) and a handle to write outputs into.
pub struct Context<'a> {
    pub node_name: &'a str,
    inputs: &'a HashMap<String, Box<dyn Message>>,
    outputs: &'a Outputs,
}

impl<'a> Context<'a> {
    /// Borrow the current value of an input port.
    pub fn input(&self, port: &str) -> Option<&dyn Message> {
        self.inputs.get(port).map(|boxed| boxed.as_ref())
    }

    /// Set the value to publish on an output port this cycle.
    pub async fn set_output(&self, port: &str, message: Box<dyn Message>) -> NodeResult<()> {
        self.outputs.set(port, message).await
    }
}

/// User-supplied business logic for a node. Implementors receive one
/// [`Context`] per processing cycle and write whatever outputs they
/// produce through it.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, ctx: &Context<'_>) -> NodeResult<()>;
}

/// Spawn the processor task: on every inputs-changed notification, take a
/// read lock on `inputs`, run `processor`, and signal completion on
/// `processing_done_tx` (used by the output sender to know when results are
/// ready to send, and in sync mode, when to report `processing-completed`).
pub fn spawn(
    node_name: String,
    inputs: Arc<Inputs>,
    outputs: Arc<Outputs>,
    processor: Arc<dyn Processor>,
    mut inputs_changed_rx: mpsc::Receiver<()>,
    processing_done_tx: mpsc::Sender<()>,
    mut done_rx: mpsc::Receiver<()>,
) -> tokio::task::JoinHandle<NodeResult<()>> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = done_rx.recv() => {
                    shared::node_info!(node_name, "processor shutting down");
                    return Ok(());
                }
                signal = inputs_changed_rx.recv() => {
                    match signal {
                        Some(()) => {
                            let snapshot = inputs.read().await;
                            let ctx = Context {
                                node_name: &node_name,
                                inputs: &snapshot,
                                outputs: &outputs,
                            };
                            processor.process(&ctx).await?;
                            drop(snapshot);
                            let _ = processing_done_tx.send(()).await;
                        }
                        None => return Ok(()),
                    }
                }
            }
        }
    })
}
