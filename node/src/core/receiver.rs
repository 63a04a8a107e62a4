//! The input receiver, in its two modes.
//!
//! Grounded on `actor/inputs/asyncReceiver.go` and `portObservers.go`: one
//! subscription per input port decodes incoming messages straight into the
//! shared [`Inputs`] snapshot. In async mode every decoded message
//! immediately notifies the processor. In sync mode the snapshot is kept
//! up to date silently; only a `receive-and-process` trigger from the
//! orchestrator notifies the processor. Reporting `processing-completed`
//! is the output sender's job (see `core::sender`), matching the
//! original's `syncSender.go`, not the receiver's.

use crate::broker::{Broker, Subscription};
use crate::error::NodeResult;
use crate::io::{Inputs, PortDescriptor};
use crate::message::Representation;
use std::sync::Arc;
use tokio::sync::mpsc;

struct PortEvent {
    port: String,
    representation: Representation,
    bytes: Vec<u8>,
}

async fn subscribe_ports(
    broker: &Arc<dyn Broker>,
    ports: &[PortDescriptor],
    events_tx: mpsc::Sender<PortEvent>,
) -> NodeResult<Vec<Arc<dyn Subscription>>> {
    let mut subscriptions = Vec::with_capacity(ports.len());
    for port in ports {
        let port_name = port.name.clone();
        let representation = port.representation;
        let tx = events_tx.clone();
        let subscription = broker
            .subscribe(
                &port.channel,
                Box::new(move |bytes| {
                    let _ = tx.try_send(PortEvent {
                        port: port_name.clone(),
                        representation,
                        bytes,
                    });
                }),
            )
            .await?;
        subscriptions.push(subscription);
    }
    Ok(subscriptions)
}

async fn unsubscribe_all(subscriptions: &[Arc<dyn Subscription>]) -> NodeResult<()> {
    for subscription in subscriptions {
        subscription.unsubscribe().await?;
    }
    Ok(())
}

/// Spawn the async-mode receiver: decode straight into `inputs`, then
/// notify the processor after every single message.
pub fn spawn_async(
    node_name: String,
    broker: Arc<dyn Broker>,
    inputs: Arc<Inputs>,
    input_ports: Vec<PortDescriptor>,
    inputs_changed_tx: mpsc::Sender<()>,
    mut done_rx: mpsc::Receiver<()>,
) -> tokio::task::JoinHandle<NodeResult<()>> {
    tokio::spawn(async move {
        let (events_tx, mut events_rx) = mpsc::channel(256);
        let subscriptions = subscribe_ports(&broker, &input_ports, events_tx).await?;

        loop {
            tokio::select! {
                _ = done_rx.recv() => {
                    shared::node_info!(node_name, "async receiver shutting down");
                    break;
                }
                event = events_rx.recv() => {
                    match event {
                        Some(event) => {
                            inputs.set_message(&event.port, event.representation, &event.bytes).await?;
                            let _ = inputs_changed_tx.send(()).await;
                        }
                        None => break,
                    }
                }
            }
        }

        unsubscribe_all(&subscriptions).await?;
        Ok(())
    })
}

/// Spawn the sync-mode receiver: decode silently into `inputs`; forward to
/// the processor only on `receive-and-process`.
pub fn spawn_sync(
    node_name: String,
    broker: Arc<dyn Broker>,
    inputs: Arc<Inputs>,
    input_ports: Vec<PortDescriptor>,
    receive_and_process_channel: String,
    inputs_changed_tx: mpsc::Sender<()>,
    mut done_rx: mpsc::Receiver<()>,
) -> tokio::task::JoinHandle<NodeResult<()>> {
    tokio::spawn(async move {
        let (events_tx, mut events_rx) = mpsc::channel(256);
        let mut port_subscriptions = subscribe_ports(&broker, &input_ports, events_tx).await?;

        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(16);
        let trigger_subscription = broker
            .subscribe(
                &receive_and_process_channel,
                Box::new(move |_payload| {
                    let _ = trigger_tx.try_send(());
                }),
            )
            .await?;
        port_subscriptions.push(trigger_subscription);

        loop {
            tokio::select! {
                _ = done_rx.recv() => {
                    shared::node_info!(node_name, "sync receiver shutting down");
                    break;
                }
                event = events_rx.recv() => {
                    match event {
                        Some(event) => {
                            inputs.set_message(&event.port, event.representation, &event.bytes).await?;
                        }
                        None => break,
                    }
                }
                trigger = trigger_rx.recv() => {
                    match trigger {
                        Some(()) => {
                            let _ = inputs_changed_tx.send(()).await;
                        }
                        None => break,
                    }
                }
            }
        }

        unsubscribe_all(&port_subscriptions).await?;
        Ok(())
    })
}
