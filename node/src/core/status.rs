//! The status responder: answers every `status-request` with a fresh
//! `status-report` describing the node's ports.
//!
//! Grounded on `actor/status/status.go`'s `Status` function: subscribe to
//! the status-request channel, and on each request publish a JSON status
//! report built from the node's current port list.

use crate::broker::Broker;
use crate::error::NodeResult;
use crate::message::orchestra::{Channel, Port, StatusReportMessage, StatusReportPorts};
use crate::message::{Message, Representation};
use std::sync::Arc;
use tokio::sync::mpsc;

fn to_wire_port(descriptor: &crate::io::PortDescriptor) -> Port {
    Port {
        name: descriptor.name.clone(),
        message_type: descriptor.message_type.clone(),
        representation: descriptor.representation.to_string(),
        channel: Channel::topic(descriptor.channel.clone()),
    }
}

/// Spawn the status responder task.
#[allow(clippy::too_many_arguments)]
pub fn spawn(
    node_name: String,
    node_type: String,
    broker: Arc<dyn Broker>,
    status_request_channel: String,
    status_report_channel: String,
    input_ports: Vec<crate::io::PortDescriptor>,
    output_ports: Vec<crate::io::PortDescriptor>,
    synchronization: String,
    specs_url: String,
    mut done_rx: mpsc::Receiver<()>,
) -> NodeResult<tokio::task::JoinHandle<NodeResult<()>>> {
    let (request_tx, mut request_rx) = mpsc::channel::<()>(16);

    let handle = tokio::spawn(async move {
        let subscription = broker
            .subscribe(
                &status_request_channel,
                Box::new(move |_payload| {
                    let _ = request_tx.try_send(());
                }),
            )
            .await?;

        let ports = StatusReportPorts {
            inputs: input_ports.iter().map(to_wire_port).collect(),
            outputs: output_ports.iter().map(to_wire_port).collect(),
        };

        loop {
            tokio::select! {
                _ = done_rx.recv() => {
                    shared::node_info!(node_name, "status responder shutting down");
                    break;
                }
                request = request_rx.recv() => {
                    match request {
                        Some(()) => {
                            let report = StatusReportMessage::new(
                                node_name.clone(),
                                node_type.clone(),
                                ports.clone(),
                                synchronization.clone(),
                                specs_url.clone(),
                            );
                            let bytes = report.encode(Representation::Json)?;
                            broker.publish(&status_report_channel, bytes).await?;
                        }
                        None => break,
                    }
                }
            }
        }

        subscription.unsubscribe().await?;
        Ok(())
    });

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InProcessBroker;
    use crate::io::PortDescriptor;
    use crate::message::orchestra::StatusRequestMessage;

    #[tokio::test]
    async fn replies_to_status_request_with_port_list() {
        let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
        let (done_tx, done_rx) = mpsc::channel(1);

        let in_port = PortDescriptor {
            name: "in1".to_string(),
            message_type: "base/Bool".to_string(),
            representation: Representation::Json,
            channel: "in1-channel".to_string(),
        };

        let handle = spawn(
            "demo".to_string(),
            "inverter".to_string(),
            broker.clone(),
            "status-request".to_string(),
            "status-report".to_string(),
            vec![in_port],
            vec![],
            "async".to_string(),
            "https://specs.example/inverter".to_string(),
            done_rx,
        )
        .unwrap();

        // Let the subscription register before publishing the request.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let (reply_tx, mut reply_rx) = mpsc::channel::<Vec<u8>>(1);
        let _reply_sub = broker
            .subscribe(
                "status-report",
                Box::new(move |payload| {
                    let _ = reply_tx.try_send(payload);
                }),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let request = StatusRequestMessage::default();
        broker
            .publish("status-request", request.encode(Representation::Json).unwrap())
            .await
            .unwrap();

        let payload = tokio::time::timeout(std::time::Duration::from_millis(200), reply_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let report: StatusReportMessage = serde_json::from_slice(&payload).unwrap();
        assert_eq!(report.body.name, "demo");
        assert_eq!(report.body.node_type, "inverter");
        assert_eq!(report.body.synchronization, "async");
        assert_eq!(report.body.specs_url, "https://specs.example/inverter");
        assert_eq!(report.body.ports.inputs.len(), 1);
        assert_eq!(report.body.ports.inputs[0].name, "in1");

        drop(done_tx);
        handle.await.unwrap().unwrap();
    }
}
