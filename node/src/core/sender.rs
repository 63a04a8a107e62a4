//! The output sender, in its two modes.
//!
//! Grounded on `actor/outputs/asyncSender.go` and `syncSender.go`. Async
//! mode publishes the outputs buffer the moment the processor finishes a
//! cycle. Sync mode runs the Idle/AwaitingSendTrigger state machine from
//! the original: on the processor's completion it reports
//! `processing-completed` and waits; only on the orchestrator's
//! `send-results` trigger does it actually publish the buffered outputs
//! and report `sending-completed`.

use crate::broker::Broker;
use crate::error::NodeResult;
use crate::io::Outputs;
use crate::message::orchestra::{ProcessingCompletedMessage, SendingCompletedMessage};
use crate::message::{Message, Representation};
use std::sync::Arc;
use tokio::sync::mpsc;

async fn publish_outputs(broker: &Arc<dyn Broker>, outputs: &Outputs, node_name: &str) -> NodeResult<()> {
    let drained = outputs.drain().await?;
    if drained.is_empty() {
        shared::node_debug!(node_name, "processing cycle produced no outputs to send");
    }
    for (descriptor, bytes) in drained {
        broker.publish(&descriptor.channel, bytes).await?;
    }
    Ok(())
}

/// Spawn the async-mode sender: publish the outputs buffer every time the
/// processor signals a completed cycle.
pub fn spawn_async(
    node_name: String,
    broker: Arc<dyn Broker>,
    outputs: Arc<Outputs>,
    mut processing_done_rx: mpsc::Receiver<()>,
    mut done_rx: mpsc::Receiver<()>,
) -> tokio::task::JoinHandle<NodeResult<()>> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = done_rx.recv() => {
                    shared::node_info!(node_name, "async sender shutting down");
                    break;
                }
                signal = processing_done_rx.recv() => {
                    match signal {
                        Some(()) => publish_outputs(&broker, &outputs, &node_name).await?,
                        None => break,
                    }
                }
            }
        }
        Ok(())
    })
}

/// Spawn the sync-mode sender: implements the Idle / AwaitingSendTrigger
/// state machine. While idle, a processor completion reports
/// `processing-completed` and moves to awaiting-send-trigger; the state
/// machine ignores a second completion notice while already awaiting a
/// trigger, since the orchestrator is expected to pace one
/// receive-and-process/send-results cycle at a time.
pub fn spawn_sync(
    node_name: String,
    broker: Arc<dyn Broker>,
    outputs: Arc<Outputs>,
    processing_completed_channel: String,
    sending_completed_channel: String,
    send_results_channel: String,
    mut processing_done_rx: mpsc::Receiver<()>,
    mut done_rx: mpsc::Receiver<()>,
) -> tokio::task::JoinHandle<NodeResult<()>> {
    tokio::spawn(async move {
        let (send_trigger_tx, mut send_trigger_rx) = mpsc::channel::<()>(16);
        let subscription = broker
            .subscribe(
                &send_results_channel,
                Box::new(move |_payload| {
                    let _ = send_trigger_tx.try_send(());
                }),
            )
            .await?;

        #[derive(PartialEq)]
        enum State {
            Idle,
            AwaitingSendTrigger,
        }
        let mut state = State::Idle;

        loop {
            tokio::select! {
                _ = done_rx.recv() => {
                    shared::node_info!(node_name, "sync sender shutting down");
                    break;
                }
                signal = processing_done_rx.recv(), if state == State::Idle => {
                    match signal {
                        Some(()) => {
                            let notice = ProcessingCompletedMessage::new(node_name.clone());
                            broker
                                .publish(&processing_completed_channel, notice.encode(Representation::Json)?)
                                .await?;
                            state = State::AwaitingSendTrigger;
                        }
                        None => break,
                    }
                }
                trigger = send_trigger_rx.recv(), if state == State::AwaitingSendTrigger => {
                    match trigger {
                        Some(()) => {
                            publish_outputs(&broker, &outputs, &node_name).await?;
                            let notice = SendingCompletedMessage::new(node_name.clone());
                            broker
                                .publish(&sending_completed_channel, notice.encode(Representation::Json)?)
                                .await?;
                            state = State::Idle;
                        }
                        None => break,
                    }
                }
            }
        }

        subscription.unsubscribe().await?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InProcessBroker;
    use crate::io::PortDescriptor;
    use crate::message::base::BoolMessage;

    fn bool_port(name: &str, channel: &str) -> PortDescriptor {
        PortDescriptor {
            name: name.to_string(),
            message_type: "base/Bool".to_string(),
            representation: Representation::Json,
            channel: channel.to_string(),
        }
    }

    #[tokio::test]
    async fn async_sender_publishes_on_processing_done() {
        let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
        let outputs = Arc::new(Outputs::new(vec![bool_port("out1", "out1-channel")]).unwrap());
        outputs.set("out1", Box::new(BoolMessage::new(true))).await.unwrap();

        let (received_tx, mut received_rx) = mpsc::channel::<Vec<u8>>(1);
        let _sub = broker
            .subscribe("out1-channel", Box::new(move |payload| {
                let _ = received_tx.try_send(payload);
            }))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let (processing_done_tx, processing_done_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = mpsc::channel(1);
        let handle = spawn_async(
            "demo".to_string(),
            broker.clone(),
            outputs.clone(),
            processing_done_rx,
            done_rx,
        );

        processing_done_tx.send(()).await.unwrap();
        let payload = tokio::time::timeout(std::time::Duration::from_millis(200), received_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload, b"true");

        drop(done_tx);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn sync_sender_waits_for_send_results_trigger() {
        let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
        let outputs = Arc::new(Outputs::new(vec![bool_port("out1", "out1-channel")]).unwrap());
        outputs.set("out1", Box::new(BoolMessage::new(true))).await.unwrap();

        let (completed_tx, mut completed_rx) = mpsc::channel::<Vec<u8>>(1);
        let _completed_sub = broker
            .subscribe("processing-completed", Box::new(move |payload| {
                let _ = completed_tx.try_send(payload);
            }))
            .await
            .unwrap();
        let (published_tx, mut published_rx) = mpsc::channel::<Vec<u8>>(1);
        let _out_sub = broker
            .subscribe("out1-channel", Box::new(move |payload| {
                let _ = published_tx.try_send(payload);
            }))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let (processing_done_tx, processing_done_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = mpsc::channel(1);
        let handle = spawn_sync(
            "demo".to_string(),
            broker.clone(),
            outputs.clone(),
            "processing-completed".to_string(),
            "sending-completed".to_string(),
            "send-results".to_string(),
            processing_done_rx,
            done_rx,
        );

        processing_done_tx.send(()).await.unwrap();
        tokio::time::timeout(std::time::Duration::from_millis(200), completed_rx.recv())
            .await
            .unwrap()
            .unwrap();

        // Outputs must not be published before send-results arrives.
        assert!(published_rx.try_recv().is_err());

        broker.publish("send-results", Vec::new()).await.unwrap();
        let payload = tokio::time::timeout(std::time::Duration::from_millis(200), published_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload, b"true");

        drop(done_tx);
        handle.await.unwrap().unwrap();
    }
}
