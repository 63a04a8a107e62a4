//! End-to-end scenarios run against a full [`Node`] wired to an
//! [`InProcessBroker`], exercising the concurrency model and the
//! orchestrator protocol the way a real deployment would.

use async_trait::async_trait;
use node::config::{Channels, Configure, NodeConfig, Orchestration, PortSpec, Synchronization};
use node::message::base::BoolMessage;
use node::message::orchestra::{ProcessingCompletedMessage, SendingCompletedMessage, StatusReportMessage, StatusRequestMessage};
use node::{Broker, Context, InProcessBroker, Message, Node, NodeError, NodeResult, Processor, Representation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn bool_port_spec(name: &str, channel: &str) -> PortSpec {
    PortSpec {
        name: name.to_string(),
        channel: channel.to_string(),
        message_type: "base/Bool".to_string(),
        representation: Representation::Json,
        default_value: None,
    }
}

struct Invert;

#[async_trait]
impl Processor for Invert {
    async fn process(&self, ctx: &Context<'_>) -> NodeResult<()> {
        let input = ctx.input("in1").expect("in1 is configured");
        let value = input.as_any().downcast_ref::<BoolMessage>().expect("in1 is base/Bool").value;
        ctx.set_output("out1", Box::new(BoolMessage::new(!value))).await?;
        Ok(())
    }
}

async fn publish_bool(broker: &Arc<dyn Broker>, channel: &str, value: bool) {
    let msg = BoolMessage::new(value);
    broker
        .publish(channel, msg.encode(Representation::Json).unwrap())
        .await
        .unwrap();
}

async fn subscribe_collector(broker: &Arc<dyn Broker>, channel: &str) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel(16);
    let subscription = broker
        .subscribe(channel, Box::new(move |payload| {
            let _ = tx.try_send(payload);
        }))
        .await
        .unwrap();
    std::mem::forget(subscription);
    rx
}

#[tokio::test]
async fn async_single_port_round_trip() {
    let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
    let mut config = NodeConfig::default_node("inverter");
    config.add_input_port(bool_port_spec("in1", "in1-channel"));
    config.add_output_port(bool_port_spec("out1", "out1-channel"));

    let mut out_rx = subscribe_collector(&broker, "out1-channel").await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let node = Node::start(config, broker.clone(), Arc::new(Invert)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    publish_bool(&broker, "in1-channel", true).await;

    let payload = tokio::time::timeout(Duration::from_millis(200), out_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(body["Body"]["Data"], serde_json::json!(false));

    node.shutdown().await.unwrap();
}

#[tokio::test]
async fn status_round_trip_through_node() {
    let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
    let mut config = NodeConfig::default_node("with-status");
    config.add_input_port(bool_port_spec("in1", "in1-channel"));
    config.add_output_port(bool_port_spec("out1", "out1-channel"));
    config.orchestration = Orchestration {
        presence: true,
        synchronization: Synchronization::Async,
        channels: Channels::default(),
    };

    let node = Node::start(config, broker.clone(), Arc::new(Invert)).await.unwrap();
    let mut report_rx = subscribe_collector(&broker, "status-report").await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let request = StatusRequestMessage::default();
    broker
        .publish("status-request", request.encode(Representation::Json).unwrap())
        .await
        .unwrap();

    let payload = tokio::time::timeout(Duration::from_millis(200), report_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let report: StatusReportMessage = serde_json::from_slice(&payload).unwrap();
    assert_eq!(report.body.name, "with-status");
    assert_eq!(report.body.ports.inputs[0].name, "in1");
    assert_eq!(report.body.ports.outputs[0].name, "out1");

    node.shutdown().await.unwrap();
}

#[tokio::test]
async fn sync_cycle_runs_receive_and_process_then_send_results() {
    let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
    let mut config = NodeConfig::default_node("sync-node");
    config.add_input_port(bool_port_spec("in1", "in1-channel"));
    config.add_output_port(bool_port_spec("out1", "out1-channel"));
    config.orchestration = Orchestration {
        presence: true,
        synchronization: Synchronization::Sync,
        channels: Channels::default(),
    };

    let node = Node::start(config, broker.clone(), Arc::new(Invert)).await.unwrap();
    let mut processing_completed_rx = subscribe_collector(&broker, "processing-completed").await;
    let mut sending_completed_rx = subscribe_collector(&broker, "sending-completed").await;
    let mut out_rx = subscribe_collector(&broker, "out1-channel").await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    publish_bool(&broker, "in1-channel", true).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    broker.publish("receive-and-process", Vec::new()).await.unwrap();
    let completed_payload = tokio::time::timeout(Duration::from_millis(200), processing_completed_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let completed: ProcessingCompletedMessage = serde_json::from_slice(&completed_payload).unwrap();
    assert_eq!(completed.body.data, "sync-node");

    // Outputs stay buffered until send-results arrives.
    assert!(out_rx.try_recv().is_err());

    broker.publish("send-results", Vec::new()).await.unwrap();
    let out_payload = tokio::time::timeout(Duration::from_millis(200), out_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let out_body: serde_json::Value = serde_json::from_slice(&out_payload).unwrap();
    assert_eq!(out_body["Body"]["Data"], serde_json::json!(false));

    let sending_payload = tokio::time::timeout(Duration::from_millis(200), sending_completed_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let sending: SendingCompletedMessage = serde_json::from_slice(&sending_payload).unwrap();
    assert_eq!(sending.body.data, "sync-node");

    node.shutdown().await.unwrap();
}

#[tokio::test]
async fn output_type_mismatch_is_reported_as_an_error() {
    struct WrongType;

    #[async_trait]
    impl Processor for WrongType {
        async fn process(&self, ctx: &Context<'_>) -> NodeResult<()> {
            ctx.set_output("out1", Box::new(node::message::base::FloatMessage::new(1.0))).await
        }
    }

    let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
    let mut config = NodeConfig::default_node("bad-processor");
    config.add_input_port(bool_port_spec("in1", "in1-channel"));
    config.add_output_port(bool_port_spec("out1", "out1-channel"));

    let node = Node::start(config, broker.clone(), Arc::new(WrongType)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    publish_bool(&broker, "in1-channel", true).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let result = node.wait().await;
    assert!(matches!(result, Err(NodeError::TypeMismatch { .. })));
}

#[tokio::test]
async fn merge_rejects_extension_when_disabled_end_to_end() {
    let hard_coded = NodeConfig::default_node("gated");
    let mut cli = NodeConfig::default_node("gated");
    // hard_coded's extend/modify stay at their default (false); an overlay
    // config cannot grant itself permission by claiming extend here.
    cli.configure = Configure {
        extend: true,
        modify: true,
    };
    cli.add_input_port(bool_port_spec("in1", "in1-channel"));

    let err = NodeConfig::merge(&hard_coded, &cli).unwrap_err();
    assert!(err.to_string().contains("port extension is disabled"));
}

#[tokio::test]
async fn next_injects_a_snapshot_bypassing_the_receiver() {
    let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
    let mut config = NodeConfig::default_node("driven-locally");
    config.add_input_port(bool_port_spec("in1", "in1-channel"));
    config.add_output_port(bool_port_spec("out1", "out1-channel"));

    let mut out_rx = subscribe_collector(&broker, "out1-channel").await;
    let node = Node::start(config, broker.clone(), Arc::new(Invert)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let mut snapshot = node.new_inputs().unwrap();
    snapshot.insert("in1".to_string(), Box::new(BoolMessage::new(true)));
    node.next(snapshot).await.unwrap();

    let payload = tokio::time::timeout(Duration::from_millis(200), out_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(body["Body"]["Data"], serde_json::json!(false));

    node.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_drains_in_flight_work_without_panicking() {
    let broker: Arc<dyn Broker> = Arc::new(InProcessBroker::new());
    let mut config = NodeConfig::default_node("under-load");
    config.add_input_port(bool_port_spec("in1", "in1-channel"));
    config.add_output_port(bool_port_spec("out1", "out1-channel"));

    let mut out_rx = subscribe_collector(&broker, "out1-channel").await;
    let node = Node::start(config, broker.clone(), Arc::new(Invert)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let received = Arc::new(AtomicUsize::new(0));
    let counter = received.clone();
    let drain_task = tokio::spawn(async move {
        while out_rx.recv().await.is_some() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    for i in 0..20 {
        publish_bool(&broker, "in1-channel", i % 2 == 0).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    node.shutdown().await.unwrap();
    drop(drain_task);

    assert!(received.load(Ordering::SeqCst) > 0);
}

