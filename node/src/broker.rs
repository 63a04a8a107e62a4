//! The publish/subscribe contract a node talks to, and one concrete
//! in-process implementation used for tests and the demo binary.
//!
//! Grounded on the teacher's `Communicator` trait (`producer/src/traits.rs`)
//! and the original's NATS messenger (`messenger/nats/nats.go`): publish,
//! subscribe-with-callback, and an explicit unsubscribe on the subscription
//! handle. A production broker client (NATS, Kafka, or otherwise) is
//! out of scope for this crate; callers provide their own `Broker` impl.

use crate::error::NodeResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// A handle to an active subscription. Dropping it does not unsubscribe;
/// callers must call [`Subscription::unsubscribe`] explicitly, mirroring
/// the original's `Subscriber.Unsubscribe()`.
#[async_trait]
pub trait Subscription: Send + Sync {
    async fn unsubscribe(&self) -> NodeResult<()>;
}

/// A publish/subscribe transport. Channel names are opaque topic strings;
/// message bodies are already-encoded bytes, since encoding is the
/// message type's responsibility, not the broker's.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish `payload` on `channel`.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> NodeResult<()>;

    /// Subscribe to `channel`; `handler` is invoked for every message
    /// published on it from the moment of subscription onward.
    async fn subscribe(
        &self,
        channel: &str,
        handler: Box<dyn Fn(Vec<u8>) + Send + Sync>,
    ) -> NodeResult<Arc<dyn Subscription>>;

    /// Release any resources held by the broker (connections, background
    /// tasks). Called last during node shutdown.
    async fn close(&self) -> NodeResult<()>;
}

const CHANNEL_CAPACITY: usize = 256;

struct InProcessSubscription {
    cancel: tokio::sync::watch::Sender<bool>,
}

#[async_trait]
impl Subscription for InProcessSubscription {
    async fn unsubscribe(&self) -> NodeResult<()> {
        // The broadcast sender for the channel is kept around for future
        // subscribers; this only stops this subscription's listener task.
        let _ = self.cancel.send(true);
        Ok(())
    }
}

/// An in-process broker backed by one [`tokio::sync::broadcast`] channel
/// per topic. Intended for tests and the demo binary: every node built on
/// the same `InProcessBroker` instance can talk to every other node in
/// the same process, with no network involved.
#[derive(Clone, Default)]
pub struct InProcessBroker {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>>,
}

impl InProcessBroker {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender_for(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl Broker for InProcessBroker {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> NodeResult<()> {
        let sender = self.sender_for(channel).await;
        // No active subscribers is not an error: the original transport
        // (NATS) behaves the same way for topics with no listeners.
        let _ = sender.send(payload);
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        handler: Box<dyn Fn(Vec<u8>) + Send + Sync>,
    ) -> NodeResult<Arc<dyn Subscription>> {
        let sender = self.sender_for(channel).await;
        let mut receiver = sender.subscribe();
        let (cancel_tx, mut cancel_rx) = tokio::sync::watch::channel(false);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_rx.changed() => break,
                    msg = receiver.recv() => match msg {
                        Ok(payload) => handler(payload),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(Arc::new(InProcessSubscription { cancel: cancel_tx }))
    }

    async fn close(&self) -> NodeResult<()> {
        self.channels.lock().await.clear();
        Ok(())
    }
}
