use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::RecvError};

use super::{Publisher, Subscription};
use crate::error::BrokerError;

/// In-process broker with one broadcast sender per channel.
///
/// The channels close once every clone of the broker has been dropped; pending
/// messages are still delivered to existing subscriptions before they end.
#[derive(Clone)]
pub struct MemoryBroker {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
    capacity: usize,
}

impl MemoryBroker {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, channel: &str) -> Result<broadcast::Sender<String>, BrokerError> {
        let mut channels = self.channels.lock().map_err(|_| BrokerError::Closed {
            channel: channel.to_string(),
        })?;
        let sender = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(sender.clone())
    }

    pub fn subscribe(&self, channel: &str) -> Result<MemorySubscription, BrokerError> {
        let receiver = self.sender(channel)?.subscribe();
        Ok(MemorySubscription {
            channel: channel.to_string(),
            receiver,
        })
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl Publisher for MemoryBroker {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        if let Err(e) = self.sender(channel)?.send(payload.to_string()) {
            debug!("No active subscribers on {}: {}", channel, e);
        }
        Ok(())
    }
}

pub struct MemorySubscription {
    channel: String,
    receiver: broadcast::Receiver<String>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next_payload(&mut self) -> Option<String> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => return Some(payload),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber on {} lagged, {} messages dropped", self.channel, skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("Channel {} closed", self.channel);
                    return None;
                }
            }
        }
    }
}
