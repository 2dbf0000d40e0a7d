//! Publish/subscribe seams shared by the gateway and the alarm consumers.
//!
//! Delivery is broadcast and best-effort: every live subscription on a channel sees
//! every message published after it subscribed, and nothing is buffered for
//! subscribers that are not connected.

pub mod memory;

use async_trait::async_trait;

use crate::error::BrokerError;

pub use memory::{MemoryBroker, MemorySubscription};

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes one payload. Must be safe to call from several tasks at once.
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError>;
}

#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next payload. `None` means the channel is gone for good.
    async fn next_payload(&mut self) -> Option<String>;
}

#[async_trait]
impl<S: Subscription + ?Sized> Subscription for Box<S> {
    async fn next_payload(&mut self) -> Option<String> {
        (**self).next_payload().await
    }
}
