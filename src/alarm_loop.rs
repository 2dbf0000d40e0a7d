//! The standing subscription loop shared by every alarm consumer.
//!
//! Each payload moves `waiting -> processing -> delivered | skipped | error logged`
//! and the loop goes back to waiting. A failure only ever ends the unit of work it
//! happened in.

use async_trait::async_trait;
use log::{debug, error, info, warn};

use crate::broker::Subscription;
use crate::error::DeliveryError;
use crate::event::AlarmEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Skipped(&'static str),
}

#[async_trait]
pub trait AlarmHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, event: &AlarmEvent) -> Result<Outcome, DeliveryError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub received: u64,
    pub delivered: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Runs until the subscription reports the channel closed.
pub async fn run_alarm_loop<S, H>(mut subscription: S, handler: &H) -> LoopStats
where
    S: Subscription,
    H: AlarmHandler + ?Sized,
{
    let mut stats = LoopStats::default();
    info!("{} waiting for alarms", handler.name());

    while let Some(payload) = subscription.next_payload().await {
        stats.received += 1;

        let event = match AlarmEvent::from_json(&payload) {
            Ok(event) => event,
            Err(e) => {
                error!("{}: failed to parse alarm message: {}", handler.name(), e);
                stats.failed += 1;
                continue;
            }
        };

        match handler.handle(&event).await {
            Ok(Outcome::Delivered) => stats.delivered += 1,
            Ok(Outcome::Skipped(reason)) => {
                debug!("{}: skipped alarm {} ({})", handler.name(), event.id_label(), reason);
                stats.skipped += 1;
            }
            Err(DeliveryError::Rejected { status, body }) => {
                warn!(
                    "{}: alarm {} rejected with status {}: {}",
                    handler.name(),
                    event.id_label(),
                    status,
                    body
                );
                stats.failed += 1;
            }
            Err(e) => {
                error!("{}: failed to deliver alarm {}: {}", handler.name(), event.id_label(), e);
                stats.failed += 1;
            }
        }
    }

    info!(
        "{} stopped after {} alarms ({} delivered, {} skipped, {} failed)",
        handler.name(),
        stats.received,
        stats.delivered,
        stats.skipped,
        stats.failed
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{MemoryBroker, Publisher};
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AlarmHandler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle(&self, event: &AlarmEvent) -> Result<Outcome, DeliveryError> {
            let id = event.id_label();
            self.seen.lock().unwrap().push(id.clone());
            match id.as_str() {
                "skip" => Ok(Outcome::Skipped("test")),
                "reject" => Err(DeliveryError::Rejected { status: 500, body: String::new() }),
                _ => Ok(Outcome::Delivered),
            }
        }
    }

    #[tokio::test]
    async fn test_loop_survives_bad_messages_and_failures() {
        let broker = MemoryBroker::default();
        let subscription = broker.subscribe("alarms").unwrap();
        let recorder = Recorder { seen: Mutex::new(Vec::new()) };

        for payload in [
            "not json",
            r#"{"alarm_id":"reject"}"#,
            r#"{"alarm_id":"skip"}"#,
            "[1]",
            r#"{"alarm_id":"ok"}"#,
        ] {
            broker.publish("alarms", payload).await.unwrap();
        }
        drop(broker);

        let stats = run_alarm_loop(subscription, &recorder).await;

        assert_eq!(
            stats,
            LoopStats { received: 5, delivered: 1, skipped: 1, failed: 3 }
        );
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["reject", "skip", "ok"]);
    }
}
