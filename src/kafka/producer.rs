use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error};
use rdkafka::{
    config::FromClientConfig,
    producer::{FutureProducer, FutureRecord},
};
use std::time::Duration;

use super::config::KafkaConfig;
use crate::broker::Publisher;
use crate::error::BrokerError;

/// Publishes channel payloads as Kafka records, one topic per channel.
#[derive(Clone)]
pub struct KafkaPublisher {
    producer: FutureProducer,
    queue_timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let producer = FutureProducer::from_config(&config.producer_client_config())?;
        Ok(KafkaPublisher {
            producer,
            queue_timeout: Duration::from_millis(u64::from(config.producer.message_timeout_ms)),
        })
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        // Keying by channel keeps one publisher's sequence on a single partition.
        let record = FutureRecord::to(channel).payload(payload).key(channel);

        match self.producer.send(record, self.queue_timeout).await {
            Ok((partition, offset)) => {
                debug!(
                    "Published to {} partition {} at offset {}",
                    channel, partition, offset
                );
                Ok(())
            }
            Err((e, _)) => {
                error!("Failed to publish to {}: {}", channel, e);
                Err(BrokerError::Kafka(e))
            }
        }
    }
}
