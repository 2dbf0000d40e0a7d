use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};
use rdkafka::{
    config::FromClientConfig,
    consumer::{Consumer, StreamConsumer},
    Message,
};
use std::time::Duration;

use super::config::{instance_group_id, KafkaConfig};
use crate::broker::Subscription;

/// One consumer group's view of a single channel.
pub struct KafkaSubscription {
    consumer: StreamConsumer,
    channel: String,
    group_id: String,
}

impl KafkaSubscription {
    /// Joins a fresh instance of consumer group `group` on `channel`.
    pub fn new(config: &KafkaConfig, group: &str, channel: &str) -> Result<Self> {
        let group_id = instance_group_id(group);
        let consumer = StreamConsumer::from_config(&config.consumer_client_config(&group_id))?;
        consumer.subscribe(&[channel])?;

        info!("Subscribed to {} as consumer group {}", channel, group_id);

        Ok(KafkaSubscription {
            consumer,
            channel: channel.to_string(),
            group_id,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }
}

#[async_trait]
impl Subscription for KafkaSubscription {
    async fn next_payload(&mut self) -> Option<String> {
        loop {
            match self.consumer.recv().await {
                Ok(message) => match message.payload() {
                    Some(bytes) => {
                        let payload = String::from_utf8_lossy(bytes).into_owned();
                        if payload.contains('\u{FFFD}') {
                            warn!("Message on {} contains invalid UTF-8, using lossy conversion", self.channel);
                        }
                        return Some(payload);
                    }
                    None => {
                        warn!("Empty message payload on {}", self.channel);
                    }
                },
                Err(e) => {
                    error!("Kafka receive error on {} ({}): {}", self.channel, self.group_id, e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}
