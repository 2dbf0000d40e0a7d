use rdkafka::config::ClientConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KafkaProducerConfig {
    pub message_timeout_ms: u32,
    pub request_timeout_ms: u32,
    pub retry_backoff_ms: u32,
    pub retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KafkaConsumerConfig {
    pub auto_offset_reset: String,
    pub enable_auto_commit: bool,
    pub auto_commit_interval_ms: u32,
    pub session_timeout_ms: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KafkaConfig {
    pub bootstrap_servers: String,
    pub producer: KafkaProducerConfig,
    pub consumer: KafkaConsumerConfig,
}

impl KafkaConfig {
    pub fn producer_client_config(&self) -> ClientConfig {
        let mut producer_config = ClientConfig::new();
        producer_config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("message.timeout.ms", self.producer.message_timeout_ms.to_string())
            .set("request.timeout.ms", self.producer.request_timeout_ms.to_string())
            .set("retry.backoff.ms", self.producer.retry_backoff_ms.to_string())
            .set("retries", self.producer.retries.to_string());
        producer_config
    }

    /// Every consumer component passes its own group id, so each one sees every message.
    /// Offsets are not committed by default, so a restarted group starts at the tail.
    pub fn consumer_client_config(&self, group_id: &str) -> ClientConfig {
        let mut consumer_config = ClientConfig::new();
        consumer_config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("group.id", group_id)
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", self.consumer.session_timeout_ms.to_string())
            .set("auto.offset.reset", &self.consumer.auto_offset_reset)
            .set("enable.auto.commit", self.consumer.enable_auto_commit.to_string())
            .set("auto.commit.interval.ms", self.consumer.auto_commit_interval_ms.to_string());
        consumer_config
    }
}

/// Group id for one running consumer: `base` plus a per-process suffix.
///
/// Two instances of the same component each get their own copy of the channel
/// instead of splitting it between them.
pub fn instance_group_id(base: &str) -> String {
    format!("{}-{}", base, uuid::Uuid::new_v4().simple())
}

impl Default for KafkaProducerConfig {
    fn default() -> Self {
        Self {
            message_timeout_ms: 5000,
            request_timeout_ms: 5000,
            retry_backoff_ms: 100,
            retries: 0,
        }
    }
}

impl Default for KafkaConsumerConfig {
    fn default() -> Self {
        Self {
            auto_offset_reset: "latest".to_string(),
            enable_auto_commit: false,
            auto_commit_interval_ms: 1000,
            session_timeout_ms: 6000,
        }
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            producer: KafkaProducerConfig::default(),
            consumer: KafkaConsumerConfig::default(),
        }
    }
}
