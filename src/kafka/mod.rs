pub mod config;
pub mod consumer;
pub mod producer;

pub use config::{instance_group_id, KafkaConfig, KafkaConsumerConfig, KafkaProducerConfig};
pub use consumer::KafkaSubscription;
pub use producer::KafkaPublisher;
