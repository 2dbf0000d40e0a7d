pub mod alarm_loop;
pub mod broker;
pub mod config;
pub mod error;
pub mod escalation;
pub mod event;
pub mod gateway;
pub mod kafka;
pub mod nms;
pub mod runtime;
pub mod supervisor;

pub use alarm_loop::{run_alarm_loop, AlarmHandler, LoopStats, Outcome};
pub use broker::{MemoryBroker, Publisher, Subscription};
pub use config::AppConfig;
pub use error::{BrokerError, DeliveryError, GatewayError};
pub use escalation::{EscalationNotifier, EscalationPolicy};
pub use event::{AlarmEvent, AlarmStatus, NmsEvent, RawTrap, Severity};
pub use kafka::{KafkaConfig, KafkaPublisher, KafkaSubscription};
pub use nms::NmsForwarder;
pub use supervisor::Supervisor;
