use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::kafka::KafkaConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelsConfig {
    pub traps: String,
    pub alarms: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub http_addr: String,
    pub udp_addr: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub webhook_url: Option<String>,
    pub timeout_ms: u64,
    pub group_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NmsConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub group_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub kafka: KafkaConfig,
    pub channels: ChannelsConfig,
    pub gateway: GatewayConfig,
    pub escalation: EscalationConfig,
    pub nms: NmsConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when it is missing or unreadable,
    /// then applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let config = Self::from_file(path).unwrap_or_else(|e| {
            warn!("Failed to load {:?}: {}. Using default configuration.", path, e);
            AppConfig::default()
        });
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `KAFKA_BOOTSTRAP_SERVERS`, `SLACK_WEBHOOK_URL`, `OPEN_NMS_URL` and
    /// `OPEN_NMS_API_KEY` from `lookup`. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(servers) = get("KAFKA_BOOTSTRAP_SERVERS") {
            self.kafka.bootstrap_servers = servers;
        }
        if let Some(url) = get("SLACK_WEBHOOK_URL") {
            self.escalation.webhook_url = Some(url);
        }
        if let Some(url) = get("OPEN_NMS_URL") {
            self.nms.url = Some(url);
        }
        if let Some(key) = get("OPEN_NMS_API_KEY") {
            self.nms.api_key = Some(key);
        }
        self
    }
}

impl EscalationConfig {
    pub fn webhook_url(&self) -> Option<&str> {
        non_empty(&self.webhook_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl NmsConfig {
    pub fn url(&self) -> Option<&str> {
        non_empty(&self.url)
    }

    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.api_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            traps: "traps".to_string(),
            alarms: "alarms".to_string(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8008".to_string(),
            udp_addr: "0.0.0.0:9162".to_string(),
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_ms: 5000,
            group_id: "escalation-notifier".to_string(),
        }
    }
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_ms: 10000,
            group_id: "nms-forwarder".to_string(),
        }
    }
}
