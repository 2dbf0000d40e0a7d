use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use std::time::Duration;

use crate::alarm_loop::{AlarmHandler, Outcome};
use crate::config::NmsConfig;
use crate::error::DeliveryError;
use crate::event::{AlarmEvent, NmsEvent};

/// REST endpoint of the external network-management system.
#[derive(Clone)]
pub struct NmsClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl NmsClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into(), api_key })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn forward(&self, event: &NmsEvent) -> Result<(), DeliveryError> {
        let mut request = self.client.post(&self.url).json(event);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}

/// Forwards every alarm, unfiltered. Without a target it subscribes but stays idle.
pub struct NmsForwarder {
    target: Option<NmsClient>,
}

impl NmsForwarder {
    pub fn new(target: Option<NmsClient>) -> Self {
        Self { target }
    }

    pub fn from_config(config: &NmsConfig) -> Result<Self> {
        let target = match config.url() {
            Some(url) => {
                let api_key = config.api_key().map(str::to_string);
                info!(
                    "Forwarding alarms to {} ({})",
                    url,
                    if api_key.is_some() { "bearer auth" } else { "no auth" }
                );
                Some(NmsClient::new(url, api_key, config.timeout())?)
            }
            None => {
                warn!("NMS forward URL not configured; forwarder will remain idle");
                None
            }
        };
        Ok(Self::new(target))
    }

    pub fn is_idle(&self) -> bool {
        self.target.is_none()
    }
}

#[async_trait]
impl AlarmHandler for NmsForwarder {
    fn name(&self) -> &str {
        "nms-forwarder"
    }

    async fn handle(&self, event: &AlarmEvent) -> Result<Outcome, DeliveryError> {
        let Some(target) = &self.target else {
            return Ok(Outcome::Skipped("no forward target"));
        };

        target.forward(&NmsEvent::from(event)).await?;
        info!("Forwarded alarm {} to NMS", event.id_label());
        Ok(Outcome::Delivered)
    }
}
