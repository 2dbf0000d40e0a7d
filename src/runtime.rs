//! Process wiring shared by the binaries: logging, configuration, and spawning
//! each pipeline component with its own Kafka connection.

use anyhow::Result;
use clap::Args;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::alarm_loop::{run_alarm_loop, AlarmHandler};
use crate::broker::{Publisher, Subscription};
use crate::config::AppConfig;
use crate::escalation::EscalationNotifier;
use crate::gateway;
use crate::kafka::{KafkaPublisher, KafkaSubscription};
use crate::nms::NmsForwarder;
use crate::supervisor::Supervisor;

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Kafka bootstrap servers (overrides config file and environment)
    #[arg(short, long)]
    pub brokers: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Initialises logging, then loads the configuration with all overrides applied.
    pub fn bootstrap(&self) -> AppConfig {
        init_logging(self.verbose);

        let mut config = AppConfig::load(&self.config);
        if let Some(brokers) = &self.brokers {
            config.kafka.bootstrap_servers = brokers.clone();
        }
        info!("Kafka broker: {}", config.kafka.bootstrap_servers);
        config
    }
}

pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Starts a component on a supervisor; setup errors are returned, not spawned.
pub type ComponentStart = fn(&mut Supervisor, &AppConfig) -> Result<()>;

/// Starts every component in turn. One that fails to start is logged and skipped,
/// and the ones already running stay up. Returns how many started.
pub fn start_components(
    supervisor: &mut Supervisor,
    config: &AppConfig,
    components: &[(&str, ComponentStart)],
) -> usize {
    let mut started = 0;
    for (name, start) in components {
        match start(supervisor, config) {
            Ok(()) => started += 1,
            Err(e) => error!("Failed to start {}: {:#}", name, e),
        }
    }
    started
}

pub fn spawn_alarm_consumer<S, H>(supervisor: &mut Supervisor, subscription: S, handler: H)
where
    S: Subscription + 'static,
    H: AlarmHandler + 'static,
{
    let name = handler.name().to_string();
    supervisor.spawn(&name, async move {
        run_alarm_loop(subscription, &handler).await;
        anyhow::Ok(())
    });
}

pub fn spawn_gateway(supervisor: &mut Supervisor, config: &AppConfig) -> Result<()> {
    let publisher: Arc<dyn Publisher> = Arc::new(KafkaPublisher::new(&config.kafka)?);
    gateway::spawn(supervisor, publisher, &config.gateway, &config.channels);
    Ok(())
}

pub fn spawn_escalation(supervisor: &mut Supervisor, config: &AppConfig) -> Result<()> {
    let notifier = EscalationNotifier::from_config(&config.escalation)?;
    let subscription = KafkaSubscription::new(
        &config.kafka,
        &config.escalation.group_id,
        &config.channels.alarms,
    )?;
    spawn_alarm_consumer(supervisor, subscription, notifier);
    Ok(())
}

pub fn spawn_nms_forwarder(supervisor: &mut Supervisor, config: &AppConfig) -> Result<()> {
    let forwarder = NmsForwarder::from_config(&config.nms)?;
    let subscription =
        KafkaSubscription::new(&config.kafka, &config.nms.group_id, &config.channels.alarms)?;
    spawn_alarm_consumer(supervisor, subscription, forwarder);
    Ok(())
}
