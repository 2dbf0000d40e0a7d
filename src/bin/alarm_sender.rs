use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use trapline::runtime::CommonArgs;
use trapline::{AlarmEvent, KafkaPublisher, Publisher};

#[derive(Parser)]
#[command(name = "alarm-sender")]
#[command(about = "Publish JSONL alarm events to the alarms channel at a configurable rate")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Path to JSONL file, one alarm event per line
    #[arg(short, long)]
    data: PathBuf,

    /// Send rate in messages per second
    #[arg(short, long, default_value = "10")]
    rate: u64,

    /// Maximum number of messages to send (0 = unlimited)
    #[arg(short, long, default_value = "0")]
    max_messages: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.common.bootstrap();

    info!("🚀 Starting alarm sender");
    info!("Data file: {:?}", args.data);
    info!("Send rate: {} messages/second", args.rate);

    let publisher = KafkaPublisher::new(&config.kafka)?;
    let channel = config.channels.alarms.clone();

    let file = File::open(&args.data).await?;
    let mut lines = BufReader::new(file).lines();

    let delay = if args.rate > 0 {
        Duration::from_millis(1000 / args.rate)
    } else {
        Duration::from_millis(0)
    };

    let mut count = 0;
    let mut success_count = 0;
    let mut error_count = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if args.max_messages > 0 && count >= args.max_messages {
            info!("Reached maximum message limit: {}", args.max_messages);
            break;
        }
        count += 1;

        let event = match AlarmEvent::from_json(&line) {
            Ok(event) => event.normalized(chrono::Utc::now()),
            Err(e) => {
                warn!("Skipping line {}: not an alarm event: {}", count, e);
                error_count += 1;
                continue;
            }
        };

        match publisher.publish(&channel, &event.to_json()?).await {
            Ok(()) => {
                success_count += 1;
                if args.common.verbose {
                    info!("✅ Sent alarm {}", event.id_label());
                } else if count % 100 == 0 {
                    info!("📊 Sent {} messages ({} success, {} errors)", count, success_count, error_count);
                }
            }
            Err(e) => {
                error_count += 1;
                error!("❌ Failed to send alarm {}: {}", event.id_label(), e);
            }
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!("🎉 Completed sending alarms");
    info!("📊 Final stats: {} total, {} success, {} errors", count, success_count, error_count);

    Ok(())
}
