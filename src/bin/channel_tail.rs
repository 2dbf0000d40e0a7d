use anyhow::Result;
use clap::Parser;
use log::info;

use trapline::runtime::CommonArgs;
use trapline::{KafkaSubscription, Subscription};

#[derive(Parser)]
#[command(name = "channel-tail")]
#[command(about = "Print messages published on a pipeline channel")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Channel to follow (defaults to the configured traps channel)
    #[arg(short = 'C', long)]
    channel: Option<String>,

    /// Consumer group prefix; each run joins its own instance of it
    #[arg(short, long, default_value = "channel-tail")]
    group_id: String,

    /// Pretty print JSON messages
    #[arg(short, long)]
    pretty: bool,

    /// Maximum number of messages to print (0 = unlimited)
    #[arg(short, long, default_value = "0")]
    max_messages: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.common.bootstrap();

    let channel = args.channel.unwrap_or_else(|| config.channels.traps.clone());
    let mut subscription = KafkaSubscription::new(&config.kafka, &args.group_id, &channel)?;

    info!("📥 Following {} as {}", channel, args.group_id);

    let mut count = 0;
    while let Some(payload) = subscription.next_payload().await {
        count += 1;

        if args.pretty {
            match serde_json::from_str::<serde_json::Value>(&payload) {
                Ok(json_value) => println!("{}", serde_json::to_string_pretty(&json_value)?),
                Err(_) => println!("{}", payload),
            }
        } else {
            println!("{}", payload);
        }

        if args.max_messages > 0 && count >= args.max_messages {
            info!("Reached maximum message limit: {}", args.max_messages);
            break;
        }
    }

    info!("📊 Total messages printed: {}", count);
    Ok(())
}
