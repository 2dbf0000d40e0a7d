use anyhow::Result;
use clap::Parser;

use trapline::runtime::{self, CommonArgs};
use trapline::Supervisor;

#[derive(Parser)]
#[command(name = "escalation-notifier")]
#[command(about = "Post severe raised alarms to a chat webhook")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Webhook URL (overrides config file and SLACK_WEBHOOK_URL)
    #[arg(short, long)]
    webhook_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = args.common.bootstrap();

    if let Some(url) = args.webhook_url {
        config.escalation.webhook_url = Some(url);
    }

    let mut supervisor = Supervisor::new();
    runtime::spawn_escalation(&mut supervisor, &config)?;
    supervisor.run_until_shutdown(runtime::shutdown_signal()).await;

    Ok(())
}
