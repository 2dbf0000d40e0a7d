use anyhow::Result;
use clap::Parser;

use trapline::runtime::{self, CommonArgs};
use trapline::Supervisor;

#[derive(Parser)]
#[command(name = "nms-forwarder")]
#[command(about = "Forward every alarm to the network-management system REST endpoint")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Forward target URL (overrides config file and OPEN_NMS_URL)
    #[arg(short, long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = args.common.bootstrap();

    if let Some(url) = args.url {
        config.nms.url = Some(url);
    }

    let mut supervisor = Supervisor::new();
    runtime::spawn_nms_forwarder(&mut supervisor, &config)?;
    supervisor.run_until_shutdown(runtime::shutdown_signal()).await;

    Ok(())
}
