use anyhow::Result;
use clap::Parser;

use trapline::runtime::{self, CommonArgs};
use trapline::Supervisor;

#[derive(Parser)]
#[command(name = "trap-gateway")]
#[command(about = "Accept traps over HTTP and UDP and publish them to the traps channel")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// HTTP listen address (overrides config file)
    #[arg(long)]
    http_addr: Option<String>,

    /// UDP listen address (overrides config file)
    #[arg(long)]
    udp_addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = args.common.bootstrap();

    if let Some(addr) = args.http_addr {
        config.gateway.http_addr = addr;
    }
    if let Some(addr) = args.udp_addr {
        config.gateway.udp_addr = addr;
    }

    let mut supervisor = Supervisor::new();
    runtime::spawn_gateway(&mut supervisor, &config)?;
    supervisor.run_until_shutdown(runtime::shutdown_signal()).await;

    Ok(())
}
