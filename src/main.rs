use anyhow::{bail, Result};
use clap::Parser;
use log::info;

use trapline::runtime::{self, CommonArgs, ComponentStart};
use trapline::Supervisor;

#[derive(Parser)]
#[command(name = "trapline")]
#[command(about = "Run the trap gateway, escalation notifier and NMS forwarder in one process")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.common.bootstrap();

    info!("🚀 Starting trap pipeline");

    // Each component gets its own broker connection and its own task. A component
    // that cannot start is logged and the rest run without it.
    let mut supervisor = Supervisor::new();
    runtime::start_components(
        &mut supervisor,
        &config,
        &[
            ("gateway", runtime::spawn_gateway as ComponentStart),
            ("escalation notifier", runtime::spawn_escalation),
            ("NMS forwarder", runtime::spawn_nms_forwarder),
        ],
    );
    if supervisor.is_empty() {
        bail!("no pipeline component could be started");
    }

    supervisor.run_until_shutdown(runtime::shutdown_signal()).await;

    info!("✅ Trap pipeline stopped");
    Ok(())
}
