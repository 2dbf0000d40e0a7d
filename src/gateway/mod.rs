//! Trap ingress: an HTTP endpoint and a UDP listener publishing to the traps channel.
//!
//! The two paths share only the publisher and run as separate supervised tasks.

pub mod http;
pub mod udp;

use log::info;
use std::sync::Arc;

use crate::broker::Publisher;
use crate::config::{ChannelsConfig, GatewayConfig};
use crate::supervisor::Supervisor;

pub use http::router;
pub use udp::UdpTrapListener;

/// Spawns the HTTP and UDP ingress tasks onto `supervisor`.
pub fn spawn(
    supervisor: &mut Supervisor,
    publisher: Arc<dyn Publisher>,
    gateway: &GatewayConfig,
    channels: &ChannelsConfig,
) {
    let app = router(publisher.clone(), channels.traps.clone());
    let http_addr = gateway.http_addr.clone();
    supervisor.spawn("trap-http", async move {
        let listener = tokio::net::TcpListener::bind(&http_addr).await?;
        info!("Trap listener HTTP endpoint ready on http://{}", listener.local_addr()?);
        axum::serve(listener, app).await?;
        anyhow::Ok(())
    });

    let udp_addr = gateway.udp_addr.clone();
    let traps = channels.traps.clone();
    supervisor.spawn("trap-udp", async move {
        UdpTrapListener::bind(&udp_addr, publisher, traps).await?.run().await
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{MemoryBroker, Subscription};
    use crate::supervisor::TaskExit;
    use std::time::Duration;
    use tokio::net::{TcpListener, UdpSocket};

    #[tokio::test]
    async fn test_http_bind_failure_leaves_udp_running() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let udp_addr = std::net::UdpSocket::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let gateway = GatewayConfig {
            http_addr: taken.local_addr().unwrap().to_string(),
            udp_addr: udp_addr.to_string(),
        };
        let broker = MemoryBroker::default();
        let mut traps = broker.subscribe("traps").unwrap();

        let mut supervisor = Supervisor::new();
        spawn(&mut supervisor, Arc::new(broker.clone()), &gateway, &ChannelsConfig::default());

        let (name, exit) = tokio::time::timeout(Duration::from_secs(5), supervisor.join_next())
            .await
            .expect("HTTP task did not fail")
            .unwrap();
        assert_eq!(name, "trap-http");
        assert!(matches!(exit, TaskExit::Failed(_)));
        assert_eq!(supervisor.len(), 1);

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let payload = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                client.send_to(br#"{"source_ip":"10.2.2.2"}"#, udp_addr).await.unwrap();
                if let Ok(Some(payload)) =
                    tokio::time::timeout(Duration::from_millis(100), traps.next_payload()).await
                {
                    return payload;
                }
            }
        })
        .await
        .expect("UDP listener stopped with the HTTP task");

        assert_eq!(payload, r#"{"source_ip":"10.2.2.2"}"#);
        assert_eq!(supervisor.len(), 1);
        drop(taken);
    }
}
