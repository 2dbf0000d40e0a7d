use anyhow::Result;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

use crate::broker::Publisher;
use crate::error::GatewayError;
use crate::event::RawTrap;

const MAX_DATAGRAM: usize = 65535;

/// JSON-over-UDP trap ingress. Nothing is ever sent back to the sender.
pub struct UdpTrapListener {
    socket: UdpSocket,
    publisher: Arc<dyn Publisher>,
    channel: String,
}

impl UdpTrapListener {
    pub async fn bind(
        addr: &str,
        publisher: Arc<dyn Publisher>,
        channel: impl Into<String>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("UDP JSON trap listener started on {}", socket.local_addr()?);
        Ok(Self { socket, publisher, channel: channel.into() })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receives until the task is dropped. A bad datagram only costs itself.
    pub async fn run(self) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (len, sender) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    error!("UDP listener receive error: {}", e);
                    continue;
                }
            };

            match self.process_datagram(&buf[..len], sender).await {
                Ok(()) => info!("UDP trap forwarded to {} (source {})", self.channel, sender.ip()),
                Err(GatewayError::Publish(e)) => {
                    error!("Dropping UDP trap from {}: {}", sender, e);
                }
                Err(e) => warn!("Ignoring malformed UDP packet from {}: {}", sender, e),
            }
        }
    }

    async fn process_datagram(&self, data: &[u8], sender: SocketAddr) -> Result<(), GatewayError> {
        let trap = RawTrap::from_datagram(data, sender)?;
        let payload = trap.to_payload()?;
        self.publisher.publish(&self.channel, &payload).await?;
        Ok(())
    }
}
