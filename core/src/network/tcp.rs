use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use sonar_common::network::subdomain::ServiceTag;
use sonar_common::resolving::ServiceProber;

/// Marks a service responsive when a TCP handshake to its well-known port
/// completes within the timeout. Nothing is sent over the connection.
#[derive(Debug, Clone, Copy)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn probe_port(&self, addr: IpAddr, port: u16) -> bool {
        let socket_addr: SocketAddr = SocketAddr::new(addr, port);

        match timeout(self.timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                trace!("Connection to {socket_addr} refused: {e}");
                false
            }
            Err(_elapsed) => false,
        }
    }
}

#[async_trait]
impl ServiceProber for TcpProber {
    async fn probe(&self, addr: IpAddr, service: ServiceTag) -> bool {
        self.probe_port(addr, service.port()).await
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
