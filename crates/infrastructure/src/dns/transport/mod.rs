pub mod tcp;
pub mod udp;
pub mod udp_pool;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;
pub use udp_pool::UdpSocketPool;

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use warden_dns_domain::ResolveError;

/// One request/response exchange against a single upstream.
#[async_trait]
pub trait DnsExchange: Send + Sync {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Bytes, ResolveError>;

    fn protocol_name(&self) -> &'static str;
}
