use super::udp_pool::UdpSocketPool;
use super::DnsExchange;
use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use warden_dns_domain::ResolveError;

/// Maximum UDP DNS response size with EDNS(0).
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// DNS over UDP using pooled ephemeral sockets.
pub struct UdpTransport {
    pool: Arc<UdpSocketPool>,
}

impl UdpTransport {
    pub fn new(pool: Arc<UdpSocketPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DnsExchange for UdpTransport {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Bytes, ResolveError> {
        let pooled = self.pool.acquire(server).await?;
        let socket = pooled.socket();
        let query_id = query
            .get(0..2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .unwrap_or(0);

        let exchange = async {
            socket.send_to(query, server).await.map_err(|e| {
                ResolveError::UpstreamNetwork {
                    server: server.to_string(),
                    message: format!("send failed: {}", e),
                }
            })?;

            let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
            loop {
                let (len, from) = socket.recv_from(&mut buf).await.map_err(|e| {
                    ResolveError::UpstreamNetwork {
                        server: server.to_string(),
                        message: format!("recv failed: {}", e),
                    }
                })?;

                if from.ip() != server.ip() {
                    warn!(
                        expected = %server,
                        received_from = %from,
                        "UDP response from unexpected source"
                    );
                    continue;
                }

                // Stale datagram from an earlier exchange on this pooled
                // socket; keep waiting for our id.
                let response_id = buf
                    .get(0..2)
                    .map(|b| u16::from_be_bytes([b[0], b[1]]))
                    .unwrap_or(0);
                if len >= 12 && response_id == query_id {
                    buf.truncate(len);
                    return Ok(Bytes::from(buf));
                }
                debug!(
                    server = %server,
                    response_id,
                    query_id,
                    "Discarding mismatched UDP datagram"
                );
            }
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::UpstreamTimeout {
                server: server.to_string(),
            }),
        }
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
