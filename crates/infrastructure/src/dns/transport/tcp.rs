use super::DnsExchange;
use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use warden_dns_domain::ResolveError;

/// DNS over TCP (RFC 1035 §4.2.2 length-prefixed framing).
///
/// Used for the truncated-bit retry path; each exchange opens a fresh
/// connection.
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsExchange for TcpTransport {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Bytes, ResolveError> {
        let network_err = |message: String| ResolveError::UpstreamNetwork {
            server: server.to_string(),
            message,
        };

        let exchange = async {
            let mut stream = TcpStream::connect(server)
                .await
                .map_err(|e| network_err(format!("connect failed: {}", e)))?;

            let len = u16::try_from(query.len())
                .map_err(|_| network_err("query exceeds TCP frame limit".into()))?;
            stream
                .write_all(&len.to_be_bytes())
                .await
                .map_err(|e| network_err(format!("write failed: {}", e)))?;
            stream
                .write_all(query)
                .await
                .map_err(|e| network_err(format!("write failed: {}", e)))?;

            let mut len_buf = [0u8; 2];
            stream
                .read_exact(&mut len_buf)
                .await
                .map_err(|e| network_err(format!("read failed: {}", e)))?;
            let response_len = u16::from_be_bytes(len_buf) as usize;

            let mut response = vec![0u8; response_len];
            stream
                .read_exact(&mut response)
                .await
                .map_err(|e| network_err(format!("read failed: {}", e)))?;

            Ok(Bytes::from(response))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::UpstreamTimeout {
                server: server.to_string(),
            }),
        }
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}
