use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use warden_dns_domain::ResolveError;

/// Reuses ephemeral-port UDP sockets across upstream exchanges.
///
/// A socket is handed out exclusively and returned on drop, so concurrent
/// queries never interleave datagrams on one socket. Bounded: surplus
/// sockets are simply closed.
pub struct UdpSocketPool {
    v4: Mutex<Vec<UdpSocket>>,
    v6: Mutex<Vec<UdpSocket>>,
    max_idle_per_family: usize,
}

impl UdpSocketPool {
    pub fn new(max_idle_per_family: usize) -> Self {
        Self {
            v4: Mutex::new(Vec::new()),
            v6: Mutex::new(Vec::new()),
            max_idle_per_family,
        }
    }

    pub async fn acquire(
        self: &Arc<Self>,
        server: SocketAddr,
    ) -> Result<PooledSocket, ResolveError> {
        let reused = {
            let mut idle = self.family(server.is_ipv6()).lock().unwrap();
            idle.pop()
        };

        let socket = match reused {
            Some(socket) => socket,
            None => {
                let bind_addr: SocketAddr = if server.is_ipv6() {
                    "[::]:0".parse().unwrap()
                } else {
                    "0.0.0.0:0".parse().unwrap()
                };
                UdpSocket::bind(bind_addr).await.map_err(|e| {
                    ResolveError::UpstreamNetwork {
                        server: server.to_string(),
                        message: format!("failed to bind UDP socket: {}", e),
                    }
                })?
            }
        };

        Ok(PooledSocket {
            socket: Some(socket),
            pool: Arc::clone(self),
            is_ipv6: server.is_ipv6(),
        })
    }

    fn family(&self, is_ipv6: bool) -> &Mutex<Vec<UdpSocket>> {
        if is_ipv6 {
            &self.v6
        } else {
            &self.v4
        }
    }

    fn release(&self, socket: UdpSocket, is_ipv6: bool) {
        let mut idle = self.family(is_ipv6).lock().unwrap();
        if idle.len() < self.max_idle_per_family {
            idle.push(socket);
        }
    }

    pub fn idle_count(&self) -> usize {
        self.v4.lock().unwrap().len() + self.v6.lock().unwrap().len()
    }
}

/// Exclusive handle to a pooled socket; returns it to the pool on drop.
pub struct PooledSocket {
    socket: Option<UdpSocket>,
    pool: Arc<UdpSocketPool>,
    is_ipv6: bool,
}

impl PooledSocket {
    pub fn socket(&self) -> &UdpSocket {
        self.socket.as_ref().expect("socket present until drop")
    }
}

impl Drop for PooledSocket {
    fn drop(&mut self) {
        if let Some(socket) = self.socket.take() {
            self.pool.release(socket, self.is_ipv6);
        }
    }
}
