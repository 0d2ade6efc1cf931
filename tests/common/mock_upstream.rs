use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// Behavior of the mock upstream, swappable at runtime.
#[derive(Debug, Clone)]
pub struct UpstreamBehavior {
    pub delay: Option<Duration>,
    pub silent: bool,
    pub rcode: ResponseCode,
    pub answer: Option<Ipv4Addr>,
    pub ttl: u32,
}

impl Default for UpstreamBehavior {
    fn default() -> Self {
        Self {
            delay: None,
            silent: false,
            rcode: ResponseCode::NoError,
            answer: Some(Ipv4Addr::new(93, 184, 216, 34)),
            ttl: 300,
        }
    }
}

impl UpstreamBehavior {
    pub fn answering(ip: Ipv4Addr, ttl: u32) -> Self {
        Self {
            answer: Some(ip),
            ttl,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    pub fn nxdomain() -> Self {
        Self {
            rcode: ResponseCode::NXDomain,
            answer: None,
            ..Self::default()
        }
    }
}

/// In-process mock upstream resolver; counts every exchange it serves.
pub struct MockUpstream {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    behavior: Arc<Mutex<UpstreamBehavior>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    pub async fn start(behavior: UpstreamBehavior) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let queries = Arc::new(AtomicUsize::new(0));
        let behavior = Arc::new(Mutex::new(behavior));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task_queries = Arc::clone(&queries);
        let task_behavior = Arc::clone(&behavior);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { break };
                        task_queries.fetch_add(1, Ordering::SeqCst);

                        let behavior = task_behavior.lock().unwrap().clone();
                        if behavior.silent {
                            continue;
                        }
                        if let Some(delay) = behavior.delay {
                            tokio::time::sleep(delay).await;
                        }
                        if let Some(response) = respond(&buf[..len], &behavior) {
                            let _ = socket.send_to(&response, peer).await;
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            behavior,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn set_behavior(&self, behavior: UpstreamBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn respond(query_bytes: &[u8], behavior: &UpstreamBehavior) -> Option<Vec<u8>> {
    let query = Message::from_vec(query_bytes).ok()?;
    let question = query.queries().first()?.clone();

    let mut response = Message::new(query.id(), MessageType::Response, OpCode::Query);
    response.set_recursion_desired(query.recursion_desired());
    response.set_recursion_available(true);
    response.set_response_code(behavior.rcode);
    response.add_query(question.clone());

    if behavior.rcode == ResponseCode::NoError {
        if let Some(ip) = behavior.answer {
            response.add_answer(Record::from_rdata(
                question.name().clone(),
                behavior.ttl,
                RData::A(A(ip)),
            ));
        }
    }

    response.to_vec().ok()
}
