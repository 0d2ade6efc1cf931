use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// How the mock upstream answers.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Sleep before answering.
    pub delay: Option<Duration>,
    /// Do not answer at all (client times out).
    pub silent: bool,
    pub rcode: ResponseCode,
    /// A-record payload for NOERROR answers.
    pub answer: Option<Ipv4Addr>,
    pub ttl: u32,
}

impl Default for MockBehavior {
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

impl MockBehavior {
    pub fn answering(ip: Ipv4Addr, ttl: u32) -> Self {
        Self {
            answer: Some(ip),
            ttl,
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    pub fn rcode(rcode: ResponseCode) -> Self {
        Self {
            rcode,
            answer: None,
            ..Self::default()
        }
    }
}

/// In-process mock upstream DNS server for forwarder and pipeline tests.
///
/// Counts every query it sees; behavior can be swapped at runtime to
/// simulate an upstream recovering.
pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    behavior: Arc<Mutex<MockBehavior>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(behavior: MockBehavior) -> std::io::Result<Self> {
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
                        if let Some(response) = build_response(&buf[..len], &behavior) {
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

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn build_response(query_bytes: &[u8], behavior: &MockBehavior) -> Option<Vec<u8>> {
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
