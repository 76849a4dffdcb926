//! Faulty agent variants for edge case testing.
//!
//! These agents simulate conditions that are difficult to reproduce with a
//! well-behaved agent.

use bytes::Bytes;
use snmp_trapkit::{Message, MessagePdu, Oid, PduType, Value, VarBind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// An agent that reads every datagram and never answers.
///
/// Useful for testing timeout behavior.
pub struct SilentAgent {
    addr: SocketAddr,
    received: Arc<AtomicUsize>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl SilentAgent {
    pub async fn new() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("failed to bind silent agent");
        let addr = socket.local_addr().unwrap();
        let received = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let task = {
            let received = received.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 65_535];
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        r = socket.recv_from(&mut buf) => {
                            if r.is_ok() {
                                received.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                }
            })
        };

        Self {
            addr,
            received,
            cancel,
            _task: task,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Datagrams received, one per transmission attempt.
    pub fn received(&self) -> usize {
        self.received.load(Ordering::Relaxed)
    }
}

impl Drop for SilentAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// An agent whose GETNEXT always answers with the same OID.
///
/// The first step of a walk succeeds; the second returns an OID equal to
/// the previous one.
pub struct NonIncreasingAgent {
    addr: SocketAddr,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl NonIncreasingAgent {
    pub async fn new(fixed: Oid) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("failed to bind non-increasing agent");
        let addr = socket.local_addr().unwrap();
        let cancel = CancellationToken::new();

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 65_535];
                loop {
                    let (len, peer) = tokio::select! {
                        _ = cancel.cancelled() => return,
                        r = socket.recv_from(&mut buf) => match r {
                            Ok(r) => r,
                            Err(_) => continue,
                        },
                    };
                    let Ok(msg) = Message::decode(Bytes::copy_from_slice(&buf[..len])) else {
                        continue;
                    };
                    let MessagePdu::Pdu(pdu) = &msg.pdu else {
                        continue;
                    };
                    if pdu.pdu_type != PduType::GetNextRequest {
                        continue;
                    }
                    let mut response = pdu.to_response();
                    response.varbinds = vec![VarBind::new(fixed.clone(), Value::Integer(1))];
                    let reply = Message::new(msg.version, msg.community.clone(), response);
                    let _ = socket.send_to(&reply.encode().unwrap(), peer).await;
                }
            })
        };

        Self {
            addr,
            cancel,
            _task: task,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for NonIncreasingAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
