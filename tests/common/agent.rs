//! In-process SNMP agent for testing.
//!
//! Serves a BTreeMap over UDP using the library's own codec. Agents bind to
//! ephemeral localhost ports and shut down cleanly on drop.

use bytes::Bytes;
use snmp_trapkit::{ErrorStatus, Message, MessagePdu, Oid, Pdu, PduType, Value, VarBind, Version};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::fixtures;

type Mib = Arc<Mutex<BTreeMap<Oid, Value>>>;
type RequestLog = Arc<Mutex<Vec<(PduType, i32)>>>;

/// An in-process SNMP agent for testing.
///
/// Answers GET, GETNEXT, GETBULK and SET for v1 and v2c. Requests with an
/// unknown community are dropped like a real agent would; SET needs the
/// write community.
///
/// # Example
///
/// ```ignore
/// let agent = TestAgent::new().await;
/// let client = Client::builder(agent.addr().to_string()).build()?;
/// let result = client.get(&oid!(1,3,6,1,2,1,1,1,0)).await?;
/// // Agent automatically stops when dropped
/// ```
pub struct TestAgent {
    addr: SocketAddr,
    data: Mib,
    requests: Arc<AtomicUsize>,
    log: RequestLog,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

/// Builder for [`TestAgent`].
pub struct TestAgentBuilder {
    data: BTreeMap<Oid, Value>,
    drop_first: usize,
    late_first: Option<Duration>,
}

impl TestAgentBuilder {
    pub fn data(mut self, data: BTreeMap<Oid, Value>) -> Self {
        self.data = data;
        self
    }

    /// Ignore the first `n` requests, to exercise retransmission.
    pub fn drop_first(mut self, n: usize) -> Self {
        self.drop_first = n;
        self
    }

    /// Answer the first request only after `delay`, and never answer its
    /// retransmissions. Other requests are answered immediately.
    pub fn late_first(mut self, delay: Duration) -> Self {
        self.late_first = Some(delay);
        self
    }

    pub async fn start(self) -> TestAgent {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test agent");
        let addr = socket.local_addr().unwrap();
        let data: Mib = Arc::new(Mutex::new(self.data));
        let requests = Arc::new(AtomicUsize::new(0));
        let log = RequestLog::default();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(serve(
            Arc::new(socket),
            Shared {
                data: data.clone(),
                requests: requests.clone(),
                log: log.clone(),
            },
            self.drop_first,
            self.late_first,
            cancel.clone(),
        ));

        TestAgent {
            addr,
            data,
            requests,
            log,
            cancel,
            _task: task,
        }
    }
}

impl TestAgent {
    pub fn builder() -> TestAgentBuilder {
        TestAgentBuilder {
            data: fixtures::system_mib(),
            drop_first: 0,
            late_first: None,
        }
    }

    /// Create an agent with default system MIB data.
    pub async fn new() -> Self {
        Self::builder().start().await
    }

    /// Create an agent with custom initial data.
    pub async fn with_data(data: BTreeMap<Oid, Value>) -> Self {
        Self::builder().data(data).start().await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Current value stored at `oid`.
    pub fn value(&self, oid: &Oid) -> Option<Value> {
        self.data.lock().unwrap().get(oid).cloned()
    }

    /// Datagrams received so far, including dropped ones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// `(pdu type, request-id)` of every request decoded so far, dropped
    /// ones included.
    pub fn requests(&self) -> Vec<(PduType, i32)> {
        self.log.lock().unwrap().clone()
    }

    /// Stop answering; the socket closes once the task exits.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Shared {
    data: Mib,
    requests: Arc<AtomicUsize>,
    log: RequestLog,
}

async fn serve(
    socket: Arc<UdpSocket>,
    shared: Shared,
    drop_first: usize,
    late_first: Option<Duration>,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; 65_535];
    let mut delayed: Option<i32> = None;
    loop {
        let (len, peer) = tokio::select! {
            _ = cancel.cancelled() => return,
            r = socket.recv_from(&mut buf) => match r {
                Ok(r) => r,
                Err(_) => continue,
            },
        };
        let seen = shared.requests.fetch_add(1, Ordering::Relaxed) + 1;
        let Ok(request) = Message::decode(Bytes::copy_from_slice(&buf[..len])) else {
            continue;
        };
        let request_id = request.pdu.request_id();
        if let (MessagePdu::Pdu(pdu), Some(id)) = (&request.pdu, request_id) {
            shared.log.lock().unwrap().push((pdu.pdu_type, id));
        }
        if seen <= drop_first {
            continue;
        }
        if delayed.is_some() && delayed == request_id {
            continue;
        }
        let Some(response) = answer(&shared.data, request) else {
            continue;
        };
        let bytes = response.encode().expect("test agent response must encode");

        match late_first {
            Some(delay) if delayed.is_none() => {
                delayed = request_id;
                let socket = socket.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {
                            let _ = socket.send_to(&bytes, peer).await;
                        }
                    }
                });
            }
            _ => {
                let _ = socket.send_to(&bytes, peer).await;
            }
        }
    }
}

/// Build the response for `request`, or `None` to stay silent.
pub fn answer(data: &Mutex<BTreeMap<Oid, Value>>, request: Message) -> Option<Message> {
    let MessagePdu::Pdu(pdu) = request.pdu else {
        return None;
    };
    let version = request.version;
    let community = request.community;
    let writable = &community[..] == fixtures::COMMUNITY_RW.as_bytes();
    if !writable && &community[..] != fixtures::COMMUNITY_RO.as_bytes() {
        return None;
    }

    let mut mib = data.lock().unwrap();
    let response = match pdu.pdu_type {
        PduType::GetRequest => lookup(&pdu, version, |oid| {
            mib.get(oid)
                .map(|v| VarBind::new(oid.clone(), v.clone()))
        }),
        PduType::GetNextRequest => lookup(&pdu, version, |oid| next_after(&mib, oid)),
        PduType::GetBulkRequest => bulk(&mib, &pdu),
        PduType::SetRequest => {
            if !writable {
                let status = match version {
                    Version::V1 => ErrorStatus::ReadOnly,
                    _ => ErrorStatus::NoAccess,
                };
                error_response(&pdu, status, 1)
            } else {
                for vb in &pdu.varbinds {
                    mib.insert(vb.oid.clone(), vb.value.clone());
                }
                pdu.to_response()
            }
        }
        _ => return None,
    };
    Some(Message::new(version, community, response))
}

fn next_after(mib: &BTreeMap<Oid, Value>, oid: &Oid) -> Option<VarBind> {
    mib.range((Bound::Excluded(oid.clone()), Bound::Unbounded))
        .next()
        .map(|(k, v)| VarBind::new(k.clone(), v.clone()))
}

/// GET/GETNEXT: v2c reports misses inline, v1 fails the whole PDU with
/// noSuchName.
fn lookup(pdu: &Pdu, version: Version, mut find: impl FnMut(&Oid) -> Option<VarBind>) -> Pdu {
    let miss = if pdu.pdu_type == PduType::GetRequest {
        Value::NoSuchObject
    } else {
        Value::EndOfMibView
    };
    let mut varbinds = Vec::with_capacity(pdu.varbinds.len());
    for (i, vb) in pdu.varbinds.iter().enumerate() {
        match find(&vb.oid) {
            Some(found) => varbinds.push(found),
            None if version == Version::V1 => {
                return error_response(pdu, ErrorStatus::NoSuchName, i as i32 + 1);
            }
            None => varbinds.push(VarBind::new(vb.oid.clone(), miss.clone())),
        }
    }
    Pdu {
        varbinds,
        ..pdu.to_response()
    }
}

fn bulk(mib: &BTreeMap<Oid, Value>, pdu: &Pdu) -> Pdu {
    let non_repeaters = pdu.non_repeaters().max(0) as usize;
    let max_repetitions = pdu.max_repetitions().max(0) as usize;
    let step = |oid: &Oid| {
        next_after(mib, oid).unwrap_or_else(|| VarBind::new(oid.clone(), Value::EndOfMibView))
    };

    let mut varbinds = Vec::new();
    for vb in pdu.varbinds.iter().take(non_repeaters) {
        varbinds.push(step(&vb.oid));
    }
    let mut cursors: Vec<Oid> = pdu
        .varbinds
        .iter()
        .skip(non_repeaters)
        .map(|vb| vb.oid.clone())
        .collect();
    for _ in 0..max_repetitions {
        if cursors.is_empty() {
            break;
        }
        let mut all_ended = true;
        for cursor in cursors.iter_mut() {
            let next = step(cursor);
            if next.value != Value::EndOfMibView {
                all_ended = false;
            }
            *cursor = next.oid.clone();
            varbinds.push(next);
        }
        if all_ended {
            break;
        }
    }
    Pdu {
        varbinds,
        ..pdu.to_response()
    }
}

fn error_response(pdu: &Pdu, status: ErrorStatus, index: i32) -> Pdu {
    Pdu {
        error_status: status.as_i32(),
        error_index: index,
        ..pdu.to_response()
    }
}
