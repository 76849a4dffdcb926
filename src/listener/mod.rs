//! UDP trap listener.
//!
//! [`TrapListener`] binds a UDP port, decodes each datagram on its own and
//! hands notifications to a [`TrapHandler`]. A bad datagram is logged,
//! counted and reported; it never stops the listener. InformRequests are
//! acknowledged before dispatch.
//!
//! ```no_run
//! use snmp_trapkit::listener::{DispatchMode, OverflowPolicy, ReceivedTrap, TrapListener};
//!
//! # async fn example() -> snmp_trapkit::Result<()> {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ReceivedTrap>();
//! let mut listener = TrapListener::builder()
//!     .dispatch(DispatchMode::Queued {
//!         capacity: 1024,
//!         overflow: OverflowPolicy::DropOldest,
//!     })
//!     .build(tx);
//!
//! let addr = listener.start("0.0.0.0:1162".parse().unwrap()).await?;
//! println!("listening on {}", addr);
//!
//! while let Some(trap) = rx.recv().await {
//!     println!("{}", trap);
//! }
//! listener.stop().await;
//! # Ok(())
//! # }
//! ```

mod notification;
mod queue;

pub use notification::{Notification, ReceivedTrap};
pub use queue::OverflowPolicy;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::message::{Message, MessagePdu};
use crate::pdu::PduType;
use crate::util::{MAX_DATAGRAM, bind_udp_socket};

use queue::DispatchQueue;

/// Receives notifications from a [`TrapListener`].
///
/// Both methods run on a listener task; long work belongs on a channel or
/// a spawned task.
pub trait TrapHandler: Send + Sync + 'static {
    fn on_trap(&self, trap: ReceivedTrap);

    /// A datagram from `source` could not be turned into a notification.
    fn on_decode_error(&self, source: SocketAddr, error: &Error) {
        let _ = (source, error);
    }
}

impl TrapHandler for UnboundedSender<ReceivedTrap> {
    fn on_trap(&self, trap: ReceivedTrap) {
        if self.send(trap).is_err() {
            tracing::debug!(target: "snmp_trapkit::listener", "trap channel closed");
        }
    }
}

/// Lifecycle of a [`TrapListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Listening,
}

/// Where the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Decode and call the handler on the receive task.
    #[default]
    Inline,
    /// Queue raw datagrams for a separate worker task. The receive task never
    /// waits on the handler; a full queue applies `overflow`.
    Queued {
        capacity: usize,
        overflow: OverflowPolicy,
    },
}

/// Counter snapshot from [`TrapListener::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListenerStats {
    /// Datagrams read from the socket.
    pub received: u64,
    /// Notifications handed to the handler.
    pub dispatched: u64,
    /// Datagrams that failed to decode.
    pub decode_errors: u64,
    /// Valid messages that were not notifications.
    pub ignored: u64,
    /// Datagrams discarded by a full queue.
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    dispatched: AtomicU64,
    decode_errors: AtomicU64,
    ignored: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ListenerStats {
        ListenerStats {
            received: self.received.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

struct Datagram {
    data: Bytes,
    source: SocketAddr,
}

/// State shared by the receive task and the dispatch worker.
struct Shared {
    socket: UdpSocket,
    handler: Arc<dyn TrapHandler>,
    counters: Arc<Counters>,
    respond_to_informs: bool,
}

/// Builder for [`TrapListener`].
#[derive(Debug, Clone)]
pub struct ListenerBuilder {
    dispatch: DispatchMode,
    respond_to_informs: bool,
}

impl Default for ListenerBuilder {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Inline,
            respond_to_informs: true,
        }
    }
}

impl ListenerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch mode (default: inline).
    pub fn dispatch(mut self, mode: DispatchMode) -> Self {
        self.dispatch = mode;
        self
    }

    /// Answer InformRequests with a Response (default: true).
    pub fn respond_to_informs(mut self, respond: bool) -> Self {
        self.respond_to_informs = respond;
        self
    }

    pub fn build(self, handler: impl TrapHandler) -> TrapListener {
        TrapListener {
            handler: Arc::new(handler),
            dispatch: self.dispatch,
            respond_to_informs: self.respond_to_informs,
            counters: Arc::new(Counters::default()),
            running: None,
        }
    }
}

struct Running {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// UDP notification listener.
pub struct TrapListener {
    handler: Arc<dyn TrapHandler>,
    dispatch: DispatchMode,
    respond_to_informs: bool,
    counters: Arc<Counters>,
    running: Option<Running>,
}

impl std::fmt::Debug for TrapListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrapListener")
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl TrapListener {
    pub fn builder() -> ListenerBuilder {
        ListenerBuilder::new()
    }

    /// Listener with inline dispatch.
    pub fn new(handler: impl TrapHandler) -> Self {
        ListenerBuilder::new().build(handler)
    }

    pub fn state(&self) -> ListenerState {
        if self.running.is_some() {
            ListenerState::Listening
        } else {
            ListenerState::Stopped
        }
    }

    /// Bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    pub fn stats(&self) -> ListenerStats {
        self.counters.snapshot()
    }

    /// Bind `bind_addr` and start receiving. Port 0 picks a free port; the
    /// bound address is returned.
    pub async fn start(&mut self, bind_addr: SocketAddr) -> Result<SocketAddr> {
        if let Some(running) = &self.running {
            return Err(Error::config(format!(
                "listener already running on {}",
                running.local_addr
            )));
        }
        let queue = match self.dispatch {
            DispatchMode::Queued { capacity: 0, .. } => {
                return Err(Error::config("dispatch queue capacity must be at least 1"));
            }
            DispatchMode::Queued { capacity, overflow } => {
                Some(Arc::new(DispatchQueue::new(capacity, overflow)))
            }
            DispatchMode::Inline => None,
        };

        let socket = bind_udp_socket(bind_addr).map_err(|e| Error::transport(Some(bind_addr), e))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::transport(Some(bind_addr), e))?;

        let shared = Arc::new(Shared {
            socket,
            handler: self.handler.clone(),
            counters: self.counters.clone(),
            respond_to_informs: self.respond_to_informs,
        });
        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(2);

        if let Some(queue) = &queue {
            tasks.push(tokio::spawn(dispatch_worker(
                shared.clone(),
                queue.clone(),
                cancel.clone(),
            )));
        }
        tasks.push(tokio::spawn(receive_loop(shared, queue, cancel.clone())));

        tracing::info!(
            target: "snmp_trapkit::listener",
            { snmp.local_addr = %local_addr,
            dispatch = ?self.dispatch },
            "listening for traps"
        );
        self.running = Some(Running {
            local_addr,
            cancel,
            tasks,
        });
        Ok(local_addr)
    }

    /// Stop receiving and wait for the listener tasks to finish. Queued
    /// datagrams are still dispatched. A no-op when already stopped.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.cancel.cancel();
        for task in running.tasks {
            if let Err(e) = task.await {
                tracing::warn!(target: "snmp_trapkit::listener", error = %e, "listener task failed");
            }
        }
        tracing::info!(
            target: "snmp_trapkit::listener",
            { snmp.local_addr = %running.local_addr },
            "listener stopped"
        );
    }
}

impl Drop for TrapListener {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}

async fn receive_loop(
    shared: Arc<Shared>,
    queue: Option<Arc<DispatchQueue<Datagram>>>,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = shared.socket.recv_from(&mut buf) => received,
        };
        let (len, source) = match received {
            Ok(received) => received,
            Err(e) => {
                tracing::warn!(target: "snmp_trapkit::listener", error = %e, "receive failed");
                continue;
            }
        };
        Counters::bump(&shared.counters.received);
        let data = Bytes::copy_from_slice(&buf[..len]);

        match &queue {
            None => process(&shared, data, source).await,
            Some(queue) => {
                if let Some(dropped) = queue.push(Datagram { data, source }) {
                    Counters::bump(&shared.counters.dropped);
                    tracing::warn!(
                        target: "snmp_trapkit::listener",
                        { snmp.source = %dropped.source },
                        "dispatch queue full, datagram dropped"
                    );
                }
            }
        }
    }
    tracing::debug!(target: "snmp_trapkit::listener", "receive loop exited");
}

async fn dispatch_worker(
    shared: Arc<Shared>,
    queue: Arc<DispatchQueue<Datagram>>,
    cancel: CancellationToken,
) {
    while let Some(datagram) = queue.pop(&cancel).await {
        process(&shared, datagram.data, datagram.source).await;
    }
    tracing::debug!(target: "snmp_trapkit::listener", "dispatch worker exited");
}

/// Decode one datagram, acknowledge informs and dispatch.
async fn process(shared: &Shared, data: Bytes, source: SocketAddr) {
    let len = data.len();
    let decoded = Message::decode(data).and_then(|message| {
        let ack = match &message.pdu {
            MessagePdu::Pdu(pdu) if pdu.pdu_type == PduType::InformRequest => {
                Some(Message::new(message.version, message.community.clone(), pdu.to_response()))
            }
            _ => None,
        };
        let pdu_type = message.pdu.pdu_type();
        Notification::from_message(message).map(|n| (n, ack, pdu_type))
    });

    let (notification, ack) = match decoded {
        Ok((Some(notification), ack, _)) => (notification, ack),
        Ok((None, _, pdu_type)) => {
            Counters::bump(&shared.counters.ignored);
            tracing::debug!(
                target: "snmp_trapkit::listener",
                { snmp.source = %source,
                snmp.pdu_type = %pdu_type },
                "ignoring non-notification PDU"
            );
            return;
        }
        Err(e) => {
            Counters::bump(&shared.counters.decode_errors);
            tracing::warn!(
                target: "snmp_trapkit::listener",
                { snmp.source = %source,
                snmp.bytes = len,
                error = %e },
                "failed to decode datagram"
            );
            shared.handler.on_decode_error(source, &e);
            return;
        }
    };

    if let Some(ack) = ack.filter(|_| shared.respond_to_informs) {
        acknowledge(shared, &ack, source).await;
    }

    tracing::debug!(
        target: "snmp_trapkit::listener",
        { snmp.source = %source,
        snmp.version = %notification.version(),
        trap_oid = %notification.trap_oid() },
        "notification received"
    );
    Counters::bump(&shared.counters.dispatched);
    shared.handler.on_trap(ReceivedTrap {
        source,
        received_at: SystemTime::now(),
        notification,
    });
}

async fn acknowledge(shared: &Shared, ack: &Message, source: SocketAddr) {
    let sent = match ack.encode() {
        Ok(bytes) => shared
            .socket
            .send_to(&bytes, source)
            .await
            .map_err(|e| Error::transport(Some(source), e)),
        Err(e) => Err(e),
    };
    if let Err(e) = sent {
        tracing::warn!(
            target: "snmp_trapkit::listener",
            { snmp.source = %source,
            error = %e },
            "failed to acknowledge inform"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::pdu::{GenericTrap, Pdu, TrapV1Pdu, oids};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    async fn send(to: SocketAddr, data: &[u8]) -> UdpSocket {
        let socket = UdpSocket::bind(loopback()).await.unwrap();
        socket.send_to(data, to).await.unwrap();
        socket
    }

    #[tokio::test]
    async fn start_twice_is_config_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut listener = TrapListener::new(tx);
        listener.start(loopback()).await.unwrap();
        assert_eq!(listener.state(), ListenerState::Listening);
        assert!(matches!(
            listener.start(loopback()).await,
            Err(Error::Config(_))
        ));
        listener.stop().await;
        assert_eq!(listener.state(), ListenerState::Stopped);
        // stopping again is harmless
        listener.stop().await;
    }

    #[tokio::test]
    async fn zero_capacity_queue_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut listener = TrapListener::builder()
            .dispatch(DispatchMode::Queued {
                capacity: 0,
                overflow: OverflowPolicy::DropNewest,
            })
            .build(tx);
        assert!(matches!(
            listener.start(loopback()).await,
            Err(Error::Config(_))
        ));
        assert_eq!(listener.state(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn inline_dispatch_of_v1_trap() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut listener = TrapListener::new(tx);
        let addr = listener.start(loopback()).await.unwrap();

        let trap = TrapV1Pdu::new(
            oid!(1, 3, 6, 1, 4, 1, 9999),
            [127, 0, 0, 1],
            GenericTrap::EnterpriseSpecific,
            1,
            0,
            vec![],
        );
        let bytes = Message::v1("public", trap.clone()).encode().unwrap();
        let _peer = send(addr, &bytes).await;

        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            got.notification,
            Notification::TrapV1 {
                community: Bytes::from_static(b"public"),
                trap
            }
        );
        listener.stop().await;
        assert_eq!(listener.stats().dispatched, 1);
    }

    #[tokio::test]
    async fn inform_acknowledged() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut listener = TrapListener::new(tx);
        let addr = listener.start(loopback()).await.unwrap();

        let inform = Pdu::inform(4242, 10, oids::warm_start(), vec![]);
        let bytes = Message::v2c("public", inform.clone()).encode().unwrap();
        let peer = send(addr, &bytes).await;

        let mut buf = vec![0u8; 1024];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), peer.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let ack = Message::decode(Bytes::copy_from_slice(&buf[..len])).unwrap();
        assert_eq!(ack.pdu, MessagePdu::Pdu(inform.to_response()));

        let got = rx.recv().await.unwrap();
        assert!(got.notification.is_confirmed());
        listener.stop().await;
    }

    #[tokio::test]
    async fn request_pdus_are_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut listener = TrapListener::new(tx);
        let addr = listener.start(loopback()).await.unwrap();

        let get = Message::v2c("public", Pdu::get_request(1, &[oid!(1, 3, 6, 1)]))
            .encode()
            .unwrap();
        let trap = Message::v2c("public", Pdu::trap_v2(2, 0, oids::cold_start(), vec![]))
            .encode()
            .unwrap();
        let peer = send(addr, &get).await;
        peer.send_to(&trap, addr).await.unwrap();

        rx.recv().await.unwrap();
        listener.stop().await;
        let stats = listener.stats();
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.received, 2);
    }
}
