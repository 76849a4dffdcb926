//! SNMP request client.
//!
//! [`Client`] sends GET, GETNEXT, GETBULK and SET requests to one agent and
//! builds WALK and BULK retrieval on top of them. Each call opens its own
//! ephemeral UDP socket, so a cloned client can run calls concurrently.
//!
//! ```no_run
//! use snmp_trapkit::{Client, Retry, oid};
//! use std::time::Duration;
//!
//! # async fn example() -> snmp_trapkit::Result<()> {
//! let client = Client::builder("192.168.1.1:161")
//!     .community("public")
//!     .timeout(Duration::from_secs(2))
//!     .retry(Retry::immediate(1))
//!     .build()?;
//!
//! let descr = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
//! println!("{}", descr);
//!
//! for vb in client.walk(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1)).await? {
//!     println!("{}", vb);
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod retry;
mod walk;

pub use builder::ClientBuilder;
pub use retry::{Backoff, Retry};
pub use walk::BulkResponse;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::time::Instant;
use tracing::{Span, instrument};

use crate::error::{DecodeErrorKind, Error, Result};
use crate::message::{Message, MessagePdu};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::transport::UdpTransport;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_REPETITIONS: i32 = 25;
pub const DEFAULT_MAX_WALK_ITERATIONS: usize = 10_000;

/// Client configuration.
///
/// Most users go through [`ClientBuilder`] instead of filling this in.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// SNMP version (default: v2c)
    pub version: Version,
    /// Community string (default: "public")
    pub community: Bytes,
    /// Wait per attempt (default: 5 seconds)
    pub timeout: Duration,
    /// Retransmissions on timeout (default: 3, no backoff)
    pub retry: Retry,
    /// GETNEXT requests a single walk may issue (default: 10 000)
    pub max_walk_iterations: usize,
    /// max-repetitions for [`Client::bulk_default`] (default: 25)
    pub max_repetitions: i32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: DEFAULT_TIMEOUT,
            retry: Retry::default(),
            max_walk_iterations: DEFAULT_MAX_WALK_ITERATIONS,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
        }
    }
}

/// SNMP client for one agent.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    target: SocketAddr,
    config: ClientConfig,
    request_ids: AtomicI32,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.inner.target)
            .field("version", &self.inner.config.version)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Start building a client for `target` (`host:port`, port required).
    pub fn builder(target: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(target)
    }

    pub fn new(target: SocketAddr, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                target,
                config,
                request_ids: AtomicI32::new(request_id_seed()),
            }),
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.inner.target
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Next request-id, always positive.
    fn next_request_id(&self) -> i32 {
        let id = self.inner.request_ids.fetch_add(1, Ordering::Relaxed) & 0x7FFF_FFFF;
        id.max(1)
    }

    /// Send `pdu` and wait for the matching Response.
    ///
    /// The request-id in `pdu` is replaced with a fresh one. The same encoded
    /// bytes are retransmitted after each timeout until the retry budget is
    /// spent. An error-status in the Response becomes [`Error::Snmp`].
    #[instrument(
        level = "debug",
        skip(self, pdu),
        err,
        fields(
            snmp.target = %self.inner.target,
            snmp.pdu_type = %pdu.pdu_type,
            snmp.request_id = tracing::field::Empty,
            snmp.attempt = tracing::field::Empty,
        )
    )]
    pub async fn request(&self, mut pdu: Pdu) -> Result<Pdu> {
        if !pdu.is_confirmed() {
            return Err(Error::config(format!(
                "{} does not expect a response",
                pdu.pdu_type
            )));
        }
        pdu.request_id = self.next_request_id();
        Span::current().record("snmp.request_id", pdu.request_id);

        let config = &self.inner.config;
        let request_id = pdu.request_id;
        let data = Message::new(config.version, config.community.clone(), pdu).encode()?;
        let response = self.exchange(request_id, &data).await?;

        if response.is_error() {
            let status = response.error_status_enum();
            tracing::debug!(
                target: "snmp_trapkit::client",
                { snmp.request_id = request_id,
                snmp.error_status = %status,
                snmp.error_index = response.error_index },
                "agent returned error"
            );
            return Err(Error::Snmp {
                target: Some(self.inner.target),
                status,
                index: u32::try_from(response.error_index).unwrap_or(0),
                oid: response.error_varbind().map(|vb| vb.oid.clone()),
            });
        }
        Ok(response)
    }

    /// Send `data` and wait for a Response with `request_id`, retransmitting
    /// on timeout.
    async fn exchange(&self, request_id: i32, data: &[u8]) -> Result<Pdu> {
        let target = self.inner.target;
        let config = &self.inner.config;
        let transport = UdpTransport::connect(target).await?;
        let start = Instant::now();

        for attempt in 0..config.retry.attempts() {
            Span::current().record("snmp.attempt", attempt);
            if attempt > 0 {
                let delay = config.retry.delay_before(attempt);
                tracing::debug!(
                    target: "snmp_trapkit::client",
                    { snmp.request_id = request_id,
                    delay_ms = delay.as_millis() as u64 },
                    "retrying request"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            transport.send(data).await?;
            let deadline = Instant::now() + config.timeout;

            while let Some(bytes) = transport.recv_until(deadline).await? {
                let message = Message::decode(bytes)?;
                if message.version != config.version {
                    tracing::warn!(
                        target: "snmp_trapkit::client",
                        { snmp.target = %target,
                        expected = %config.version,
                        actual = %message.version },
                        "version mismatch in response"
                    );
                    return Err(Error::decode(
                        0,
                        DecodeErrorKind::VersionMismatch {
                            expected: config.version,
                            actual: message.version,
                        },
                    ));
                }
                match message.pdu {
                    MessagePdu::Pdu(pdu)
                        if pdu.pdu_type == PduType::Response && pdu.request_id == request_id =>
                    {
                        tracing::trace!(
                            target: "snmp_trapkit::client",
                            { snmp.request_id = request_id,
                            snmp.varbind_count = pdu.varbinds.len(),
                            elapsed_ms = start.elapsed().as_millis() as u64 },
                            "received response"
                        );
                        return Ok(pdu);
                    }
                    other => {
                        tracing::debug!(
                            target: "snmp_trapkit::client",
                            { snmp.target = %target,
                            snmp.request_id = request_id,
                            received_type = %other.pdu_type(),
                            received_id = ?other.request_id() },
                            "skipping unrelated datagram"
                        );
                    }
                }
            }
        }

        let elapsed = start.elapsed();
        tracing::debug!(
            target: "snmp_trapkit::client",
            { snmp.target = %target,
            snmp.request_id = request_id,
            ?elapsed,
            retries = config.retry.retries },
            "request timed out"
        );
        Err(Error::Timeout {
            target: Some(target),
            elapsed,
            retries: config.retry.retries,
        })
    }

    fn first_varbind(&self, response: Pdu) -> Result<VarBind> {
        response
            .varbinds
            .into_iter()
            .next()
            .ok_or_else(|| Error::decode(0, DecodeErrorKind::EmptyResponse))
    }

    /// GET a single OID.
    ///
    /// In v2c a missing object comes back as a varbind holding
    /// `NoSuchObject`/`NoSuchInstance`; in v1 it is an
    /// [`Error::Snmp`] with `NoSuchName`.
    #[instrument(skip(self), err, fields(snmp.target = %self.inner.target, snmp.oid = %oid))]
    pub async fn get(&self, oid: &Oid) -> Result<VarBind> {
        let response = self
            .request(Pdu::get_request(0, std::slice::from_ref(oid)))
            .await?;
        self.first_varbind(response)
    }

    /// GET several OIDs in one request; results keep the request order.
    #[instrument(skip(self, oids), err, fields(snmp.target = %self.inner.target, snmp.oid_count = oids.len()))]
    pub async fn get_many(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        let response = self.request(Pdu::get_request(0, oids)).await?;
        Ok(response.varbinds)
    }

    /// GETNEXT for a single OID.
    #[instrument(skip(self), err, fields(snmp.target = %self.inner.target, snmp.oid = %oid))]
    pub async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        let response = self
            .request(Pdu::get_next_request(0, std::slice::from_ref(oid)))
            .await?;
        self.first_varbind(response)
    }

    /// GETBULK (v2c only).
    ///
    /// The first `non_repeaters` OIDs get one successor each, the rest up to
    /// `max_repetitions` successors. The raw varbind list is returned,
    /// exception values included.
    #[instrument(skip(self, oids), err, fields(snmp.target = %self.inner.target, snmp.oid_count = oids.len()))]
    pub async fn get_bulk(
        &self,
        oids: &[Oid],
        non_repeaters: i32,
        max_repetitions: i32,
    ) -> Result<Vec<VarBind>> {
        let response = self
            .request(Pdu::get_bulk(0, non_repeaters, max_repetitions, oids))
            .await?;
        Ok(response.varbinds)
    }

    /// SET a single OID.
    ///
    /// A SET is retransmitted like any other request, so on a lossy network
    /// the agent may apply it more than once.
    #[instrument(skip(self, value), err, fields(snmp.target = %self.inner.target, snmp.oid = %oid))]
    pub async fn set(&self, oid: &Oid, value: impl Into<Value>) -> Result<VarBind> {
        let varbind = VarBind::new(oid.clone(), value);
        let response = self.request(Pdu::set_request(0, vec![varbind])).await?;
        self.first_varbind(response)
    }

    /// SET several OIDs in one request; the agent applies all or none.
    #[instrument(skip(self, varbinds), err, fields(snmp.target = %self.inner.target, snmp.oid_count = varbinds.len()))]
    pub async fn set_many(&self, varbinds: &[(Oid, Value)]) -> Result<Vec<VarBind>> {
        if varbinds.is_empty() {
            return Ok(Vec::new());
        }
        let vbs = varbinds
            .iter()
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .collect();
        let response = self.request(Pdu::set_request(0, vbs)).await?;
        Ok(response.varbinds)
    }
}

fn request_id_seed() -> i32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(1);
    (nanos & 0x3FFF_FFFF) as i32
}
