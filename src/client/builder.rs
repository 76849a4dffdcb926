//! Client builder.

use std::time::Duration;

use bytes::Bytes;

use crate::client::retry::Retry;
use crate::client::{Client, ClientConfig};
use crate::error::{Error, Result};
use crate::util::resolve_addr;
use crate::version::Version;

/// Builder for [`Client`].
///
/// ```rust
/// use snmp_trapkit::{Client, Retry, Version};
/// use std::time::Duration;
///
/// let client = Client::builder("127.0.0.1:1161")
///     .version(Version::V1)
///     .community("private")
///     .timeout(Duration::from_millis(500))
///     .retry(Retry::fixed(2, Duration::from_millis(100)))
///     .build()
///     .unwrap();
/// assert_eq!(client.config().retry.retries, 2);
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    target: String,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            config: ClientConfig::default(),
        }
    }

    /// SNMP version (default: v2c).
    pub fn version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    /// Community string (default: "public").
    pub fn community(mut self, community: impl AsRef<[u8]>) -> Self {
        self.config.community = Bytes::copy_from_slice(community.as_ref());
        self
    }

    /// Time to wait for a response before retransmitting (default: 5 seconds).
    ///
    /// A request that never gets an answer fails after roughly
    /// `timeout * (retries + 1)` plus any backoff.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Retransmission policy (default: 3 retries, no backoff).
    pub fn retry(mut self, retry: Retry) -> Self {
        self.config.retry = retry;
        self
    }

    /// Cap on GETNEXT requests per walk (default: 10 000).
    pub fn max_walk_iterations(mut self, max: usize) -> Self {
        self.config.max_walk_iterations = max;
        self
    }

    /// max-repetitions used by [`Client::bulk_default`] (default: 25).
    pub fn max_repetitions(mut self, max: i32) -> Self {
        self.config.max_repetitions = max;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.config.timeout.is_zero() {
            return Err(Error::config("timeout must be non-zero"));
        }
        if self.config.max_repetitions < 0 {
            return Err(Error::config("max-repetitions must not be negative"));
        }
        if self.config.max_walk_iterations == 0 {
            return Err(Error::config("max walk iterations must be at least 1"));
        }
        Ok(())
    }

    /// Resolve the target and build the client. No packet is sent.
    pub fn build(self) -> Result<Client> {
        self.validate()?;
        let target = resolve_addr(&self.target)?;
        tracing::debug!(
            target: "snmp_trapkit::client",
            { snmp.target = %target,
            version = %self.config.version,
            timeout_ms = self.config.timeout.as_millis() as u64,
            retries = self.config.retry.retries },
            "client configured"
        );
        Ok(Client::new(target, self.config))
    }
}
