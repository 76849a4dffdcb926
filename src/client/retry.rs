//! Retransmission policy.

use std::time::Duration;

/// How many times a request is retransmitted after a timeout, and how long
/// to pause before each retransmission.
///
/// ```
/// use snmp_trapkit::{Backoff, Retry};
/// use std::time::Duration;
///
/// let retry = Retry::fixed(2, Duration::from_millis(250));
/// assert_eq!(retry.retries, 2);
/// assert_eq!(retry.delay_before(1), Duration::from_millis(250));
///
/// let retry = Retry::exponential(4, Duration::from_millis(100), Duration::from_millis(500));
/// assert_eq!(retry.delay_before(3), Duration::from_millis(400));
/// assert_eq!(retry.delay_before(4), Duration::from_millis(500));
/// assert!(matches!(Retry::default().backoff, Backoff::None));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retry {
    /// Retransmissions after the first send (0 = send once).
    pub retries: u32,
    pub backoff: Backoff,
}

/// Pause inserted before a retransmission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Backoff {
    /// Retransmit as soon as the previous attempt times out.
    #[default]
    None,
    Fixed(Duration),
    /// `initial`, doubled on each retransmission, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Default for Retry {
    /// 3 retries, no backoff.
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Backoff::None,
        }
    }
}

impl Retry {
    /// Send once, never retransmit.
    pub fn none() -> Self {
        Self {
            retries: 0,
            backoff: Backoff::None,
        }
    }

    /// `retries` immediate retransmissions.
    pub fn immediate(retries: u32) -> Self {
        Self {
            retries,
            backoff: Backoff::None,
        }
    }

    pub fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn exponential(retries: u32, initial: Duration, max: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Exponential { initial, max },
        }
    }

    /// Total number of sends, first one included.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay before retransmission number `retry` (1-based).
    pub fn delay_before(&self, retry: u32) -> Duration {
        match &self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { initial, max } => {
                let shift = retry.saturating_sub(1).min(31);
                initial.saturating_mul(1u32 << shift).min(*max)
            }
        }
    }
}
