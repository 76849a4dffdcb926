//! UDP transport.
//!
//! [`UdpTransport`] wraps one ephemeral socket aimed at a single target.
//! The client opens one per request so concurrent calls never read each
//! other's responses; the sender keeps one for its lifetime.

mod udp;

pub use udp::UdpTransport;
