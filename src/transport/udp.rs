//! UDP transport implementation.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};

use crate::error::{Error, Result};
use crate::util::{MAX_DATAGRAM, bind_ephemeral_udp_socket};

/// UDP socket bound to an ephemeral port, sending to one target.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
    local_addr: SocketAddr,
    connected: bool,
}

impl UdpTransport {
    /// Bind and connect to `target`.
    ///
    /// The kernel then only delivers datagrams from `target`. An ICMP port
    /// unreachable surfaces as a transport error on the next send or receive.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        let socket =
            bind_ephemeral_udp_socket(target).map_err(|e| Error::transport(Some(target), e))?;
        socket
            .connect(target)
            .await
            .map_err(|e| Error::transport(Some(target), e))?;
        Self::finish(socket, target, true)
    }

    /// Bind without connecting; datagrams go out with `send_to`.
    ///
    /// Fire-and-forget senders use this so a closed port on the target does
    /// not turn later sends into errors.
    pub fn unconnected(target: SocketAddr) -> Result<Self> {
        let socket =
            bind_ephemeral_udp_socket(target).map_err(|e| Error::transport(Some(target), e))?;
        Self::finish(socket, target, false)
    }

    fn finish(socket: UdpSocket, target: SocketAddr, connected: bool) -> Result<Self> {
        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::transport(Some(target), e))?;
        tracing::trace!(
            target: "snmp_trapkit::transport",
            { snmp.target = %target,
            snmp.local_addr = %local_addr,
            connected },
            "UDP socket bound"
        );
        Ok(Self {
            socket,
            target,
            local_addr,
            connected,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Send one datagram to the target.
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "snmp_trapkit::transport",
            { snmp.target = %self.target,
            snmp.bytes = data.len() },
            "UDP send"
        );
        let sent = if self.connected {
            self.socket.send(data).await
        } else {
            self.socket.send_to(data, self.target).await
        };
        sent.map_err(|e| Error::transport(Some(self.target), e))?;
        Ok(())
    }

    /// Wait for the next datagram until `deadline`.
    ///
    /// Returns `Ok(None)` when the deadline passes first. On an unconnected
    /// socket, datagrams from other sources are discarded.
    pub async fn recv_until(&self, deadline: Instant) -> Result<Option<Bytes>> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let received = match timeout_at(deadline, self.socket.recv_from(&mut buf)).await {
                Ok(received) => received,
                Err(_) => return Ok(None),
            };
            let (len, source) = received.map_err(|e| Error::transport(Some(self.target), e))?;
            if !self.connected && source != self.target {
                tracing::debug!(
                    target: "snmp_trapkit::transport",
                    { snmp.target = %self.target,
                    snmp.source = %source },
                    "discarding datagram from unexpected source"
                );
                continue;
            }
            tracing::trace!(
                target: "snmp_trapkit::transport",
                { snmp.target = %self.target,
                snmp.bytes = len },
                "UDP recv"
            );
            buf.truncate(len);
            return Ok(Some(Bytes::from(buf)));
        }
    }
}
