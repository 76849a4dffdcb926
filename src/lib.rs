// Allow large error types - the Error enum includes OIDs inline for debugging convenience.
#![allow(clippy::result_large_err)]

//! # snmp-trapkit
//!
//! SNMP v1/v2c toolkit built on Tokio.
//!
//! ## Features
//!
//! - BER codec for v1/v2c messages, including the SNMPv1 Trap-PDU
//! - Trap sender with burst and raw-datagram modes
//! - Trap listener with inline or queued dispatch and inform acknowledgement
//! - Request client for GET, GETNEXT, GETBULK, SET, WALK and BULK
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_trapkit::{Client, oid};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), snmp_trapkit::Error> {
//!     let client = Client::builder("192.168.1.1:161")
//!         .community("public")
//!         .timeout(Duration::from_secs(2))
//!         .build()?;
//!
//!     let sys_descr = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
//!     println!("sysDescr: {}", sys_descr.value);
//!
//!     for vb in client.walk(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)).await? {
//!         println!("{}", vb);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Receiving traps
//!
//! ```rust,no_run
//! use snmp_trapkit::TrapListener;
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> snmp_trapkit::Result<()> {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let mut listener = TrapListener::new(tx);
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

pub mod ber;
pub mod client;
pub mod error;
pub mod listener;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod sender;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use client::{Backoff, BulkResponse, Client, ClientBuilder, ClientConfig, Retry};
pub use error::{
    DecodeErrorKind, EncodeErrorKind, Error, ErrorStatus, OidErrorKind, Result, WalkAbortReason,
};
pub use listener::{
    DispatchMode, ListenerBuilder, ListenerState, ListenerStats, Notification, OverflowPolicy,
    ReceivedTrap, TrapHandler, TrapListener,
};
pub use message::{Message, MessagePdu};
pub use oid::Oid;
pub use pdu::{GenericTrap, Pdu, PduType, TrapV1Pdu};
pub use sender::{BurstReport, SenderBuilder, SenderConfig, TrapPdu, TrapSender};
pub use transport::UdpTransport;
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
