//! Shared pieces of the `snmp-*` command-line tools.
//!
//! Only compiled with the `cli` feature.

pub mod args;
pub mod scenarios;
pub mod validate;
