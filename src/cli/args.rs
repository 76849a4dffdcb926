//! Command-line argument structures for the snmp-trapkit CLI tools.

use clap::{Parser, ValueEnum};

use crate::Version;

/// SNMP version for CLI argument parsing.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SnmpVersion {
    /// SNMPv1
    #[value(name = "1")]
    V1,
    /// SNMPv2c (default)
    #[default]
    #[value(name = "2c")]
    V2c,
}

impl From<SnmpVersion> for Version {
    fn from(v: SnmpVersion) -> Self {
        match v {
            SnmpVersion::V1 => Version::V1,
            SnmpVersion::V2c => Version::V2c,
        }
    }
}

/// Logging flags shared by every tool.
#[derive(Debug, Parser)]
pub struct LogArgs {
    /// Log library activity (snmp_trapkit=debug).
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Log everything down to individual datagrams (snmp_trapkit=trace).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

impl LogArgs {
    /// Install a stderr subscriber filtered by the flags.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = if self.debug {
            "snmp_trapkit=trace"
        } else if self.verbose {
            "snmp_trapkit=debug"
        } else {
            "snmp_trapkit=warn"
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Join a host and port into a `host:port` string, bracketing bare IPv6
/// literals.
pub fn host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
