//! snmp-trap-send: send test trap scenarios to a receiver.
//!
//! Part of the snmp-trapkit CLI utilities.

use clap::Parser;
use snmp_trapkit::TrapSender;
use snmp_trapkit::cli::args::{LogArgs, SnmpVersion, host_port};
use snmp_trapkit::cli::scenarios::{self, SUITE_PAUSE, Scenario};
use std::process::ExitCode;
use std::time::Duration;

/// Send SNMP trap scenarios to a trap receiver.
#[derive(Debug, Parser)]
#[command(name = "snmp-trap-send", version, about)]
struct Args {
    /// Receiver host.
    #[arg(long = "host", default_value = "127.0.0.1")]
    host: String,

    /// Receiver port.
    #[arg(short = 'p', long = "port", default_value = "162")]
    port: u16,

    /// Community string.
    #[arg(short = 'c', long = "community", default_value = "public")]
    community: String,

    /// Version used for v2 trap PDUs.
    #[arg(long = "snmp-version", default_value = "2c")]
    snmp_version: SnmpVersion,

    /// Scenario to run.
    #[arg(short = 't', long = "test", default_value = "all")]
    test: Scenario,

    /// Number of traps in a burst.
    #[arg(long = "count", default_value = "5")]
    count: usize,

    /// Seconds between burst traps.
    #[arg(long = "interval", default_value = "1.0")]
    interval: f64,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    args.log.init_tracing();

    let interval = match Duration::try_from_secs_f64(args.interval) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: invalid --interval: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let target = host_port(&args.host, args.port);
    let sender = match TrapSender::builder(&target)
        .community(&args.community)
        .version(args.snmp_version.into())
        .build()
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Sending traps to {}", sender.target());

    let suites = args.test.expand();
    let mut failed = Vec::new();
    for (i, scenario) in suites.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(SUITE_PAUSE).await;
        }
        let outcome = scenarios::run(&sender, *scenario, args.count, interval).await;
        let mark = if outcome.passed() { "ok" } else { "FAILED" };
        println!(
            "  {:<10} {} (sent {}, failed {})",
            scenario.name(),
            mark,
            outcome.sent,
            outcome.failed
        );
        if !outcome.passed() {
            failed.push(scenario.name());
        }
    }

    if failed.is_empty() {
        println!("{}/{} scenarios passed", suites.len(), suites.len());
        ExitCode::SUCCESS
    } else {
        eprintln!("Error: failed scenarios: {}", failed.join(", "));
        ExitCode::FAILURE
    }
}
