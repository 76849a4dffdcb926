//! snmp-validate: check an agent with GET, WALK and BULK, and optionally SET.
//!
//! Part of the snmp-trapkit CLI utilities.

use clap::Parser;
use snmp_trapkit::cli::args::{LogArgs, SnmpVersion, host_port};
use snmp_trapkit::cli::validate::{PASS_THRESHOLD, Validator};
use snmp_trapkit::{Client, Retry};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Validate an SNMP agent and write a JSON report.
#[derive(Debug, Parser)]
#[command(name = "snmp-validate", version, about)]
struct Args {
    /// Agent host.
    #[arg(long = "host", default_value = "snmp-emulator")]
    host: String,

    /// Agent port.
    #[arg(short = 'p', long = "port", default_value = "161")]
    port: u16,

    /// Read community.
    #[arg(short = 'c', long = "community", default_value = "public")]
    community: String,

    /// Community used for the SET check (only with --set).
    #[arg(long = "write-community", default_value = "private")]
    write_community: String,

    /// SNMP version: 1 or 2c.
    #[arg(short = 'v', long = "snmp-version", default_value = "2c")]
    snmp_version: SnmpVersion,

    /// Request timeout in seconds.
    #[arg(short = 't', long = "timeout", default_value = "5")]
    timeout: f64,

    /// Retry count.
    #[arg(short = 'r', long = "retries", default_value = "3")]
    retries: u32,

    /// Also SET sysContact.0. Off by default so a run never writes to the
    /// agent.
    #[arg(long = "set")]
    set: bool,

    /// Value written to sysContact.0 with --set.
    #[arg(long = "contact", default_value = "snmp-trapkit validation")]
    contact: String,

    /// Where to write the JSON report. Missing parent directories are
    /// created.
    #[arg(
        short = 'o',
        long = "output",
        default_value = "test/results/snmp-validation.json"
    )]
    output: PathBuf,

    #[command(flatten)]
    log: LogArgs,
}

fn build_client(args: &Args, community: &str) -> snmp_trapkit::Result<Client> {
    let timeout = Duration::try_from_secs_f64(args.timeout)
        .map_err(|e| snmp_trapkit::Error::config(format!("invalid --timeout: {}", e)))?;
    Client::builder(host_port(&args.host, args.port))
        .version(args.snmp_version.into())
        .community(community)
        .timeout(timeout)
        .retry(Retry::immediate(args.retries))
        .build()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    args.log.init_tracing();

    let clients = build_client(&args, &args.community)
        .and_then(|reader| Ok((reader, build_client(&args, &args.write_community)?)));
    let (reader, writer) = match clients {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Validating {} ({})", host_port(&args.host, args.port), reader.target());

    let mut validator = Validator::new(args.host.clone(), reader).with_writer(writer);
    let set_contact = args.set.then_some(args.contact.as_str());
    validator.run_standard(set_contact).await;
    let report = validator.into_report();

    for test in &report.tests {
        let mark = if test.success { "ok" } else { "FAILED" };
        let detail = match (&test.error, test.count) {
            (Some(error), _) => format!("({})", error),
            (None, Some(count)) => format!("[{}]", count),
            (None, None) => test.value.clone().unwrap_or_default(),
        };
        println!(
            "  {:<5} {:<24} {} {}",
            test.operation.name(),
            test.subject(),
            mark,
            detail
        );
    }

    println!();
    for op in report.summary() {
        println!(
            "{}: {}/{} ({:.1}%)",
            op.operation.name(),
            op.passed,
            op.total,
            op.success_rate()
        );
    }
    println!(
        "Overall: {}/{} ({:.1}%, pass at {:.0}%)",
        report.passed(),
        report.tests.len(),
        report.success_rate(),
        PASS_THRESHOLD
    );

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Error: could not create {}: {}", dir.display(), e);
        }
    }
    match report.to_json() {
        Ok(json) => match std::fs::write(&args.output, json) {
            Ok(()) => println!("Report written to {}", args.output.display()),
            Err(e) => eprintln!("Error: could not write {}: {}", args.output.display(), e),
        },
        Err(e) => eprintln!("Error: could not serialize report: {}", e),
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
