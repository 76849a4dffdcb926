//! snmp-trap-listen: print received traps until interrupted.
//!
//! Part of the snmp-trapkit CLI utilities.

use clap::Parser;
use snmp_trapkit::cli::args::LogArgs;
use snmp_trapkit::listener::{DispatchMode, OverflowPolicy, TrapListener};
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::sync::mpsc;

/// Receive SNMP traps and informs and print them.
#[derive(Debug, Parser)]
#[command(name = "snmp-trap-listen", version, about)]
struct Args {
    /// Address to bind.
    #[arg(short = 'b', long = "bind", default_value = "0.0.0.0:1162")]
    bind: SocketAddr,

    /// Hand datagrams to a worker through a queue of this size instead of
    /// handling them on the receive task.
    #[arg(long = "queue")]
    queue: Option<usize>,

    /// Do not acknowledge InformRequests.
    #[arg(long = "no-inform-ack")]
    no_inform_ack: bool,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    args.log.init_tracing();

    let dispatch = match args.queue {
        Some(capacity) => DispatchMode::Queued {
            capacity,
            overflow: OverflowPolicy::DropOldest,
        },
        None => DispatchMode::Inline,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut listener = TrapListener::builder()
        .dispatch(dispatch)
        .respond_to_informs(!args.no_inform_ack)
        .build(tx);

    let local = match listener.start(args.bind).await {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Listening on {} (Ctrl-C to stop)", local);

    loop {
        tokio::select! {
            trap = rx.recv() => match trap {
                Some(trap) => println!("{}", trap),
                None => break,
            },
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    eprintln!("Error: {}", e);
                }
                break;
            }
        }
    }

    listener.stop().await;
    while let Ok(trap) = rx.try_recv() {
        println!("{}", trap);
    }

    let stats = listener.stats();
    println!(
        "received {}, dispatched {}, decode errors {}, ignored {}, dropped {}",
        stats.received, stats.dispatched, stats.decode_errors, stats.ignored, stats.dropped
    );
    ExitCode::SUCCESS
}
