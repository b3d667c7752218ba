mod cli;
mod dns;
mod pcap;
mod report;

use std::process::exit;

use anyhow::Result;
use clap::Parser;
use cli::Args;
use dns::{Classifier, DnsCollector};
use log::{error, info, warn};
use report::{FixedWidth, ReportFormatter, Table};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_interfaces {
        let interfaces = pcap::CaptureLoader::list_interfaces()?;
        println!("Available network interfaces:");
        for device in interfaces {
            let status = if device.flags.is_up() { "UP" } else { "DOWN" };
            let running = if device.flags.is_running() {
                "RUNNING"
            } else {
                ""
            };
            let loopback = if device.flags.is_loopback() {
                "LOOPBACK"
            } else {
                ""
            };

            println!("  {} [{}] {} {}", device.name, status, running, loopback);

            if let Some(desc) = device.desc {
                println!("    Description: {desc}");
            }
        }
        return Ok(());
    }

    args.validate()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    let interface = if let Some(ref iface) = args.interface {
        iface.clone()
    } else {
        pcap::CaptureLoader::select_default_interface()?
    };

    if let Some(hostname) = args.hostname.as_deref()
        && hostname.ends_with('.')
    {
        warn!("Hostname {hostname:?} ends with a dot; decoded names never do");
    }

    let classifier = Classifier::new(args.hostname.clone());
    let formatter: Box<dyn ReportFormatter + Send> = match args.width {
        Some(width) => Box::new(FixedWidth {
            width,
            rates: args.rates,
        }),
        None => Box::new(Table { rates: args.rates }),
    };

    info!("Starting DNS query counter");
    info!("Interface: {interface}");
    info!("Mode: {}", classifier.describe());
    info!("Reporting every {}s", args.interval);

    let (_capture_handle, frame_rx, cancel_token) = pcap::CaptureLoader::load(&interface)?;

    let collector = DnsCollector::new(
        classifier,
        args.report_period(),
        formatter,
        Box::new(std::io::stdout()),
    );
    let result = collector.run(frame_rx, shutdown_signal()).await;

    // The capture thread may sit in a blocking read and would hold up runtime
    // shutdown, so stop it and exit without joining it on every path.
    exit(finish(result, &cancel_token))
}

/// Stops the capture and maps the collector outcome to an exit status.
fn finish(result: Result<()>, cancel_token: &CancellationToken) -> i32 {
    cancel_token.cancel();
    match result {
        Ok(()) => {
            info!("DNS query counter stopped");
            0
        }
        Err(e) => {
            error!("DNS query counter failed: {e:#}");
            1
        }
    }
}

/// Resolves on the first SIGINT or SIGTERM. Later signals are swallowed by the
/// installed handlers, so the final report cannot be interrupted.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                let interrupted = tokio::select! {
                    result = tokio::signal::ctrl_c() => result,
                    _ = terminate.recv() => {
                        info!("Caught terminate");
                        return;
                    }
                };
                match interrupted {
                    Ok(()) => info!("Caught interrupt"),
                    Err(e) => {
                        warn!("Failed to listen for interrupt: {e}");
                        terminate.recv().await;
                        info!("Caught terminate");
                    }
                }
                return;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Caught interrupt"),
        Err(e) => {
            warn!("Failed to listen for interrupt: {e}");
            std::future::pending::<()>().await;
        }
    }
}
