//! devstated: device state daemon with an in-process protocol bridge.

mod console;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use devstate_daemon::{setup, Config, Daemon, DaemonStatus, FixedSensor, LoopHandle};
use devstate_protocol::{LocalConnection, LocalPeer, MethodCall};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::console::Command;

#[derive(Parser)]
#[command(
    name = "devstated",
    about = "Device state daemon",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon until interrupted.
    Run {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Read commands from stdin.
        #[arg(long)]
        console: bool,
    },

    /// Print the effective configuration as TOML.
    PrintConfig {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, console } => {
            let config = setup::load_config(config.as_deref())?;
            init_tracing(&config.daemon.log_level);
            run(config, console).await?;
        }
        Commands::PrintConfig { config } => {
            let config = setup::load_config(config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn run(config: Config, console: bool) -> anyhow::Result<()> {
    let simulated = config.thermal.simulated_celsius;
    let interface = config.bridge.endpoints.request_interface.clone();
    let (connection, peer) = LocalConnection::pair();

    let mut daemon = Daemon::new(config, Arc::new(connection));
    daemon.load_modules()?;
    if let Some(celsius) = simulated {
        info!(celsius, "using simulated temperature sensor");
        daemon.set_sensor(Box::new(FixedSensor::new(celsius)));
    }

    let handle = daemon.handle();
    tokio::spawn(print_signals(peer));

    if console {
        let handle = handle.clone();
        let status = daemon.status_receiver();
        tokio::spawn(async move {
            if let Err(e) = run_console(&handle, &status, &interface).await {
                warn!(error = %e, "console failed");
            }
            if let Err(e) = handle.quit().await {
                warn!(error = %e, "failed to stop daemon");
            }
        });
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
            if let Err(e) = handle.quit().await {
                warn!(error = %e, "failed to stop daemon");
            }
        }
    });

    daemon.run().await?;
    Ok(())
}

async fn print_signals(mut peer: LocalPeer) {
    while let Some(signal) = peer.recv().await {
        match signal {
            Ok(signal) if signal.args.is_empty() => println!("signal {}", signal.name),
            Ok(signal) => println!("signal {} {}", signal.name, signal.args.join(" ")),
            Err(e) => warn!(error = %e, "bad signal frame"),
        }
    }
}

/// Read commands from stdin until `quit` or end of input.
async fn run_console(
    handle: &LoopHandle,
    status: &watch::Receiver<DaemonStatus>,
    interface: &str,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", console::HELP);

    while let Some(line) = lines.next_line().await? {
        let command = match console::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };

        match command {
            Command::Connect => handle.connect().await?,
            Command::Disconnect => handle.disconnect().await?,
            Command::Call { method, sender } => {
                let mut call = MethodCall::new(interface, method);
                if let Some(sender) = sender {
                    call = call.with_sender(sender);
                }
                match handle.call(call).await {
                    Ok(reply) => println!("reply {}", reply.args.join(" ")),
                    Err(e) => println!("error: {e}"),
                }
            }
            Command::Publish(message) => handle.publish(message).await?,
            Command::Status => print_status(&status.borrow()),
            Command::Help => println!("{}", console::HELP),
            Command::Quit => break,
        }
    }

    Ok(())
}

fn print_status(status: &DaemonStatus) {
    println!("modules:   {}", status.modules.join(", "));
    println!("connected: {}", status.connected);
    println!("bound:     {}", status.bound);
    println!(
        "version:   {}",
        status.version.as_deref().unwrap_or(devstate_protocol::UNKNOWN_VERSION)
    );
    println!(
        "messages:  {} ({} handler failures)",
        status.messages, status.handler_failures
    );
    println!("sensor:    {} failed reads", status.sensor_failures);
}
