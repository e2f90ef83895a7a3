// rfxcom -- command-line host for an RFXCOM 433 MHz transceiver.
//
// Usage:
//   rfxcom listen
//   rfxcom --config rfxcom.yaml listen
//   rfxcom send --protocol ARC --house-code A --unit-code 1 on
//   rfxcom send --protocol AC --device-id 02382C82 --unit-code 2 off
//   rfxcom pair --protocol AC --device-id 02382C82 --unit-code 2
//   rfxcom devices

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rfxcom_protocol::{CommandRequest, SwitchCommand};
use rfxcom_runner::{Config, DeviceStore, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const DEFAULT_CONFIG_FILE: &str = "rfxcom.yaml";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Listen for and control RFXCOM 433 MHz devices.
#[derive(Parser)]
#[command(name = "rfxcom", version, about)]
struct Cli {
    /// Configuration file. Defaults to ./rfxcom.yaml when present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log filter (e.g. debug, rfxcom_link=trace). Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for devices until interrupted.
    Listen,

    /// Switch a device on or off.
    Send {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(value_enum)]
        state: State,
    },

    /// Pair a device through the bridge.
    Pair {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print the configured device list.
    Devices,
}

#[derive(Args)]
struct TargetArgs {
    /// Protocol name (ARC, X10, AC, IKEA_KOPPLA, PT2262, LIGHTWAVERF, BLYSS).
    #[arg(long)]
    protocol: String,

    /// House code letter.
    #[arg(long)]
    house_code: Option<String>,

    /// Unit code.
    #[arg(long)]
    unit_code: Option<String>,

    /// Hex device id.
    #[arg(long)]
    device_id: Option<String>,
}

impl TargetArgs {
    fn into_request(self, command: SwitchCommand) -> CommandRequest {
        CommandRequest {
            protocol: self.protocol,
            command,
            house_code: self.house_code,
            unit_code: self.unit_code,
            device_id: self.device_id,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum State {
    On,
    Off,
}

impl From<State> for SwitchCommand {
    fn from(state: State) -> Self {
        match state {
            State::On => SwitchCommand::On,
            State::Off => SwitchCommand::Off,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_tracing(level: Option<&str>) {
    let env_filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Config::load(Path::new(DEFAULT_CONFIG_FILE)),
        None => Ok(Config::default()),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Listen => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupted, shutting down");
                }
                on_signal.cancel();
            });
            rfxcom_runner::listen(&config, cancel).await
        }
        Command::Send { target, state } => {
            rfxcom_runner::send(&config, &target.into_request(state.into())).await
        }
        Command::Pair { target } => {
            let result = rfxcom_runner::pair(&config, &target.into_request(SwitchCommand::On)).await?;
            println!("{}", result);
            Ok(())
        }
        Command::Devices => {
            let store = DeviceStore::load(&config.devices_file)?;
            if store.records().is_empty() {
                println!("no devices in {}", store.path().display());
            }
            for line in rfxcom_runner::format_devices(&store) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "rfxcom failed");
            ExitCode::FAILURE
        }
    }
}
