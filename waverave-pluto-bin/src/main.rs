mod config;
mod info;
mod os_signal;
mod rx;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Context;
use tracing_subscriber::EnvFilter;
use waverave_pluto::{Generation, SimDevice, Source};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Hardware generation: `pluto` or `fmcomms2`
    #[arg(short = 'G', long, default_value = "pluto")]
    generation: Generation,

    /// Device argument string, kept with the source for reference
    #[arg(short = 'd', long = "device-args", default_value_t)]
    device_args: String,

    /// Offset of the simulated test tone from the center frequency, in Hz
    #[arg(long, default_value_t = waverave_pluto::sim::DEFAULT_TONE_HZ)]
    tone_hz: f64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Info(info::Cmd),
    Rx(rx::Cmd),
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Cli::parse();

    if let Commands::Info(c) = &args.command {
        return c.cmd(args.generation);
    }

    // No IIO transport is built in; the simulated device stands in for it.
    let tone_hz = args.tone_hz;
    let src = Source::open(args.generation, &args.device_args, |open| {
        SimDevice::open(open).map(|dev| dev.with_tone(tone_hz))
    })
    .wrap_err_with(|| format!("Failed to open {}", args.generation))?;

    match args.command {
        Commands::Info(_) => unreachable!("Should've executed the Info command earlier"),
        Commands::Rx(c) => c.cmd(src).await,
    }
}
