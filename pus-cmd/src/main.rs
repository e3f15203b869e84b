mod dump;
mod info;
mod stations;
mod wrap;

use std::io::stderr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use hifitime::Epoch;
use pus::dds::TimeQuality;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a packet file or DDS archive.
    Info {
        /// Input file
        input: PathBuf,

        /// Input is a DDS archive where each packet is preceded by an 18 byte DDS header.
        #[arg(long, action)]
        dds: bool,

        /// Count and skip DDS records whose packet cannot be decoded rather than stopping
        /// at the first one. Only used with --dds.
        #[arg(long, action)]
        lenient: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,
    },
    /// Write one JSON document per packet to stdout.
    Dump {
        /// Input file
        input: PathBuf,

        /// Input is a DDS archive.
        #[arg(long, action)]
        dds: bool,

        /// Report and skip DDS records whose packet cannot be decoded. Only used with --dds.
        #[arg(long, action)]
        lenient: bool,

        /// Include the hex encoded packet payload.
        #[arg(long, action)]
        payload: bool,
    },
    /// Wrap the packets in a packet file in DDS headers.
    ///
    /// Each record is stamped with its packet's time if the packet carries an absolute
    /// timestamp, otherwise with --time, otherwise with the current time.
    Wrap {
        /// Ground station id
        #[arg(short, long, default_value_t = 0)]
        station: u16,

        /// Virtual channel
        #[arg(long, default_value_t = 0)]
        vc: u16,

        /// SLE service type
        #[arg(long, default_value_t = 0)]
        sle: u8,

        /// Time quality; 0 good, 1 inaccurate, 2 bad, 3 unknown.
        #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
        quality: u8,

        /// Time for packets without an absolute timestamp (RFC3339).
        #[arg(short, long, value_parser = parse_timestamp, value_name = "timestamp")]
        time: Option<Epoch>,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "wrapped.dds", value_name = "path")]
        output: PathBuf,

        /// Input packet file.
        input: PathBuf,
    },
    /// List the known ground stations.
    Stations {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,
    },
}

fn parse_timestamp(s: &str) -> Result<Epoch, String> {
    Epoch::from_str(s).map_err(|_| "Could not parse into an RFC3339 timestamp".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("PUS_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Info {
            input,
            dds,
            lenient,
            format,
        } => info::info(input, *dds, *lenient, format),
        Commands::Dump {
            input,
            dds,
            lenient,
            payload,
        } => dump::dump(input, *dds, *lenient, *payload),
        Commands::Wrap {
            station,
            vc,
            sle,
            quality,
            time,
            clobber,
            output,
            input,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            let opts = wrap::WrapOpts {
                ground_station_id: *station,
                virtual_channel: *vc,
                sle: *sle,
                time_quality: TimeQuality::from(*quality),
                time: *time,
            };
            wrap::wrap(input, output, &opts)
        }
        Commands::Stations { format } => stations::stations(format),
    }
}
