use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;

use midi2osc::config::{default_output, DEFAULT_ADDRESS, DEFAULT_TEMPO_BPM};
use midi2osc::{Config, EventOrder, TempoSource};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a MIDI file into a length-prefixed OSC bundle stream
    Convert {
        #[arg(short, long)]
        midi_file: PathBuf,

        #[arg(short, long, help = "Output stream path [default: <MIDI_FILE>.osc]")]
        output: Option<PathBuf>,

        #[arg(short, long, default_value_t = DEFAULT_TEMPO_BPM, help = "Tempo in BPM")]
        tempo: f64,

        #[arg(short, long, default_value = DEFAULT_ADDRESS, help = "OSC address of every message")]
        address: String,

        #[arg(
            short = 'c',
            long,
            help = "Override the MIDI channel (0-15) for all notes and CC changes"
        )]
        override_midi_channel: Option<u8>,

        #[arg(long, help = "Follow the file's Set Tempo events after the initial tempo")]
        tempo_map: bool,

        #[arg(
            long,
            help = "Merge all tracks by time instead of writing them one after another"
        )]
        time_order: bool,
    },

    /// Print every record of an OSC bundle stream
    Dump { stream: PathBuf },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Convert {
            midi_file,
            output,
            tempo,
            address,
            override_midi_channel,
            tempo_map,
            time_order,
        } => {
            log::info!("MIDI FILE: {}", midi_file.display());
            let config = Config {
                output: output.unwrap_or_else(|| default_output(&midi_file)),
                tempo_bpm: tempo,
                address,
                override_channel: override_midi_channel,
                tempo_source: if tempo_map {
                    TempoSource::File
                } else {
                    TempoSource::Fixed
                },
                order: if time_order {
                    EventOrder::Time
                } else {
                    EventOrder::File
                },
                input: midi_file,
            };
            midi2osc::convert(&config).context("convert midi file")?;
        }
        Command::Dump { stream } => {
            let entries = midi2osc::dump(&stream).context("dump osc stream")?;
            for entry in &entries {
                println!("{}", entry.describe());
            }
            log::info!("{} message(s)", entries.len());
        }
    }

    Ok(())
}
