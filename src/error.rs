use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a conversion or a dump. All of them are fatal to the run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("failed to parse MIDI file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: midi_file::Error,
    },

    #[error("SMPTE time division is not supported, the file needs ticks per quarter note")]
    UnsupportedDivision,

    #[error("{field} out of range: {value} (max {max})")]
    ValueOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("time {0}s cannot be represented as an OSC timetag")]
    TimeOutOfRange(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // rosc's error type only promises Debug across versions
    #[error("OSC error: {0:?}")]
    Osc(rosc::OscError),

    #[error("truncated record at byte {offset}: needed {needed} bytes, {available} left")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
