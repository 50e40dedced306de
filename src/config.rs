use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

pub const DEFAULT_TEMPO_BPM: f64 = 137.0;
pub const DEFAULT_ADDRESS: &str = "/slot0";

// characters with a meaning in OSC address patterns
const RESERVED_ADDRESS_CHARS: &[char] = &['#', '*', ',', '?', '[', ']', '{', '}'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TempoSource {
    /// Configured tempo for the whole file, Set Tempo events are ignored.
    #[default]
    Fixed,
    /// Configured tempo until the first Set Tempo event, then the file's tempo map.
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    /// Track by track, events in file order within each track.
    #[default]
    File,
    /// All tracks merged by absolute tick. Ties keep file order.
    Time,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub tempo_bpm: f64,
    pub address: String,
    pub override_channel: Option<u8>,
    pub tempo_source: TempoSource,
    pub order: EventOrder,
}

impl Config {
    /// Defaults for everything but the input. The output goes next to it with `.osc` appended.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = default_output(&input);
        Self {
            input,
            output,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            address: DEFAULT_ADDRESS.to_string(),
            override_channel: None,
            tempo_source: TempoSource::default(),
            order: EventOrder::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tempo_bpm.is_finite() || self.tempo_bpm <= 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "tempo must be a positive number of beats per minute, got {}",
                self.tempo_bpm
            )));
        }
        validate_address(&self.address)?;
        if let Some(ch) = self.override_channel {
            if ch > 15 {
                return Err(ConvertError::InvalidConfig(format!(
                    "override channel must be 0-15, got {}",
                    ch
                )));
            }
        }
        if self.input == self.output {
            return Err(ConvertError::InvalidConfig(
                "output path would overwrite the input file".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_output(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".osc");
    PathBuf::from(name)
}

fn validate_address(address: &str) -> Result<()> {
    if !address.starts_with('/') {
        return Err(ConvertError::InvalidConfig(format!(
            "OSC address must start with '/', got {:?}",
            address
        )));
    }
    if let Some(c) = address
        .chars()
        .find(|c| c.is_whitespace() || RESERVED_ADDRESS_CHARS.contains(c))
    {
        return Err(ConvertError::InvalidConfig(format!(
            "OSC address {:?} contains {:?}",
            address, c
        )));
    }
    Ok(())
}
