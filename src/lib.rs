//! Converts the channel messages of a Standard MIDI File into a stream of timestamped,
//! length-prefixed OSC bundles.

pub mod config;
pub mod convert;
pub mod error;
pub mod extractor;
pub mod formatter;
pub mod midi_event;
pub mod stream;
pub mod timing;

pub use config::{Config, EventOrder, TempoSource};
pub use convert::{convert, dump, ConversionReport, DumpEntry};
pub use error::ConvertError;
