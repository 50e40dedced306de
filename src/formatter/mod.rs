use crate::error::Result;
use crate::midi_event::PackedMidi;
use crate::timing::Timetag;

mod osc_formatter;

pub use osc_formatter::OscFormatter;

/// Serializes one packed MIDI value scheduled at `timetag` into a datagram.
pub trait BundleFormatter {
    fn format(&self, value: PackedMidi, timetag: Timetag) -> Result<Vec<u8>>;
}
