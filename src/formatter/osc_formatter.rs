use rosc::{encoder, OscBundle, OscMessage, OscPacket, OscType};

use crate::error::{ConvertError, Result};
use crate::formatter::BundleFormatter;
use crate::midi_event::PackedMidi;
use crate::timing::Timetag;

/// One bundle per value, holding a single message to `address` with the value as an int32.
pub struct OscFormatter {
    address: String,
}

impl OscFormatter {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn bundle(&self, value: PackedMidi, timetag: Timetag) -> OscPacket {
        let message = OscMessage {
            addr: self.address.clone(),
            args: vec![OscType::Int(value.into())],
        };
        OscPacket::Bundle(OscBundle {
            timetag: timetag.into(),
            content: vec![OscPacket::Message(message)],
        })
    }
}

impl BundleFormatter for OscFormatter {
    fn format(&self, value: PackedMidi, timetag: Timetag) -> Result<Vec<u8>> {
        encoder::encode(&self.bundle(value, timetag)).map_err(ConvertError::Osc)
    }
}
