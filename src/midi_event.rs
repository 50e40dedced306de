use crate::error::{ConvertError, Result};

const MAX_CHANNEL: u8 = 0x0F;
const MAX_DATA: u8 = 0x7F;
const MAX_STATUS: u8 = 0xF0;

/// Channel-voice messages, one per status nibble from 0x80 to 0xE0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NoteOff(u8, u8),
    NoteOn(u8, u8),
    PolyPressure(u8, u8),
    ControlChange(u8, u8),
    ProgramChange(u8),
    ChannelPressure(u8),
    /// 14-bit bend, 8192 is centre.
    PitchBend(u16),
}

impl Message {
    /// Status byte with the channel nibble cleared.
    pub fn status(&self) -> u8 {
        match self {
            Message::NoteOff(..) => 0x80,
            Message::NoteOn(..) => 0x90,
            Message::PolyPressure(..) => 0xA0,
            Message::ControlChange(..) => 0xB0,
            Message::ProgramChange(..) => 0xC0,
            Message::ChannelPressure(..) => 0xD0,
            Message::PitchBend(..) => 0xE0,
        }
    }

    /// Data bytes as they appear on the wire. Single-byte messages pad with 0, pitch bend
    /// is LSB then MSB.
    pub fn data(&self) -> [u8; 2] {
        match *self {
            Message::NoteOff(note, velocity) => [note, velocity],
            Message::NoteOn(note, velocity) => [note, velocity],
            Message::PolyPressure(note, pressure) => [note, pressure],
            Message::ControlChange(num, val) => [num, val],
            Message::ProgramChange(program) => [program, 0],
            Message::ChannelPressure(pressure) => [pressure, 0],
            Message::PitchBend(bend) => {
                // a bend wider than 14 bits leaves an MSB the packer rejects
                let msb = u8::try_from(bend >> 7).unwrap_or(u8::MAX);
                [(bend & 0x7F) as u8, msb]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    pub track: usize,
    pub tick: u64, // absolute, from the start of its track
    pub message: Message,
    pub channel: u8, // 0-based
}

impl MidiEvent {
    pub fn pack(&self) -> Result<PackedMidi> {
        let [d0, d1] = self.message.data();
        PackedMidi::new(self.message.status(), self.channel, d0, d1)
    }
}

/// Status, channel and both data bytes folded into the low 24 bits of an integer:
/// `((status + channel) << 16) | (data0 << 8) | data1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedMidi(u32);

impl PackedMidi {
    /// Fails instead of letting a wide field bleed into its neighbour.
    pub fn new(status: u8, channel: u8, data0: u8, data1: u8) -> Result<Self> {
        if status & 0x0F != 0 || status > MAX_STATUS {
            return Err(ConvertError::ValueOutOfRange {
                field: "status",
                value: status as u32,
                max: MAX_STATUS as u32,
            });
        }
        check("channel", channel, MAX_CHANNEL)?;
        check("data[0]", data0, MAX_DATA)?;
        check("data[1]", data1, MAX_DATA)?;

        let status_byte = (status + channel) as u32;
        Ok(Self(status_byte << 16 | (data0 as u32) << 8 | data1 as u32))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns `(status + channel, data0, data1)`.
    pub fn unpack(&self) -> (u8, u8, u8) {
        let [_, status_byte, data0, data1] = self.0.to_be_bytes();
        (status_byte, data0, data1)
    }
}

impl From<PackedMidi> for i32 {
    fn from(packed: PackedMidi) -> Self {
        // 24 bits always fit
        packed.0 as i32
    }
}

fn check(field: &'static str, value: u8, max: u8) -> Result<()> {
    if value > max {
        return Err(ConvertError::ValueOutOfRange {
            field,
            value: value as u32,
            max: max as u32,
        });
    }
    Ok(())
}
