use std::path::Path;

use log::{debug, warn};
use midi_file::core::{
    ChannelPressureMessage, ControlChangeValue, Message, NoteMessage, PitchBendMessage,
    ProgramChangeValue,
};
use midi_file::file::{Division, Event, MetaEvent, TrackEvent};
use midi_file::MidiFile;

use crate::error::{ConvertError, Result};
use crate::midi_event::{self, MidiEvent};
use crate::timing::TempoChange;

/// Everything the conversion needs from a MIDI file.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub pulses_per_qn: u16,
    pub track_count: usize,
    /// Track order outer, file order inner.
    pub events: Vec<MidiEvent>,
    pub tempo_changes: Vec<TempoChange>,
    /// Events that produced no bundle: meta events other than Set Tempo, sysex, and
    /// channel mode messages.
    pub skipped: usize,
}

pub fn load(path: &Path) -> Result<MidiFile> {
    if !path.is_file() {
        return Err(ConvertError::InputNotFound(path.to_path_buf()));
    }
    MidiFile::load(path).map_err(|source| ConvertError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub struct Extractor {
    midi_file: MidiFile,
    override_midi_channel: Option<u8>,
    pulses_per_qn: u16,
    track: usize,
    ticks: u64,
    skipped: usize,
    tempo_changes: Vec<TempoChange>,
}

impl Extractor {
    pub fn new(midi_file: MidiFile, override_midi_channel: Option<u8>) -> Result<Self> {
        // read division to get pulses per quarter note
        let pulses_per_qn = match midi_file.header().division() {
            Division::QuarterNote(qtr) => check_pulses_per_qn(qtr.get())?,
            Division::Smpte(smpte) => {
                debug!("SMPTE division: {:?}", smpte);
                return Err(ConvertError::UnsupportedDivision);
            }
        };

        Ok(Self {
            midi_file,
            override_midi_channel,
            pulses_per_qn,
            track: 0,
            ticks: 0,
            skipped: 0,
            tempo_changes: Vec::new(),
        })
    }

    pub fn run(mut self) -> Result<Extracted> {
        let tracks: Vec<Vec<TrackEvent>> = self
            .midi_file
            .tracks()
            .map(|t| t.events().cloned().collect())
            .collect();
        debug!("{} pulses per quarter note", self.pulses_per_qn);

        let mut events = Vec::new();
        for (track, track_events) in tracks.iter().enumerate() {
            // absolute ticks restart with every track
            self.track = track;
            self.ticks = 0;
            for track_event in track_events {
                if let Some(event) = self.process_event(track_event) {
                    events.push(event);
                }
            }
        }

        Ok(Extracted {
            pulses_per_qn: self.pulses_per_qn,
            track_count: tracks.len(),
            events,
            tempo_changes: self.tempo_changes,
            skipped: self.skipped,
        })
    }

    fn process_event(&mut self, track_event: &TrackEvent) -> Option<MidiEvent> {
        let dt = track_event.delta_time();
        self.ticks += dt as u64;
        match track_event.event() {
            Event::Midi(msg) => self.handle_midi_msg(msg),

            Event::Meta(MetaEvent::SetTempo(new_tempo)) => {
                let change = TempoChange {
                    tick: self.ticks,
                    micros_per_qn: new_tempo.get(),
                };
                debug!(
                    "tempo change at tick {}: {:.3} bpm",
                    change.tick,
                    change.bpm()
                );
                self.tempo_changes.push(change);
                None
            }

            event => {
                debug!(
                    "skipping track {} tick {}: {:?}",
                    self.track, self.ticks, event
                );
                self.skipped += 1;
                None
            }
        }
    }

    fn handle_midi_msg(&mut self, msg: &Message) -> Option<MidiEvent> {
        match msg {
            Message::NoteOn(note) => Some(self.handle_note(note, true)),
            Message::NoteOff(note) => Some(self.handle_note(note, false)),
            Message::PolyPressure(note) => Some(self.handle_poly_pressure(note)),
            Message::Control(cc) => Some(self.handle_control_change(cc)),
            Message::ProgramChange(pc) => Some(self.handle_program_change(pc)),
            Message::ChannelPressure(cp) => Some(self.handle_channel_pressure(cp)),
            Message::PitchBend(pb) => Some(self.handle_pitch_bend(pb)),
            // channel mode messages decode into their own variants
            _ => {
                warn!(
                    "skipping channel mode message at track {} tick {}: {:?}",
                    self.track, self.ticks, msg
                );
                self.skipped += 1;
                None
            }
        }
    }

    fn handle_note(&self, note: &NoteMessage, on: bool) -> MidiEvent {
        let number = note.note_number().get();
        let velocity = note.velocity().get();
        let message = if on {
            midi_event::Message::NoteOn(number, velocity)
        } else {
            midi_event::Message::NoteOff(number, velocity)
        };
        self.event(message, note.channel().get())
    }

    fn handle_poly_pressure(&self, note: &NoteMessage) -> MidiEvent {
        // the parser stores key pressure in the velocity field
        let message =
            midi_event::Message::PolyPressure(note.note_number().get(), note.velocity().get());
        self.event(message, note.channel().get())
    }

    fn handle_control_change(&self, cc: &ControlChangeValue) -> MidiEvent {
        let message =
            midi_event::Message::ControlChange(cc.control() as u8, cc.value().get() as u8);
        self.event(message, cc.channel().get())
    }

    fn handle_program_change(&self, pc: &ProgramChangeValue) -> MidiEvent {
        let message = midi_event::Message::ProgramChange(pc.program().get());
        self.event(message, pc.channel().get())
    }

    fn handle_channel_pressure(&self, cp: &ChannelPressureMessage) -> MidiEvent {
        let message = midi_event::Message::ChannelPressure(cp.pressure().get());
        self.event(message, cp.channel().get())
    }

    fn handle_pitch_bend(&self, pb: &PitchBendMessage) -> MidiEvent {
        let message = midi_event::Message::PitchBend(pb.pitch_bend().get());
        self.event(message, pb.channel().get())
    }

    fn event(&self, message: midi_event::Message, channel: u8) -> MidiEvent {
        let event = MidiEvent {
            track: self.track,
            tick: self.ticks,
            message,
            channel: self.override_midi_channel.unwrap_or(channel),
        };
        debug!("{:?}", event);
        event
    }
}

fn check_pulses_per_qn(pulses_per_qn: u16) -> Result<u16> {
    if pulses_per_qn == 0 {
        return Err(ConvertError::ValueOutOfRange {
            field: "division",
            value: 0,
            max: u16::MAX as u32,
        });
    }
    Ok(pulses_per_qn)
}
