use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use rosc::{decoder, OscPacket, OscType};

use crate::config::{Config, EventOrder, TempoSource};
use crate::error::{ConvertError, Result};
use crate::extractor::{self, Extracted, Extractor};
use crate::formatter::{BundleFormatter, OscFormatter};
use crate::midi_event::MidiEvent;
use crate::stream::{FrameReader, FrameWriter};
use crate::timing::{format_midi_time, TickClock, Timetag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionReport {
    pub records: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Reads `config.input` and writes one framed OSC bundle per channel event to `config.output`.
///
/// The input is fully parsed before the output is created, so a missing or invalid MIDI file
/// leaves nothing behind. A failure after that point leaves a partial output file which
/// cannot be resumed.
pub fn convert(config: &Config) -> Result<ConversionReport> {
    config.validate()?;

    let midi_file = extractor::load(&config.input)?;
    let extracted = Extractor::new(midi_file, config.override_channel)?.run()?;
    info!(
        "{}: {} track(s), {} channel event(s), {} pulses per quarter note",
        config.input.display(),
        extracted.track_count,
        extracted.events.len(),
        extracted.pulses_per_qn
    );

    let file = File::create(&config.output).map_err(|e| ConvertError::io(&config.output, e))?;
    let mut report = write_events(
        config,
        &extracted,
        &OscFormatter::new(config.address.clone()),
        BufWriter::new(file),
    )?;
    report.skipped = extracted.skipped;

    info!(
        "wrote {} bundle(s), {} bytes to {} ({} event(s) skipped)",
        report.records,
        report.bytes,
        config.output.display(),
        report.skipped
    );
    Ok(report)
}

/// Formats and frames every extracted event into `out`, flushing before returning.
pub fn write_events<W: Write>(
    config: &Config,
    extracted: &Extracted,
    formatter: &dyn BundleFormatter,
    out: W,
) -> Result<ConversionReport> {
    let clock = match config.tempo_source {
        TempoSource::Fixed => TickClock::fixed(config.tempo_bpm, extracted.pulses_per_qn),
        TempoSource::File => TickClock::with_tempo_map(
            config.tempo_bpm,
            extracted.pulses_per_qn,
            &extracted.tempo_changes,
        ),
    };

    let mut writer = FrameWriter::new(out);
    for event in ordered(&extracted.events, config.order) {
        let seconds = clock.seconds(event.tick);
        let timetag = Timetag::from_seconds(seconds)?;
        let value = event.pack()?;
        let bytes = formatter.format(value, timetag)?;
        debug!(
            "track {} tick {} -> {:.6}s {:#08x}",
            event.track,
            event.tick,
            seconds,
            value.get()
        );
        writer
            .write_record(&bytes)
            .map_err(|e| ConvertError::io(&config.output, e))?;
    }
    writer
        .flush()
        .map_err(|e| ConvertError::io(&config.output, e))?;

    Ok(ConversionReport {
        records: writer.records(),
        skipped: 0,
        bytes: writer.bytes(),
    })
}

fn ordered(events: &[MidiEvent], order: EventOrder) -> Vec<&MidiEvent> {
    let mut refs: Vec<&MidiEvent> = events.iter().collect();
    if order == EventOrder::Time {
        // stable, so ties keep track-then-event order
        refs.sort_by_key(|e| e.tick);
    }
    refs
}

/// One decoded message of a stream record.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpEntry {
    pub timetag: Timetag,
    pub address: String,
    pub args: Vec<OscType>,
}

impl DumpEntry {
    pub fn describe(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                OscType::Int(v) => format!("{:#08x}", v),
                other => format!("{:?}", other),
            })
            .collect();
        format!(
            "[osc@{}: {} {}]",
            format_midi_time(self.timetag.as_seconds()),
            self.address,
            args.join(" ")
        )
    }
}

/// Decodes every record of a stream written by [`convert`].
pub fn dump(path: &Path) -> Result<Vec<DumpEntry>> {
    if !path.is_file() {
        return Err(ConvertError::InputNotFound(path.to_path_buf()));
    }
    let buf = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    decode_stream(&buf)
}

pub fn decode_stream(buf: &[u8]) -> Result<Vec<DumpEntry>> {
    let mut entries = Vec::new();
    for record in FrameReader::new(buf) {
        let (_, packet) = decoder::decode_udp(record?).map_err(ConvertError::Osc)?;
        collect_messages(packet, Timetag::default(), &mut entries);
    }
    Ok(entries)
}

fn collect_messages(packet: OscPacket, timetag: Timetag, entries: &mut Vec<DumpEntry>) {
    match packet {
        OscPacket::Message(msg) => entries.push(DumpEntry {
            timetag,
            address: msg.addr,
            args: msg.args,
        }),
        OscPacket::Bundle(bundle) => {
            let timetag = bundle.timetag.into();
            for content in bundle.content {
                collect_messages(content, timetag, entries);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi_event::Message;

    fn extracted(events: Vec<MidiEvent>) -> Extracted {
        Extracted {
            pulses_per_qn: 480,
            track_count: 2,
            events,
            tempo_changes: vec![],
            skipped: 0,
        }
    }

    fn note_on(track: usize, tick: u64, note: u8) -> MidiEvent {
        MidiEvent {
            track,
            tick,
            message: Message::NoteOn(note, 100),
            channel: 0,
        }
    }

    #[test]
    fn writes_one_record_per_event() {
        let config = Config::new("in.mid");
        let events = extracted(vec![note_on(0, 0, 60), note_on(0, 480, 62)]);
        let mut out = Vec::new();
        let report =
            write_events(&config, &events, &OscFormatter::new("/slot0"), &mut out).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.bytes, out.len() as u64);

        let entries = decode_stream(&out).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].args, vec![OscType::Int(0x90_3C_64)]);
        let expected = 60.0 / 137.0;
        assert!((entries[1].timetag.as_seconds() - expected).abs() < 1e-9);
    }

    #[test]
    fn time_order_merges_tracks_stably() {
        let config = Config {
            order: EventOrder::Time,
            ..Config::new("in.mid")
        };
        let events = extracted(vec![
            note_on(0, 960, 60),
            note_on(0, 1920, 61),
            note_on(1, 0, 62),
            note_on(1, 960, 63),
        ]);
        let mut out = Vec::new();
        write_events(&config, &events, &OscFormatter::new("/slot0"), &mut out).unwrap();
        let notes: Vec<i32> = decode_stream(&out)
            .unwrap()
            .iter()
            .map(|e| match e.args[0] {
                OscType::Int(v) => (v >> 8) & 0xFF,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(notes, vec![62, 60, 63, 61]);
    }

    #[test]
    fn packing_error_aborts_the_run() {
        let config = Config::new("in.mid");
        let mut bad = note_on(0, 0, 60);
        bad.channel = 16;
        let events = extracted(vec![note_on(0, 0, 60), bad]);
        let mut out = Vec::new();
        let err =
            write_events(&config, &events, &OscFormatter::new("/slot0"), &mut out).unwrap_err();
        assert!(matches!(err, ConvertError::ValueOutOfRange { .. }));
    }

    #[test]
    fn describe_formats_time_address_and_value() {
        let entry = DumpEntry {
            timetag: Timetag::from_seconds(61.25).unwrap(),
            address: "/slot0".to_string(),
            args: vec![OscType::Int(0x90_3C_64)],
        };
        assert_eq!(entry.describe(), "[osc@01:01.250: /slot0 0x903c64]");
    }
}
