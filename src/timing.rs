use std::time::Duration;

use rosc::OscTime;

use crate::error::{ConvertError, Result};

// microseconds per second
const MICROS_PER_SEC: f64 = 1_000_000.0;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// A Set Tempo meta event at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub tick: u64,
    pub micros_per_qn: u32,
}

impl TempoChange {
    pub fn bpm(&self) -> f64 {
        MICROS_PER_SEC / self.micros_per_qn as f64 * 60.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    start_tick: u64,
    start_sec: f64,
    sec_per_tick: f64,
}

/// Maps absolute ticks to seconds from the start of the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TickClock {
    // sorted by start_tick, first one starts at tick 0
    segments: Vec<Segment>,
}

impl TickClock {
    /// One tempo for the whole file: seconds = 60 * tick / (bpm * pulses_per_qn).
    pub fn fixed(bpm: f64, pulses_per_qn: u16) -> Self {
        Self {
            segments: vec![Segment {
                start_tick: 0,
                start_sec: 0.0,
                sec_per_tick: seconds_per_tick(bpm, pulses_per_qn),
            }],
        }
    }

    /// Starts at `initial_bpm` and follows every tempo change from then on.
    pub fn with_tempo_map(initial_bpm: f64, pulses_per_qn: u16, changes: &[TempoChange]) -> Self {
        let mut changes = changes.to_vec();
        changes.sort_by_key(|c| c.tick);

        let mut clock = Self::fixed(initial_bpm, pulses_per_qn);
        for change in changes {
            let last = clock.segments[clock.segments.len() - 1];
            let segment = Segment {
                start_tick: change.tick,
                start_sec: last.start_sec
                    + (change.tick - last.start_tick) as f64 * last.sec_per_tick,
                sec_per_tick: ticks_to_seconds(1, pulses_per_qn, change.micros_per_qn),
            };
            if segment.start_tick == last.start_tick {
                // later change at the same tick wins
                let n = clock.segments.len();
                clock.segments[n - 1] = segment;
            } else {
                clock.segments.push(segment);
            }
        }
        clock
    }

    pub fn seconds(&self, tick: u64) -> f64 {
        let idx = self
            .segments
            .partition_point(|s| s.start_tick <= tick)
            .saturating_sub(1);
        let seg = &self.segments[idx];
        seg.start_sec + (tick - seg.start_tick) as f64 * seg.sec_per_tick
    }
}

pub fn seconds_per_tick(bpm: f64, pulses_per_qn: u16) -> f64 {
    60.0 / bpm / pulses_per_qn as f64
}

fn ticks_to_seconds(ticks: u64, pulses_per_qn: u16, tempo: u32) -> f64 {
    // MIDI tempo is in microseconds per quarter note
    let tempo_in_secs = tempo as f64 / MICROS_PER_SEC;
    let beats = ticks as f64 / pulses_per_qn as f64;
    beats * tempo_in_secs
}

/// OSC timetag relative to the start of the stream. No NTP epoch offset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timetag {
    pub seconds: u32,
    pub fraction: u32,
}

impl Timetag {
    pub fn from_seconds(time: f64) -> Result<Self> {
        if !time.is_finite() || time < 0.0 || time >= TWO_POW_32 {
            return Err(ConvertError::TimeOutOfRange(time));
        }
        let whole = time.trunc();
        // rounding can push the product to exactly 2^32
        let fraction = ((time - whole) * TWO_POW_32)
            .floor()
            .clamp(0.0, u32::MAX as f64);
        Ok(Self {
            seconds: whole as u32,
            fraction: fraction as u32,
        })
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds as f64 + self.fraction as f64 / TWO_POW_32
    }

    pub fn to_bits(&self) -> u64 {
        (self.seconds as u64) << 32 | self.fraction as u64
    }
}

impl From<Timetag> for OscTime {
    fn from(tag: Timetag) -> Self {
        OscTime {
            seconds: tag.seconds,
            fractional: tag.fraction,
        }
    }
}

impl From<OscTime> for Timetag {
    fn from(time: OscTime) -> Self {
        Timetag {
            seconds: time.seconds,
            fraction: time.fractional,
        }
    }
}

pub fn format_midi_time(seconds: f64) -> String {
    let duration = Duration::from_secs_f64(seconds);
    let minutes = duration.as_secs() / 60;
    let seconds = duration.as_secs() % 60;
    let fractional = duration.subsec_millis();
    format!("{:02}:{:02}.{:03}", minutes, seconds, fractional)
}
