// Standard MIDI File output.
//
// `SmfEncoder` implements `SequenceEncoder` on top of `midly`. Calls are
// collected per track and the whole file is written in `finalize`, since SMF
// track chunks are length-prefixed. Layout:
//
// - Format 0 for a single track, format 1 (parallel) otherwise. No separate
//   tempo track: players fall back to 120 BPM.
// - Metrical timing, 960 ticks per quarter note.
// - Each track opens with a TrackName meta event and ends with EndOfTrack.
// - Note-offs are real NoteOff messages with velocity 0.
// - `advance_time` only accumulates ticks; they become the delta of the next
//   event on the track, EndOfTrack included, so trailing beats keep their
//   length.

use crate::encoder::SequenceEncoder;
use crate::error::SequenceError;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u28},
};
use std::io::Write;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 960;

/// Largest delta an SMF event can carry.
const MAX_DELTA: u32 = (1 << 28) - 1;

#[derive(Debug, Clone)]
enum Recorded {
    TrackName(String),
    Midi { channel: u4, message: MidiMessage },
    EndOfTrack,
}

#[derive(Debug, Default)]
struct TrackBuf {
    events: Vec<(u32, Recorded)>,
    closed: bool,
}

/// Encoder that writes a Standard MIDI File to `out` on `finalize`.
pub struct SmfEncoder<W: Write> {
    out: W,
    declared: Option<usize>,
    tracks: Vec<TrackBuf>,
    channel: u4,
    pending_ticks: u32,
    finalized: bool,
}

impl<W: Write> SmfEncoder<W> {
    pub fn new(out: W) -> Self {
        SmfEncoder {
            out,
            declared: None,
            tracks: Vec::new(),
            channel: u4::new(0),
            pending_ticks: 0,
            finalized: false,
        }
    }

    /// Give back the writer so an in-memory buffer can be inspected.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// The track being written. Opens a new one if the last was ended.
    fn open_track(&mut self) -> Result<&mut TrackBuf, SequenceError> {
        if self.declared.is_none() {
            return Err(SequenceError::EncoderState("container not begun"));
        }
        if self.finalized {
            return Err(SequenceError::EncoderState("container already finalized"));
        }
        if self.tracks.last().is_none_or(|t| t.closed) {
            self.tracks.push(TrackBuf::default());
        }
        self.tracks
            .last_mut()
            .ok_or(SequenceError::EncoderState("no open track"))
    }

    /// Append an event carrying all ticks accumulated since the previous one.
    fn push(&mut self, event: Recorded) -> Result<(), SequenceError> {
        let delta = self.pending_ticks;
        self.open_track()?.events.push((delta, event));
        self.pending_ticks = 0;
        Ok(())
    }

    fn push_midi(&mut self, message: MidiMessage) -> Result<(), SequenceError> {
        let channel = self.channel;
        self.push(Recorded::Midi { channel, message })
    }
}

fn to_u7(value: u8, what: &'static str) -> Result<u7, SequenceError> {
    if value > 127 {
        return Err(SequenceError::EncoderState(what));
    }
    Ok(u7::new(value))
}

fn format_for(track_count: usize) -> Format {
    if track_count == 1 {
        Format::SingleTrack
    } else {
        Format::Parallel
    }
}

impl<W: Write> SequenceEncoder for SmfEncoder<W> {
    fn begin_container(&mut self, track_count: usize) -> Result<(), SequenceError> {
        if self.declared.is_some() {
            return Err(SequenceError::EncoderState("container already begun"));
        }
        if track_count > usize::from(u16::MAX) {
            return Err(SequenceError::EncoderState("too many tracks for SMF"));
        }
        self.declared = Some(track_count);
        Ok(())
    }

    fn set_track_name(&mut self, name: &str) -> Result<(), SequenceError> {
        self.push(Recorded::TrackName(name.to_string()))
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), SequenceError> {
        if channel > 15 {
            return Err(SequenceError::EncoderState("channel above 15"));
        }
        self.open_track()?;
        self.channel = u4::new(channel);
        Ok(())
    }

    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), SequenceError> {
        self.push_midi(MidiMessage::NoteOn {
            key: to_u7(pitch, "pitch above 127")?,
            vel: to_u7(velocity, "velocity above 127")?,
        })
    }

    fn note_off(&mut self, pitch: u8) -> Result<(), SequenceError> {
        self.push_midi(MidiMessage::NoteOff {
            key: to_u7(pitch, "pitch above 127")?,
            vel: u7::new(0),
        })
    }

    fn advance_time(&mut self, quarters: u32) -> Result<(), SequenceError> {
        self.open_track()?;
        let ticks = u64::from(self.pending_ticks)
            + u64::from(quarters) * u64::from(TICKS_PER_QUARTER);
        if ticks > u64::from(MAX_DELTA) {
            return Err(SequenceError::EncoderState("delta exceeds 28 bits"));
        }
        self.pending_ticks = ticks as u32;
        Ok(())
    }

    fn end_track(&mut self) -> Result<(), SequenceError> {
        self.push(Recorded::EndOfTrack)?;
        if let Some(track) = self.tracks.last_mut() {
            track.closed = true;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SequenceError> {
        let Some(declared) = self.declared else {
            return Err(SequenceError::EncoderState("container not begun"));
        };
        if self.finalized {
            return Err(SequenceError::EncoderState("container already finalized"));
        }
        if self.tracks.iter().any(|t| !t.closed) {
            return Err(SequenceError::EncoderState("track left open"));
        }
        if self.tracks.len() != declared {
            return Err(SequenceError::TrackCountMismatch {
                declared,
                written: self.tracks.len(),
            });
        }

        let smf = build_smf(&self.tracks, format_for(declared));
        smf.write_std(&mut self.out)?;
        self.out.flush()?;
        self.finalized = true;
        Ok(())
    }
}

/// Borrow the recorded tracks as an in-memory SMF.
fn build_smf(tracks: &[TrackBuf], format: Format) -> Smf<'_> {
    let mut smf = Smf::new(Header::new(
        format,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));
    for buf in tracks {
        let track = buf
            .events
            .iter()
            .map(|(delta, event)| TrackEvent {
                delta: u28::new(*delta),
                kind: match event {
                    Recorded::TrackName(name) => {
                        TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes()))
                    }
                    Recorded::Midi { channel, message } => TrackEventKind::Midi {
                        channel: *channel,
                        message: *message,
                    },
                    Recorded::EndOfTrack => TrackEventKind::Meta(MetaMessage::EndOfTrack),
                },
            })
            .collect();
        smf.tracks.push(track);
    }
    smf
}
