// The encoder seam between sequence rendering and file output.
//
// Rendering never touches bytes. It drives a `SequenceEncoder` through a fixed
// call protocol:
//
//   begin_container(n)
//   n times: set_track_name, set_channel, (note_on | note_off | advance_time)*, end_track
//   finalize
//
// `SmfEncoder` (midi.rs) turns those calls into a Standard MIDI File.
// `RecordingEncoder` keeps them as a list, which is what the tests assert on.

use crate::error::SequenceError;

pub trait SequenceEncoder {
    /// Open the container for `track_count` tracks.
    fn begin_container(&mut self, track_count: usize) -> Result<(), SequenceError>;

    fn set_track_name(&mut self, name: &str) -> Result<(), SequenceError>;

    /// Channel for subsequent note events on the current track.
    fn set_channel(&mut self, channel: u8) -> Result<(), SequenceError>;

    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), SequenceError>;

    fn note_off(&mut self, pitch: u8) -> Result<(), SequenceError>;

    /// Move the current track's clock forward by `quarters` quarter notes.
    fn advance_time(&mut self, quarters: u32) -> Result<(), SequenceError>;

    fn end_track(&mut self) -> Result<(), SequenceError>;

    /// Complete the container. Nothing may be called afterwards.
    fn finalize(&mut self) -> Result<(), SequenceError>;
}

/// One encoder invocation, as captured by `RecordingEncoder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderCall {
    BeginContainer { track_count: usize },
    TrackName(String),
    Channel(u8),
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    Advance { quarters: u32 },
    EndTrack,
    Finalize,
}

/// Encoder that only records the calls it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingEncoder {
    pub calls: Vec<EncoderCall>,
}

impl RecordingEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The calls belonging to track `index`: everything from its
    /// `TrackName` up to and including its `EndTrack`.
    pub fn track_calls(&self, index: usize) -> &[EncoderCall] {
        let mut starts = self
            .calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, EncoderCall::TrackName(_)))
            .map(|(i, _)| i);
        let Some(start) = starts.nth(index) else {
            return &[];
        };
        let end = self.calls[start..]
            .iter()
            .position(|c| *c == EncoderCall::EndTrack)
            .map_or(self.calls.len(), |offset| start + offset + 1);
        &self.calls[start..end]
    }
}

impl SequenceEncoder for RecordingEncoder {
    fn begin_container(&mut self, track_count: usize) -> Result<(), SequenceError> {
        self.calls.push(EncoderCall::BeginContainer { track_count });
        Ok(())
    }

    fn set_track_name(&mut self, name: &str) -> Result<(), SequenceError> {
        self.calls.push(EncoderCall::TrackName(name.to_string()));
        Ok(())
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), SequenceError> {
        self.calls.push(EncoderCall::Channel(channel));
        Ok(())
    }

    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), SequenceError> {
        self.calls.push(EncoderCall::NoteOn { pitch, velocity });
        Ok(())
    }

    fn note_off(&mut self, pitch: u8) -> Result<(), SequenceError> {
        self.calls.push(EncoderCall::NoteOff { pitch });
        Ok(())
    }

    fn advance_time(&mut self, quarters: u32) -> Result<(), SequenceError> {
        self.calls.push(EncoderCall::Advance { quarters });
        Ok(())
    }

    fn end_track(&mut self) -> Result<(), SequenceError> {
        self.calls.push(EncoderCall::EndTrack);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SequenceError> {
        self.calls.push(EncoderCall::Finalize);
        Ok(())
    }
}
