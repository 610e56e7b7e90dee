// Sequence configuration.
//
// Every knob the generator reads lives in `SequenceConfig`: track count, pitch
// range, the allowed pitch set, beat-count candidates, the activation roll,
// velocity, note duration, and the beat-advance step. `Default` reproduces the
// stock session (8 tracks, 120 pitches, a 15-note pentatonic spread). The
// generator binary can override any subset from a JSON file; absent fields keep
// their defaults.
//
// The config is built once, validated once, and then only ever borrowed.
// Components never consult globals.

use crate::error::SequenceError;
use serde::{Deserialize, Serialize};

/// Highest number of tracks: one per MIDI channel.
pub const MAX_TRACKS: usize = 16;

/// MIDI note numbers are 7-bit.
pub const MAX_PITCH_RANGE: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Number of tracks. Track `i` is written on MIDI channel `i`.
    pub track_count: usize,
    /// Width of each beat row and size of the note table.
    pub pitch_range: usize,
    /// The only pitches that can ever be activated.
    pub allowed_pitches: Vec<u8>,
    /// Candidate beat counts; each track picks one uniformly.
    pub beat_lengths: Vec<usize>,
    /// Upper bound (inclusive) of the per-cell activation roll, lower bound 0.
    pub activation_roll_max: u32,
    /// A roll at or above this value activates the cell.
    pub activation_threshold: u32,
    /// Velocity of every note-on.
    pub velocity: u8,
    /// How many beats a struck note rings before its decay note-off.
    pub note_duration: u8,
    /// Time advanced after each beat, in quarter notes.
    pub beat_quarters: u32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        SequenceConfig {
            track_count: 8,
            pitch_range: 120,
            allowed_pitches: vec![
                49, 51, 54, 56, 58, //
                61, 63, 66, 68, 70, //
                73, 75, 78, 80, 82,
            ],
            beat_lengths: vec![8, 16, 24, 32, 64, 128],
            activation_roll_max: 100,
            activation_threshold: 98,
            velocity: 100,
            note_duration: 1,
            beat_quarters: 1,
        }
    }
}

impl SequenceConfig {
    /// Parse and validate a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, SequenceError> {
        let config: SequenceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Whether `pitch` belongs to the allowed set.
    pub fn is_allowed(&self, pitch: usize) -> bool {
        self.allowed_pitches.iter().any(|&p| usize::from(p) == pitch)
    }

    /// Reject configurations that cannot produce a valid MIDI file.
    pub fn validate(&self) -> Result<(), SequenceError> {
        if self.track_count == 0 || self.track_count > MAX_TRACKS {
            return Err(SequenceError::invalid_config(format!(
                "track_count must be in 1..={MAX_TRACKS}, got {}",
                self.track_count
            )));
        }
        if self.pitch_range == 0 || self.pitch_range > MAX_PITCH_RANGE {
            return Err(SequenceError::invalid_config(format!(
                "pitch_range must be in 1..={MAX_PITCH_RANGE}, got {}",
                self.pitch_range
            )));
        }
        if self.allowed_pitches.is_empty() {
            return Err(SequenceError::invalid_config("allowed_pitches is empty"));
        }
        if let Some(&p) = self
            .allowed_pitches
            .iter()
            .find(|&&p| usize::from(p) >= self.pitch_range)
        {
            return Err(SequenceError::invalid_config(format!(
                "allowed pitch {p} is outside the pitch range 0..{}",
                self.pitch_range
            )));
        }
        if self.beat_lengths.is_empty() {
            return Err(SequenceError::invalid_config("beat_lengths is empty"));
        }
        if self.beat_lengths.contains(&0) {
            return Err(SequenceError::invalid_config(
                "beat_lengths must all be positive",
            ));
        }
        if self.velocity > 127 {
            return Err(SequenceError::invalid_config(format!(
                "velocity must be at most 127, got {}",
                self.velocity
            )));
        }
        if self.note_duration == 0 {
            return Err(SequenceError::invalid_config(
                "note_duration must be at least one beat",
            ));
        }
        if self.beat_quarters == 0 {
            return Err(SequenceError::invalid_config(
                "beat_quarters must be at least one",
            ));
        }
        Ok(())
    }
}
