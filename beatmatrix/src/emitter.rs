// Per-track event emission.
//
// Walks one track's beats in order. Each beat marks its active pitches as
// struck, runs the note table's decay/strike pass (forwarding each event to the
// encoder the moment it is decided), then advances time by one beat. The track
// closes with `end_track`. Track name and channel are the orchestrator's job.

use crate::config::SequenceConfig;
use crate::encoder::SequenceEncoder;
use crate::error::SequenceError;
use crate::matrix::TrackGrid;
use crate::note::{NoteEvent, NoteTable};

/// Event counts for one emitted track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackStats {
    pub beats: usize,
    pub note_ons: usize,
    pub note_offs: usize,
}

/// Emit every beat of `track` into `encoder`, mutating the shared `notes`.
///
/// The caller has already checked that each beat row is as wide as `notes`.
pub fn emit_track<E: SequenceEncoder + ?Sized>(
    track: &TrackGrid,
    notes: &mut NoteTable,
    config: &SequenceConfig,
    encoder: &mut E,
) -> Result<TrackStats, SequenceError> {
    let mut stats = TrackStats::default();

    for row in &track.beats {
        for (pitch, _) in row.iter().enumerate().filter(|(_, on)| **on) {
            notes.mark_strike(pitch);
        }

        notes.advance_beat(config.velocity, |event| match event {
            NoteEvent::On { pitch, velocity } => {
                stats.note_ons += 1;
                encoder.note_on(pitch, velocity)
            }
            NoteEvent::Off { pitch } => {
                stats.note_offs += 1;
                encoder.note_off(pitch)
            }
        })?;

        encoder.advance_time(config.beat_quarters)?;
        stats.beats += 1;
    }

    encoder.end_track()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{EncoderCall, RecordingEncoder};

    fn single_pitch_track(pattern: &[bool]) -> TrackGrid {
        TrackGrid {
            index: 0,
            beats: pattern.iter().map(|&on| vec![false, on, false]).collect(),
        }
    }

    fn small_config() -> SequenceConfig {
        SequenceConfig {
            track_count: 1,
            pitch_range: 3,
            allowed_pitches: vec![1],
            ..Default::default()
        }
    }

    #[test]
    fn strike_rest_strike() {
        let track = single_pitch_track(&[true, false, true]);
        let mut notes = NoteTable::new(3, 1);
        let mut enc = RecordingEncoder::new();
        let stats = emit_track(&track, &mut notes, &small_config(), &mut enc).unwrap();

        use EncoderCall::*;
        assert_eq!(
            enc.calls,
            vec![
                NoteOn {
                    pitch: 1,
                    velocity: 100
                },
                Advance { quarters: 1 },
                NoteOff { pitch: 1 },
                Advance { quarters: 1 },
                // Still ringing: decay off, then the re-strike's own off.
                NoteOff { pitch: 1 },
                NoteOff { pitch: 1 },
                NoteOn {
                    pitch: 1,
                    velocity: 100
                },
                Advance { quarters: 1 },
                EndTrack,
            ]
        );
        assert_eq!(
            stats,
            TrackStats {
                beats: 3,
                note_ons: 2,
                note_offs: 3,
            }
        );
    }

    #[test]
    fn empty_track_only_ends() {
        let track = TrackGrid {
            index: 0,
            beats: Vec::new(),
        };
        let mut notes = NoteTable::new(3, 1);
        let mut enc = RecordingEncoder::new();
        emit_track(&track, &mut notes, &small_config(), &mut enc).unwrap();
        assert_eq!(enc.calls, vec![EncoderCall::EndTrack]);
    }

    #[test]
    fn one_advance_per_beat_with_configured_step() {
        let track = single_pitch_track(&[false; 5]);
        let config = SequenceConfig {
            beat_quarters: 2,
            ..small_config()
        };
        let mut notes = NoteTable::new(3, 1);
        let mut enc = RecordingEncoder::new();
        emit_track(&track, &mut notes, &config, &mut enc).unwrap();
        assert_eq!(enc.calls.len(), 6);
        assert!(
            enc.calls[..5]
                .iter()
                .all(|c| *c == EncoderCall::Advance { quarters: 2 })
        );
    }

    #[test]
    fn configured_velocity_is_used() {
        let track = single_pitch_track(&[true]);
        let config = SequenceConfig {
            velocity: 64,
            ..small_config()
        };
        let mut notes = NoteTable::new(3, 1);
        let mut enc = RecordingEncoder::new();
        emit_track(&track, &mut notes, &config, &mut enc).unwrap();
        assert_eq!(
            enc.calls[0],
            EncoderCall::NoteOn {
                pitch: 1,
                velocity: 64
            }
        );
    }
}
