// Top-level rendering: matrix + note table -> encoder calls.
//
// `render_sequence` is the whole pipeline: validate the config, build the note
// table, generate the matrix, render it. `render_matrix` renders a matrix the
// caller built, against a note table the caller owns; the table comes back
// holding whatever state the last track left in it.
//
// The pitch-width precondition is checked across the whole matrix before the
// encoder sees a single call, so a bad matrix never produces a partial file.

use crate::config::{MAX_PITCH_RANGE, MAX_TRACKS, SequenceConfig};
use crate::emitter::{TrackStats, emit_track};
use crate::encoder::SequenceEncoder;
use crate::error::SequenceError;
use crate::matrix::{ActivationMatrix, RandomSource, generate_matrix};
use crate::note::NoteTable;

/// What a render produced, per track in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub tracks: Vec<TrackStats>,
}

impl RenderSummary {
    pub fn total_beats(&self) -> usize {
        self.tracks.iter().map(|t| t.beats).sum()
    }

    pub fn total_note_ons(&self) -> usize {
        self.tracks.iter().map(|t| t.note_ons).sum()
    }

    pub fn total_note_offs(&self) -> usize {
        self.tracks.iter().map(|t| t.note_offs).sum()
    }
}

/// Name written at the start of track `index`.
pub fn track_name(index: usize) -> String {
    format!("Track: {index}")
}

/// Every beat row of every track must be exactly as wide as the note table.
pub fn check_pitch_width(notes: &NoteTable, matrix: &ActivationMatrix) -> Result<(), SequenceError> {
    for track in matrix.tracks() {
        for (beat, row) in track.beats.iter().enumerate() {
            if row.len() != notes.len() {
                return Err(SequenceError::PitchRangeMismatch {
                    notes: notes.len(),
                    track: track.index,
                    beat,
                    width: row.len(),
                });
            }
        }
    }
    Ok(())
}

/// Generate a matrix from `rng` and render it with a fresh note table.
pub fn render_sequence<E: SequenceEncoder + ?Sized>(
    config: &SequenceConfig,
    rng: &mut impl RandomSource,
    encoder: &mut E,
) -> Result<RenderSummary, SequenceError> {
    config.validate()?;
    let mut notes = NoteTable::new(config.pitch_range, config.note_duration);
    let matrix = generate_matrix(config, rng);
    log::info!(
        "generated {} tracks, {} active cells",
        matrix.track_count(),
        matrix.active_cells()
    );
    render_matrix(config, &matrix, &mut notes, encoder)
}

/// Render `matrix` into `encoder`, sharing `notes` across all tracks.
pub fn render_matrix<E: SequenceEncoder + ?Sized>(
    config: &SequenceConfig,
    matrix: &ActivationMatrix,
    notes: &mut NoteTable,
    encoder: &mut E,
) -> Result<RenderSummary, SequenceError> {
    if matrix.track_count() > MAX_TRACKS {
        return Err(SequenceError::invalid_config(format!(
            "matrix has {} tracks, at most {MAX_TRACKS} channels are available",
            matrix.track_count()
        )));
    }
    if notes.len() > MAX_PITCH_RANGE {
        return Err(SequenceError::invalid_config(format!(
            "note table has {} pitches, MIDI allows {MAX_PITCH_RANGE}",
            notes.len()
        )));
    }
    check_pitch_width(notes, matrix)?;

    encoder.begin_container(matrix.track_count())?;

    let mut summary = RenderSummary::default();
    for track in matrix.tracks() {
        log::info!("writing track/channel {}", track.index);
        encoder.set_track_name(&track_name(track.index))?;
        // Bounded by MAX_TRACKS above.
        encoder.set_channel(track.index as u8)?;
        let stats = emit_track(track, notes, config, encoder)?;
        log::debug!(
            "track {}: {} beats, {} note-ons, {} note-offs",
            track.index,
            stats.beats,
            stats.note_ons,
            stats.note_offs
        );
        summary.tracks.push(stats);
    }

    encoder.finalize()?;
    Ok(summary)
}
