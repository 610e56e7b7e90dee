// Activation matrix: which pitch is struck on which beat of which track.
//
// Indexed as `tracks[track].beats[beat][pitch]`. Every beat row spans the full
// pitch range so that pitch numbers index rows directly; only pitches in the
// allowed set can ever be `true`, the rest of each row is dead space.
//
// Generation draws every track's length first (in track order), then fills the
// cells track by track, beat by beat, in ascending pitch order with one roll
// per allowed pitch. The draw order is part of the contract: it is what makes a
// seed reproduce a matrix exactly.

use crate::config::SequenceConfig;
use beatmatrix_prng::SeqRng;

/// Randomness consumed by the matrix generator.
///
/// `SeqRng` is the production source; tests plug in scripted sources to pin
/// down exact matrices.
pub trait RandomSource {
    /// Uniform index in `0..len`. Callers guarantee `len > 0`.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform roll in `0..=max`.
    fn roll(&mut self, max: u32) -> u32;
}

impl RandomSource for SeqRng {
    fn pick_index(&mut self, len: usize) -> usize {
        self.range_usize(0, len)
    }

    fn roll(&mut self, max: u32) -> u32 {
        self.range_u32_inclusive(0, max)
    }
}

/// One track's slice of the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackGrid {
    /// Track index, reused as the output channel.
    pub index: usize,
    /// `beats[beat][pitch]`; true means the pitch is struck on that beat.
    pub beats: Vec<Vec<bool>>,
}

impl TrackGrid {
    pub fn beat_count(&self) -> usize {
        self.beats.len()
    }

    /// Whether `pitch` is struck on `beat`. Out-of-range lookups are `false`.
    pub fn is_active(&self, beat: usize, pitch: usize) -> bool {
        self.beats
            .get(beat)
            .and_then(|row| row.get(pitch))
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationMatrix {
    tracks: Vec<TrackGrid>,
}

impl ActivationMatrix {
    /// Build a matrix from explicit `[track][beat][pitch]` rows.
    ///
    /// Rows are taken as-is; width checks happen when the matrix is rendered.
    pub fn from_rows(rows: Vec<Vec<Vec<bool>>>) -> Self {
        ActivationMatrix {
            tracks: rows
                .into_iter()
                .enumerate()
                .map(|(index, beats)| TrackGrid { index, beats })
                .collect(),
        }
    }

    pub fn tracks(&self) -> &[TrackGrid] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Total number of active cells across all tracks.
    pub fn active_cells(&self) -> usize {
        self.tracks
            .iter()
            .flat_map(|t| t.beats.iter())
            .map(|row| row.iter().filter(|&&on| on).count())
            .sum()
    }
}

/// Generate a fresh matrix for `config.track_count` tracks.
///
/// `config` is expected to be validated; an empty `beat_lengths` list would
/// leave nothing to pick from.
pub fn generate_matrix(config: &SequenceConfig, rng: &mut impl RandomSource) -> ActivationMatrix {
    let lengths: Vec<usize> = (0..config.track_count)
        .map(|_| config.beat_lengths[rng.pick_index(config.beat_lengths.len())])
        .collect();

    let allowed: Vec<bool> = (0..config.pitch_range)
        .map(|pitch| config.is_allowed(pitch))
        .collect();

    let tracks = lengths
        .into_iter()
        .enumerate()
        .map(|(index, num_beats)| {
            let beats = (0..num_beats)
                .map(|_| {
                    allowed
                        .iter()
                        .map(|&playable| {
                            playable
                                && rng.roll(config.activation_roll_max)
                                    >= config.activation_threshold
                        })
                        .collect::<Vec<bool>>()
                })
                .collect();
            let track = TrackGrid { index, beats };
            log::debug!("track {index}: {num_beats} beats");
            track
        })
        .collect();

    ActivationMatrix { tracks }
}
