// Error type shared by configuration loading, rendering, and SMF output.
//
// Generation and note tracking cannot fail. Everything that can lands in one
// of three groups: a bad configuration (rejected at startup, before any file
// exists), the note-table/matrix width precondition (rejected before the first
// track), and output failures from the writer or the encoder's bookkeeping.
// None of them is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The note table and the matrix disagree on the number of pitches.
    #[error(
        "number of notes ({notes}) must equal the pitch width of every beat \
         (track {track}, beat {beat} has {width})"
    )]
    PitchRangeMismatch {
        notes: usize,
        track: usize,
        beat: usize,
        width: usize,
    },

    #[error("container declared {declared} tracks but {written} were written")]
    TrackCountMismatch { declared: usize, written: usize },

    #[error("encoder call out of order: {0}")]
    EncoderState(&'static str),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl SequenceError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        SequenceError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
