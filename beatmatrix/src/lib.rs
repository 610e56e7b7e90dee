// Beat-matrix sequence generator.
//
// Builds a random multi-track note sequence and writes it as a Standard MIDI
// File. Each track gets a random number of beats; on every beat, each pitch of
// a fixed pentatonic set has a small chance of being struck. A per-pitch note
// table turns strikes into note-on/note-off events, which are fed to an
// encoder one at a time.
//
// Architecture:
// - config.rs: `SequenceConfig`, defaults, JSON loading, validation
// - matrix.rs: the (track, beat, pitch) activation matrix and its generator,
//   plus the `RandomSource` seam (`beatmatrix_prng::SeqRng` in production)
// - note.rs: per-pitch ringing/strike state and the per-beat decay/strike pass
// - emitter.rs: one track's beats -> encoder calls
// - orchestrator.rs: whole-sequence rendering and the pitch-width precondition
// - encoder.rs: the `SequenceEncoder` trait and a call-recording encoder
// - midi.rs: `SmfEncoder`, the midly-backed SMF writer
// - session.rs: timestamped output files
//
// Output is deterministic given a seed.

pub mod config;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod matrix;
pub mod midi;
pub mod note;
pub mod orchestrator;
pub mod session;

pub use config::SequenceConfig;
pub use encoder::{EncoderCall, RecordingEncoder, SequenceEncoder};
pub use error::SequenceError;
pub use matrix::{ActivationMatrix, RandomSource, TrackGrid, generate_matrix};
pub use midi::SmfEncoder;
pub use note::{Note, NoteEvent, NoteTable};
pub use orchestrator::{RenderSummary, render_matrix, render_sequence};
