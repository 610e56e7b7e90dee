// Per-pitch note state and the beat-by-beat on/off state machine.
//
// The `NoteTable` holds one `Note` per pitch and is created once per run. It is
// NOT reset between tracks: a pitch left ringing at the end of track N is still
// ringing when track N+1 starts, so its first beat can open with a note-off on
// the new track's channel. The carry-over is part of the event stream and is
// kept. It is probably unintended; isolating tracks means giving each track a
// fresh `NoteTable`.
//
// Each beat is one ordered pass over pitch indices. For each pitch, decay is
// checked before strike, so events within a beat come out in pitch order with
// a pitch's own events grouped together:
//
//   decay:  ringing  -> beats_played += 1; if beats_played >= duration: OFF
//   strike: struck   -> if ringing: OFF; ON; beats_played = 0; ringing = true
//
// Decay never clears `ringing`. Once a note has rung its duration it emits a
// note-off on every later beat until it is struck again, and a re-strike of a
// note past its duration produces OFF, OFF, ON. Consumers see every pair.
//
// `beats_played` is a `u8` and wraps. The 256th beat after a strike brings it
// back to 0, which is below any non-zero duration, so that one beat emits no
// note-off before the repeated offs resume.

/// State for a single pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Beats a struck note rings before decay turns it off.
    pub duration: u8,
    /// Beats elapsed since the last strike, while ringing. Wraps after 255.
    pub beats_played: u8,
    /// Set by the first strike and never cleared.
    pub ringing: bool,
    /// Pending strike for the beat being processed.
    pub strike: bool,
}

impl Note {
    pub fn new(duration: u8) -> Self {
        Note {
            duration,
            beats_played: 0,
            ringing: false,
            strike: false,
        }
    }
}

/// An on/off decision produced by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    On { pitch: u8, velocity: u8 },
    Off { pitch: u8 },
}

/// One `Note` per pitch, indexed by pitch number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTable {
    notes: Vec<Note>,
}

impl NoteTable {
    /// A table of `pitch_range` silent notes, all with the same duration.
    ///
    /// `render_matrix` rejects tables wider than 128 pitches. `advance_beat`
    /// only visits pitches that fit a `u8`.
    pub fn new(pitch_range: usize, duration: u8) -> Self {
        NoteTable {
            notes: vec![Note::new(duration); pitch_range],
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, pitch: usize) -> Option<&Note> {
        self.notes.get(pitch)
    }

    /// Schedule `pitch` to be struck on the next `advance_beat`.
    pub fn mark_strike(&mut self, pitch: usize) {
        if let Some(note) = self.notes.get_mut(pitch) {
            note.strike = true;
        }
    }

    /// Run one beat of decay and strike over every pitch, in pitch order.
    ///
    /// Events are handed to `sink` as soon as they are decided. A sink error
    /// stops the pass and is returned; the notes already visited keep their
    /// updated state.
    pub fn advance_beat<E>(
        &mut self,
        velocity: u8,
        mut sink: impl FnMut(NoteEvent) -> Result<(), E>,
    ) -> Result<(), E> {
        for (pitch, note) in (0..=u8::MAX).zip(self.notes.iter_mut()) {
            if note.ringing {
                note.beats_played = note.beats_played.wrapping_add(1);
                if note.beats_played >= note.duration {
                    sink(NoteEvent::Off { pitch })?;
                }
            }

            if note.strike {
                if note.ringing {
                    sink(NoteEvent::Off { pitch })?;
                }
                sink(NoteEvent::On { pitch, velocity })?;
                note.beats_played = 0;
                note.strike = false;
                note.ringing = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn beat(table: &mut NoteTable, strikes: &[usize]) -> Vec<NoteEvent> {
        for &p in strikes {
            table.mark_strike(p);
        }
        let mut events = Vec::new();
        table
            .advance_beat(100, |e| {
                events.push(e);
                Ok::<(), Infallible>(())
            })
            .unwrap();
        events
    }

    const fn on(pitch: u8) -> NoteEvent {
        NoteEvent::On {
            pitch,
            velocity: 100,
        }
    }

    const fn off(pitch: u8) -> NoteEvent {
        NoteEvent::Off { pitch }
    }

    #[test]
    fn silent_table_emits_nothing() {
        let mut table = NoteTable::new(120, 1);
        for _ in 0..4 {
            assert!(beat(&mut table, &[]).is_empty());
        }
    }

    #[test]
    fn single_strike_turns_on_then_off_next_beat() {
        let mut table = NoteTable::new(120, 1);
        assert_eq!(beat(&mut table, &[61]), vec![on(61)]);
        let note = table.get(61).unwrap();
        assert!(note.ringing);
        assert!(!note.strike);
        assert_eq!(note.beats_played, 0);
        assert_eq!(beat(&mut table, &[]), vec![off(61)]);
    }

    #[test]
    fn decay_does_not_clear_ringing() {
        let mut table = NoteTable::new(120, 1);
        beat(&mut table, &[61]);
        for _ in 0..3 {
            assert_eq!(beat(&mut table, &[]), vec![off(61)]);
            assert!(table.get(61).unwrap().ringing);
        }
        assert_eq!(table.get(61).unwrap().beats_played, 3);
    }

    #[test]
    fn ringing_counter_wraps_after_255_beats() {
        let mut table = NoteTable::new(4, 1);
        assert_eq!(beat(&mut table, &[1]), vec![on(1)]);
        for _ in 0..255 {
            assert_eq!(beat(&mut table, &[]), vec![off(1)]);
        }
        assert_eq!(table.get(1).unwrap().beats_played, 255);
        // 256th beat: the counter wraps to 0, which is below the duration.
        assert!(beat(&mut table, &[]).is_empty());
        assert_eq!(table.get(1).unwrap().beats_played, 0);
        assert_eq!(beat(&mut table, &[]), vec![off(1)]);
    }

    #[test]
    fn consecutive_strikes_emit_off_before_on() {
        let mut table = NoteTable::new(120, 1);
        assert_eq!(beat(&mut table, &[70]), vec![on(70)]);
        // Decay off, redundant off for the re-strike, then the new note.
        assert_eq!(beat(&mut table, &[70]), vec![off(70), off(70), on(70)]);
    }

    #[test]
    fn restrike_within_duration_emits_one_redundant_off() {
        let mut table = NoteTable::new(120, 3);
        assert_eq!(beat(&mut table, &[70]), vec![on(70)]);
        assert_eq!(beat(&mut table, &[70]), vec![off(70), on(70)]);
        assert!(beat(&mut table, &[]).is_empty());
        assert!(beat(&mut table, &[]).is_empty());
        assert_eq!(beat(&mut table, &[]), vec![off(70)]);
    }

    #[test]
    fn events_are_grouped_per_pitch_in_pitch_order() {
        let mut table = NoteTable::new(120, 1);
        beat(&mut table, &[49]);
        // 49 decays and is re-struck; 51 is new. 49's events all precede 51's.
        assert_eq!(
            beat(&mut table, &[51, 49]),
            vec![off(49), off(49), on(49), on(51)]
        );
    }

    #[test]
    fn sink_error_stops_the_pass() {
        let mut table = NoteTable::new(8, 1);
        table.mark_strike(2);
        table.mark_strike(5);
        let mut seen = Vec::new();
        let result = table.advance_beat(100, |e| {
            seen.push(e);
            Err("full")
        });
        assert_eq!(result, Err("full"));
        assert_eq!(seen, vec![on(2)]);
        assert!(table.get(5).unwrap().strike);
    }

    #[test]
    fn pitches_past_u8_are_never_visited() {
        let mut table = NoteTable::new(300, 1);
        assert_eq!(beat(&mut table, &[255, 256, 299]), vec![on(255)]);
        assert!(table.get(256).unwrap().strike);
        assert!(!table.get(299).unwrap().ringing);
    }

    #[test]
    fn mark_strike_ignores_out_of_range_pitch() {
        let mut table = NoteTable::new(4, 1);
        table.mark_strike(10);
        assert!(beat(&mut table, &[]).is_empty());
    }
}
