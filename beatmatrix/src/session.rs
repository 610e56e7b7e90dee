// Session files: timestamped `.mid` output on disk.
//
// A session is one full render written to `session-<unix seconds>-test.mid`.
// The file is opened once, wrapped in a `BufWriter`, and closed when the
// encoder is dropped, whether rendering succeeded or not. A failed render can
// leave a truncated file behind; nothing deletes it.

use crate::config::SequenceConfig;
use crate::error::SequenceError;
use crate::matrix::RandomSource;
use crate::midi::SmfEncoder;
use crate::orchestrator::{RenderSummary, render_sequence};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File name for a session started at `unix_seconds`.
pub fn session_file_name(unix_seconds: u64) -> String {
    format!("session-{unix_seconds}-test.mid")
}

/// Seconds since the Unix epoch, or 0 if the clock is before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Path of a new session file in `dir`, stamped with the current time.
pub fn session_path(dir: &Path) -> PathBuf {
    dir.join(session_file_name(unix_now()))
}

/// Render a full sequence into a new SMF at `path`.
///
/// The config is validated before the file is created.
pub fn write_session(
    config: &SequenceConfig,
    rng: &mut impl RandomSource,
    path: &Path,
) -> Result<RenderSummary, SequenceError> {
    config.validate()?;
    let file = File::create(path)?;
    let mut encoder = SmfEncoder::new(BufWriter::new(file));
    render_sequence(config, rng, &mut encoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatmatrix_prng::SeqRng;

    #[test]
    fn file_name_carries_timestamp_and_marker() {
        assert_eq!(session_file_name(1_700_000_000), "session-1700000000-test.mid");
    }

    #[test]
    fn session_path_is_inside_dir() {
        let dir = Path::new("out");
        let path = session_path(dir);
        assert_eq!(path.parent(), Some(dir));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("session-") && name.ends_with("-test.mid"));
    }

    #[test]
    fn invalid_config_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.mid");
        let config = SequenceConfig {
            track_count: 0,
            ..Default::default()
        };
        assert!(write_session(&config, &mut SeqRng::new(1), &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("x.mid");
        let err = write_session(&SequenceConfig::default(), &mut SeqRng::new(1), &path)
            .unwrap_err();
        assert!(matches!(err, SequenceError::Io(_)));
    }
}
