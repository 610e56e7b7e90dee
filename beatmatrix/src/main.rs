// Beat-matrix generator: CLI entry point.
//
// Renders one random sequence and writes it to a timestamped `.mid` file.
//
// Usage:
//   cargo run -p beatmatrix -- [--seed N] [--config PATH] [--out-dir DIR]
//
// Without --seed the clock picks one; it is logged either way so a run can be
// reproduced. --config takes a JSON `SequenceConfig`; missing fields keep their
// defaults. Set RUST_LOG=debug for per-track detail.

use beatmatrix::SequenceConfig;
use beatmatrix::session::{session_path, write_session};
use beatmatrix_prng::SeqRng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let seed: u64 = parse_flag(&args, "--seed").unwrap_or_else(clock_seed);
    let out_dir: PathBuf = parse_flag(&args, "--out-dir").unwrap_or_else(|| PathBuf::from("."));
    let config_path: Option<PathBuf> = parse_flag(&args, "--config");

    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let path = session_path(&out_dir);
    log::info!("seed {seed}, {} tracks, writing {}", config.track_count, path.display());

    let mut rng = SeqRng::new(seed);
    match write_session(&config, &mut rng, &path) {
        Ok(summary) => log::info!(
            "done: {} tracks, {} beats, {} note-ons, {} note-offs",
            summary.tracks.len(),
            summary.total_beats(),
            summary.total_note_ons(),
            summary.total_note_offs()
        ),
        Err(e) => {
            log::error!("could not write {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SequenceConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(SequenceConfig::default());
    };
    log::info!("loading config from {}", path.display());
    let json = std::fs::read_to_string(path)?;
    Ok(SequenceConfig::from_json(&json)?)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
