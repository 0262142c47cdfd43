use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use kpn_core::config::ArenaConfig;

// Runtime knobs for the headless driver (not gameplay tuning).

/// Path of a JSON tuning file; defaults apply when unset.
pub fn config_path() -> Option<PathBuf> {
    env::var_os("KPN_CONFIG").map(PathBuf::from)
}

/// Ticks to run before exiting. Zero runs forever.
pub fn ticks() -> u64 {
    env::var("KPN_TICKS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1800)
}

/// Synthetic clients to connect.
pub fn bots() -> usize {
    env::var("KPN_BOTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(6)
}

/// Whether to sleep between ticks to hold the configured tick rate.
pub fn realtime() -> bool {
    !matches!(env::var("KPN_REALTIME").as_deref(), Ok("0" | "false"))
}

/// Whether frames carry full snapshots, or events only.
pub fn snapshots() -> bool {
    matches!(env::var("KPN_SNAPSHOTS").as_deref(), Ok("1" | "true"))
}

/// Loads tuning from [`config_path`], or the defaults.
pub fn load_arena_config() -> Result<ArenaConfig> {
    let Some(path) = config_path() else {
        return Ok(ArenaConfig::default());
    };
    let json = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config = ArenaConfig::from_json_str(&json)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}
