//! Simulation Configuration
//!
//! Timings and tuning for a session, with defaults matching the classic game
//! feel and optional overrides from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::game::actor::{DEFAULT_TRANSITION_MS, EYE_HEIGHT};
use crate::game::input::{MOVE_COOLDOWN_MS, TURN_COOLDOWN_MS};

/// Session configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Base RNG seed (mixed with the level fingerprint).
    pub seed: u64,
    /// Level document to load. `None` uses the built-in dungeon.
    pub level_path: Option<PathBuf>,
    /// Pause after an accepted move (ms).
    pub move_cooldown_ms: f64,
    /// Pause after a turn attempt (ms).
    pub turn_cooldown_ms: f64,
    /// Move and turn transition length (ms).
    pub transition_ms: f32,
    /// Camera height.
    pub eye_height: f32,
    /// How far in front of the actor spells appear, in cells.
    pub spawn_offset: f32,
    /// Fixed tick length used by the demo and replays (ms).
    pub tick_ms: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            level_path: None,
            move_cooldown_ms: MOVE_COOLDOWN_MS,
            turn_cooldown_ms: TURN_COOLDOWN_MS,
            transition_ms: DEFAULT_TRANSITION_MS,
            eye_height: EYE_HEIGHT,
            spawn_offset: 0.5,
            tick_ms: 1000.0 / crate::TICK_RATE as f32,
        }
    }
}

impl SimConfig {
    /// Create config from environment variables.
    ///
    /// Reads `DUNGEON_SEED`, `DUNGEON_LEVEL`, `DUNGEON_MOVE_COOLDOWN_MS`,
    /// `DUNGEON_TURN_COOLDOWN_MS` and `DUNGEON_TRANSITION_MS`. Unparseable
    /// values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            seed: parse_or("DUNGEON_SEED", &lookup, defaults.seed),
            level_path: lookup("DUNGEON_LEVEL")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            move_cooldown_ms: parse_or("DUNGEON_MOVE_COOLDOWN_MS", &lookup, defaults.move_cooldown_ms),
            turn_cooldown_ms: parse_or("DUNGEON_TURN_COOLDOWN_MS", &lookup, defaults.turn_cooldown_ms),
            transition_ms: parse_or("DUNGEON_TRANSITION_MS", &lookup, defaults.transition_ms),
            ..defaults
        }
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Ignoring unparseable config value");
                default
            }
        },
        None => default,
    }
}
