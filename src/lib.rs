//! # Grid Crawler
//!
//! Simulation core and level tooling for a first-person, grid-based dungeon
//! crawler.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       GRID CRAWLER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── vec3.rs      - World-space vector                       │
//! │  ├── easing.rs    - Transition curves and angle arcs         │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  game/            - Dungeon simulation                       │
//! │  ├── grid.rs      - Tiles and walkability                    │
//! │  ├── actor.rs     - Player moves and turns                   │
//! │  ├── projectile.rs- Spells in flight                         │
//! │  ├── effects.rs   - Pit lights and torches                   │
//! │  ├── input.rs     - Commands, cooldowns, input scripts       │
//! │  ├── state.rs     - Session state                            │
//! │  └── tick.rs      - Per-frame loop and replay                │
//! │                                                              │
//! │  level/           - Level files (offline)                    │
//! │  ├── document.rs  - JSON schema, load and save               │
//! │  └── editor.rs    - Authoring operations                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same level, seed and input frames, `game::tick` produces the
//! same state hash on every run:
//! - BTreeMap everywhere iteration order matters
//! - All randomness from a seeded Xorshift128+
//! - Time only enters through the tick delta

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod level;

// Re-export commonly used types
pub use config::SimConfig;
pub use core::rng::DeterministicRng;
pub use core::vec3::Vec3;
pub use game::input::{Command, InputFrame, InputScript};
pub use game::state::{DungeonState, FrameView};
pub use level::document::{Level, LevelError};
pub use level::editor::{EditError, LevelEditor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
