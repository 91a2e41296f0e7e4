//! Game Logic Module
//!
//! All dungeon simulation code. Deterministic given a level, a seed and the
//! input frames.
//!
//! ## Module Structure
//!
//! - `direction`: Facing table shared by everything that points somewhere
//! - `grid`: Tiles and walkability
//! - `actor`: Player motion and turn transitions
//! - `projectile`: Spell variants, flight and collision
//! - `impact`: Short-lived flashes where projectiles die
//! - `effects`: Pit lights and torches
//! - `input`: Commands, input frames, cooldowns, recorded scripts
//! - `state`: Session state and render snapshot
//! - `tick`: Per-frame simulation loop and replay
//! - `events`: Notifications for renderer, audio and UI

pub mod direction;
pub mod grid;
pub mod actor;
pub mod projectile;
pub mod impact;
pub mod effects;
pub mod input;
pub mod state;
pub mod tick;
pub mod events;

// Re-export key types
pub use direction::Facing;
pub use grid::{Grid, PlayerStart, Tile, TileType, FeatureKind};
pub use actor::{Actor, ActorPose, Step};
pub use projectile::{Projectile, Variant};
pub use input::{Command, InputFrame, InputScript, CooldownGate};
pub use state::{DungeonState, FrameView};
pub use tick::{tick, replay, TickResult};
pub use events::{GameEvent, GameEventData, SoundCue};
