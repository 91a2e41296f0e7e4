//! Core deterministic primitives.
//!
//! Everything the simulation builds on: world vectors, easing curves, the
//! seeded RNG and state hashing. Nothing in here knows about dungeons.

pub mod vec3;
pub mod easing;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec3::Vec3;
pub use easing::{ease_in_out_quad, shortest_arc_end};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
