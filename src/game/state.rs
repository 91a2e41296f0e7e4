//! Dungeon State
//!
//! Everything one session owns: the (read-only) grid, the actor, live
//! projectiles, impact effects, ambient lights and input cooldowns.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::config::SimConfig;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::{derive_session_seed, DeterministicRng};
use crate::core::vec3::Vec3;
use crate::game::actor::{Actor, ActorPose};
use crate::game::direction::Facing;
use crate::game::effects::{EffectRegistry, PitLight, Torch};
use crate::game::events::GameEvent;
use crate::game::grid::{Grid, PlayerStart};
use crate::game::impact::{ImpactEffect, ImpactView};
use crate::game::input::CooldownGate;
use crate::game::projectile::{Projectile, ProjectileView, Variant};
use crate::level::document::Level;

/// Complete state of a session.
#[derive(Clone, Debug)]
pub struct DungeonState {
    /// Ticks run so far
    pub tick: u32,

    /// Simulation clock (ms), the sum of all tick deltas
    pub clock_ms: f64,

    /// Session seed (level fingerprint mixed with the configured seed)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// Level fingerprint
    pub level_hash: StateHash,

    /// Tile grid (never mutated during simulation)
    pub grid: Grid,

    /// Where the actor started
    pub start: PlayerStart,

    /// The player
    pub actor: Actor,

    /// Live projectiles (BTreeMap for deterministic iteration)
    pub projectiles: BTreeMap<u32, Projectile>,

    /// Fading impact effects
    pub impacts: Vec<ImpactEffect>,

    /// Pit lights and torches
    pub effects: EffectRegistry,

    /// Input timers
    pub cooldowns: CooldownGate,

    /// Next projectile ID (monotonic counter)
    pub next_projectile_id: u32,

    /// Events generated this tick (cleared each tick)
    pending_events: Vec<GameEvent>,

    /// Next event sequence number
    next_event_seq: u32,
}

impl DungeonState {
    /// Start a session on `level` with the configured seed.
    pub fn new(level: &Level, config: &SimConfig) -> Self {
        Self::with_seed(level, config, config.seed)
    }

    /// Start a session on `level` with an explicit base seed.
    pub fn with_seed(level: &Level, config: &SimConfig, base_seed: u64) -> Self {
        let level_hash = level.fingerprint();
        let rng_seed = derive_session_seed(&level_hash, base_seed);
        let mut rng = DeterministicRng::new(rng_seed);
        let effects = EffectRegistry::from_grid(&level.grid, &mut rng);

        let actor = Actor::new(level.start)
            .with_durations(config.transition_ms, config.transition_ms)
            .with_eye_height(config.eye_height);

        Self {
            tick: 0,
            clock_ms: 0.0,
            rng_seed,
            rng,
            level_hash,
            grid: level.grid.clone(),
            start: level.start,
            actor,
            projectiles: BTreeMap::new(),
            impacts: Vec::new(),
            effects,
            cooldowns: CooldownGate::new(),
            next_projectile_id: 0,
            pending_events: Vec::new(),
            next_event_seq: 0,
        }
    }

    /// Launch a projectile and return its id.
    pub fn spawn_projectile(&mut self, variant: Variant, origin: Vec3, direction: Facing) -> u32 {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        let projectile = Projectile::spawn(id, variant, origin, direction, self.clock_ms, &mut self.rng);
        self.projectiles.insert(id, projectile);
        id
    }

    /// Number of live projectiles.
    pub fn active_projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    /// Snapshot for the renderer.
    pub fn frame(&self) -> FrameView {
        FrameView {
            tick: self.tick,
            clock_ms: self.clock_ms,
            actor: self.actor.pose(),
            projectiles: self.projectiles.values().map(|p| p.view(self.clock_ms)).collect(),
            impacts: self.impacts.iter().map(|i| i.view(self.clock_ms)).collect(),
            pit_lights: self.effects.pit_lights().cloned().collect(),
            torches: self.effects.torches().cloned().collect(),
        }
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            hasher.update_bytes(&self.level_hash);
            hasher.update_f64(self.clock_ms);

            self.actor.hash_into(hasher);
            self.cooldowns.hash_into(hasher);

            // Projectiles in id order (BTreeMap guarantees this)
            hasher.update_u32(self.projectiles.len() as u32);
            for projectile in self.projectiles.values() {
                projectile.hash_into(hasher);
            }

            hasher.update_u32(self.impacts.len() as u32);
            for impact in &self.impacts {
                hasher.update_u8(impact.variant as u8);
                hasher.update_vec3(impact.position);
                hasher.update_f64(impact.spawned_at_ms);
            }

            self.effects.hash_into(hasher);
            hasher.update_u32(self.next_projectile_id);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event, stamping its sequence number.
    pub fn push_event(&mut self, mut event: GameEvent) {
        event.seq = self.next_event_seq;
        self.next_event_seq = self.next_event_seq.wrapping_add(1);
        self.pending_events.push(event);
    }
}

/// Everything the renderer draws for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    /// Tick this frame shows
    pub tick: u32,
    /// Simulation clock (ms)
    pub clock_ms: f64,
    /// Camera pose
    pub actor: ActorPose,
    /// Live projectiles
    pub projectiles: Vec<ProjectileView>,
    /// Fading impacts
    pub impacts: Vec<ImpactView>,
    /// Pit lights
    pub pit_lights: Vec<PitLight>,
    /// Torches
    pub torches: Vec<Torch>,
}

// =============================================================================
// TESTS
// =============================================================================
