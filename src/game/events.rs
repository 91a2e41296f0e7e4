//! Game Events
//!
//! Per-tick notifications for collaborators (renderer, audio, UI) and for
//! replay comparison.

use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;
use crate::game::actor::Step;
use crate::game::direction::Facing;
use crate::game::effects::TorchToggle;
use crate::game::projectile::{DestroyCause, Variant};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Actor movement and turns
    Actor = 0,
    /// Projectile spawn and destruction
    Projectile = 1,
    /// Torch and light changes
    Effect = 2,
    /// Sound cues
    Audio = 3,
    /// Status and compass updates
    Ui = 4,
}

/// Sound the audio collaborator should play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Footstep after an accepted move
    Step,
    /// Spell cast
    Cast(Variant),
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Actor started a move
    ActorMoved {
        /// Relative step taken
        step: Step,
        /// Cell left
        from: (i32, i32),
        /// Cell entered
        to: (i32, i32),
    },

    /// Logical facing changed (compass update)
    FacingChanged {
        /// New facing
        facing: Facing,
    },

    /// Projectile launched
    ProjectileSpawned {
        /// Projectile id
        id: u32,
        /// Spell type
        variant: Variant,
        /// Launch point
        position: Vec3,
        /// Travel direction
        direction: Facing,
    },

    /// Projectile removed
    ProjectileDestroyed {
        /// Projectile id
        id: u32,
        /// Spell type
        variant: Variant,
        /// Why
        cause: DestroyCause,
        /// Last position
        position: Vec3,
    },

    /// Torch placed or removed
    TorchToggled {
        /// Wall column
        x: i32,
        /// Wall row
        z: i32,
        /// Face
        face: Facing,
        /// Placed or removed
        result: TorchToggle,
    },

    /// Sound cue
    Sound(SoundCue),

    /// User-facing status text
    Status(String),
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Emission order within the session (tie-breaker)
    pub seq: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event. `seq` is assigned when pushed into the state.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        Self { tick, priority, seq: 0, data }
    }

    /// Create actor moved event.
    pub fn actor_moved(tick: u32, step: Step, from: (i32, i32), to: (i32, i32)) -> Self {
        Self::new(tick, EventPriority::Actor, GameEventData::ActorMoved { step, from, to })
    }

    /// Create facing changed event.
    pub fn facing_changed(tick: u32, facing: Facing) -> Self {
        Self::new(tick, EventPriority::Ui, GameEventData::FacingChanged { facing })
    }

    /// Create projectile spawned event.
    pub fn projectile_spawned(tick: u32, id: u32, variant: Variant, position: Vec3, direction: Facing) -> Self {
        Self::new(
            tick,
            EventPriority::Projectile,
            GameEventData::ProjectileSpawned { id, variant, position, direction },
        )
    }

    /// Create projectile destroyed event.
    pub fn projectile_destroyed(tick: u32, id: u32, variant: Variant, cause: DestroyCause, position: Vec3) -> Self {
        Self::new(
            tick,
            EventPriority::Projectile,
            GameEventData::ProjectileDestroyed { id, variant, cause, position },
        )
    }

    /// Create torch toggled event.
    pub fn torch_toggled(tick: u32, x: i32, z: i32, face: Facing, result: TorchToggle) -> Self {
        Self::new(tick, EventPriority::Effect, GameEventData::TorchToggled { x, z, face, result })
    }

    /// Create sound event.
    pub fn sound(tick: u32, cue: SoundCue) -> Self {
        Self::new(tick, EventPriority::Audio, GameEventData::Sound(cue))
    }

    /// Create status event.
    pub fn status(tick: u32, text: impl Into<String>) -> Self {
        Self::new(tick, EventPriority::Ui, GameEventData::Status(text.into()))
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.seq == other.seq
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then emission order
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.seq.cmp(&other.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let mut status = GameEvent::status(10, "hello");
        status.seq = 1;
        let mut moved = GameEvent::actor_moved(10, Step::Forward, (1, 1), (1, 2));
        moved.seq = 2;
        let mut step = GameEvent::sound(10, SoundCue::Step);
        step.seq = 3;
        let mut later = GameEvent::actor_moved(11, Step::Forward, (1, 2), (1, 3));
        later.seq = 0;

        // Same tick: actor before audio before UI regardless of emission order
        assert!(moved < step);
        assert!(step < status);
        // Earlier tick first
        assert!(status < later);
    }

    #[test]
    fn test_status_constructor() {
        let event = GameEvent::status(0, "Torch placed");
        assert_eq!(event.data, GameEventData::Status("Torch placed".to_string()));
        assert_eq!(event.priority, EventPriority::Ui);
    }
}
