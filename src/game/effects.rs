//! Effect & Trap Registry
//!
//! Ambient lights that live as long as the level: a pulsing light in every
//! pit trap and flickering torches on wall faces.
//!
//! Both registries are `BTreeMap`s so lookups are by key and iteration order
//! is stable for hashing and replay.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::core::vec3::Vec3;
use crate::game::direction::{wall_mount, Facing, Mount};
use crate::game::grid::{FeatureKind, Grid};

/// Light height inside a pit (half the pit depth, below the floor).
pub const PIT_LIGHT_Y: f32 = -1.0;

/// Total horizontal wobble of a pit light per axis.
pub const PIT_JITTER: f32 = 0.05;

/// Default torch flicker rate multiplier.
pub const TORCH_FLICKER_SPEED: f32 = 1.0;

// =============================================================================
// PIT LIGHTS
// =============================================================================

/// Pulsing light at the bottom of a pit trap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PitLight {
    /// Trap column
    pub x: i32,
    /// Trap row
    pub z: i32,
    /// Phase rate in [0.5, 1.0)
    pub pulse_speed: f32,
    /// Phase
    pub time: f32,
    /// Current intensity
    pub intensity: f32,
    /// Current (jittered) light position
    pub light_position: Vec3,
}

impl PitLight {
    /// New light with random rate and phase.
    pub fn new(x: i32, z: i32, rng: &mut DeterministicRng) -> Self {
        let pulse_speed = rng.next_range(0.5, 1.0);
        let time = rng.next_angle();
        Self {
            x,
            z,
            pulse_speed,
            time,
            intensity: Self::intensity_at(time),
            light_position: Vec3::from_cell(x, z, PIT_LIGHT_Y),
        }
    }

    #[inline]
    fn intensity_at(time: f32) -> f32 {
        0.8 + (time * 2.0).sin() * 0.2
    }

    /// Advance the pulse and re-jitter the light.
    pub fn advance(&mut self, delta_ms: f32, rng: &mut DeterministicRng) {
        self.time += delta_ms * 0.001 * self.pulse_speed;
        self.intensity = Self::intensity_at(self.time);
        self.light_position = Vec3::new(
            self.x as f32 + rng.jitter(PIT_JITTER),
            PIT_LIGHT_Y,
            self.z as f32 + rng.jitter(PIT_JITTER),
        );
    }
}

// =============================================================================
// TORCHES
// =============================================================================

/// Outcome of a torch toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorchToggle {
    /// A torch now hangs there
    Placed,
    /// The torch that hung there is gone
    Removed,
}

/// Flickering torch on one wall face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Torch {
    /// Wall column
    pub x: i32,
    /// Wall row
    pub z: i32,
    /// Face it hangs on
    pub face: Facing,
    /// Flicker rate multiplier
    pub flicker_speed: f32,
    /// Phase
    pub time: f32,
    /// Light intensity
    pub intensity: f32,
    /// Light hue (HSL)
    pub hue: f32,
    /// Light saturation (HSL)
    pub saturation: f32,
    /// Flame sway (radians about Z)
    pub sway: f32,
    /// World placement
    pub mount: Mount,
}

impl Torch {
    /// New torch starting at `phase`.
    pub fn new(x: i32, z: i32, face: Facing, phase: f32) -> Self {
        let mut torch = Self {
            x,
            z,
            face,
            flicker_speed: TORCH_FLICKER_SPEED,
            time: phase,
            intensity: 0.8,
            hue: 0.08,
            saturation: 0.9,
            sway: 0.0,
            mount: wall_mount(x, z, face),
        };
        torch.refresh(0.0);
        torch
    }

    fn refresh(&mut self, noise: f32) {
        self.intensity = self.time.sin() * 0.2 + noise * 0.1 + 0.8;
        self.hue = 0.08 + (self.time * 0.5).sin() * 0.01;
        self.saturation = 0.9 + (self.time * 0.7).sin() * 0.1;
        self.sway = (self.time * 2.0).sin() * 0.1;
    }

    /// Advance the flicker.
    pub fn advance(&mut self, delta_ms: f32, rng: &mut DeterministicRng) {
        self.time += delta_ms * 0.01 * self.flicker_speed;
        let noise = rng.next_f32();
        self.refresh(noise);
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Key for a torch: wall cell plus the face it hangs on.
pub type TorchKey = (i32, i32, Facing);

/// All ambient lights for a level.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EffectRegistry {
    pit_lights: BTreeMap<(i32, i32), PitLight>,
    torches: BTreeMap<TorchKey, Torch>,
}

impl EffectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded from a grid: a pit light per trap and a torch per
    /// `torch` wall feature.
    pub fn from_grid(grid: &Grid, rng: &mut DeterministicRng) -> Self {
        let mut registry = Self::new();

        for (x, z) in grid.traps() {
            registry.add_pit_light(x, z, rng);
        }

        for feature in grid.features() {
            if *feature.kind == FeatureKind::Torch {
                let phase = rng.next_angle();
                registry
                    .torches
                    .insert((feature.x, feature.z, feature.face), Torch::new(feature.x, feature.z, feature.face, phase));
            }
        }

        debug!(
            pit_lights = registry.pit_lights.len(),
            torches = registry.torches.len(),
            "Effect registry built"
        );
        registry
    }

    /// Add a pit light. Returns false if one already exists at `(x, z)`;
    /// existing pulse parameters are never reassigned.
    pub fn add_pit_light(&mut self, x: i32, z: i32, rng: &mut DeterministicRng) -> bool {
        if self.pit_lights.contains_key(&(x, z)) {
            return false;
        }
        self.pit_lights.insert((x, z), PitLight::new(x, z, rng));
        true
    }

    /// Pit light at `(x, z)`.
    pub fn pit_light(&self, x: i32, z: i32) -> Option<&PitLight> {
        self.pit_lights.get(&(x, z))
    }

    /// Place a torch if none hangs at `(x, z, face)`, otherwise remove it.
    pub fn toggle_torch(&mut self, x: i32, z: i32, face: Facing) -> TorchToggle {
        let key = (x, z, face);
        if self.torches.remove(&key).is_some() {
            TorchToggle::Removed
        } else {
            self.torches.insert(key, Torch::new(x, z, face, 0.0));
            TorchToggle::Placed
        }
    }

    /// Torch at `(x, z, face)`.
    pub fn torch(&self, x: i32, z: i32, face: Facing) -> Option<&Torch> {
        self.torches.get(&(x, z, face))
    }

    /// True if a torch hangs at `(x, z, face)`.
    pub fn has_torch(&self, x: i32, z: i32, face: Facing) -> bool {
        self.torches.contains_key(&(x, z, face))
    }

    /// All pit lights in key order.
    pub fn pit_lights(&self) -> impl Iterator<Item = &PitLight> {
        self.pit_lights.values()
    }

    /// All torches in key order.
    pub fn torches(&self) -> impl Iterator<Item = &Torch> {
        self.torches.values()
    }

    /// Number of pit lights.
    pub fn pit_light_count(&self) -> usize {
        self.pit_lights.len()
    }

    /// Number of torches.
    pub fn torch_count(&self) -> usize {
        self.torches.len()
    }

    /// Animate everything by `delta_ms`.
    pub fn advance(&mut self, delta_ms: f32, rng: &mut DeterministicRng) {
        for light in self.pit_lights.values_mut() {
            light.advance(delta_ms, rng);
        }
        for torch in self.torches.values_mut() {
            torch.advance(delta_ms, rng);
        }
    }

    /// Feed the registry into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.pit_lights.len() as u32);
        for light in self.pit_lights.values() {
            hasher.update_i32(light.x);
            hasher.update_i32(light.z);
            hasher.update_f32(light.time);
            hasher.update_vec3(light.light_position);
        }
        hasher.update_u32(self.torches.len() as u32);
        for torch in self.torches.values() {
            hasher.update_i32(torch.x);
            hasher.update_i32(torch.z);
            hasher.update_u8(torch.face as u8);
            hasher.update_f32(torch.time);
            hasher.update_f32(torch.intensity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::TileType;

    #[test]
    fn test_torch_toggle_twice_restores_empty() {
        let mut registry = EffectRegistry::new();
        assert_eq!(registry.toggle_torch(2, 0, Facing::South), TorchToggle::Placed);
        assert!(registry.has_torch(2, 0, Facing::South));
        assert_eq!(registry.toggle_torch(2, 0, Facing::South), TorchToggle::Removed);
        assert!(!registry.has_torch(2, 0, Facing::South));
        assert_eq!(registry.torch_count(), 0);
    }

    #[test]
    fn test_torches_keyed_by_face() {
        let mut registry = EffectRegistry::new();
        registry.toggle_torch(2, 2, Facing::North);
        registry.toggle_torch(2, 2, Facing::East);
        assert_eq!(registry.torch_count(), 2);
        registry.toggle_torch(2, 2, Facing::North);
        assert!(registry.has_torch(2, 2, Facing::East));
        assert_eq!(registry.torch_count(), 1);
    }

    #[test]
    fn test_pit_light_parameters_fixed_at_creation() {
        let mut rng = DeterministicRng::new(42);
        let mut registry = EffectRegistry::new();
        assert!(registry.add_pit_light(1, 3, &mut rng));
        let speed = registry.pit_light(1, 3).unwrap().pulse_speed;
        assert!((0.5..1.0).contains(&speed));

        assert!(!registry.add_pit_light(1, 3, &mut rng));
        assert_eq!(registry.pit_light(1, 3).unwrap().pulse_speed, speed);
    }

    #[test]
    fn test_pit_light_pulse_and_jitter() {
        let mut rng = DeterministicRng::new(8);
        let mut light = PitLight::new(3, 4, &mut rng);
        let t0 = light.time;

        for _ in 0..100 {
            light.advance(16.0, &mut rng);
            assert!((0.599..=1.001).contains(&light.intensity));
            assert!((light.light_position.x - 3.0).abs() <= 0.0251);
            assert!((light.light_position.z - 4.0).abs() <= 0.0251);
            assert_eq!(light.light_position.y, PIT_LIGHT_Y);
        }

        let expected = t0 + 100.0 * 16.0 * 0.001 * light.pulse_speed;
        assert!((light.time - expected).abs() < 1e-3);
    }

    #[test]
    fn test_torch_flicker_bounds() {
        let mut rng = DeterministicRng::new(3);
        let mut torch = Torch::new(0, 2, Facing::East, 0.0);
        for _ in 0..200 {
            torch.advance(16.0, &mut rng);
            assert!((0.599..=1.101).contains(&torch.intensity));
            assert!((0.0699..=0.0901).contains(&torch.hue));
            assert!((0.799..=1.001).contains(&torch.saturation));
            assert!(torch.sway.abs() <= 0.1001);
        }
    }

    #[test]
    fn test_registry_from_grid() {
        let mut grid = Grid::blank(5);
        grid.tile_at_mut(2, 2).unwrap().set_type(TileType::Trap);
        grid.tile_at_mut(0, 2).unwrap().set_feature(Facing::East, Some(FeatureKind::Torch));
        grid.tile_at_mut(4, 2).unwrap().set_feature(Facing::West, Some(FeatureKind::Door));

        let mut rng = DeterministicRng::new(1);
        let registry = EffectRegistry::from_grid(&grid, &mut rng);

        assert_eq!(registry.pit_light_count(), 1);
        assert!(registry.pit_light(2, 2).is_some());
        assert_eq!(registry.torch_count(), 1);
        assert!(registry.has_torch(0, 2, Facing::East));
    }
}
