//! Impact Effects
//!
//! Short-lived lights (and, for gas, scattered puffs) left behind when a
//! projectile hits a wall. They run on their own clock and never touch the
//! simulation.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::core::vec3::Vec3;
use crate::game::projectile::Variant;

/// How long the impact flash stays lit (ms).
pub const IMPACT_LIGHT_MS: f64 = 150.0;

/// Puffs scattered by a gas cloud impact.
pub const GAS_IMPACT_PARTICLES: usize = 10;

/// One fading puff.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactParticle {
    /// World position
    pub position: Vec3,
    /// Radius
    pub size: f32,
    /// Fade length (ms)
    pub duration_ms: f64,
}

impl ImpactParticle {
    /// Opacity after `elapsed_ms`, or `None` once faded out.
    pub fn opacity(&self, elapsed_ms: f64) -> Option<f32> {
        let progress = (elapsed_ms / self.duration_ms).min(1.0);
        if progress < 1.0 {
            Some((1.0 - progress as f32) * 0.8)
        } else {
            None
        }
    }
}

/// A flash of light where a projectile died.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactEffect {
    /// Variant that caused it
    pub variant: Variant,
    /// Where it happened
    pub position: Vec3,
    /// Light colour (0xRRGGBB)
    pub color: u32,
    /// Light intensity while lit
    pub intensity: f32,
    /// Clock time of the impact (ms)
    pub spawned_at_ms: f64,
    /// Gas puffs (empty for other variants)
    pub particles: Vec<ImpactParticle>,
}

impl ImpactEffect {
    /// Create the effect for `variant` at `position`.
    pub fn spawn(variant: Variant, position: Vec3, now_ms: f64, rng: &mut DeterministicRng) -> Self {
        let profile = variant.profile();
        let particles = match variant {
            Variant::GasCloud => (0..GAS_IMPACT_PARTICLES)
                .map(|_| {
                    let size = rng.next_range(0.1, 0.3);
                    let angle = rng.next_angle();
                    let distance = rng.next_range(0.3, 0.8);
                    let lift = rng.next_range(0.0, 0.3);
                    let duration_ms = rng.next_range(500.0, 1000.0) as f64;
                    ImpactParticle {
                        position: position.add(Vec3::new(
                            angle.cos() * distance,
                            lift,
                            angle.sin() * distance,
                        )),
                        size,
                        duration_ms,
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            variant,
            position,
            color: profile.impact_color,
            intensity: profile.impact_intensity,
            spawned_at_ms: now_ms,
            particles,
        }
    }

    /// Milliseconds since the impact.
    #[inline]
    pub fn elapsed(&self, now_ms: f64) -> f64 {
        (now_ms - self.spawned_at_ms).max(0.0)
    }

    /// The flash is still lit.
    pub fn light_active(&self, now_ms: f64) -> bool {
        self.elapsed(now_ms) < IMPACT_LIGHT_MS
    }

    /// Anything left to draw.
    pub fn is_alive(&self, now_ms: f64) -> bool {
        let elapsed = self.elapsed(now_ms);
        elapsed < IMPACT_LIGHT_MS || self.particles.iter().any(|p| elapsed < p.duration_ms)
    }

    /// Renderer snapshot.
    pub fn view(&self, now_ms: f64) -> ImpactView {
        let elapsed = self.elapsed(now_ms);
        ImpactView {
            variant: self.variant,
            position: self.position,
            color: self.color,
            intensity: if self.light_active(now_ms) { self.intensity } else { 0.0 },
            particles: self
                .particles
                .iter()
                .filter_map(|p| {
                    p.opacity(elapsed).map(|opacity| ParticleView {
                        position: p.position,
                        size: p.size,
                        opacity,
                    })
                })
                .collect(),
        }
    }
}

/// A drawable puff.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleView {
    /// World position
    pub position: Vec3,
    /// Radius
    pub size: f32,
    /// 0..1
    pub opacity: f32,
}

/// Renderer view of one impact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactView {
    /// Variant that caused it
    pub variant: Variant,
    /// Centre of the flash
    pub position: Vec3,
    /// Light colour
    pub color: u32,
    /// Zero once the flash is over
    pub intensity: f32,
    /// Visible puffs
    pub particles: Vec<ParticleView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_decays_after_150ms() {
        let mut rng = DeterministicRng::new(1);
        let impact = ImpactEffect::spawn(Variant::Fireball, Vec3::ZERO, 1000.0, &mut rng);

        assert_eq!(impact.color, 0xff3300);
        assert!(impact.light_active(1149.0));
        assert!(!impact.light_active(1150.0));
        assert!(!impact.is_alive(1150.0));
        assert_eq!(impact.view(1200.0).intensity, 0.0);
        assert!(impact.particles.is_empty());
    }

    #[test]
    fn test_gas_impact_scatters_puffs() {
        let mut rng = DeterministicRng::new(2);
        let impact = ImpactEffect::spawn(Variant::GasCloud, Vec3::new(2.0, 0.6, 2.0), 0.0, &mut rng);

        assert_eq!(impact.particles.len(), GAS_IMPACT_PARTICLES);
        for p in &impact.particles {
            assert!((500.0..1000.0).contains(&p.duration_ms));
            assert!(p.position.distance_squared(Vec3::new(2.0, 0.6, 2.0)) < 1.0);
        }

        // Flash over, puffs still fading
        assert!(!impact.light_active(200.0));
        assert!(impact.is_alive(200.0));
        assert!(!impact.is_alive(1000.0));
        assert!(impact.view(1000.0).particles.is_empty());
    }

    #[test]
    fn test_particle_fades_linearly() {
        let p = ImpactParticle { position: Vec3::ZERO, size: 0.1, duration_ms: 500.0 };
        assert_eq!(p.opacity(0.0), Some(0.8));
        assert_eq!(p.opacity(250.0), Some(0.4));
        assert_eq!(p.opacity(500.0), None);
    }
}
