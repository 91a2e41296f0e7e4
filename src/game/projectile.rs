//! Projectile Simulation
//!
//! One movement/collision algorithm for every spell, parameterised by a
//! per-variant profile table. Variant-specific visuals dispatch by `match`.
//!
//! Each advance:
//! 1. Destroyed projectiles do nothing.
//! 2. `now − created_at > lifetime` destroys it (no impact).
//! 3. The next position is `speed × (delta / 16.67)` along the facing.
//! 4. If the cell under it (`floor(x), floor(z)`) is not walkable, an impact
//!    effect is spawned and the projectile is destroyed.
//! 5. Otherwise the position is committed and visuals are updated.

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::core::vec3::Vec3;
use crate::game::direction::Facing;
use crate::game::grid::Grid;
use crate::game::impact::{ImpactEffect, ParticleView};

/// Milliseconds in one reference step; speeds are "per step".
pub const STEP_MS: f32 = 16.67;

/// Orbiting puffs around a gas cloud.
pub const GAS_PARTICLES: usize = 5;

/// Tumble added to X and Z rotation per update.
const TUMBLE_PER_UPDATE: f32 = 0.05;

// =============================================================================
// VARIANTS
// =============================================================================

/// Spell type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum Variant {
    /// Slow fire bolt
    Fireball = 0,
    /// Fast ice bolt
    IceArrow = 1,
    /// Fastest, short-lived
    Lightning = 2,
    /// Slow drifting cloud
    GasCloud = 3,
}

/// Shared cast cooldown bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CastSlot {
    /// Fireball and ice arrow share this
    Bolt,
    /// Lightning
    Lightning,
    /// Gas cloud
    Gas,
}

/// Per-variant tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VariantProfile {
    /// Distance per 16.67 ms step
    pub speed: f32,
    /// Time to live (ms)
    pub lifetime_ms: f64,
    /// Carried light colour (0xRRGGBB)
    pub light_color: u32,
    /// Carried light base intensity
    pub light_intensity: f32,
    /// Impact flash colour
    pub impact_color: u32,
    /// Impact flash intensity
    pub impact_intensity: f32,
    /// Flicker base (`base + rand × range`), unused for gas
    pub flicker_base: f32,
    /// Flicker range
    pub flicker_range: f32,
    /// Tumbles while flying
    pub tumbles: bool,
    /// Cooldown bucket
    pub slot: CastSlot,
    /// Cooldown length (ms)
    pub cooldown_ms: f64,
}

const PROFILES: [VariantProfile; 4] = [
    // Fireball
    VariantProfile {
        speed: 0.10,
        lifetime_ms: 3000.0,
        light_color: 0xff5500,
        light_intensity: 2.0,
        impact_color: 0xff3300,
        impact_intensity: 5.0,
        flicker_base: 1.8,
        flicker_range: 0.4,
        tumbles: true,
        slot: CastSlot::Bolt,
        cooldown_ms: 800.0,
    },
    // IceArrow
    VariantProfile {
        speed: 0.20,
        lifetime_ms: 3000.0,
        light_color: 0x00aaaa,
        light_intensity: 2.0,
        impact_color: 0x00aaff,
        impact_intensity: 4.0,
        flicker_base: 1.8,
        flicker_range: 0.4,
        tumbles: true,
        slot: CastSlot::Bolt,
        cooldown_ms: 800.0,
    },
    // Lightning
    VariantProfile {
        speed: 0.25,
        lifetime_ms: 2000.0,
        light_color: 0xaaddff,
        light_intensity: 3.0,
        impact_color: 0xccffff,
        impact_intensity: 6.0,
        flicker_base: 2.5,
        flicker_range: 1.0,
        tumbles: false,
        slot: CastSlot::Lightning,
        cooldown_ms: 1000.0,
    },
    // GasCloud
    VariantProfile {
        speed: 0.08,
        lifetime_ms: 4000.0,
        light_color: 0x2aff80,
        light_intensity: 1.0,
        impact_color: 0x2aff80,
        impact_intensity: 3.0,
        flicker_base: 0.8,
        flicker_range: 0.0,
        tumbles: false,
        slot: CastSlot::Gas,
        cooldown_ms: 1200.0,
    },
];

impl Variant {
    /// All variants in index order.
    pub const ALL: [Variant; 4] = [
        Variant::Fireball,
        Variant::IceArrow,
        Variant::Lightning,
        Variant::GasCloud,
    ];

    /// Tuning for this variant.
    #[inline]
    pub fn profile(self) -> &'static VariantProfile {
        &PROFILES[self as usize]
    }

    /// Name used in commands and logs.
    pub fn name(self) -> &'static str {
        match self {
            Variant::Fireball => "fireball",
            Variant::IceArrow => "iceArrow",
            Variant::Lightning => "lightning",
            Variant::GasCloud => "gasCloud",
        }
    }

    /// Parse a variant name. Accepts the short `ice` and `gas` aliases.
    pub fn parse(name: &str) -> Option<Variant> {
        match name {
            "fireball" => Some(Variant::Fireball),
            "iceArrow" | "ice" => Some(Variant::IceArrow),
            "lightning" => Some(Variant::Lightning),
            "gasCloud" | "gas" => Some(Variant::GasCloud),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// PROJECTILE
// =============================================================================

/// Why a projectile stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyCause {
    /// Lifetime ran out
    Expired,
    /// Hit something not walkable
    Collided,
}

/// Lifecycle state. `Destroyed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileStatus {
    /// Flying
    Active,
    /// Gone
    Destroyed(DestroyCause),
}

/// Result of one advance.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectileOutcome {
    /// Already destroyed; nothing happened
    Inactive,
    /// Still flying
    Moved,
    /// Destroyed by lifetime expiry this advance
    Expired,
    /// Destroyed by collision this advance
    Collided(ImpactEffect),
}

/// Decorative puff orbiting a gas cloud.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasParticle {
    /// Radius of the puff
    pub size: f32,
    /// Orbit radius
    pub orbit: f32,
    /// Radians per step
    pub angular_speed: f32,
    /// Current orbit angle
    pub angle: f32,
}

impl GasParticle {
    fn random(rng: &mut DeterministicRng) -> Self {
        Self {
            size: rng.next_range(0.1, 0.25),
            orbit: rng.next_range(0.2, 0.3),
            angular_speed: rng.next_range(0.01, 0.03),
            angle: rng.next_angle(),
        }
    }

    /// World position around `centre`.
    pub fn position(&self, centre: Vec3) -> Vec3 {
        centre.add(Vec3::new(
            self.angle.cos() * self.orbit,
            (self.angle * 2.0).sin() * 0.05,
            self.angle.sin() * self.orbit,
        ))
    }
}

/// A spell in flight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projectile {
    id: u32,
    variant: Variant,
    position: Vec3,
    direction: Facing,
    speed: f32,
    lifetime_ms: f64,
    created_at_ms: f64,
    status: ProjectileStatus,
    /// Mesh rotation (radians per axis)
    rotation: Vec3,
    /// Uniform mesh scale
    scale: f32,
    /// Current carried-light intensity
    light_intensity: f32,
    /// Gas cloud only
    particles: Vec<GasParticle>,
}

impl Projectile {
    /// Launch a projectile with the variant's default speed and lifetime.
    pub fn spawn(
        id: u32,
        variant: Variant,
        origin: Vec3,
        direction: Facing,
        now_ms: f64,
        rng: &mut DeterministicRng,
    ) -> Self {
        let profile = variant.profile();

        let rotation = match variant {
            // Lightning points along its travel axis
            Variant::Lightning => match direction {
                Facing::North => Vec3::new(FRAC_PI_2, 0.0, 0.0),
                Facing::East => Vec3::new(0.0, 0.0, -FRAC_PI_2),
                Facing::South => Vec3::new(-FRAC_PI_2, 0.0, 0.0),
                Facing::West => Vec3::new(0.0, 0.0, FRAC_PI_2),
            },
            _ => Vec3::ZERO,
        };

        let particles = match variant {
            Variant::GasCloud => (0..GAS_PARTICLES).map(|_| GasParticle::random(rng)).collect(),
            _ => Vec::new(),
        };

        Self {
            id,
            variant,
            position: origin,
            direction,
            speed: profile.speed,
            lifetime_ms: profile.lifetime_ms,
            created_at_ms: now_ms,
            status: ProjectileStatus::Active,
            rotation,
            scale: 1.0,
            light_intensity: profile.light_intensity,
            particles,
        }
    }

    /// Override speed (distance per step).
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Override lifetime (ms).
    pub fn with_lifetime(mut self, lifetime_ms: f64) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }

    /// Identifier.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Spell type.
    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Current position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Direction of travel.
    #[inline]
    pub fn direction(&self) -> Facing {
        self.direction
    }

    /// Lifecycle state.
    #[inline]
    pub fn status(&self) -> ProjectileStatus {
        self.status
    }

    /// Still flying.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProjectileStatus::Active
    }

    /// Orbiting gas puffs.
    pub fn particles(&self) -> &[GasParticle] {
        &self.particles
    }

    /// Fraction of lifetime used (0..1).
    pub fn life_progress(&self, now_ms: f64) -> f32 {
        if self.lifetime_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.created_at_ms) / self.lifetime_ms).clamp(0.0, 1.0) as f32
    }

    /// Destroy. Idempotent; the first cause sticks.
    pub fn destroy(&mut self, cause: DestroyCause) {
        if self.is_active() {
            self.status = ProjectileStatus::Destroyed(cause);
        }
    }

    /// Advance by `delta_ms` at clock time `now_ms`.
    pub fn advance(
        &mut self,
        delta_ms: f32,
        now_ms: f64,
        grid: &Grid,
        rng: &mut DeterministicRng,
    ) -> ProjectileOutcome {
        if !self.is_active() {
            return ProjectileOutcome::Inactive;
        }

        if now_ms - self.created_at_ms > self.lifetime_ms {
            self.destroy(DestroyCause::Expired);
            return ProjectileOutcome::Expired;
        }

        let distance = self.speed * (delta_ms / STEP_MS);
        let (dx, dz) = self.direction.offset();
        let next = self.position.offset_xz(dx as f32 * distance, dz as f32 * distance);

        let (cx, cz) = next.cell();
        if !grid.is_walkable(cx, cz) {
            let impact = ImpactEffect::spawn(self.variant, self.position, now_ms, rng);
            self.destroy(DestroyCause::Collided);
            return ProjectileOutcome::Collided(impact);
        }

        self.position = next;
        self.update_visuals(delta_ms, now_ms, rng);
        ProjectileOutcome::Moved
    }

    /// Per-variant cosmetics after a committed step.
    ///
    /// Gas particle orbits advance by `angular_speed` per 16.67 ms step of
    /// `delta_ms` rather than a fixed amount per call, so orbit speed is the
    /// same at any frame rate.
    fn update_visuals(&mut self, delta_ms: f32, now_ms: f64, rng: &mut DeterministicRng) {
        let profile = self.variant.profile();
        match self.variant {
            Variant::Fireball | Variant::IceArrow | Variant::Lightning => {
                self.light_intensity = profile.flicker_base + rng.next_f32() * profile.flicker_range;
                if profile.tumbles {
                    self.rotation.x += TUMBLE_PER_UPDATE;
                    self.rotation.z += TUMBLE_PER_UPDATE;
                }
            }
            Variant::GasCloud => {
                let steps = delta_ms / STEP_MS;
                for particle in &mut self.particles {
                    particle.angle += particle.angular_speed * steps;
                }
                self.scale = 1.0 + self.life_progress(now_ms) * 0.5;
                self.light_intensity = 0.8 + ((now_ms * 0.01).sin() * 0.2) as f32;
            }
        }
    }

    /// Renderer snapshot.
    pub fn view(&self, now_ms: f64) -> ProjectileView {
        let profile = self.variant.profile();
        ProjectileView {
            id: self.id,
            variant: self.variant,
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
            light_color: profile.light_color,
            light_intensity: self.light_intensity,
            particles: self
                .particles
                .iter()
                .enumerate()
                .map(|(i, p)| ParticleView {
                    position: p.position(self.position),
                    size: p.size,
                    opacity: 0.4 + ((now_ms * 0.005 + i as f64).sin() * 0.3) as f32,
                })
                .collect(),
        }
    }

    /// Feed the projectile into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id);
        hasher.update_u8(self.variant as u8);
        hasher.update_vec3(self.position);
        hasher.update_u8(self.direction as u8);
        hasher.update_f64(self.created_at_ms);
        hasher.update_bool(self.is_active());
        hasher.update_f32(self.light_intensity);
        for particle in &self.particles {
            hasher.update_f32(particle.angle);
        }
    }
}

/// Renderer view of one projectile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    /// Identifier
    pub id: u32,
    /// Spell type
    pub variant: Variant,
    /// Position
    pub position: Vec3,
    /// Mesh rotation
    pub rotation: Vec3,
    /// Uniform mesh scale
    pub scale: f32,
    /// Carried light colour
    pub light_color: u32,
    /// Carried light intensity
    pub light_intensity: f32,
    /// Gas puffs
    pub particles: Vec<ParticleView>,
}

// =============================================================================
// TESTS
// =============================================================================
