//! 3D World Vector
//!
//! Continuous world-space position used for projectiles, lights and the
//! actor's visual pose. The ground plane is X/Z; Y is height.

use std::fmt;
use std::ops::{Add, Sub, Neg};
use serde::{Serialize, Deserialize};

/// 3D vector with `f32` components.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component (grid column axis)
    pub x: f32,
    /// Y component (height)
    pub y: f32,
    /// Z component (grid row axis)
    pub z: f32,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Centre of a grid cell at the given height.
    #[inline]
    pub fn from_cell(x: i32, z: i32, y: f32) -> Self {
        Self { x: x as f32, y, z: z as f32 }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }

    /// Offset on the ground plane only.
    #[inline]
    pub fn offset_xz(self, dx: f32, dz: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y,
            z: self.z + dz,
        }
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> f32 {
        let d = self.sub(other);
        d.x * d.x + d.y * d.y + d.z * d.z
    }

    /// Linear interpolation. t = 0 returns self, t = 1 returns other.
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self.add(other.sub(self).scale(t))
    }

    /// Grid cell containing this point (`floor` on X and Z).
    #[inline]
    pub fn cell(self) -> (i32, i32) {
        (self.x.floor() as i32, self.z.floor() as i32)
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vec3::add(self, rhs)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vec3::sub(self, rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec3({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_ops() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, 0.5, 0.5);
        assert_eq!(a + b, Vec3::new(1.5, 2.5, 3.5));
        assert_eq!(a - b, Vec3::new(0.5, 1.5, 2.5));
        assert_eq!(-b, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(b.scale(4.0), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_vec3_lerp() {
        let a = Vec3::new(0.0, 0.6, 0.0);
        let b = Vec3::new(2.0, 0.6, -4.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec3::new(1.0, 0.6, -2.0));
    }

    #[test]
    fn test_vec3_cell_floors_negative() {
        assert_eq!(Vec3::new(1.9, 0.0, 0.2).cell(), (1, 0));
        assert_eq!(Vec3::new(-0.1, 0.0, 2.0).cell(), (-1, 2));
    }

    #[test]
    fn test_offset_xz_keeps_height() {
        let v = Vec3::from_cell(3, 4, 0.6).offset_xz(0.5, -0.5);
        assert_eq!(v, Vec3::new(3.5, 0.6, 3.5));
    }
}
