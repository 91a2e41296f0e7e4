//! Cardinal Facing
//!
//! The single facing table shared by the actor, projectiles, torches, wall
//! features and the level editor. Every consumer derives its grid offset and
//! yaw from here so the four directions never drift apart.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use serde::{Serialize, Deserialize};

/// Distance from a wall cell's centre to a mounted feature.
///
/// Slightly more than half a cell so the mount sits just proud of the face.
pub const WALL_MOUNT_OFFSET: f32 = 0.51;

/// One of the four cardinal directions.
///
/// Serialized as its index (0 = North .. 3 = West) to match the map document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Facing {
    /// Towards −Z
    #[default]
    North = 0,
    /// Towards +X
    East = 1,
    /// Towards +Z
    South = 2,
    /// Towards −X
    West = 3,
}

/// Facing index outside 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid facing index {0} (expected 0-3)")]
pub struct InvalidFacing(pub u8);

impl Facing {
    /// All facings in index order.
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Facing from its index (0-3).
    pub fn from_index(index: u8) -> Option<Facing> {
        match index {
            0 => Some(Facing::North),
            1 => Some(Facing::East),
            2 => Some(Facing::South),
            3 => Some(Facing::West),
            _ => None,
        }
    }

    /// Numeric index (0-3).
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Grid step `(dx, dz)` one cell in this direction.
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    /// Yaw in radians for a camera or mesh looking this way.
    #[inline]
    pub fn yaw(self) -> f32 {
        match self {
            Facing::North => 0.0,
            Facing::East => -FRAC_PI_2,
            Facing::South => PI,
            Facing::West => FRAC_PI_2,
        }
    }

    /// Quarter turn counter-clockwise (North → West).
    #[inline]
    pub fn turn_left(self) -> Facing {
        Self::ALL[((self as u8 + 3) % 4) as usize]
    }

    /// Quarter turn clockwise (North → East).
    #[inline]
    pub fn turn_right(self) -> Facing {
        Self::ALL[((self as u8 + 1) % 4) as usize]
    }

    /// Half turn.
    #[inline]
    pub fn opposite(self) -> Facing {
        Self::ALL[((self as u8 + 2) % 4) as usize]
    }

    /// Lower-case face name used as a map document key.
    pub fn name(self) -> &'static str {
        match self {
            Facing::North => "north",
            Facing::East => "east",
            Facing::South => "south",
            Facing::West => "west",
        }
    }

    /// Capitalised label for status text.
    pub fn label(self) -> &'static str {
        match self {
            Facing::North => "North",
            Facing::East => "East",
            Facing::South => "South",
            Facing::West => "West",
        }
    }

    /// Parse a face name (case-insensitive).
    pub fn parse(name: &str) -> Option<Facing> {
        match name.to_ascii_lowercase().as_str() {
            "north" | "n" => Some(Facing::North),
            "east" | "e" => Some(Facing::East),
            "south" | "s" => Some(Facing::South),
            "west" | "w" => Some(Facing::West),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Facing {
    type Error = InvalidFacing;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Facing::from_index(value).ok_or(InvalidFacing(value))
    }
}

impl From<Facing> for u8 {
    fn from(facing: Facing) -> u8 {
        facing as u8
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// WALL MOUNTS
// =============================================================================

/// World placement of something hung on a wall face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mount {
    /// World X
    pub x: f32,
    /// World Z
    pub z: f32,
    /// Yaw facing away from the wall
    pub yaw: f32,
}

/// Placement for a feature on `face` of the wall cell at `(wall_x, wall_z)`.
///
/// Torches toggled by the actor, torches loaded from the document and every
/// other wall feature all go through here.
pub fn wall_mount(wall_x: i32, wall_z: i32, face: Facing) -> Mount {
    let (dx, dz) = face.offset();
    Mount {
        x: wall_x as f32 + dx as f32 * WALL_MOUNT_OFFSET,
        z: wall_z as f32 + dz as f32 * WALL_MOUNT_OFFSET,
        yaw: face.yaw(),
    }
}
