//! Map Document
//!
//! The JSON level format shared by the game and the editor:
//!
//! ```text
//! { name, description,
//!   map: Tile[x][z],   // {type, north?, south?, east?, west?, stairDirection?}
//!   playerStart: { x, z, direction: 0..=3 } }
//! ```
//!
//! Older levels store `map` cells as integers (`0` empty, `1` wall, `2`
//! trap). Those load fine and are written back in the object form.

use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::core::hash::{StateHash, StateHasher};
use crate::game::direction::Facing;
use crate::game::grid::{FeatureKind, Grid, PlayerStart, StairDirection, Tile, TileType};

/// Level loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// File could not be read or written.
    #[error("Level file error: {0}")]
    Io(#[from] std::io::Error),

    /// Not valid level JSON.
    #[error("Malformed level JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// `map` has no cells.
    #[error("Level map is empty")]
    Empty,

    /// Some column length differs from the number of columns.
    #[error("Level map is not square: column {column} has {len} cells, expected {size}")]
    NotSquare {
        /// Offending column
        column: usize,
        /// Its length
        len: usize,
        /// Expected length
        size: usize,
    },

    /// Player start lies off the map.
    #[error("Player start ({x}, {z}) is outside the {size}x{size} map")]
    StartOutOfBounds {
        /// Start column
        x: i64,
        /// Start row
        z: i64,
        /// Map size
        size: usize,
    },

    /// Start direction outside 0..=3.
    #[error("Invalid player direction {0}, expected 0-3")]
    BadDirection(i64),

    /// Legacy integer cell with no meaning.
    #[error("Unknown legacy cell code {code} at ({x}, {z})")]
    UnknownCellCode {
        /// Column
        x: usize,
        /// Row
        z: usize,
        /// The integer found
        code: i64,
    },
}

// =============================================================================
// SCHEMA
// =============================================================================

/// One tile in object form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDocument {
    /// Tile type name
    #[serde(rename = "type")]
    pub tile_type: TileType,
    /// North face feature
    #[serde(default)]
    pub north: Option<FeatureKind>,
    /// South face feature
    #[serde(default)]
    pub south: Option<FeatureKind>,
    /// East face feature
    #[serde(default)]
    pub east: Option<FeatureKind>,
    /// West face feature
    #[serde(default)]
    pub west: Option<FeatureKind>,
    /// Stairs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stair_direction: Option<StairDirection>,
}

/// A map cell as found on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellDocument {
    /// Old integer code
    Legacy(i64),
    /// Object form
    Tile(TileDocument),
}

/// Player start as found on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartDocument {
    /// Column
    pub x: i64,
    /// Row
    pub z: i64,
    /// 0 North, 1 East, 2 South, 3 West
    pub direction: i64,
}

impl Default for StartDocument {
    fn default() -> Self {
        Self { x: 1, z: 1, direction: 0 }
    }
}

/// A complete level file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free text
    #[serde(default)]
    pub description: String,
    /// Cells, `map[x][z]`
    pub map: Vec<Vec<CellDocument>>,
    /// Where the actor starts
    #[serde(default)]
    pub player_start: StartDocument,
}

impl TileDocument {
    fn from_tile(tile: &Tile) -> Self {
        Self {
            tile_type: tile.tile_type(),
            north: tile.feature(Facing::North).cloned(),
            south: tile.feature(Facing::South).cloned(),
            east: tile.feature(Facing::East).cloned(),
            west: tile.feature(Facing::West).cloned(),
            stair_direction: tile.stair_direction(),
        }
    }

    fn into_tile(self, x: usize, z: usize) -> Tile {
        let mut tile = Tile::new(self.tile_type);

        let faces = [
            (Facing::North, self.north),
            (Facing::South, self.south),
            (Facing::East, self.east),
            (Facing::West, self.west),
        ];
        for (face, feature) in faces {
            let Some(kind) = feature else { continue };
            if self.tile_type != TileType::Wall {
                warn!(x, z, face = face.name(), feature = kind.name(), "Dropping wall feature on non-wall tile");
                continue;
            }
            if !kind.is_known() {
                warn!(x, z, feature = kind.name(), "Unknown wall feature kept but ignored");
            }
            tile.set_feature(face, Some(kind));
        }

        let derived = self.tile_type.stair_direction();
        if self.stair_direction.is_some() && self.stair_direction != derived {
            warn!(x, z, "Stair direction contradicts tile type, using the type");
        }

        tile
    }
}

impl CellDocument {
    fn into_tile(self, x: usize, z: usize) -> Result<Tile, LevelError> {
        match self {
            CellDocument::Legacy(code) => TileType::from_legacy(code)
                .map(Tile::new)
                .ok_or(LevelError::UnknownCellCode { x, z, code }),
            CellDocument::Tile(doc) => Ok(doc.into_tile(x, z)),
        }
    }
}

impl StartDocument {
    fn validate(self, size: usize) -> Result<PlayerStart, LevelError> {
        let direction = u8::try_from(self.direction)
            .ok()
            .and_then(Facing::from_index)
            .ok_or(LevelError::BadDirection(self.direction))?;

        let limit = size as i64;
        if self.x < 0 || self.z < 0 || self.x >= limit || self.z >= limit {
            return Err(LevelError::StartOutOfBounds { x: self.x, z: self.z, size });
        }

        Ok(PlayerStart {
            x: self.x as i32,
            z: self.z as i32,
            direction,
        })
    }
}

impl MapDocument {
    /// Parse JSON text.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Pretty-printed JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Canonical document for a level.
    pub fn from_level(level: &Level) -> Self {
        let map = level
            .grid
            .columns()
            .iter()
            .map(|column| {
                column
                    .iter()
                    .map(|tile| CellDocument::Tile(TileDocument::from_tile(tile)))
                    .collect()
            })
            .collect();

        Self {
            name: level.name.clone(),
            description: level.description.clone(),
            map,
            player_start: StartDocument {
                x: i64::from(level.start.x),
                z: i64::from(level.start.z),
                direction: i64::from(level.start.direction.index()),
            },
        }
    }

    /// Validate and convert into a playable level.
    pub fn into_level(self) -> Result<Level, LevelError> {
        let size = self.map.len();
        if size == 0 {
            return Err(LevelError::Empty);
        }

        let mut columns = Vec::with_capacity(size);
        for (x, column) in self.map.into_iter().enumerate() {
            if column.len() != size {
                return Err(LevelError::NotSquare { column: x, len: column.len(), size });
            }
            let tiles = column
                .into_iter()
                .enumerate()
                .map(|(z, cell)| cell.into_tile(x, z))
                .collect::<Result<Vec<_>, _>>()?;
            columns.push(tiles);
        }

        let grid = Grid::from_columns(columns).ok_or(LevelError::Empty)?;
        let start = self.player_start.validate(size)?;
        if !grid.is_walkable(start.x, start.z) {
            warn!(x = start.x, z = start.z, "Player starts on a tile that cannot be entered");
        }

        Ok(Level {
            name: self.name,
            description: self.description,
            grid,
            start,
        })
    }
}

// =============================================================================
// LEVEL
// =============================================================================

/// A validated, playable level.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    /// Display name
    pub name: String,
    /// Free text
    pub description: String,
    /// Tiles
    pub grid: Grid,
    /// Actor start
    pub start: PlayerStart,
}

/// Outcome of [`Level::load_or_default`].
#[derive(Debug)]
pub struct LoadReport {
    /// The level to play
    pub level: Level,
    /// Why the requested file was not used, if it wasn't
    pub error: Option<LevelError>,
}

impl LoadReport {
    /// True if the fallback level was substituted.
    pub fn used_fallback(&self) -> bool {
        self.error.is_some()
    }
}

impl Level {
    /// The built-in 5×5 dungeon.
    pub fn default_dungeon() -> Self {
        let (grid, start) = Grid::default_dungeon();
        Self {
            name: "Default Dungeon".to_string(),
            description: "Walled room with a single pillar".to_string(),
            grid,
            start,
        }
    }

    /// Hash of everything that affects play (not name or description).
    pub fn fingerprint(&self) -> StateHash {
        let mut hasher = StateHasher::for_level();
        hasher.update_u32(self.grid.size() as u32);
        for (_, _, tile) in self.grid.iter() {
            hasher.update_str(tile.tile_type().name());
            for face in Facing::ALL {
                match tile.feature(face) {
                    Some(kind) => hasher.update_str(kind.name()),
                    None => hasher.update_u8(0),
                }
            }
        }
        hasher.update_i32(self.start.x);
        hasher.update_i32(self.start.z);
        hasher.update_u8(self.start.direction.index());
        hasher.finalize()
    }

    /// Parse and validate JSON text.
    pub fn from_json(s: &str) -> Result<Self, LevelError> {
        MapDocument::from_json(s)?.into_level()
    }

    /// Canonical JSON text.
    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(MapDocument::from_level(self).to_json()?)
    }

    /// Read a level file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let text = fs::read_to_string(path.as_ref())?;
        let level = Self::from_json(&text)?;
        info!(name = %level.name, size = level.grid.size(), "Loaded dungeon");
        Ok(level)
    }

    /// Read a level file, substituting the built-in dungeon on failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> LoadReport {
        match Self::load(path.as_ref()) {
            Ok(level) => LoadReport { level, error: None },
            Err(error) => {
                warn!(path = %path.as_ref().display(), %error, "Creating default map");
                LoadReport {
                    level: Self::default_dungeon(),
                    error: Some(error),
                }
            }
        }
    }

    /// Write the canonical form.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LevelError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
