//! Tile Grid
//!
//! Square map of typed tiles with a walkability predicate.
//!
//! Storage is a flat vector in `x * size + z` order. Every lookup is bounds
//! checked; anything outside the grid is simply not walkable.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::game::direction::{wall_mount, Facing, Mount};

/// Smallest grid that still has an interior cell.
pub const MIN_GRID_SIZE: usize = 3;

/// Largest grid the editor will create.
pub const MAX_GRID_SIZE: usize = 256;

// =============================================================================
// TILE TYPES
// =============================================================================

/// What occupies a grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum TileType {
    /// Open floor
    #[default]
    Empty = 0,
    /// Solid wall; the only type that carries face features
    Wall = 1,
    /// Pit trap (walkable)
    Trap = 2,
    /// Stairs to the previous level
    StairsUp = 3,
    /// Stairs to the next level
    StairsDown = 4,
}

impl TileType {
    /// True for every type the actor and projectiles may enter.
    #[inline]
    pub fn is_walkable(self) -> bool {
        !matches!(self, TileType::Wall)
    }

    /// Stair direction derived from the type.
    pub fn stair_direction(self) -> Option<StairDirection> {
        match self {
            TileType::StairsUp => Some(StairDirection::Up),
            TileType::StairsDown => Some(StairDirection::Down),
            _ => None,
        }
    }

    /// Name as written in the map document.
    pub fn name(self) -> &'static str {
        match self {
            TileType::Empty => "empty",
            TileType::Wall => "wall",
            TileType::Trap => "trap",
            TileType::StairsUp => "stairs-up",
            TileType::StairsDown => "stairs-down",
        }
    }

    /// Upgrade a legacy integer cell (`0` empty, `1` wall, `2` trap).
    pub fn from_legacy(code: i64) -> Option<TileType> {
        match code {
            0 => Some(TileType::Empty),
            1 => Some(TileType::Wall),
            2 => Some(TileType::Trap),
            _ => None,
        }
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a staircase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StairDirection {
    /// Leads to the previous level
    Up,
    /// Leads to the next level
    Down,
}

/// Something mounted on a wall face.
///
/// Unknown names survive a load/save cycle as `Other` but nothing in the
/// simulation acts on them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureKind {
    /// Door
    Door,
    /// Wall torch (becomes a flickering light)
    Torch,
    /// Painting
    Painting,
    /// Unrecognised feature name
    Other(String),
}

impl FeatureKind {
    /// Document name of the feature.
    pub fn name(&self) -> &str {
        match self {
            FeatureKind::Door => "door",
            FeatureKind::Torch => "torch",
            FeatureKind::Painting => "painting",
            FeatureKind::Other(name) => name,
        }
    }

    /// False for `Other`.
    pub fn is_known(&self) -> bool {
        !matches!(self, FeatureKind::Other(_))
    }
}

impl From<String> for FeatureKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "door" => FeatureKind::Door,
            "torch" => FeatureKind::Torch,
            "painting" => FeatureKind::Painting,
            _ => FeatureKind::Other(name),
        }
    }
}

impl From<&str> for FeatureKind {
    fn from(name: &str) -> Self {
        FeatureKind::from(name.to_string())
    }
}

impl From<FeatureKind> for String {
    fn from(kind: FeatureKind) -> String {
        match kind {
            FeatureKind::Other(name) => name,
            known => known.name().to_string(),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// TILE
// =============================================================================

/// One grid cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    tile_type: TileType,
    /// Features indexed by `Facing as usize`
    faces: [Option<FeatureKind>; 4],
}

impl Tile {
    /// Bare tile of the given type.
    pub fn new(tile_type: TileType) -> Self {
        Self { tile_type, faces: Default::default() }
    }

    /// Bare wall.
    pub fn wall() -> Self {
        Self::new(TileType::Wall)
    }

    /// Open floor.
    pub fn empty() -> Self {
        Self::new(TileType::Empty)
    }

    /// Tile type.
    #[inline]
    pub fn tile_type(&self) -> TileType {
        self.tile_type
    }

    /// Walkability of this tile.
    #[inline]
    pub fn is_walkable(&self) -> bool {
        self.tile_type.is_walkable()
    }

    /// Stair direction derived from the type.
    pub fn stair_direction(&self) -> Option<StairDirection> {
        self.tile_type.stair_direction()
    }

    /// Change the type. Leaving `Wall` clears all four faces.
    pub fn set_type(&mut self, tile_type: TileType) {
        self.tile_type = tile_type;
        if tile_type != TileType::Wall {
            self.clear_faces();
        }
    }

    /// Feature on one face.
    pub fn feature(&self, face: Facing) -> Option<&FeatureKind> {
        self.faces[face as usize].as_ref()
    }

    /// Set or clear a face feature. Returns false (and changes nothing) on
    /// anything other than a wall.
    pub fn set_feature(&mut self, face: Facing, feature: Option<FeatureKind>) -> bool {
        if self.tile_type != TileType::Wall {
            return false;
        }
        self.faces[face as usize] = feature;
        true
    }

    /// Remove every face feature.
    pub fn clear_faces(&mut self) {
        self.faces = Default::default();
    }

    /// Iterate `(face, feature)` over populated faces in North, East, South,
    /// West order.
    pub fn features(&self) -> impl Iterator<Item = (Facing, &FeatureKind)> {
        Facing::ALL
            .into_iter()
            .filter_map(move |face| self.feature(face).map(|kind| (face, kind)))
    }

    /// True if any face carries a feature.
    pub fn has_features(&self) -> bool {
        self.faces.iter().any(Option::is_some)
    }
}

// =============================================================================
// PLAYER START
// =============================================================================

/// Where and how the actor starts a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStart {
    /// Column
    pub x: i32,
    /// Row
    pub z: i32,
    /// Initial facing
    pub direction: Facing,
}

impl Default for PlayerStart {
    fn default() -> Self {
        Self { x: 1, z: 1, direction: Facing::North }
    }
}

// =============================================================================
// GRID
// =============================================================================

/// A feature found on a wall face, with its world placement.
#[derive(Clone, Debug)]
pub struct WallFeature<'a> {
    /// Wall column
    pub x: i32,
    /// Wall row
    pub z: i32,
    /// Face the feature hangs on
    pub face: Facing,
    /// What it is
    pub kind: &'a FeatureKind,
    /// World placement
    pub mount: Mount,
}

/// Square tile grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Grid of `size × size` tiles all of one type.
    pub fn filled(size: usize, tile_type: TileType) -> Self {
        Self {
            size,
            tiles: vec![Tile::new(tile_type); size * size],
        }
    }

    /// Walled border around an empty interior.
    pub fn blank(size: usize) -> Self {
        let mut grid = Self::filled(size, TileType::Empty);
        for x in 0..size {
            for z in 0..size {
                if x == 0 || z == 0 || x + 1 == size || z + 1 == size {
                    grid.tiles[x * size + z] = Tile::wall();
                }
            }
        }
        grid
    }

    /// Build from column-major rows (`columns[x][z]`).
    ///
    /// Returns `None` unless the input is non-empty and square.
    pub fn from_columns(columns: Vec<Vec<Tile>>) -> Option<Self> {
        let size = columns.len();
        if size == 0 || columns.iter().any(|col| col.len() != size) {
            return None;
        }
        Some(Self {
            size,
            tiles: columns.into_iter().flatten().collect(),
        })
    }

    /// The fallback 5×5 dungeon: walled border with one pillar at (2, 2).
    pub fn default_dungeon() -> (Self, PlayerStart) {
        let mut grid = Self::blank(5);
        grid.tiles[2 * 5 + 2] = Tile::wall();
        (grid, PlayerStart::default())
    }

    /// Cells per side.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, x: i32, z: i32) -> Option<usize> {
        if x < 0 || z < 0 {
            return None;
        }
        let (x, z) = (x as usize, z as usize);
        if x >= self.size || z >= self.size {
            return None;
        }
        Some(x * self.size + z)
    }

    /// True if `(x, z)` lies on the grid.
    #[inline]
    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        self.index(x, z).is_some()
    }

    /// Tile at `(x, z)`, or `None` off the grid.
    #[inline]
    pub fn tile_at(&self, x: i32, z: i32) -> Option<&Tile> {
        self.index(x, z).map(|i| &self.tiles[i])
    }

    /// Mutable tile at `(x, z)`.
    #[inline]
    pub fn tile_at_mut(&mut self, x: i32, z: i32) -> Option<&mut Tile> {
        self.index(x, z).map(move |i| &mut self.tiles[i])
    }

    /// True iff `(x, z)` is on the grid and its tile can be entered.
    #[inline]
    pub fn is_walkable(&self, x: i32, z: i32) -> bool {
        self.tile_at(x, z).map_or(false, Tile::is_walkable)
    }

    /// Iterate every cell as `(x, z, tile)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &Tile)> {
        let size = self.size;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| ((i / size) as i32, (i % size) as i32, tile))
    }

    /// Cells as nested columns (`columns[x][z]`), the document layout.
    pub fn columns(&self) -> Vec<Vec<Tile>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.tiles.chunks(self.size).map(<[Tile]>::to_vec).collect()
    }

    /// Every trap cell.
    pub fn traps(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.iter()
            .filter(|(_, _, tile)| tile.tile_type() == TileType::Trap)
            .map(|(x, z, _)| (x, z))
    }

    /// Every recognised wall feature with its placement.
    pub fn features(&self) -> impl Iterator<Item = WallFeature<'_>> {
        self.iter()
            .filter(|(_, _, tile)| tile.tile_type() == TileType::Wall)
            .flat_map(|(x, z, tile)| {
                tile.features()
                    .filter(|(_, kind)| kind.is_known())
                    .map(move |(face, kind)| WallFeature {
                        x,
                        z,
                        face,
                        kind,
                        mount: wall_mount(x, z, face),
                    })
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================
