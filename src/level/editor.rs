//! Level Editor
//!
//! Offline authoring operations over a [`Level`]. Every operation returns
//! the status line to show the user, or an [`EditError`] whose message is
//! shown instead. A rejected operation leaves the level untouched.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::game::direction::Facing;
use crate::game::grid::{
    FeatureKind, Grid, PlayerStart, StairDirection, TileType, MAX_GRID_SIZE, MIN_GRID_SIZE,
};
use crate::level::document::{Level, LevelError};

/// Grid size of a fresh editor.
pub const DEFAULT_EDITOR_SIZE: usize = 10;

/// Rejected editor operation.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// Feature placement on something other than a wall.
    #[error("Wall features can only be added to walls")]
    FeatureOnNonWall,

    /// Grid too small to have an interior, or too large to allocate.
    #[error("Map size must be between {min} and {max}, got {0}", min = MIN_GRID_SIZE, max = MAX_GRID_SIZE)]
    InvalidSize(usize),

    /// Coordinates off the map.
    #[error("Cell ({x}, {z}) is outside the map")]
    OutOfBounds {
        /// Column
        x: i32,
        /// Row
        z: i32,
    },

    /// Save without a name.
    #[error("Please enter a filename")]
    EmptyFilename,

    /// Reading or writing the level failed.
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// What a click on a cell does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tool {
    /// Paint a wall
    Wall,
    /// Paint floor
    Empty,
    /// Paint a pit trap
    Trap,
    /// Stairs to the previous level
    StairsUp,
    /// Stairs to the next level
    StairsDown,
    /// Move the player start here
    Player,
    /// Set (or clear, with `None`) a feature on one face of a wall
    WallFeature {
        /// Feature to place
        kind: Option<FeatureKind>,
        /// Face to place it on
        face: Facing,
    },
}

/// Editable level.
#[derive(Clone, Debug)]
pub struct LevelEditor {
    level: Level,
}

impl Default for LevelEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelEditor {
    /// Editor holding a fresh blank level.
    pub fn new() -> Self {
        Self { level: blank_level(DEFAULT_EDITOR_SIZE) }
    }

    /// Edit an existing level.
    pub fn from_level(level: Level) -> Self {
        Self { level }
    }

    /// The level being edited.
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Finish editing.
    pub fn into_level(self) -> Level {
        self.level
    }

    // =========================================================================
    // Whole-level operations
    // =========================================================================

    /// Replace the level with a blank `size × size` one.
    pub fn create_blank(&mut self, size: usize) -> Result<String, EditError> {
        check_size(size)?;
        self.level = blank_level(size);
        Ok("Created new level".to_string())
    }

    /// Change the grid size, keeping overlapping cells.
    ///
    /// A start position that no longer fits moves to `new_size - 2` on that axis.
    pub fn resize(&mut self, new_size: usize) -> Result<String, EditError> {
        check_size(new_size)?;
        if new_size == self.level.grid.size() {
            return Ok(format!("Map is already {new_size}x{new_size}"));
        }

        let mut grid = Grid::blank(new_size);
        for (x, z, tile) in self.level.grid.iter() {
            if let Some(slot) = grid.tile_at_mut(x, z) {
                *slot = tile.clone();
            }
        }
        self.level.grid = grid;

        let limit = new_size as i32;
        let start = &mut self.level.start;
        if start.x >= limit {
            start.x = limit - 2;
        }
        if start.z >= limit {
            start.z = limit - 2;
        }

        debug!(size = new_size, start_x = start.x, start_z = start.z, "Resized level");
        Ok(format!("Resized map to {new_size}x{new_size}"))
    }

    /// Set the level name.
    pub fn set_name(&mut self, name: &str) -> Result<String, EditError> {
        self.level.name = name.to_string();
        Ok(format!("Renamed level to {name}"))
    }

    /// Set the level description.
    pub fn set_description(&mut self, description: &str) -> Result<String, EditError> {
        self.level.description = description.to_string();
        Ok("Updated description".to_string())
    }

    // =========================================================================
    // Cell operations
    // =========================================================================

    /// Change a tile's type. Leaving `wall` clears every face.
    pub fn set_cell_type(&mut self, x: i32, z: i32, tile_type: TileType) -> Result<String, EditError> {
        let tile = self
            .level
            .grid
            .tile_at_mut(x, z)
            .ok_or(EditError::OutOfBounds { x, z })?;
        tile.set_type(tile_type);
        Ok(format!("Set ({x}, {z}) to {tile_type}"))
    }

    /// Place or clear a feature on one face of a wall.
    pub fn set_face(
        &mut self,
        x: i32,
        z: i32,
        face: Facing,
        feature: Option<FeatureKind>,
    ) -> Result<String, EditError> {
        let tile = self
            .level
            .grid
            .tile_at_mut(x, z)
            .ok_or(EditError::OutOfBounds { x, z })?;

        let message = match &feature {
            Some(kind) => format!("Added {kind} to {} face of ({x}, {z})", face.name()),
            None => format!("Cleared {} face of ({x}, {z})", face.name()),
        };
        if !tile.set_feature(face, feature) {
            return Err(EditError::FeatureOnNonWall);
        }
        Ok(message)
    }

    /// Move the player start.
    pub fn set_player_start(&mut self, x: i32, z: i32) -> Result<String, EditError> {
        if !self.level.grid.in_bounds(x, z) {
            return Err(EditError::OutOfBounds { x, z });
        }
        self.level.start.x = x;
        self.level.start.z = z;
        Ok(format!("Player start set to ({x}, {z})"))
    }

    /// Turn the player start.
    pub fn set_player_direction(&mut self, direction: Facing) -> Result<String, EditError> {
        self.level.start.direction = direction;
        Ok(format!("Player faces {}", direction.label()))
    }

    /// Apply a tool to a cell, as a click in the editor grid does.
    pub fn apply_tool(&mut self, x: i32, z: i32, tool: &Tool) -> Result<String, EditError> {
        match tool {
            Tool::Wall => self.set_cell_type(x, z, TileType::Wall),
            Tool::Empty => self.set_cell_type(x, z, TileType::Empty),
            Tool::Trap => self.set_cell_type(x, z, TileType::Trap),
            Tool::StairsUp | Tool::StairsDown => {
                let tile_type = if *tool == Tool::StairsUp { TileType::StairsUp } else { TileType::StairsDown };
                self.set_cell_type(x, z, tile_type)?;
                let way = match tile_type.stair_direction() {
                    Some(StairDirection::Up) => "upward",
                    _ => "downward",
                };
                Ok(format!("Added {way} stairs at ({x}, {z})"))
            }
            Tool::Player => self.set_player_start(x, z),
            Tool::WallFeature { kind, face } => self.set_face(x, z, *face, kind.clone()),
        }
    }

    /// Human-readable description of a cell.
    pub fn cell_info(&self, x: i32, z: i32) -> Result<String, EditError> {
        let tile = self
            .level
            .grid
            .tile_at(x, z)
            .ok_or(EditError::OutOfBounds { x, z })?;

        let mut info = format!("({x}, {z}) - {}", tile.tile_type());
        match tile.stair_direction() {
            Some(StairDirection::Up) => info.push_str(" (to previous level)"),
            Some(StairDirection::Down) => info.push_str(" (to next level)"),
            None => {
                let features: Vec<String> = Facing::ALL
                    .iter()
                    .filter_map(|face| tile.feature(*face).map(|kind| format!("{}: {kind}", face.label())))
                    .collect();
                if !features.is_empty() {
                    info.push_str(&format!(" ({})", features.join(", ")));
                }
            }
        }
        Ok(info)
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Lower-cased name with every whitespace run (leading and trailing
    /// included) replaced by a single `_`.
    pub fn suggested_filename(&self) -> String {
        let mut filename = String::with_capacity(self.level.name.len());
        let mut in_run = false;
        for c in self.level.name.to_lowercase().chars() {
            if c.is_whitespace() {
                if !in_run {
                    filename.push('_');
                }
                in_run = true;
            } else {
                filename.push(c);
                in_run = false;
            }
        }
        filename
    }

    /// Save as `<dir>/<filename>.json`.
    pub fn save(&self, dir: impl AsRef<Path>, filename: &str) -> Result<String, EditError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(EditError::EmptyFilename);
        }
        let file = if filename.ends_with(".json") {
            filename.to_string()
        } else {
            format!("{filename}.json")
        };
        let path: PathBuf = dir.as_ref().join(&file);
        self.level.save(&path)?;
        Ok(format!("Saved level as {file}"))
    }

    /// Replace the level with one read from disk.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<String, EditError> {
        self.level = Level::load(path)?;
        Ok(format!("Loaded level: {}", self.level.name))
    }
}

fn check_size(size: usize) -> Result<(), EditError> {
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
        return Err(EditError::InvalidSize(size));
    }
    Ok(())
}

fn blank_level(size: usize) -> Level {
    Level {
        name: "New Level".to_string(),
        description: "A new dungeon level".to_string(),
        grid: Grid::blank(size),
        start: PlayerStart::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(size: usize) -> LevelEditor {
        let mut editor = LevelEditor::new();
        editor.create_blank(size).unwrap();
        editor
    }

    #[test]
    fn test_create_blank() {
        let mut editor = LevelEditor::new();
        assert_eq!(editor.create_blank(6).unwrap(), "Created new level");

        let level = editor.level();
        assert_eq!(level.name, "New Level");
        assert_eq!(level.grid.size(), 6);
        assert_eq!(level.grid.tile_at(0, 3).unwrap().tile_type(), TileType::Wall);
        assert_eq!(level.grid.tile_at(2, 3).unwrap().tile_type(), TileType::Empty);
        assert!(matches!(editor.create_blank(2), Err(EditError::InvalidSize(2))));
    }

    #[test]
    fn test_oversized_maps_rejected() {
        let mut editor = editor(MAX_GRID_SIZE);
        assert_eq!(editor.level().grid.size(), MAX_GRID_SIZE);

        editor.create_blank(6).unwrap();
        editor.set_cell_type(2, 2, TileType::Trap).unwrap();

        let err = editor.create_blank(MAX_GRID_SIZE + 1).unwrap_err();
        assert!(matches!(err, EditError::InvalidSize(n) if n == MAX_GRID_SIZE + 1));
        assert_eq!(err.to_string(), format!("Map size must be between 3 and 256, got {}", MAX_GRID_SIZE + 1));

        assert!(matches!(editor.resize(usize::MAX), Err(EditError::InvalidSize(usize::MAX))));
        assert_eq!(editor.level().grid.size(), 6);
        assert_eq!(editor.level().grid.tile_at(2, 2).unwrap().tile_type(), TileType::Trap);
    }

    #[test]
    fn test_resize_keeps_cells_and_clamps_start() {
        let mut editor = editor(10);
        editor.set_cell_type(2, 2, TileType::Trap).unwrap();
        editor.set_player_start(9, 9).unwrap();

        assert_eq!(editor.resize(5).unwrap(), "Resized map to 5x5");

        let level = editor.level();
        assert_eq!(level.grid.size(), 5);
        assert_eq!(level.grid.tile_at(2, 2).unwrap().tile_type(), TileType::Trap);
        assert_eq!((level.start.x, level.start.z), (3, 3));
    }

    #[test]
    fn test_resize_grow_adds_border() {
        let mut editor = editor(5);
        editor.resize(7).unwrap();
        let grid = &editor.level().grid;
        assert_eq!(grid.tile_at(6, 6).unwrap().tile_type(), TileType::Wall);
        // Old border is copied as-is
        assert_eq!(grid.tile_at(4, 2).unwrap().tile_type(), TileType::Wall);
        assert_eq!(grid.tile_at(5, 2).unwrap().tile_type(), TileType::Empty);
    }

    #[test]
    fn test_leaving_wall_clears_faces() {
        let mut editor = editor(5);
        editor.set_face(0, 2, Facing::North, Some(FeatureKind::Door)).unwrap();
        assert_eq!(editor.cell_info(0, 2).unwrap(), "(0, 2) - wall (North: door)");

        editor.set_cell_type(0, 2, TileType::Empty).unwrap();
        assert_eq!(editor.level().grid.tile_at(0, 2).unwrap().feature(Facing::North), None);
    }

    #[test]
    fn test_feature_on_floor_rejected() {
        let mut editor = editor(5);
        let before = editor.level().clone();

        let err = editor.set_face(2, 2, Facing::East, Some(FeatureKind::Torch)).unwrap_err();

        assert_eq!(err.to_string(), "Wall features can only be added to walls");
        assert_eq!(editor.level(), &before);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut editor = editor(5);
        assert!(matches!(
            editor.set_cell_type(5, 0, TileType::Wall),
            Err(EditError::OutOfBounds { x: 5, z: 0 })
        ));
        assert!(editor.set_player_start(-1, 2).is_err());
        assert!(editor.cell_info(0, 9).is_err());
    }

    #[test]
    fn test_apply_tool() {
        let mut editor = editor(5);

        assert_eq!(editor.apply_tool(2, 2, &Tool::StairsDown).unwrap(), "Added downward stairs at (2, 2)");
        assert_eq!(editor.cell_info(2, 2).unwrap(), "(2, 2) - stairs-down (to next level)");

        assert_eq!(editor.apply_tool(1, 2, &Tool::StairsUp).unwrap(), "Added upward stairs at (1, 2)");
        assert_eq!(editor.cell_info(1, 2).unwrap(), "(1, 2) - stairs-up (to previous level)");

        editor.apply_tool(3, 3, &Tool::Player).unwrap();
        assert_eq!((editor.level().start.x, editor.level().start.z), (3, 3));

        let torch = Tool::WallFeature { kind: Some(FeatureKind::Torch), face: Facing::East };
        editor.apply_tool(0, 1, &torch).unwrap();
        let painting = Tool::WallFeature { kind: Some(FeatureKind::Painting), face: Facing::North };
        editor.apply_tool(0, 1, &painting).unwrap();
        assert_eq!(editor.cell_info(0, 1).unwrap(), "(0, 1) - wall (North: painting, East: torch)");

        let clear = Tool::WallFeature { kind: None, face: Facing::East };
        editor.apply_tool(0, 1, &clear).unwrap();
        assert_eq!(editor.cell_info(0, 1).unwrap(), "(0, 1) - wall (North: painting)");
    }

    #[test]
    fn test_metadata() {
        let mut editor = editor(5);
        editor.set_name("  Goblin   Warren ").unwrap();
        editor.set_description("Smells").unwrap();
        editor.set_player_direction(Facing::West).unwrap();

        assert_eq!(editor.suggested_filename(), "_goblin_warren_");

        editor.set_name("Crypt\tof  Bones").unwrap();
        assert_eq!(editor.suggested_filename(), "crypt_of_bones");
        assert_eq!(editor.level().description, "Smells");
        assert_eq!(editor.level().start.direction, Facing::West);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(6);
        editor.set_name("Crypt").unwrap();
        editor.apply_tool(3, 3, &Tool::Trap).unwrap();

        assert!(matches!(editor.save(dir.path(), "  "), Err(EditError::EmptyFilename)));
        assert_eq!(editor.save(dir.path(), "crypt").unwrap(), "Saved level as crypt.json");

        let mut other = LevelEditor::new();
        assert_eq!(other.load(dir.path().join("crypt.json")).unwrap(), "Loaded level: Crypt");
        assert_eq!(other.level(), editor.level());

        // Failed load leaves the level alone
        assert!(other.load(dir.path().join("missing.json")).is_err());
        assert_eq!(other.level().name, "Crypt");
    }
}
