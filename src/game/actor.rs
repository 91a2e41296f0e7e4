//! Actor Motion Controller
//!
//! Discrete grid position and facing for the player, with eased visual
//! transitions layered on top.
//!
//! The logical cell and facing change the instant a move or turn is accepted.
//! The visual pose (what the camera shows) lags behind and catches up over
//! the transition duration. Gameplay always reads the logical state.

use serde::{Serialize, Deserialize};

use crate::core::easing::{ease_in_out_quad, lerp_angle, shortest_arc_end};
use crate::core::hash::StateHasher;
use crate::core::vec3::Vec3;
use crate::game::direction::Facing;
use crate::game::grid::{Grid, PlayerStart};

/// Default move/turn transition length (ms).
pub const DEFAULT_TRANSITION_MS: f32 = 300.0;

/// Camera height above the floor.
pub const EYE_HEIGHT: f32 = 0.6;

/// The four relative steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Step {
    /// Along the facing
    Forward = 0,
    /// Against the facing
    Backward = 1,
    /// Strafe to the left
    Left = 2,
    /// Strafe to the right
    Right = 3,
}

impl Step {
    /// Absolute direction of this step for an actor facing `facing`.
    #[inline]
    pub fn direction(self, facing: Facing) -> Facing {
        match self {
            Step::Forward => facing,
            Step::Backward => facing.opposite(),
            Step::Left => facing.turn_left(),
            Step::Right => facing.turn_right(),
        }
    }
}

/// In-flight move.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveTransition {
    /// Visual start (cell centre)
    pub from: Vec3,
    /// Visual end (cell centre)
    pub to: Vec3,
    /// Linear progress 0..1
    pub progress: f32,
    /// Total length (ms)
    pub duration: f32,
}

/// In-flight turn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnTransition {
    /// Yaw at start
    pub start_yaw: f32,
    /// Yaw at end, already adjusted to the short arc
    pub end_yaw: f32,
    /// Linear progress 0..1
    pub progress: f32,
    /// Total length (ms)
    pub duration: f32,
}

/// What the renderer needs to place the camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorPose {
    /// Interpolated eye position
    pub position: Vec3,
    /// Interpolated yaw (radians)
    pub yaw: f32,
    /// Logical facing
    pub facing: Facing,
    /// Logical cell
    pub cell: (i32, i32),
}

/// The player avatar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    x: i32,
    z: i32,
    facing: Facing,
    moving: Option<MoveTransition>,
    turning: Option<TurnTransition>,
    move_duration: f32,
    turn_duration: f32,
    eye_height: f32,
}

impl Actor {
    /// Actor at the level's start with default timings.
    pub fn new(start: PlayerStart) -> Self {
        Self {
            x: start.x,
            z: start.z,
            facing: start.direction,
            moving: None,
            turning: None,
            move_duration: DEFAULT_TRANSITION_MS,
            turn_duration: DEFAULT_TRANSITION_MS,
            eye_height: EYE_HEIGHT,
        }
    }

    /// Override transition lengths (ms).
    pub fn with_durations(mut self, move_ms: f32, turn_ms: f32) -> Self {
        self.move_duration = move_ms.max(f32::EPSILON);
        self.turn_duration = turn_ms.max(f32::EPSILON);
        self
    }

    /// Override eye height.
    pub fn with_eye_height(mut self, eye_height: f32) -> Self {
        self.eye_height = eye_height;
        self
    }

    // =========================================================================
    // Logical state
    // =========================================================================

    /// Logical cell.
    #[inline]
    pub fn cell(&self) -> (i32, i32) {
        (self.x, self.z)
    }

    /// Logical facing.
    #[inline]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Eye height.
    #[inline]
    pub fn eye_height(&self) -> f32 {
        self.eye_height
    }

    /// Cell directly ahead.
    pub fn forward_cell(&self) -> (i32, i32) {
        self.neighbour(Step::Forward)
    }

    /// Cell one step away in a relative direction.
    pub fn neighbour(&self, step: Step) -> (i32, i32) {
        let (dx, dz) = step.direction(self.facing).offset();
        (self.x + dx, self.z + dz)
    }

    /// A move transition is running.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving.is_some()
    }

    /// A turn transition is running.
    #[inline]
    pub fn is_turning(&self) -> bool {
        self.turning.is_some()
    }

    /// Running move transition, if any.
    pub fn move_transition(&self) -> Option<&MoveTransition> {
        self.moving.as_ref()
    }

    /// Running turn transition, if any.
    pub fn turn_transition(&self) -> Option<&TurnTransition> {
        self.turning.as_ref()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Step one cell. Rejected while moving or turning, or into anything not
    /// walkable.
    pub fn try_step(&mut self, step: Step, grid: &Grid) -> bool {
        if self.is_moving() || self.is_turning() {
            return false;
        }

        let (nx, nz) = self.neighbour(step);
        if !grid.is_walkable(nx, nz) {
            return false;
        }

        let from = Vec3::from_cell(self.x, self.z, self.eye_height);
        let to = Vec3::from_cell(nx, nz, self.eye_height);
        self.x = nx;
        self.z = nz;
        self.moving = Some(MoveTransition {
            from,
            to,
            progress: 0.0,
            duration: self.move_duration,
        });
        true
    }

    /// Step forward.
    pub fn move_forward(&mut self, grid: &Grid) -> bool {
        self.try_step(Step::Forward, grid)
    }

    /// Step backward.
    pub fn move_backward(&mut self, grid: &Grid) -> bool {
        self.try_step(Step::Backward, grid)
    }

    /// Strafe left.
    pub fn strafe_left(&mut self, grid: &Grid) -> bool {
        self.try_step(Step::Left, grid)
    }

    /// Strafe right.
    pub fn strafe_right(&mut self, grid: &Grid) -> bool {
        self.try_step(Step::Right, grid)
    }

    /// Quarter turn left. Rejected only while a turn is running.
    pub fn turn_left(&mut self) -> bool {
        self.turn_to(self.facing.turn_left())
    }

    /// Quarter turn right. Rejected only while a turn is running.
    pub fn turn_right(&mut self) -> bool {
        self.turn_to(self.facing.turn_right())
    }

    fn turn_to(&mut self, target: Facing) -> bool {
        if self.is_turning() {
            return false;
        }

        let start_yaw = self.facing.yaw();
        let end_yaw = shortest_arc_end(start_yaw, target.yaw());
        self.facing = target;
        self.turning = Some(TurnTransition {
            start_yaw,
            end_yaw,
            progress: 0.0,
            duration: self.turn_duration,
        });
        true
    }

    /// Advance running transitions by `delta_ms`.
    pub fn advance(&mut self, delta_ms: f32) {
        if let Some(mv) = self.moving.as_mut() {
            mv.progress += delta_ms / mv.duration;
            if mv.progress >= 1.0 {
                self.moving = None;
            }
        }

        if let Some(turn) = self.turning.as_mut() {
            turn.progress += delta_ms / turn.duration;
            if turn.progress >= 1.0 {
                self.turning = None;
            }
        }
    }

    // =========================================================================
    // Visual pose
    // =========================================================================

    /// Eased eye position.
    pub fn visual_position(&self) -> Vec3 {
        match &self.moving {
            Some(mv) => mv.from.lerp(mv.to, ease_in_out_quad(mv.progress)),
            None => Vec3::from_cell(self.x, self.z, self.eye_height),
        }
    }

    /// Eased yaw.
    pub fn visual_yaw(&self) -> f32 {
        match &self.turning {
            Some(turn) => lerp_angle(turn.start_yaw, turn.end_yaw, ease_in_out_quad(turn.progress)),
            None => self.facing.yaw(),
        }
    }

    /// Snapshot for the renderer.
    pub fn pose(&self) -> ActorPose {
        ActorPose {
            position: self.visual_position(),
            yaw: self.visual_yaw(),
            facing: self.facing,
            cell: self.cell(),
        }
    }

    /// Feed the actor into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_i32(self.x);
        hasher.update_i32(self.z);
        hasher.update_u8(self.facing as u8);
        hasher.update_bool(self.moving.is_some());
        if let Some(mv) = &self.moving {
            hasher.update_f32(mv.progress);
        }
        hasher.update_bool(self.turning.is_some());
        if let Some(turn) = &self.turning {
            hasher.update_f32(turn.progress);
            hasher.update_f32(turn.end_yaw);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn open_grid() -> Grid {
        Grid::blank(5)
    }

    fn actor_at(x: i32, z: i32, direction: Facing) -> Actor {
        Actor::new(PlayerStart { x, z, direction })
    }

    #[test]
    fn test_move_sets_logical_position_immediately() {
        let grid = open_grid();
        let mut actor = actor_at(1, 3, Facing::North);

        assert!(actor.move_forward(&grid));
        assert_eq!(actor.cell(), (1, 2));
        assert!(actor.is_moving());
        // Visual still at the start cell
        assert_eq!(actor.visual_position(), Vec3::new(1.0, EYE_HEIGHT, 3.0));
    }

    #[test]
    fn test_move_while_moving_rejected() {
        let grid = open_grid();
        let mut actor = actor_at(1, 3, Facing::North);
        assert!(actor.move_forward(&grid));
        actor.advance(100.0);

        let before = actor.clone();
        assert!(!actor.move_forward(&grid));
        assert!(!actor.strafe_right(&grid));
        assert_eq!(actor.cell(), before.cell());
        assert_eq!(actor.move_transition(), before.move_transition());
    }

    #[test]
    fn test_move_while_turning_rejected_but_turn_while_moving_allowed() {
        let grid = open_grid();
        let mut actor = actor_at(2, 2, Facing::North);

        assert!(actor.turn_left());
        assert!(!actor.move_forward(&grid));
        assert_eq!(actor.cell(), (2, 2));

        actor.advance(DEFAULT_TRANSITION_MS);
        assert!(!actor.is_turning());

        assert!(actor.move_forward(&grid));
        assert!(actor.turn_right());
    }

    #[test]
    fn test_turn_while_turning_rejected() {
        let mut actor = actor_at(1, 1, Facing::North);
        assert!(actor.turn_right());
        assert!(!actor.turn_right());
        assert_eq!(actor.facing(), Facing::East);
    }

    #[test]
    fn test_blocked_move_rejected() {
        let grid = open_grid();
        let mut actor = actor_at(1, 1, Facing::North);
        assert!(!actor.move_forward(&grid));
        assert!(!actor.strafe_left(&grid));
        assert_eq!(actor.cell(), (1, 1));
        assert!(!actor.is_moving());

        assert!(actor.move_backward(&grid));
        assert_eq!(actor.cell(), (1, 2));
    }

    #[test]
    fn test_strafe_offsets_follow_facing() {
        let grid = open_grid();
        let mut actor = actor_at(2, 2, Facing::East);
        assert!(actor.strafe_left(&grid));
        assert_eq!(actor.cell(), (2, 1));

        let mut actor = actor_at(2, 2, Facing::South);
        assert!(actor.strafe_right(&grid));
        assert_eq!(actor.cell(), (1, 2));
    }

    #[test]
    fn test_transition_eases_and_snaps() {
        let grid = open_grid();
        let mut actor = actor_at(1, 1, Facing::South);
        assert!(actor.move_forward(&grid));

        actor.advance(75.0); // t = 0.25 → eased 0.125
        let p = actor.visual_position();
        assert!((p.z - 1.125).abs() < 1e-5);

        actor.advance(225.0);
        assert!(!actor.is_moving());
        assert_eq!(actor.visual_position(), Vec3::new(1.0, EYE_HEIGHT, 2.0));
    }

    #[test]
    fn test_short_arc_south_west() {
        // South → West (turn right)
        let mut actor = actor_at(1, 1, Facing::South);
        assert!(actor.turn_right());
        let turn = *actor.turn_transition().unwrap();
        assert_eq!(turn.start_yaw, PI);
        assert_eq!(turn.end_yaw, FRAC_PI_2);

        // West → South (turn left)
        let mut actor = actor_at(1, 1, Facing::West);
        assert!(actor.turn_left());
        let turn = *actor.turn_transition().unwrap();
        assert!((turn.end_yaw - turn.start_yaw).abs() <= PI);
    }

    #[test]
    fn test_wraparound_turns_take_short_arc() {
        for facing in Facing::ALL {
            for right in [false, true] {
                let mut actor = actor_at(1, 1, facing);
                if right {
                    actor.turn_right();
                } else {
                    actor.turn_left();
                }
                let turn = *actor.turn_transition().unwrap();
                let arc = (turn.end_yaw - turn.start_yaw).abs();
                assert!((arc - FRAC_PI_2).abs() < 1e-5, "{:?} right={} arc={}", facing, right, arc);
            }
        }
    }

    #[test]
    fn test_visual_yaw_settles_on_facing() {
        let mut actor = actor_at(1, 1, Facing::East);
        actor.turn_right();
        actor.advance(150.0);
        let mid = actor.visual_yaw();
        assert!(mid < -FRAC_PI_2 || mid > FRAC_PI_2);
        actor.advance(200.0);
        assert_eq!(actor.visual_yaw(), Facing::South.yaw());
    }
}
