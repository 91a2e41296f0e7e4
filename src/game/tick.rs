//! Simulation Tick
//!
//! The per-frame game loop. Given the same level, seed and input frames it
//! produces the same state hash on every run.

use tracing::warn;

use crate::config::SimConfig;
use crate::core::vec3::Vec3;
use crate::game::actor::Step;
use crate::game::effects::TorchToggle;
use crate::game::events::{GameEvent, SoundCue};
use crate::game::grid::TileType;
use crate::game::input::{Command, InputFrame, InputScript};
use crate::game::projectile::{DestroyCause, ProjectileOutcome};
use crate::game::state::DungeonState;
use crate::level::document::Level;

/// Held-key precedence when several movement keys are down.
const MOVE_ORDER: [(Command, Step); 4] = [
    (Command::MoveForward, Step::Forward),
    (Command::MoveBackward, Step::Backward),
    (Command::StrafeLeft, Step::Left),
    (Command::StrafeRight, Step::Right),
];

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Projectiles launched this tick
    pub spawned: u32,
    /// Projectiles removed this tick
    pub destroyed: u32,
}

/// Run one simulation tick.
///
/// Order is fixed:
/// 1. clock and cooldowns
/// 2. input (move, turn, casts, torch)
/// 3. actor transitions
/// 4. projectiles (advance all, then prune) and impact effects
/// 5. pit lights and torches
pub fn tick(
    state: &mut DungeonState,
    input: InputFrame,
    delta_ms: f32,
    config: &SimConfig,
) -> TickResult {
    let mut result = TickResult::default();

    // 0. Advance tick counter and clock
    state.tick += 1;
    state.clock_ms += f64::from(delta_ms);
    state.cooldowns.tick(f64::from(delta_ms));

    // 1. Movement
    apply_movement(state, input, config);

    // 2. Turning
    apply_turn(state, input, config);

    // 3. Spell casts
    result.spawned = apply_casts(state, input, config);

    // 4. Torch placement (on press, not while held)
    if state.cooldowns.torch_pressed(input.place_torch()) {
        toggle_torch_ahead(state);
    }

    // 5. Actor transitions
    state.actor.advance(delta_ms);

    // 6. Projectiles
    result.destroyed = update_projectiles(state, delta_ms);

    // 7. Impact effects decay on their own timers
    let now = state.clock_ms;
    state.impacts.retain(|impact| impact.is_alive(now));

    // 8. Ambient registries
    state.effects.advance(delta_ms, &mut state.rng);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        tick = state.tick,
        projectiles = state.projectiles.len(),
        impacts = state.impacts.len(),
        "tick complete"
    );

    // Collect events
    result.events = state.take_events();

    result
}

/// Try held movement keys in precedence order; the first accepted step wins.
///
/// A blocked step falls through to the next held key.
fn apply_movement(state: &mut DungeonState, input: InputFrame, config: &SimConfig) {
    if !state.cooldowns.move_ready() {
        return;
    }

    let from = state.actor.cell();
    for (command, step) in MOVE_ORDER {
        if !input.is_set(command) || !state.actor.try_step(step, &state.grid) {
            continue;
        }

        state.cooldowns.trigger_move(config.move_cooldown_ms);
        let tick = state.tick;
        let to = state.actor.cell();
        state.push_event(GameEvent::actor_moved(tick, step, from, to));
        state.push_event(GameEvent::sound(tick, SoundCue::Step));
        return;
    }
}

/// Turn left or right. The cooldown starts on every attempt.
fn apply_turn(state: &mut DungeonState, input: InputFrame, config: &SimConfig) {
    if !state.cooldowns.turn_ready() {
        return;
    }

    let turned = if input.is_set(Command::TurnLeft) {
        state.cooldowns.trigger_turn(config.turn_cooldown_ms);
        state.actor.turn_left()
    } else if input.is_set(Command::TurnRight) {
        state.cooldowns.trigger_turn(config.turn_cooldown_ms);
        state.actor.turn_right()
    } else {
        return;
    };

    if turned {
        let tick = state.tick;
        let facing = state.actor.facing();
        state.push_event(GameEvent::facing_changed(tick, facing));
    }
}

/// Launch every requested spell whose cooldown slot is ready.
fn apply_casts(state: &mut DungeonState, input: InputFrame, config: &SimConfig) -> u32 {
    let mut spawned = 0;

    for variant in input.casts() {
        if !state.cooldowns.cast_ready(variant) {
            continue;
        }
        state.cooldowns.trigger_cast(variant);

        let facing = state.actor.facing();
        let (cx, cz) = state.actor.cell();
        let (dx, dz) = facing.offset();
        let origin = Vec3::from_cell(cx, cz, state.actor.eye_height())
            .offset_xz(dx as f32 * config.spawn_offset, dz as f32 * config.spawn_offset);

        let id = state.spawn_projectile(variant, origin, facing);
        let tick = state.tick;
        state.push_event(GameEvent::projectile_spawned(tick, id, variant, origin, facing));
        state.push_event(GameEvent::sound(tick, SoundCue::Cast(variant)));
        spawned += 1;
    }

    spawned
}

/// Toggle a torch on the wall face the actor is looking at.
fn toggle_torch_ahead(state: &mut DungeonState) {
    let tick = state.tick;
    let (x, z) = state.actor.forward_cell();
    let is_wall = state
        .grid
        .tile_at(x, z)
        .map_or(false, |tile| tile.tile_type() == TileType::Wall);

    if !is_wall {
        state.push_event(GameEvent::status(tick, "No wall to place a torch on"));
        return;
    }

    let face = state.actor.facing().opposite();
    let toggle = state.effects.toggle_torch(x, z, face);
    state.push_event(GameEvent::torch_toggled(tick, x, z, face, toggle));
    let text = match toggle {
        TorchToggle::Placed => "Torch placed",
        TorchToggle::Removed => "Torch removed",
    };
    state.push_event(GameEvent::status(tick, text));
}

/// Advance every projectile, then drop the destroyed ones.
fn update_projectiles(state: &mut DungeonState, delta_ms: f32) -> u32 {
    let now = state.clock_ms;
    let mut finished = Vec::new();

    for projectile in state.projectiles.values_mut() {
        let cause = match projectile.advance(delta_ms, now, &state.grid, &mut state.rng) {
            ProjectileOutcome::Inactive | ProjectileOutcome::Moved => continue,
            ProjectileOutcome::Expired => DestroyCause::Expired,
            ProjectileOutcome::Collided(impact) => {
                state.impacts.push(impact);
                DestroyCause::Collided
            }
        };
        finished.push((projectile.id(), projectile.variant(), cause, projectile.position()));
    }

    let tick = state.tick;
    for (id, variant, cause, position) in &finished {
        state.push_event(GameEvent::projectile_destroyed(tick, *id, *variant, *cause, *position));
    }

    state.projectiles.retain(|_, projectile| projectile.is_active());
    finished.len() as u32
}

/// Replay a recorded session from its input script.
///
/// Returns the final state and every event emitted.
pub fn replay(
    level: &Level,
    config: &SimConfig,
    script: &InputScript,
) -> (DungeonState, Vec<GameEvent>) {
    let mut state = DungeonState::with_seed(level, config, script.rng_seed);
    if state.level_hash != script.level_hash {
        warn!("Replaying input script on a different level than it was recorded on");
    }

    let mut all_events = Vec::new();
    for (_, frame) in script.replay_iter() {
        let result = tick(&mut state, frame, script.tick_ms, config);
        all_events.extend(result.events);
    }

    (state, all_events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::direction::Facing;
    use crate::game::events::GameEventData;
    use crate::game::projectile::Variant;

    const DT: f32 = 1000.0 / 60.0;

    fn facing_south() -> Level {
        let mut level = Level::default_dungeon();
        level.start.direction = Facing::South;
        level
    }

    fn frame(commands: &[Command]) -> InputFrame {
        InputFrame::from_commands(commands)
    }

    fn scripted_input(t: u32) -> InputFrame {
        match t % 90 {
            0..=19 => frame(&[Command::MoveBackward]),
            20 => frame(&[Command::TurnRight]),
            30 => frame(&[Command::Cast(Variant::GasCloud)]),
            40..=59 => frame(&[Command::StrafeLeft, Command::Cast(Variant::Fireball)]),
            60 => frame(&[Command::PlaceTorch]),
            70 => frame(&[Command::TurnLeft, Command::Cast(Variant::Lightning)]),
            _ => InputFrame::new(),
        }
    }

    #[test]
    fn test_tick_determinism() {
        let config = SimConfig::default();
        let level = Level::default_dungeon();
        let mut state1 = DungeonState::new(&level, &config);
        let mut state2 = DungeonState::new(&level, &config);

        for t in 0..300 {
            let input = scripted_input(t);
            tick(&mut state1, input, DT, &config);
            tick(&mut state2, input, DT, &config);
        }

        assert_eq!(state1.tick, state2.tick);
        assert_eq!(state1.compute_hash(), state2.compute_hash());
        assert_eq!(state1.actor.cell(), state2.actor.cell());
    }

    #[test]
    fn test_move_emits_step() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&Level::default_dungeon(), &config);

        let result = tick(&mut state, frame(&[Command::MoveBackward]), DT, &config);

        assert_eq!(state.actor.cell(), (1, 2));
        assert!(result.events.iter().any(|e| e.data
            == GameEventData::ActorMoved { step: Step::Backward, from: (1, 1), to: (1, 2) }));
        assert!(result.events.iter().any(|e| e.data == GameEventData::Sound(SoundCue::Step)));
    }

    #[test]
    fn test_wall_ahead_blocks_move() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&Level::default_dungeon(), &config);

        // Facing North from (1,1): row 0 is border wall
        let result = tick(&mut state, frame(&[Command::MoveForward]), DT, &config);

        assert_eq!(state.actor.cell(), (1, 1));
        assert!(result.events.is_empty());
        // Rejected moves do not start the cooldown
        assert!(state.cooldowns.move_ready());
    }

    #[test]
    fn test_blocked_step_falls_through_to_next_held_key() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&Level::default_dungeon(), &config);

        // Forward is the border wall, backward is open
        let result = tick(&mut state, frame(&[Command::MoveForward, Command::MoveBackward]), DT, &config);

        assert_eq!(state.actor.cell(), (1, 2));
        assert!(result.events.iter().any(|e| e.data
            == GameEventData::ActorMoved { step: Step::Backward, from: (1, 1), to: (1, 2) }));
        assert!(!state.cooldowns.move_ready());
    }

    #[test]
    fn test_forward_wins_when_both_open() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&facing_south(), &config);

        // Facing South at (1,1): forward (1,2) and strafe-left (2,1) are both open
        tick(&mut state, frame(&[Command::StrafeLeft, Command::MoveForward]), DT, &config);

        assert_eq!(state.actor.cell(), (1, 2));
    }

    #[test]
    fn test_held_move_waits_for_cooldown() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&Level::default_dungeon(), &config);

        let mut moves = 0;
        for _ in 0..5 {
            let result = tick(&mut state, frame(&[Command::MoveBackward]), DT, &config);
            moves += result
                .events
                .iter()
                .filter(|e| matches!(e.data, GameEventData::ActorMoved { .. }))
                .count();
        }

        assert_eq!(moves, 1);
        assert_eq!(state.actor.cell(), (1, 2));
    }

    #[test]
    fn test_turn_updates_compass() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&Level::default_dungeon(), &config);

        let result = tick(&mut state, frame(&[Command::TurnRight]), DT, &config);

        assert_eq!(state.actor.facing(), Facing::East);
        assert!(result
            .events
            .iter()
            .any(|e| e.data == GameEventData::FacingChanged { facing: Facing::East }));
        assert!(!state.cooldowns.turn_ready());
    }

    #[test]
    fn test_cast_into_adjacent_wall() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&Level::default_dungeon(), &config);

        let result = tick(&mut state, frame(&[Command::Cast(Variant::Fireball)]), DT, &config);

        assert_eq!(result.spawned, 1);
        assert_eq!(result.destroyed, 1);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.impacts.len(), 1);
        assert!(result.events.iter().any(|e| matches!(
            e.data,
            GameEventData::ProjectileDestroyed { cause: DestroyCause::Collided, .. }
        )));
    }

    #[test]
    fn test_cast_spawns_ahead_of_actor() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&facing_south(), &config);

        let result = tick(&mut state, frame(&[Command::Cast(Variant::Fireball)]), DT, &config);

        let spawned = result.events.iter().find_map(|e| match &e.data {
            GameEventData::ProjectileSpawned { position, direction, .. } => Some((*position, *direction)),
            _ => None,
        });
        assert_eq!(spawned, Some((Vec3::new(1.0, 0.6, 1.5), Facing::South)));
        assert_eq!(state.projectiles.len(), 1);
        assert!(result
            .events
            .iter()
            .any(|e| e.data == GameEventData::Sound(SoundCue::Cast(Variant::Fireball))));
    }

    #[test]
    fn test_projectile_flies_until_wall() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&facing_south(), &config);

        tick(&mut state, frame(&[Command::Cast(Variant::Fireball)]), DT, &config);
        let mut destroyed = None;
        for _ in 0..60 {
            let result = tick(&mut state, InputFrame::new(), DT, &config);
            for event in result.events {
                if let GameEventData::ProjectileDestroyed { cause, .. } = event.data {
                    destroyed = Some(cause);
                }
            }
        }

        assert_eq!(destroyed, Some(DestroyCause::Collided));
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_bolt_slot_shared() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&facing_south(), &config);

        let input = frame(&[Command::Cast(Variant::Fireball), Command::Cast(Variant::IceArrow)]);
        let result = tick(&mut state, input, DT, &config);
        assert_eq!(result.spawned, 1);

        // Lightning has its own slot
        let result = tick(&mut state, frame(&[Command::Cast(Variant::Lightning)]), DT, &config);
        assert_eq!(result.spawned, 1);

        // Bolt still cooling down
        let result = tick(&mut state, frame(&[Command::Cast(Variant::IceArrow)]), DT, &config);
        assert_eq!(result.spawned, 0);
    }

    #[test]
    fn test_torch_toggle_on_wall_ahead() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&Level::default_dungeon(), &config);
        let torch = frame(&[Command::PlaceTorch]);

        // Facing North at (1,1): the wall is (1,0), its south face looks at us
        tick(&mut state, torch, DT, &config);
        assert!(state.effects.has_torch(1, 0, Facing::South));

        tick(&mut state, InputFrame::new(), DT, &config);
        let result = tick(&mut state, torch, DT, &config);
        assert!(!state.effects.has_torch(1, 0, Facing::South));
        assert!(result.events.iter().any(|e| e.data
            == GameEventData::TorchToggled { x: 1, z: 0, face: Facing::South, result: TorchToggle::Removed }));
    }

    #[test]
    fn test_held_torch_key_toggles_once() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&Level::default_dungeon(), &config);
        let torch = frame(&[Command::PlaceTorch]);

        let mut toggles = 0;
        for _ in 0..10 {
            let result = tick(&mut state, torch, DT, &config);
            toggles += result
                .events
                .iter()
                .filter(|e| matches!(e.data, GameEventData::TorchToggled { .. }))
                .count();
        }

        assert_eq!(toggles, 1);
        assert!(state.effects.has_torch(1, 0, Facing::South));
    }

    #[test]
    fn test_torch_needs_wall() {
        let config = SimConfig::default();
        let mut state = DungeonState::new(&facing_south(), &config);

        let result = tick(&mut state, frame(&[Command::PlaceTorch]), DT, &config);

        assert_eq!(state.effects.torch_count(), 0);
        assert!(result.events.iter().any(|e| matches!(e.data, GameEventData::Status(_))));
    }

    #[test]
    fn test_replay_determinism() {
        let config = SimConfig::default();
        let level = Level::default_dungeon();
        let mut state = DungeonState::new(&level, &config);
        let mut script = InputScript::new(level.fingerprint(), config.seed, DT);

        let mut live_events = Vec::new();
        for t in 0..240 {
            let input = scripted_input(t);
            script.record(t, input);
            live_events.extend(tick(&mut state, input, DT, &config).events);
        }
        script.finalize(239);

        let (replayed, events) = replay(&level, &config, &script);

        assert_eq!(replayed.tick, state.tick);
        assert_eq!(replayed.compute_hash(), state.compute_hash());
        assert_eq!(events.len(), live_events.len());

        // Survives a bincode round trip
        let bytes = script.to_bytes().unwrap();
        let decoded = InputScript::from_bytes(&bytes).unwrap();
        let (again, _) = replay(&level, &config, &decoded);
        assert_eq!(again.compute_hash(), state.compute_hash());
    }
}
